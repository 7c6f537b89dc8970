//! 计时抽象.
//!
//! 音频输出端不提供 "播放完成" 回调, 只能按时长等待.
//! 所有等待都通过 [`Sleeper`] 发出, 生产环境用 [`ThreadSleeper`] 真实阻塞,
//! 测试中用 [`VirtualClock`] 推进虚拟时间, 不产生真实延迟.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 阻塞等待的注入点
pub trait Sleeper {
    /// 阻塞当前线程指定时长
    fn sleep(&mut self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// 基于 `std::thread::sleep` 的真实等待
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// 虚拟时钟 (可克隆句柄)
///
/// `sleep` 只推进虚拟时间并记录每次等待.
/// 克隆出的句柄共享同一时间线, 便于把一份交给被测对象, 另一份留给断言.
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Arc<Mutex<ClockInner>>,
}

#[derive(Default)]
struct ClockInner {
    /// 当前虚拟时间 (自创建起)
    now: Duration,
    /// 每次 sleep 的时长, 按调用顺序
    sleeps: Vec<Duration>,
}

impl VirtualClock {
    /// 创建新时钟, 虚拟时间从 0 开始
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ClockInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 当前虚拟时间
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// 全部等待记录
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// 已等待总时长
    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }
}

impl Sleeper for VirtualClock {
    fn sleep(&mut self, duration: Duration) {
        let mut inner = self.lock();
        inner.now += duration;
        inner.sleeps.push(duration);
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("VirtualClock")
            .field("now", &inner.now)
            .field("sleeps", &inner.sleeps.len())
            .finish()
    }
}
