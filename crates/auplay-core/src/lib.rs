//! # auplay-core
//!
//! auplay 核心库, 提供各 crate 共用的错误类型与计时抽象.
//!
//! 整条管线是单线程阻塞模型, 唯一的挂起点是定时等待
//! (codec 音量爬升等待, 片段之间的播放等待), 统一经由 [`Sleeper`] 注入.

pub mod error;
pub mod time;

// 重导出常用类型
pub use error::{AuError, AuResult};
pub use time::{Sleeper, ThreadSleeper, VirtualClock};
