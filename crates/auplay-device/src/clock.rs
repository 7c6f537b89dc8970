//! 主时钟抽象.
//!
//! 编解码芯片的 MCLK 由外部信号源 (如 PWM) 产生, 启动后持续输出.

use auplay_core::AuResult;

/// 主时钟频率: 15 MHz
pub const MASTER_CLOCK_HZ: u32 = 15_000_000;

/// 主时钟信号源
pub trait ClockSource {
    /// 以指定频率开始输出
    fn start(&mut self, frequency_hz: u32) -> AuResult<()>;

    /// 当前输出频率, 未启动时为 `None`
    fn frequency_hz(&self) -> Option<u32>;
}
