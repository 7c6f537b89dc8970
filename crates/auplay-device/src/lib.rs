//! # auplay-device
//!
//! 外部音频硬件的启动流程.
//!
//! 编解码芯片与主时钟通过 [`AudioCodec`] / [`ClockSource`] 注入,
//! [`AudioDeviceSequencer`] 按固定顺序完成启动:
//!
//! ```text
//! Idle → Reset → Routing → Gain → Clocking → Settle → Ready
//!          (任一步失败 → Failed)
//! ```
//!
//! 启动成功后得到 [`CodecConfig`], 它是播放控制器的构造凭证.

pub mod clock;
pub mod clock_plan;
pub mod codec;
pub mod config;
pub mod host;
pub mod mock;
pub mod sequencer;

pub use clock::{ClockSource, MASTER_CLOCK_HZ};
pub use clock_plan::{ClockPlan, PllParams};
pub use codec::AudioCodec;
pub use config::{
    CodecConfig, DAC_VOLUME_RANGE_DB, DeviceSettings, HEADPHONE_VOLUME_RANGE_DB, MIN_SETTLE_MS,
};
pub use host::{HostClockSource, HostCodec};
pub use mock::{CodecCall, CodecOp, MockClockSource, MockCodec};
pub use sequencer::{AudioDeviceSequencer, BringUpState};
