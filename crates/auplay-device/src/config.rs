//! 设备参数.
//!
//! - [`DeviceSettings`]: 用户请求的增益与稳定时间, 可由配置文件提供
//! - [`CodecConfig`]: 一次成功启动后芯片上实际生效的参数

use std::ops::RangeInclusive;
use std::time::Duration;

use auplay_core::{AuError, AuResult};
use serde::{Deserialize, Serialize};

use crate::clock_plan::ClockPlan;

/// 数字增益范围 (dB)
pub const DAC_VOLUME_RANGE_DB: RangeInclusive<f32> = -63.5..=24.0;
/// 耳机模拟增益范围 (dB)
pub const HEADPHONE_VOLUME_RANGE_DB: RangeInclusive<f32> = -78.3..=0.0;
/// 增益爬升所需的最短稳定时间 (毫秒)
pub const MIN_SETTLE_MS: u64 = 350;

/// 请求的设备参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// 数字增益, 保持为负值以留出余量
    pub dac_volume_db: f32,
    /// 耳机模拟增益, 0 dB 为线路电平
    pub headphone_volume_db: f32,
    /// 稳定时间 (毫秒), 低于 [`MIN_SETTLE_MS`] 时按下限处理
    pub settle_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            dac_volume_db: -3.0,
            headphone_volume_db: 0.0,
            settle_ms: MIN_SETTLE_MS,
        }
    }
}

impl DeviceSettings {
    /// 实际使用的稳定时间
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms.max(MIN_SETTLE_MS))
    }

    /// 检查两项增益是否在芯片支持范围内
    pub fn validate(&self) -> AuResult<()> {
        check_range("dac_volume_db", self.dac_volume_db, &DAC_VOLUME_RANGE_DB)?;
        check_range(
            "headphone_volume_db",
            self.headphone_volume_db,
            &HEADPHONE_VOLUME_RANGE_DB,
        )
    }
}

/// 范围检查, NaN 视为越界
pub(crate) fn check_range(name: &str, value: f32, range: &RangeInclusive<f32>) -> AuResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(AuError::InvalidArgument(format!(
            "{}={} 超出范围 [{}, {}] dB",
            name,
            value,
            range.start(),
            range.end()
        )))
    }
}

/// 芯片上实际生效的参数
///
/// 只能由 [`AudioDeviceSequencer::bring_up`](crate::AudioDeviceSequencer::bring_up)
/// 在全部步骤成功并等待稳定后产生, 因此持有它即说明设备已就绪.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecConfig {
    speaker_enabled: bool,
    headphone_enabled: bool,
    dac_volume_db: f32,
    headphone_volume_db: f32,
    sample_rate: u32,
    master_clock_hz: u32,
    clock_plan: ClockPlan,
    settle: Duration,
}

impl CodecConfig {
    pub(crate) fn new(
        settings: &DeviceSettings,
        clock_plan: ClockPlan,
        settle: Duration,
    ) -> Self {
        Self {
            speaker_enabled: false,
            headphone_enabled: true,
            dac_volume_db: settings.dac_volume_db,
            headphone_volume_db: settings.headphone_volume_db,
            sample_rate: clock_plan.sample_rate,
            master_clock_hz: clock_plan.master_clock_hz,
            clock_plan,
            settle,
        }
    }

    pub fn speaker_enabled(&self) -> bool {
        self.speaker_enabled
    }

    pub fn headphone_enabled(&self) -> bool {
        self.headphone_enabled
    }

    pub fn dac_volume_db(&self) -> f32 {
        self.dac_volume_db
    }

    pub fn headphone_volume_db(&self) -> f32 {
        self.headphone_volume_db
    }

    /// 设备采样率
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn master_clock_hz(&self) -> u32 {
        self.master_clock_hz
    }

    pub fn clock_plan(&self) -> &ClockPlan {
        &self.clock_plan
    }

    /// 已经等待过的稳定时间
    pub fn settle(&self) -> Duration {
        self.settle
    }
}
