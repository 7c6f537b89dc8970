//! 主机端协作者.
//!
//! 在没有 I2C 总线和 PWM 的主机上运行播放器时使用: 每项设置都写日志,
//! 并记录芯片上应当生效的状态, 行为与真实芯片的参数检查保持一致.

use auplay_core::{AuError, AuResult};
use log::{debug, info};

use crate::clock::ClockSource;
use crate::clock_plan::ClockPlan;
use crate::codec::AudioCodec;
use crate::config::{DAC_VOLUME_RANGE_DB, HEADPHONE_VOLUME_RANGE_DB, check_range};

/// 主机端编解码芯片
#[derive(Debug, Clone)]
pub struct HostCodec {
    speaker_enabled: bool,
    headphone_enabled: bool,
    dac_volume_db: f32,
    headphone_volume_db: f32,
    clock_plan: Option<ClockPlan>,
}

impl Default for HostCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCodec {
    /// 上电状态: 输出全部关闭, 音量最小
    pub fn new() -> Self {
        Self {
            speaker_enabled: false,
            headphone_enabled: false,
            dac_volume_db: *DAC_VOLUME_RANGE_DB.start(),
            headphone_volume_db: *HEADPHONE_VOLUME_RANGE_DB.start(),
            clock_plan: None,
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

    /// 最近一次下发的时钟方案
    pub fn clock_plan(&self) -> Option<&ClockPlan> {
        self.clock_plan.as_ref()
    }
}

impl AudioCodec for HostCodec {
    fn name(&self) -> &str {
        "host-dac"
    }

    fn reset(&mut self) -> AuResult<()> {
        *self = Self::new();
        info!("[host-dac] 软复位");
        Ok(())
    }

    fn set_speaker_output(&mut self, enabled: bool) -> AuResult<()> {
        self.speaker_enabled = enabled;
        info!("[host-dac] 扬声器输出: {}", on_off(enabled));
        Ok(())
    }

    fn set_headphone_output(&mut self, enabled: bool) -> AuResult<()> {
        self.headphone_enabled = enabled;
        info!("[host-dac] 耳机输出: {}", on_off(enabled));
        Ok(())
    }

    fn set_dac_volume(&mut self, db: f32) -> AuResult<()> {
        check_range("dac_volume_db", db, &DAC_VOLUME_RANGE_DB)?;
        self.dac_volume_db = db;
        info!("[host-dac] 数字增益: {} dB", db);
        Ok(())
    }

    fn set_headphone_volume(&mut self, db: f32) -> AuResult<()> {
        check_range("headphone_volume_db", db, &HEADPHONE_VOLUME_RANGE_DB)?;
        self.headphone_volume_db = db;
        info!("[host-dac] 耳机增益: {} dB", db);
        Ok(())
    }

    fn configure_clocks(
        &mut self,
        sample_rate: u32,
        master_clock_hz: u32,
    ) -> AuResult<ClockPlan> {
        let plan = ClockPlan::derive(sample_rate, master_clock_hz)?;
        info!("[host-dac] 时钟: {}", plan);
        self.clock_plan = Some(plan);
        Ok(plan)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "开" } else { "关" }
}

/// 主机端主时钟
///
/// 只记录频率, 不产生真实信号.
#[derive(Debug, Clone, Default)]
pub struct HostClockSource {
    frequency_hz: Option<u32>,
}

impl HostClockSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClockSource for HostClockSource {
    fn start(&mut self, frequency_hz: u32) -> AuResult<()> {
        if frequency_hz == 0 {
            return Err(AuError::InvalidArgument("主时钟频率不能为 0".into()));
        }
        if let Some(prev) = self.frequency_hz {
            debug!("[host-clock] 重新启动, 原频率 {} Hz", prev);
        }
        self.frequency_hz = Some(frequency_hz);
        info!("[host-clock] 主时钟输出 {} Hz", frequency_hz);
        Ok(())
    }

    fn frequency_hz(&self) -> Option<u32> {
        self.frequency_hz
    }
}
