//! 设备启动状态机.
//!
//! 按固定顺序配置编解码芯片, 不允许跳步或重入:
//!
//! 1. Reset: 软复位
//! 2. Routing: 关闭扬声器, 打开耳机输出 (在提升音量之前)
//! 3. Gain: 数字增益, 然后耳机增益
//! 4. Clocking: 推导并下发时钟方案
//! 5. Settle: 等待增益爬升完成
//!
//! 任一步失败都以 [`AuError::DeviceConfig`] 结束, 状态停在 `Failed`.

use std::fmt;

use auplay_core::{AuError, AuResult, Sleeper};
use log::{debug, info, warn};

use crate::codec::AudioCodec;
use crate::config::{
    CodecConfig, DAC_VOLUME_RANGE_DB, DeviceSettings, HEADPHONE_VOLUME_RANGE_DB, check_range,
};

/// 启动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpState {
    Idle,
    Reset,
    Routing,
    Gain,
    Clocking,
    Settle,
    Ready,
    Failed,
}

impl BringUpState {
    /// 唯一合法的后继状态 (`Failed` 除外, 任何步骤都可进入)
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Reset),
            Self::Reset => Some(Self::Routing),
            Self::Routing => Some(Self::Gain),
            Self::Gain => Some(Self::Clocking),
            Self::Clocking => Some(Self::Settle),
            Self::Settle => Some(Self::Ready),
            Self::Ready | Self::Failed => None,
        }
    }

    /// 步骤名, 用于错误信息
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reset => "reset",
            Self::Routing => "routing",
            Self::Gain => "gain",
            Self::Clocking => "clocking",
            Self::Settle => "settle",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// 是否为终止状态
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for BringUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 设备启动器
///
/// 拥有编解码芯片句柄与等待器. 一个实例只能启动一次.
pub struct AudioDeviceSequencer<C, S> {
    codec: C,
    sleeper: S,
    settings: DeviceSettings,
    state: BringUpState,
}

impl<C: AudioCodec, S: Sleeper> AudioDeviceSequencer<C, S> {
    pub fn new(codec: C, sleeper: S, settings: DeviceSettings) -> Self {
        Self {
            codec,
            sleeper,
            settings,
            state: BringUpState::Idle,
        }
    }

    /// 当前状态
    pub fn state(&self) -> BringUpState {
        self.state
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// 拆出编解码芯片与等待器
    pub fn into_parts(self) -> (C, S) {
        (self.codec, self.sleeper)
    }

    /// 执行完整启动流程
    ///
    /// 成功时已等待稳定时间, 返回芯片上实际生效的参数.
    /// 只能在 `Idle` 状态调用一次, 重入直接拒绝且不改变状态.
    pub fn bring_up(&mut self, sample_rate: u32, master_clock_hz: u32) -> AuResult<CodecConfig> {
        if self.state != BringUpState::Idle {
            return Err(AuError::device(
                self.state.name(),
                format!("启动流程只能执行一次, 当前状态 {}", self.state),
            ));
        }

        info!(
            "开始启动 {}: {} Hz, MCLK {} Hz",
            self.codec.name(),
            sample_rate,
            master_clock_hz
        );
        match self.run(sample_rate, master_clock_hz) {
            Ok(config) => {
                info!("{} 已就绪: {}", self.codec.name(), config.clock_plan());
                Ok(config)
            }
            Err(err) => {
                warn!("设备启动失败 (状态 {}): {}", self.state, err);
                self.state = BringUpState::Failed;
                Err(err)
            }
        }
    }

    fn run(&mut self, sample_rate: u32, master_clock_hz: u32) -> AuResult<CodecConfig> {
        self.advance(BringUpState::Reset)?;
        self.codec.reset().map_err(|e| step_error(BringUpState::Reset, e))?;

        self.advance(BringUpState::Routing)?;
        self.apply_routing()
            .map_err(|e| step_error(BringUpState::Routing, e))?;

        self.advance(BringUpState::Gain)?;
        self.apply_gain()
            .map_err(|e| step_error(BringUpState::Gain, e))?;

        self.advance(BringUpState::Clocking)?;
        let plan = self
            .codec
            .configure_clocks(sample_rate, master_clock_hz)
            .map_err(|e| step_error(BringUpState::Clocking, e))?;
        debug!("时钟方案: {}", plan);

        self.advance(BringUpState::Settle)?;
        let settle = self.settings.settle();
        debug!("等待增益稳定 {} ms", settle.as_millis());
        self.sleeper.sleep(settle);

        self.advance(BringUpState::Ready)?;
        Ok(CodecConfig::new(&self.settings, plan, settle))
    }

    fn apply_routing(&mut self) -> AuResult<()> {
        self.codec.set_speaker_output(false)?;
        self.codec.set_headphone_output(true)
    }

    fn apply_gain(&mut self) -> AuResult<()> {
        let dac_db = self.settings.dac_volume_db;
        check_range("dac_volume_db", dac_db, &DAC_VOLUME_RANGE_DB)?;
        if dac_db >= 0.0 {
            warn!("数字增益 {} dB 不为负, 大幅度信号可能削波", dac_db);
        }
        self.codec.set_dac_volume(dac_db)?;

        let hp_db = self.settings.headphone_volume_db;
        check_range("headphone_volume_db", hp_db, &HEADPHONE_VOLUME_RANGE_DB)?;
        self.codec.set_headphone_volume(hp_db)
    }

    /// 只允许进入当前状态的唯一后继
    fn advance(&mut self, next: BringUpState) -> AuResult<()> {
        if self.state.successor() != Some(next) {
            return Err(AuError::device(
                next.name(),
                format!("非法状态转换: {} -> {}", self.state, next),
            ));
        }
        debug!("启动状态: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

/// 把任意错误归到指定步骤
fn step_error(step: BringUpState, err: AuError) -> AuError {
    match err {
        AuError::DeviceConfig { reason, .. } => AuError::device(step.name(), reason),
        other => AuError::device(step.name(), other.to_string()),
    }
}
