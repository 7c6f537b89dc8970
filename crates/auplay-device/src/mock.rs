//! 测试用协作者.
//!
//! [`MockCodec`] 按顺序记录每次调用, 可指定某一操作失败;
//! [`MockClockSource`] 记录启动请求.

use auplay_core::{AuError, AuResult};

use crate::clock::ClockSource;
use crate::clock_plan::ClockPlan;
use crate::codec::AudioCodec;

/// 编解码芯片操作类型 (用于故障注入)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOp {
    Reset,
    SetSpeakerOutput,
    SetHeadphoneOutput,
    SetDacVolume,
    SetHeadphoneVolume,
    ConfigureClocks,
}

/// 一次调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum CodecCall {
    Reset,
    SpeakerOutput(bool),
    HeadphoneOutput(bool),
    DacVolume(f32),
    HeadphoneVolume(f32),
    ConfigureClocks {
        sample_rate: u32,
        master_clock_hz: u32,
    },
}

impl CodecCall {
    pub fn op(&self) -> CodecOp {
        match self {
            Self::Reset => CodecOp::Reset,
            Self::SpeakerOutput(_) => CodecOp::SetSpeakerOutput,
            Self::HeadphoneOutput(_) => CodecOp::SetHeadphoneOutput,
            Self::DacVolume(_) => CodecOp::SetDacVolume,
            Self::HeadphoneVolume(_) => CodecOp::SetHeadphoneVolume,
            Self::ConfigureClocks { .. } => CodecOp::ConfigureClocks,
        }
    }
}

/// 记录调用的编解码芯片
#[derive(Debug, Clone, Default)]
pub struct MockCodec {
    calls: Vec<CodecCall>,
    fail_on: Option<CodecOp>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定操作返回错误
    pub fn failing_on(op: CodecOp) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: Some(op),
        }
    }

    /// 按顺序的全部调用
    pub fn calls(&self) -> &[CodecCall] {
        &self.calls
    }

    /// 记录调用, 命中故障注入时返回错误
    fn record(&mut self, call: CodecCall) -> AuResult<()> {
        let op = call.op();
        self.calls.push(call);
        if self.fail_on == Some(op) {
            return Err(AuError::InvalidArgument(format!("模拟故障: {:?}", op)));
        }
        Ok(())
    }
}

impl AudioCodec for MockCodec {
    fn name(&self) -> &str {
        "mock-dac"
    }

    fn reset(&mut self) -> AuResult<()> {
        self.record(CodecCall::Reset)
    }

    fn set_speaker_output(&mut self, enabled: bool) -> AuResult<()> {
        self.record(CodecCall::SpeakerOutput(enabled))
    }

    fn set_headphone_output(&mut self, enabled: bool) -> AuResult<()> {
        self.record(CodecCall::HeadphoneOutput(enabled))
    }

    fn set_dac_volume(&mut self, db: f32) -> AuResult<()> {
        self.record(CodecCall::DacVolume(db))
    }

    fn set_headphone_volume(&mut self, db: f32) -> AuResult<()> {
        self.record(CodecCall::HeadphoneVolume(db))
    }

    fn configure_clocks(
        &mut self,
        sample_rate: u32,
        master_clock_hz: u32,
    ) -> AuResult<ClockPlan> {
        self.record(CodecCall::ConfigureClocks {
            sample_rate,
            master_clock_hz,
        })?;
        ClockPlan::derive(sample_rate, master_clock_hz)
    }
}

/// 记录启动请求的主时钟
#[derive(Debug, Clone, Default)]
pub struct MockClockSource {
    starts: Vec<u32>,
    fail: bool,
}

impl MockClockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次启动都失败
    pub fn failing() -> Self {
        Self {
            starts: Vec::new(),
            fail: true,
        }
    }

    /// 全部启动请求的频率
    pub fn starts(&self) -> &[u32] {
        &self.starts
    }
}

impl ClockSource for MockClockSource {
    fn start(&mut self, frequency_hz: u32) -> AuResult<()> {
        if self.fail {
            return Err(AuError::device("clock", "模拟故障: 主时钟无法启动"));
        }
        self.starts.push(frequency_hz);
        Ok(())
    }

    fn frequency_hz(&self) -> Option<u32> {
        self.starts.last().copied()
    }
}
