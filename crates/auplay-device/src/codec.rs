//! 编解码芯片抽象.

use auplay_core::AuResult;

use crate::clock_plan::ClockPlan;

/// 外部 DAC 编解码芯片
///
/// 每个设置项独立下发, 均可能失败. 调用顺序由
/// [`AudioDeviceSequencer`](crate::AudioDeviceSequencer) 保证, 实现无需自行排序.
pub trait AudioCodec {
    /// 芯片名称 (用于日志)
    fn name(&self) -> &str;

    /// 软复位, 副作用是音量回到安全的最小值
    fn reset(&mut self) -> AuResult<()>;

    /// 扬声器输出开关
    fn set_speaker_output(&mut self, enabled: bool) -> AuResult<()>;

    /// 耳机/线路输出开关
    fn set_headphone_output(&mut self, enabled: bool) -> AuResult<()>;

    /// 数字增益 (dB)
    fn set_dac_volume(&mut self, db: f32) -> AuResult<()>;

    /// 耳机模拟增益 (dB)
    fn set_headphone_volume(&mut self, db: f32) -> AuResult<()>;

    /// 按采样率与主时钟配置 PLL 和分频器
    ///
    /// 返回实际下发的时钟方案.
    fn configure_clocks(&mut self, sample_rate: u32, master_clock_hz: u32)
    -> AuResult<ClockPlan>;
}

impl<C: AudioCodec + ?Sized> AudioCodec for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reset(&mut self) -> AuResult<()> {
        (**self).reset()
    }

    fn set_speaker_output(&mut self, enabled: bool) -> AuResult<()> {
        (**self).set_speaker_output(enabled)
    }

    fn set_headphone_output(&mut self, enabled: bool) -> AuResult<()> {
        (**self).set_headphone_output(enabled)
    }

    fn set_dac_volume(&mut self, db: f32) -> AuResult<()> {
        (**self).set_dac_volume(db)
    }

    fn set_headphone_volume(&mut self, db: f32) -> AuResult<()> {
        (**self).set_headphone_volume(db)
    }

    fn configure_clocks(
        &mut self,
        sample_rate: u32,
        master_clock_hz: u32,
    ) -> AuResult<ClockPlan> {
        (**self).configure_clocks(sample_rate, master_clock_hz)
    }
}
