//! 播放控制器.
//!
//! 依次把片段交给输出端, 每段之后阻塞 `时长 + 保护间隔`, 播完最后一段后从头开始.
//! 构造需要 [`CodecConfig`], 它只能由成功的设备启动产生, 因此不会在设备就绪前播放.

use std::time::Duration;

use auplay_codec::MULAW_TABLE;
use auplay_core::{AuError, AuResult, Sleeper};
use auplay_device::CodecConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clip::{ClipDescriptor, clip_duration};
use crate::sink::AudioSink;

/// 输出端只支持单声道
const CHANNELS: u16 = 1;

/// 播放参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// 每段之后额外等待的保护间隔 (毫秒)
    pub guard_ms: u64,
    /// 第一段之前的等待 (毫秒)
    pub lead_in_ms: u64,
    /// 播放遍数, `None` 表示无限循环
    pub passes: Option<u32>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            guard_ms: 1000,
            lead_in_ms: 500,
            passes: None,
        }
    }
}

impl PlaybackConfig {
    pub fn guard(&self) -> Duration {
        Duration::from_millis(self.guard_ms)
    }

    pub fn lead_in(&self) -> Duration {
        Duration::from_millis(self.lead_in_ms)
    }
}

/// 有限遍数播放结束后的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackReport {
    /// 完成的遍数
    pub passes: u32,
    /// 开始播放的片段总数
    pub clips_started: u64,
    /// 全部等待时长, 含首段前的等待
    pub total_wait: Duration,
}

/// 播放控制器
pub struct PlaybackController<K, S> {
    sink: K,
    sleeper: S,
    sample_rate: u32,
    config: PlaybackConfig,
}

impl<K: AudioSink, S: Sleeper> PlaybackController<K, S> {
    pub fn new(sink: K, sleeper: S, codec: &CodecConfig, config: PlaybackConfig) -> Self {
        Self {
            sink,
            sleeper,
            sample_rate: codec.sample_rate(),
            config,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// 循环播放
    ///
    /// 未设置遍数时不会正常返回, 只在出错时返回.
    /// 空列表、0 遍或采样率与设备不一致的片段在播放任何内容之前被拒绝.
    pub fn play_loop(&mut self, clips: &[ClipDescriptor]) -> AuResult<PlaybackReport> {
        self.check_clips(clips)?;

        let mut report = PlaybackReport::default();
        let lead_in = self.config.lead_in();
        self.wait(lead_in, &mut report);

        loop {
            for clip in clips {
                let buffer = clip.load(&MULAW_TABLE)?;
                self.sink.start(buffer.clone(), self.sample_rate, CHANNELS)?;
                report.clips_started += 1;

                let wait = clip_duration(buffer.len() as u64, self.sample_rate) + self.config.guard();
                debug!(
                    "[{}] 播放 {} ({} 个采样), 等待 {} ms",
                    self.sink.name(),
                    clip.name(),
                    buffer.len(),
                    wait.as_millis()
                );
                self.wait(wait, &mut report);
            }
            report.passes += 1;
            info!(
                "第 {} 遍播放完成, 共 {} 个片段",
                report.passes, report.clips_started
            );

            if self.config.passes == Some(report.passes) {
                return Ok(report);
            }
        }
    }

    fn check_clips(&self, clips: &[ClipDescriptor]) -> AuResult<()> {
        if clips.is_empty() {
            return Err(AuError::InvalidArgument("播放列表为空".into()));
        }
        if self.config.passes == Some(0) {
            return Err(AuError::InvalidArgument("播放遍数必须至少为 1".into()));
        }
        if let Some(clip) = clips.iter().find(|c| c.sample_rate() != self.sample_rate) {
            return Err(AuError::UnsupportedFormat(format!(
                "片段 {} 为 {} Hz, 设备为 {} Hz",
                clip.name(),
                clip.sample_rate(),
                self.sample_rate
            )));
        }
        Ok(())
    }

    fn wait(&mut self, duration: Duration, report: &mut PlaybackReport) {
        self.sleeper.sleep(duration);
        report.total_wait += duration;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use auplay_codec::PcmBuffer;
    use auplay_core::VirtualClock;
    use auplay_device::{AudioDeviceSequencer, DeviceSettings, MASTER_CLOCK_HZ, MockCodec};

    use super::*;
    use crate::sink::MockSink;

    fn codec_config(clock: &VirtualClock) -> CodecConfig {
        let mut seq =
            AudioDeviceSequencer::new(MockCodec::new(), clock.clone(), DeviceSettings::default());
        seq.bring_up(8000, MASTER_CLOCK_HZ).unwrap()
    }

    fn clip(name: &str, samples: usize, rate: u32) -> ClipDescriptor {
        ClipDescriptor::from_buffer(name, PcmBuffer::from_samples(vec![0; samples]), rate).unwrap()
    }

    fn config(passes: u32) -> PlaybackConfig {
        PlaybackConfig {
            passes: Some(passes),
            ..Default::default()
        }
    }

    #[test]
    fn test_单遍_时间线() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::new(clock.clone());
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(1));

        let clips = [clip("a", 8000, 8000), clip("b", 4000, 8000)];
        let report = ctrl.play_loop(&clips).unwrap();

        // 350 ms 稳定 + 500 ms 引导
        let t0 = Duration::from_millis(850);
        assert_eq!(
            sink.start_times(),
            vec![t0, t0 + Duration::from_secs(2)]
        );
        assert_eq!(report.passes, 1);
        assert_eq!(report.clips_started, 2);
        assert_eq!(
            report.total_wait,
            Duration::from_millis(500 + 2000 + 1500)
        );
    }

    #[test]
    fn test_多遍循环_按顺序重复() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::new(clock.clone());
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(3));

        let clips = [clip("a", 10, 8000), clip("b", 20, 8000)];
        let report = ctrl.play_loop(&clips).unwrap();
        assert_eq!(report.passes, 3);

        let lens: Vec<usize> = sink.events().iter().map(|e| e.buffer.len()).collect();
        assert_eq!(lens, vec![10, 20, 10, 20, 10, 20]);
    }

    #[test]
    fn test_相邻开始间隔不短于时长加保护() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::new(clock.clone());
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(2));

        let clips = [clip("odd", 12_345, 8000)];
        ctrl.play_loop(&clips).unwrap();

        let times = sink.start_times();
        let gap = times[1] - times[0];
        // 12345 / 8000 秒 = 1.543125 秒
        assert!(gap >= Duration::from_nanos(1_543_125_000) + Duration::from_secs(1));
    }

    #[test]
    fn test_拒绝空列表() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::new(clock.clone());
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(1));
        assert!(matches!(
            ctrl.play_loop(&[]),
            Err(AuError::InvalidArgument(_))
        ));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_拒绝采样率不一致() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::new(clock.clone());
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(1));
        let clips = [clip("ok", 10, 8000), clip("hifi", 10, 44100)];
        assert!(matches!(
            ctrl.play_loop(&clips),
            Err(AuError::UnsupportedFormat(_))
        ));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_零遍被拒绝() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let mut ctrl =
            PlaybackController::new(MockSink::new(clock.clone()), clock.clone(), &codec, config(0));
        assert!(ctrl.play_loop(&[clip("a", 1, 8000)]).is_err());
    }

    #[test]
    fn test_输出端失败_立即结束() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::failing_at(clock.clone(), 2);
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(5));
        let clips = [clip("a", 8, 8000)];
        assert!(ctrl.play_loop(&clips).is_err());
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_共享同一缓冲区() {
        let clock = VirtualClock::new();
        let codec = codec_config(&clock);
        let sink = MockSink::new(clock.clone());
        let mut ctrl = PlaybackController::new(sink.clone(), clock.clone(), &codec, config(2));
        let buffer = Arc::new(PcmBuffer::from_samples(vec![7; 16]));
        let clips = [ClipDescriptor::from_buffer("shared", buffer.clone(), 8000).unwrap()];
        ctrl.play_loop(&clips).unwrap();

        for event in sink.events() {
            assert!(Arc::ptr_eq(&event.buffer, &buffer));
        }
    }

    #[test]
    fn test_json_配置() {
        let config: PlaybackConfig = serde_json::from_str(r#"{"passes": 2}"#).unwrap();
        assert_eq!(config.passes, Some(2));
        assert_eq!(config.guard(), Duration::from_secs(1));
        assert_eq!(config.lead_in(), Duration::from_millis(500));
    }
}
