//! 音频输出端.
//!
//! 输出端接收整段 PCM 后立即返回, 由调用方负责在片段播完之前不再调用 `start`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use auplay_codec::PcmBuffer;
use auplay_core::{AuError, AuResult, VirtualClock};
use auplay_format::WavWriter;
use log::{debug, info};

/// 音频输出端
pub trait AudioSink {
    /// 输出端名称 (用于日志)
    fn name(&self) -> &str;

    /// 开始播放一段 PCM, 不等待播放结束
    fn start(&mut self, buffer: Arc<PcmBuffer>, sample_rate: u32, channels: u16) -> AuResult<()>;
}

impl<K: AudioSink + ?Sized> AudioSink for Box<K> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn start(&mut self, buffer: Arc<PcmBuffer>, sample_rate: u32, channels: u16) -> AuResult<()> {
        (**self).start(buffer, sample_rate, channels)
    }
}

/// 只写日志的输出端
#[derive(Debug, Default)]
pub struct LogSink {
    started: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已开始播放的片段数
    pub fn started(&self) -> u64 {
        self.started
    }
}

impl AudioSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn start(&mut self, buffer: Arc<PcmBuffer>, sample_rate: u32, channels: u16) -> AuResult<()> {
        self.started += 1;
        info!(
            "[log-sink] 播放 #{}: {} 个采样, {} Hz, {} 声道, 峰值 {}, RMS {:.1}",
            self.started,
            buffer.len(),
            sample_rate,
            channels,
            buffer.peak(),
            buffer.rms()
        );
        Ok(())
    }
}

/// 把每段播放内容依次追加到同一个 WAV 文件
///
/// 每次 `start` 后回填文件头, 进程中途退出时文件依然完整.
pub struct WavDumpSink {
    writer: WavWriter,
    sample_rate: u32,
    channels: u16,
}

impl WavDumpSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> AuResult<Self> {
        let path = path.as_ref();
        let writer = WavWriter::create(path, sample_rate, channels)?;
        info!("[wav-sink] 输出到 {}", path.display());
        Ok(Self {
            writer,
            sample_rate,
            channels,
        })
    }

    /// 已写入的 PCM 字节数
    pub fn data_bytes(&self) -> u64 {
        self.writer.data_bytes()
    }
}

impl AudioSink for WavDumpSink {
    fn name(&self) -> &str {
        "wav"
    }

    fn start(&mut self, buffer: Arc<PcmBuffer>, sample_rate: u32, channels: u16) -> AuResult<()> {
        if sample_rate != self.sample_rate || channels != self.channels {
            return Err(AuError::UnsupportedFormat(format!(
                "WAV 输出为 {} Hz / {} 声道, 收到 {} Hz / {} 声道",
                self.sample_rate, self.channels, sample_rate, channels
            )));
        }
        self.writer.write_samples(buffer.as_slice())?;
        self.writer.finalize()?;
        debug!(
            "[wav-sink] 追加 {} 个采样, 累计 {} 字节",
            buffer.len(),
            self.writer.data_bytes()
        );
        Ok(())
    }
}

/// 一次播放记录
#[derive(Debug, Clone)]
pub struct SinkEvent {
    /// 调用 `start` 时的虚拟时间
    pub at: Duration,
    pub buffer: Arc<PcmBuffer>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// 测试用输出端 (可克隆句柄)
///
/// 按虚拟时钟记录每次 `start`; 可指定第 N 次 (从 1 计) 调用失败.
#[derive(Clone)]
pub struct MockSink {
    clock: VirtualClock,
    events: Arc<Mutex<Vec<SinkEvent>>>,
    fail_at: Option<usize>,
}

impl MockSink {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            events: Arc::default(),
            fail_at: None,
        }
    }

    /// 第 `n` 次 `start` 返回错误
    pub fn failing_at(clock: VirtualClock, n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::new(clock)
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SinkEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 全部成功的播放记录
    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().clone()
    }

    /// 各次播放的开始时间
    pub fn start_times(&self) -> Vec<Duration> {
        self.lock().iter().map(|e| e.at).collect()
    }
}

impl AudioSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    fn start(&mut self, buffer: Arc<PcmBuffer>, sample_rate: u32, channels: u16) -> AuResult<()> {
        let mut events = self.lock();
        if self.fail_at == Some(events.len() + 1) {
            return Err(AuError::InvalidArgument("模拟故障: 输出端拒绝播放".into()));
        }
        events.push(SinkEvent {
            at: self.clock.now(),
            buffer,
            sample_rate,
            channels,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auplay_core::Sleeper;

    use super::*;

    fn buffer(samples: &[i16]) -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer::from_samples(samples.to_vec()))
    }

    #[test]
    fn test_日志输出端_计数() {
        let mut sink = LogSink::new();
        sink.start(buffer(&[1, 2, 3]), 8000, 1).unwrap();
        sink.start(buffer(&[4]), 8000, 1).unwrap();
        assert_eq!(sink.started(), 2);
    }

    #[test]
    fn test_wav_输出端_追加() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.wav");
        let mut sink = WavDumpSink::create(&path, 8000, 1).unwrap();
        sink.start(buffer(&[1, 2]), 8000, 1).unwrap();

        // 每次 start 后文件即完整
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 44 + 4);
        assert_eq!(u32::from_le_bytes(data[40..44].try_into().unwrap()), 4);

        sink.start(buffer(&[3]), 8000, 1).unwrap();
        assert_eq!(sink.data_bytes(), 6);
        let data = std::fs::read(&path).unwrap();
        assert_eq!(u32::from_le_bytes(data[40..44].try_into().unwrap()), 6);
        assert_eq!(&data[44..], &[1, 0, 2, 0, 3, 0]);
    }

    #[test]
    fn test_wav_输出端_拒绝不同采样率() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavDumpSink::create(dir.path().join("dump.wav"), 8000, 1).unwrap();
        assert!(matches!(
            sink.start(buffer(&[0]), 16000, 1),
            Err(AuError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_模拟输出端_记录时间() {
        let mut clock = VirtualClock::new();
        let handle = MockSink::new(clock.clone());
        let mut sink = handle.clone();

        sink.start(buffer(&[0; 4]), 8000, 1).unwrap();
        clock.sleep(Duration::from_millis(20));
        sink.start(buffer(&[0; 2]), 8000, 1).unwrap();

        assert_eq!(
            handle.start_times(),
            vec![Duration::ZERO, Duration::from_millis(20)]
        );
        assert_eq!(handle.events()[1].buffer.len(), 2);
    }

    #[test]
    fn test_模拟输出端_故障注入() {
        let clock = VirtualClock::new();
        let mut sink = MockSink::failing_at(clock, 2);
        sink.start(buffer(&[0]), 8000, 1).unwrap();
        assert!(sink.start(buffer(&[0]), 8000, 1).is_err());
        assert_eq!(sink.events().len(), 1);
    }
}
