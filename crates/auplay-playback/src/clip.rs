//! 播放片段.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use auplay_codec::{MuLawTable, PcmBuffer};
use auplay_core::{AuError, AuResult};
use auplay_format::{AuHeader, IoContext, load_au_file};
use log::debug;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// 片段数据来源
#[derive(Debug, Clone)]
pub enum ClipSource {
    /// 已解码的 PCM
    Decoded(Arc<PcmBuffer>),
    /// AU 文件, 播放前才解码
    AuFile(PathBuf),
}

/// 一个待播放的片段
#[derive(Debug, Clone)]
pub struct ClipDescriptor {
    name: String,
    source: ClipSource,
    sample_rate: u32,
    sample_count: u64,
}

impl ClipDescriptor {
    /// 由已解码的单声道 PCM 创建
    pub fn from_buffer(
        name: impl Into<String>,
        buffer: impl Into<Arc<PcmBuffer>>,
        sample_rate: u32,
    ) -> AuResult<Self> {
        if sample_rate == 0 {
            return Err(AuError::InvalidArgument("片段采样率不能为 0".into()));
        }
        let buffer = buffer.into();
        Ok(Self {
            name: name.into(),
            sample_count: buffer.len() as u64,
            source: ClipSource::Decoded(buffer),
            sample_rate,
        })
    }

    /// 由 AU 文件创建, 只读取并校验文件头
    pub fn from_au_file(path: impl AsRef<Path>) -> AuResult<Self> {
        let path = path.as_ref();
        let mut io = IoContext::open_read(path)?;
        let header = AuHeader::read_from(&mut io)?;
        let sample_count = header.sample_count().ok_or_else(|| {
            AuError::UnsupportedFormat(format!("{}: 未知长度的 AU 流", path.display()))
        })?;
        Ok(Self {
            name: path.display().to_string(),
            source: ClipSource::AuFile(path.to_path_buf()),
            sample_rate: header.sample_rate,
            sample_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ClipSource {
        &self.source
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// 标称播放时长
    pub fn duration(&self) -> Duration {
        clip_duration(self.sample_count, self.sample_rate)
    }

    /// 取得可播放的 PCM; AU 文件在此时解码
    pub fn load(&self, table: &MuLawTable) -> AuResult<Arc<PcmBuffer>> {
        match &self.source {
            ClipSource::Decoded(buffer) => Ok(Arc::clone(buffer)),
            ClipSource::AuFile(path) => {
                let (header, pcm) = load_au_file(path, table)?;
                if header.sample_rate != self.sample_rate {
                    return Err(AuError::UnsupportedFormat(format!(
                        "{}: 采样率由 {} Hz 变为 {} Hz",
                        path.display(),
                        self.sample_rate,
                        header.sample_rate
                    )));
                }
                debug!("片段 {} 解码完成: {} 个采样", self.name, pcm.len());
                Ok(Arc::new(pcm))
            }
        }
    }
}

/// 计算 `samples / sample_rate` 秒, 向上取整到纳秒
///
/// 结果不会短于真实播放时长. `sample_rate` 为 0 时返回 0.
pub fn clip_duration(samples: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let rate = u64::from(sample_rate);
    let secs = samples / rate;
    let rem = samples % rate;
    // rem < rate <= u32::MAX, 乘积不会溢出 u64
    let nanos = (rem * NANOS_PER_SEC).div_ceil(rate);
    Duration::from_secs(secs) + Duration::from_nanos(nanos)
}
