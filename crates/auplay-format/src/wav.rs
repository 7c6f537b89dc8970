//! WAV (RIFF WAVE) 写出器.
//!
//! 将 PCM16 采样写入标准 WAV 文件, 供 WAV 转储输出端使用.
//!
//! 写入流程:
//! 1. 创建时写入 RIFF 和 fmt 块, 预留 data 块大小
//! 2. `write_samples()` - 追加 PCM 数据
//! 3. `finalize()` - 回填 RIFF 大小和 data 块大小, 然后回到文件末尾
//!
//! `finalize()` 可以多次调用, 每次调用后文件都是完整有效的 WAV.

use std::io::SeekFrom;
use std::path::Path;

use auplay_core::{AuError, AuResult};
use log::debug;

use crate::io::IoContext;

/// WAV 音频格式码: PCM 整数
const WAV_FORMAT_PCM: u16 = 0x0001;
/// 位深
const BITS_PER_SAMPLE: u16 = 16;
/// RIFF 大小字段偏移
const RIFF_SIZE_OFFSET: u64 = 4;
/// data 块大小字段偏移: 12 (RIFF) + 24 (fmt) + 4 (data 标签)
const DATA_SIZE_OFFSET: u64 = 40;
/// 文件头总长度
const WAV_HEADER_SIZE: u64 = 44;

/// PCM16 WAV 写出器
pub struct WavWriter {
    io: IoContext,
    /// 已写入的数据字节数
    data_written: u64,
}

impl WavWriter {
    /// 创建文件并写入文件头
    pub fn create(path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> AuResult<Self> {
        let io = IoContext::open_write(path)?;
        Self::new(io, sample_rate, channels)
    }

    /// 在已打开的输出上写入文件头
    pub fn new(mut io: IoContext, sample_rate: u32, channels: u16) -> AuResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(AuError::InvalidArgument(format!(
                "WAV 参数无效: sample_rate={}, channels={}",
                sample_rate, channels
            )));
        }
        if !io.is_seekable() {
            return Err(AuError::InvalidArgument(
                "WAV 输出必须可寻址, 以便回填大小字段".into(),
            ));
        }

        let block_align = channels * (BITS_PER_SAMPLE / 8);
        let byte_rate = sample_rate * u32::from(block_align);

        // RIFF header
        io.write_tag(b"RIFF")?;
        io.write_u32_le(0)?; // 占位, finalize 中回填
        io.write_tag(b"WAVE")?;

        // fmt chunk
        io.write_tag(b"fmt ")?;
        io.write_u32_le(16)?; // 标准 PCM fmt 块大小
        io.write_u16_le(WAV_FORMAT_PCM)?;
        io.write_u16_le(channels)?;
        io.write_u32_le(sample_rate)?;
        io.write_u32_le(byte_rate)?;
        io.write_u16_le(block_align)?;
        io.write_u16_le(BITS_PER_SAMPLE)?;

        // data chunk header
        io.write_tag(b"data")?;
        io.write_u32_le(0)?; // 占位, finalize 中回填

        debug!("WAV 写入头部: {} Hz, {} 声道, 16 位", sample_rate, channels);

        Ok(Self {
            io,
            data_written: 0,
        })
    }

    /// 追加采样 (交错排列)
    pub fn write_samples(&mut self, samples: &[i16]) -> AuResult<()> {
        let added = samples.len() as u64 * 2;
        if WAV_HEADER_SIZE - 8 + self.data_written + added > u64::from(u32::MAX) {
            return Err(AuError::InvalidArgument("WAV 数据超过 4 GB 上限".into()));
        }
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        self.io.write_all(&bytes)?;
        self.data_written += added;
        Ok(())
    }

    /// 回填大小字段
    pub fn finalize(&mut self) -> AuResult<()> {
        let data_size = self.data_written as u32;
        let riff_size = (WAV_HEADER_SIZE - 8) as u32 + data_size;

        self.io.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        self.io.write_u32_le(riff_size)?;
        self.io.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
        self.io.write_u32_le(data_size)?;
        self.io.seek(SeekFrom::End(0))?;
        self.io.flush()?;

        debug!("WAV 回填: riff_size={}, data_size={}", riff_size, data_size);
        Ok(())
    }

    /// 已写入的数据字节数
    pub fn data_bytes(&self) -> u64 {
        self.data_written
    }

    /// 取回底层输出
    pub fn into_inner(self) -> IoContext {
        self.io
    }
}
