//! AU 文件头解析与校验.
//!
//! 文件头为 6 个大端 u32, 共 24 字节. 校验按固定顺序进行, 首个失败即返回:
//! 长度 → 魔数 → 编码 → 采样率/声道数 → 未知长度标记.

use std::fmt;
use std::io::SeekFrom;

use auplay_core::{AuError, AuResult};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};

use crate::io::IoContext;

/// AU 魔数 ".snd"
pub const AU_MAGIC: u32 = 0x2e73_6e64;
/// 文件头大小 (字节)
pub const AU_HEADER_SIZE: usize = 24;
/// data_size 的 "未知长度" 标记
pub const AU_UNKNOWN_SIZE: u32 = 0xFFFF_FFFF;
/// 唯一支持的采样率
pub const SUPPORTED_SAMPLE_RATE: u32 = 8000;
/// 唯一支持的声道数
pub const SUPPORTED_CHANNELS: u32 = 1;

/// AU 编码码值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuEncoding {
    /// 8 位 G.711 µ-law
    MuLaw8,
    /// 8 位线性 PCM
    Linear8,
    /// 16 位线性 PCM
    Linear16,
    /// 24 位线性 PCM
    Linear24,
    /// 32 位线性 PCM
    Linear32,
    /// 32 位浮点
    Float32,
    /// 64 位浮点
    Float64,
    /// 8 位 G.711 A-law
    ALaw8,
    /// 其他码值
    Unknown(u32),
}

impl AuEncoding {
    /// 从文件头码值转换
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::MuLaw8,
            2 => Self::Linear8,
            3 => Self::Linear16,
            4 => Self::Linear24,
            5 => Self::Linear32,
            6 => Self::Float32,
            7 => Self::Float64,
            27 => Self::ALaw8,
            other => Self::Unknown(other),
        }
    }

    /// 文件头码值
    pub fn code(&self) -> u32 {
        match self {
            Self::MuLaw8 => 1,
            Self::Linear8 => 2,
            Self::Linear16 => 3,
            Self::Linear24 => 4,
            Self::Linear32 => 5,
            Self::Float32 => 6,
            Self::Float64 => 7,
            Self::ALaw8 => 27,
            Self::Unknown(code) => *code,
        }
    }

    /// 编码名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::MuLaw8 => "mulaw8",
            Self::Linear8 => "pcm_s8",
            Self::Linear16 => "pcm_s16be",
            Self::Linear24 => "pcm_s24be",
            Self::Linear32 => "pcm_s32be",
            Self::Float32 => "pcm_f32be",
            Self::Float64 => "pcm_f64be",
            Self::ALaw8 => "alaw8",
            Self::Unknown(_) => "unknown",
        }
    }

    /// 每个采样的字节数 (未知编码返回 None)
    pub fn bytes_per_sample(&self) -> Option<u32> {
        match self {
            Self::MuLaw8 | Self::Linear8 | Self::ALaw8 => Some(1),
            Self::Linear16 => Some(2),
            Self::Linear24 => Some(3),
            Self::Linear32 | Self::Float32 => Some(4),
            Self::Float64 => Some(8),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for AuEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// AU 文件头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuHeader {
    /// 魔数, 有效文件为 [`AU_MAGIC`]
    pub magic: u32,
    /// 负载起始偏移
    pub data_offset: u32,
    /// 负载字节数
    pub data_size: u32,
    /// 编码码值
    pub encoding: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数
    pub channels: u32,
}

impl AuHeader {
    /// 构造 8000 Hz 单声道 µ-law 文件头
    pub fn mulaw(data_offset: u32, data_size: u32) -> Self {
        Self {
            magic: AU_MAGIC,
            data_offset,
            data_size,
            encoding: AuEncoding::MuLaw8.code(),
            sample_rate: SUPPORTED_SAMPLE_RATE,
            channels: SUPPORTED_CHANNELS,
        }
    }

    /// 解出 6 个字段, 只检查长度
    pub fn from_bytes(bytes: &[u8]) -> AuResult<Self> {
        if bytes.len() < AU_HEADER_SIZE {
            return Err(AuError::Format(format!(
                "文件头不足 {} 字节 (实际 {} 字节)",
                AU_HEADER_SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            magic: BigEndian::read_u32(&bytes[0..4]),
            data_offset: BigEndian::read_u32(&bytes[4..8]),
            data_size: BigEndian::read_u32(&bytes[8..12]),
            encoding: BigEndian::read_u32(&bytes[12..16]),
            sample_rate: BigEndian::read_u32(&bytes[16..20]),
            channels: BigEndian::read_u32(&bytes[20..24]),
        })
    }

    /// 校验其余字段
    pub fn validate(&self) -> AuResult<()> {
        if self.magic != AU_MAGIC {
            return Err(AuError::Format(format!(
                "不是 AU 文件: magic=0x{:08x}, 应为 0x{:08x}",
                self.magic, AU_MAGIC
            )));
        }
        if self.encoding != AuEncoding::MuLaw8.code() {
            return Err(AuError::UnsupportedEncoding(self.encoding));
        }
        if self.sample_rate != SUPPORTED_SAMPLE_RATE || self.channels != SUPPORTED_CHANNELS {
            return Err(AuError::UnsupportedFormat(format!(
                "sample_rate={}, channels={}, 仅支持 {} Hz 单声道",
                self.sample_rate, self.channels, SUPPORTED_SAMPLE_RATE
            )));
        }
        if self.data_size == AU_UNKNOWN_SIZE {
            return Err(AuError::UnsupportedFormat(
                "data_size=0xffffffff (未知长度流) 不受支持".into(),
            ));
        }
        if (self.data_offset as usize) < AU_HEADER_SIZE {
            warn!(
                "data_offset={} 小于文件头大小 {}, 负载与文件头重叠",
                self.data_offset, AU_HEADER_SIZE
            );
        }
        Ok(())
    }

    /// 从当前位置读取文件头, 不做校验
    ///
    /// 供探测工具展示校验失败的文件; 不足 24 字节仍返回格式错误.
    pub fn read_unvalidated(io: &mut IoContext) -> AuResult<Self> {
        let bytes = io.read_up_to(AU_HEADER_SIZE)?;
        Self::from_bytes(&bytes)
    }

    /// 从当前位置读取并校验文件头
    pub fn read_from(io: &mut IoContext) -> AuResult<Self> {
        let header = Self::read_unvalidated(io)?;
        header.validate()?;
        debug!(
            "AU 文件头: offset={}, size={}, encoding={}, rate={}, channels={}",
            header.data_offset,
            header.data_size,
            header.encoding_kind(),
            header.sample_rate,
            header.channels,
        );
        Ok(header)
    }

    /// 编码种类
    pub fn encoding_kind(&self) -> AuEncoding {
        AuEncoding::from_code(self.encoding)
    }

    /// 负载长度是否已知
    pub fn has_known_size(&self) -> bool {
        self.data_size != AU_UNKNOWN_SIZE
    }

    /// 每声道采样数 (未知长度或未知编码返回 None)
    pub fn sample_count(&self) -> Option<u64> {
        if !self.has_known_size() || self.channels == 0 {
            return None;
        }
        let bytes_per_frame = self.encoding_kind().bytes_per_sample()? * self.channels;
        Some(u64::from(self.data_size) / u64::from(bytes_per_frame))
    }

    /// 时长 (秒)
    pub fn duration_secs(&self) -> Option<f64> {
        if self.sample_rate == 0 {
            return None;
        }
        self.sample_count()
            .map(|n| n as f64 / f64::from(self.sample_rate))
    }

    /// 序列化为 24 字节大端文件头
    pub fn to_bytes(&self) -> [u8; AU_HEADER_SIZE] {
        let mut buf = [0u8; AU_HEADER_SIZE];
        BigEndian::write_u32(&mut buf[0..4], self.magic);
        BigEndian::write_u32(&mut buf[4..8], self.data_offset);
        BigEndian::write_u32(&mut buf[8..12], self.data_size);
        BigEndian::write_u32(&mut buf[12..16], self.encoding);
        BigEndian::write_u32(&mut buf[16..20], self.sample_rate);
        BigEndian::write_u32(&mut buf[20..24], self.channels);
        buf
    }
}

/// 解析并校验文件头 (纯函数)
pub fn parse_header(bytes: &[u8]) -> AuResult<AuHeader> {
    let header = AuHeader::from_bytes(bytes)?;
    header.validate()?;
    Ok(header)
}

/// 读取文件头与负载之间的注释文本
///
/// 去掉尾部 NUL, 非 UTF-8 字节按有损方式转换. 读取后定位到负载起始.
pub fn read_annotation(io: &mut IoContext, header: &AuHeader) -> AuResult<String> {
    let offset = header.data_offset as usize;
    if offset <= AU_HEADER_SIZE {
        return Ok(String::new());
    }
    io.seek(SeekFrom::Start(AU_HEADER_SIZE as u64))?;
    let raw = io.read_up_to(offset - AU_HEADER_SIZE)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}
