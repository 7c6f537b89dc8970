//! 统一错误类型定义.
//!
//! 所有 auplay crate 共用的错误类型, 支持跨模块传播.
//! 所有错误对当前运行都是致命的, 不做自动重试.

use thiserror::Error;

/// auplay 统一错误类型
#[derive(Debug, Error)]
pub enum AuError {
    /// 文件头格式错误 (长度不足或魔数不符)
    #[error("格式错误: {0}")]
    Format(String),

    /// 不支持的采样编码 (仅支持 1 = 8 位 µ-law)
    #[error("不支持的编码: encoding={0}, 仅支持 1 (8 位 µ-law)")]
    UnsupportedEncoding(u32),

    /// 不支持的音频格式 (采样率/声道数, 或未知长度流)
    #[error("不支持的格式: {0}")]
    UnsupportedFormat(String),

    /// 负载数据比声明的短
    #[error("数据截断: 声明 {declared} 个采样, 实际只读到 {decoded} 个")]
    TruncatedData {
        /// 文件头声明的采样数
        declared: u64,
        /// 截断前已解码的采样数
        decoded: u64,
    },

    /// 硬件 bring-up 任一步骤失败
    #[error("设备配置失败 [{step}]: {reason}")]
    DeviceConfig {
        /// 失败的步骤名
        step: String,
        /// 失败原因
        reason: String,
    },

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,
}

impl AuError {
    /// 构造设备配置错误
    pub fn device(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceConfig {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// 错误类别名, 用于日志与退出信息
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format(_) => "FormatError",
            Self::UnsupportedEncoding(_) => "UnsupportedEncodingError",
            Self::UnsupportedFormat(_) => "UnsupportedFormatError",
            Self::TruncatedData { .. } => "TruncatedDataError",
            Self::DeviceConfig { .. } => "DeviceConfigError",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::Io(_) => "IoError",
            Self::Eof => "Eof",
        }
    }
}

/// auplay 统一 Result 类型
pub type AuResult<T> = Result<T, AuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_错误信息包含出错值() {
        let err = AuError::UnsupportedEncoding(2);
        assert!(err.to_string().contains("encoding=2"));

        let err = AuError::TruncatedData {
            declared: 2048,
            decoded: 1000,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn test_设备错误_类别与步骤() {
        let err = AuError::device("Gain", "超出范围");
        assert_eq!(err.kind(), "DeviceConfigError");
        assert!(err.to_string().contains("[Gain]"));
    }

    #[test]
    fn test_io_错误自动转换() {
        fn open() -> AuResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(AuError::Io(_))));
    }
}
