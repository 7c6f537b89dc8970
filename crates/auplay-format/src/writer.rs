//! AU 文件写出 (µ-law 编码).
//!
//! 生成 8000 Hz 单声道 µ-law 文件, 用于生成测试素材和格式转换.
//! 注释区以 NUL 补齐到 8 字节边界, 且至少包含一个 NUL.

use std::path::Path;

use auplay_codec::encode_mulaw_slice;
use auplay_core::{AuError, AuResult};
use log::debug;

use crate::header::{AU_HEADER_SIZE, AuHeader};
use crate::io::IoContext;

/// 注释区对齐字节数
const ANNOTATION_ALIGN: usize = 8;

/// 将 PCM16 采样编码为完整的 AU 文件数据
pub fn encode_au(samples: &[i16], annotation: &str) -> AuResult<Vec<u8>> {
    let annotation = padded_annotation(annotation);
    let data_offset = u32::try_from(AU_HEADER_SIZE + annotation.len())
        .map_err(|_| AuError::InvalidArgument("注释过长".into()))?;
    let data_size = u32::try_from(samples.len())
        .ok()
        .filter(|&size| size != u32::MAX)
        .ok_or_else(|| {
            AuError::InvalidArgument(format!("采样数 {} 超出 AU data_size 范围", samples.len()))
        })?;

    let header = AuHeader::mulaw(data_offset, data_size);
    let mut out = Vec::with_capacity(data_offset as usize + samples.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&annotation);

    out.extend_from_slice(&encode_mulaw_slice(samples));
    Ok(out)
}

/// 编码并写入 AU 文件
pub fn write_au_file(path: impl AsRef<Path>, samples: &[i16], annotation: &str) -> AuResult<()> {
    let path = path.as_ref();
    let data = encode_au(samples, annotation)?;
    let mut io = IoContext::open_write(path)?;
    io.write_all(&data)?;
    io.flush()?;
    debug!("写入 {}: {} 个采样", path.display(), samples.len());
    Ok(())
}

/// 空注释不占空间; 否则补 NUL 到 8 字节边界
fn padded_annotation(annotation: &str) -> Vec<u8> {
    if annotation.is_empty() {
        return Vec::new();
    }
    let mut bytes = annotation.as_bytes().to_vec();
    bytes.push(0);
    let rem = bytes.len() % ANNOTATION_ALIGN;
    if rem != 0 {
        bytes.resize(bytes.len() + ANNOTATION_ALIGN - rem, 0);
    }
    bytes
}
