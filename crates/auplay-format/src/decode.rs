//! µ-law 负载流式解码.
//!
//! 先按 data_size 一次性分配输出, 再以 1 KB 分块读取负载并查表写入.
//! 1 字节对应 1 个采样, 分块边界不会切开采样, 无需跨块状态.

use std::io::SeekFrom;
use std::path::Path;

use auplay_codec::{MuLawTable, PcmBuffer};
use auplay_core::{AuError, AuResult};
use log::debug;

use crate::header::{AU_UNKNOWN_SIZE, AuHeader};
use crate::io::IoContext;

/// 每次读取的负载字节数
pub const DECODE_CHUNK_SIZE: usize = 1024;

/// 解码 µ-law 负载
///
/// 定位到 `header.data_offset`, 产出恰好 `header.data_size` 个采样.
/// 负载不足时返回 [`AuError::TruncatedData`], 其中 `decoded` 为实际可用的全部字节数.
/// 输入大小已知时在分配之前检查, 声明长度远大于文件不会触发巨量分配.
pub fn decode(io: &mut IoContext, header: &AuHeader, table: &MuLawTable) -> AuResult<PcmBuffer> {
    if header.data_size == AU_UNKNOWN_SIZE {
        return Err(AuError::UnsupportedFormat(
            "data_size=0xffffffff (未知长度流) 不受支持".into(),
        ));
    }
    let total = usize::try_from(header.data_size).map_err(|_| {
        AuError::UnsupportedFormat(format!("data_size={} 超出可寻址范围", header.data_size))
    })?;

    // 已知输入大小时, 负载不足直接报截断, 不按声明长度分配
    if let Some(available) = payload_available(io, header) {
        if available < u64::from(header.data_size) {
            return Err(AuError::TruncatedData {
                declared: total as u64,
                decoded: available,
            });
        }
    }

    // 先分配, 后读取
    let mut pcm = Vec::new();
    pcm.try_reserve_exact(total).map_err(|_| {
        AuError::UnsupportedFormat(format!("data_size={} 无法预分配", header.data_size))
    })?;
    pcm.resize(total, 0i16);

    seek_to_payload(io, u64::from(header.data_offset))?;

    let mut chunk = [0u8; DECODE_CHUNK_SIZE];
    let mut decoded = 0usize;
    while decoded < total {
        let want = DECODE_CHUNK_SIZE.min(total - decoded);
        let n = io.read_partial(&mut chunk[..want])?;
        if n == 0 {
            return Err(AuError::TruncatedData {
                declared: total as u64,
                decoded: decoded as u64,
            });
        }
        table.decode_into(&chunk[..n], &mut pcm[decoded..decoded + n]);
        decoded += n;
    }

    debug!("µ-law 解码完成: {} 个采样", decoded);
    Ok(PcmBuffer::from_samples(pcm))
}

/// 输入中 data_offset 之后实际存在的字节数, 大小未知时返回 None
fn payload_available(io: &IoContext, header: &AuHeader) -> Option<u64> {
    io.size()
        .map(|size| size.saturating_sub(u64::from(header.data_offset)))
}

/// 定位到负载起始; 不可寻址时向前跳过
fn seek_to_payload(io: &mut IoContext, offset: u64) -> AuResult<()> {
    if io.is_seekable() {
        io.seek(SeekFrom::Start(offset))?;
        return Ok(());
    }
    let pos = io.position()?;
    if offset < pos {
        return Err(AuError::InvalidArgument(format!(
            "不可寻址的输入无法回退到 data_offset={} (当前位置 {})",
            offset, pos
        )));
    }
    io.skip((offset - pos) as usize)
}

/// 从已打开的输入读取文件头并解码
///
/// 文件头在读取任何负载之前完成校验.
pub fn load_au(io: &mut IoContext, table: &MuLawTable) -> AuResult<(AuHeader, PcmBuffer)> {
    let header = AuHeader::read_from(io)?;
    let pcm = decode(io, &header, table)?;
    Ok((header, pcm))
}

/// 打开 AU 文件并解码
pub fn load_au_file(
    path: impl AsRef<Path>,
    table: &MuLawTable,
) -> AuResult<(AuHeader, PcmBuffer)> {
    let path = path.as_ref();
    let mut io = IoContext::open_read(path)?;
    let (header, pcm) = load_au(&mut io, table)?;
    debug!(
        "载入 {}: {} 个采样, {:.3} 秒",
        path.display(),
        pcm.len(),
        header.duration_secs().unwrap_or(0.0),
    );
    Ok((header, pcm))
}

/// 解码内存中的 AU 数据
pub fn load_au_bytes(data: Vec<u8>, table: &MuLawTable) -> AuResult<(AuHeader, PcmBuffer)> {
    let mut io = IoContext::from_memory(data);
    load_au(&mut io, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auplay_codec::MULAW_TABLE;

    fn make_au(data_offset: u32, declared: u32, payload: &[u8]) -> Vec<u8> {
        let mut data = AuHeader::mulaw(data_offset, declared).to_bytes().to_vec();
        data.resize(data_offset as usize, 0);
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_解码_四个采样() {
        let data = make_au(24, 4, &[0xFF, 0x7F, 0x00, 0x80]);
        let (header, pcm) = load_au_bytes(data, &MULAW_TABLE).unwrap();
        assert_eq!(header.data_size, 4);
        assert_eq!(
            pcm.as_slice(),
            &[
                MULAW_TABLE[0xFF],
                MULAW_TABLE[0x7F],
                MULAW_TABLE[0x00],
                MULAW_TABLE[0x80]
            ]
        );
    }

    #[test]
    fn test_解码_跨多个分块() {
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let data = make_au(24, payload.len() as u32, &payload);
        let (_, pcm) = load_au_bytes(data, &MULAW_TABLE).unwrap();
        assert_eq!(pcm.len(), payload.len());
        for (sample, &code) in pcm.iter().zip(&payload) {
            assert_eq!(*sample, MULAW_TABLE[code]);
        }
    }

    #[test]
    fn test_解码_跳过注释区() {
        let mut data = AuHeader::mulaw(40, 2).to_bytes().to_vec();
        data.extend_from_slice(&[0xAA; 16]);
        data.extend_from_slice(&[0x80, 0x00]);
        let (_, pcm) = load_au_bytes(data, &MULAW_TABLE).unwrap();
        assert_eq!(pcm.as_slice(), &[32124, -32124]);
    }

    #[test]
    fn test_负载截断() {
        let payload = vec![0x55u8; 1000];
        let data = make_au(24, 2048, &payload);
        let err = load_au_bytes(data, &MULAW_TABLE).unwrap_err();
        match err {
            AuError::TruncatedData { declared, decoded } => {
                assert_eq!(declared, 2048);
                assert_eq!(decoded, 1000);
            }
            other => panic!("期望 TruncatedData, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_声明长度巨大_不预分配() {
        let data = make_au(24, 0xFFFF_FFFE, &[0xFF; 10]);
        match load_au_bytes(data, &MULAW_TABLE) {
            Err(AuError::TruncatedData { declared, decoded }) => {
                assert_eq!(declared, 0xFFFF_FFFE);
                assert_eq!(decoded, 10);
            }
            other => panic!("期望 TruncatedData, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_负载多于声明_只取声明长度() {
        let data = make_au(24, 3, &[0xFF, 0xFF, 0xFF, 0x00, 0x00]);
        let (_, pcm) = load_au_bytes(data, &MULAW_TABLE).unwrap();
        assert_eq!(pcm.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_空负载() {
        let data = make_au(24, 0, &[]);
        let (_, pcm) = load_au_bytes(data, &MULAW_TABLE).unwrap();
        assert!(pcm.is_empty());
    }

    #[test]
    fn test_文件头无效时不读取负载() {
        let mut data = make_au(24, 4, &[0; 4]);
        data[15] = 3; // encoding = 3
        assert!(matches!(
            load_au_bytes(data, &MULAW_TABLE),
            Err(AuError::UnsupportedEncoding(3))
        ));
    }

    #[test]
    fn test_重复解码结果一致() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let data = make_au(24, 256, &payload);
        let (_, first) = load_au_bytes(data.clone(), &MULAW_TABLE).unwrap();
        let (_, second) = load_au_bytes(data, &MULAW_TABLE).unwrap();
        assert_eq!(first, second);
    }
}
