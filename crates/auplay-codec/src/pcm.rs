//! 解码后的 PCM16 缓冲区.

use std::ops::Deref;

/// 有符号 16 位线性 PCM 采样序列
///
/// 由解码器一次性填满后构造, 之后不再修改.
/// 交给输出端时以 `Arc<PcmBuffer>` 只读共享.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmBuffer {
    samples: Vec<i16>,
}

impl PcmBuffer {
    /// 从已填好的采样构造
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// 采样数
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 采样切片
    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// 消耗自身, 返回内部采样
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// 小端字节序列 (WAV 负载)
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for s in &self.samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    /// 峰值幅度
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// 均方根电平 (满幅 = 32768)
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let v = f64::from(s);
                v * v
            })
            .sum();
        (sum / self.samples.len() as f64).sqrt()
    }
}

impl From<Vec<i16>> for PcmBuffer {
    fn from(samples: Vec<i16>) -> Self {
        Self::from_samples(samples)
    }
}

impl Deref for PcmBuffer {
    type Target = [i16];

    fn deref(&self) -> &[i16] {
        &self.samples
    }
}

impl AsRef<[i16]> for PcmBuffer {
    fn as_ref(&self) -> &[i16] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_小端字节序列() {
        let buf = PcmBuffer::from_samples(vec![1, -2, 0x1234]);
        assert_eq!(buf.to_le_bytes(), vec![0x01, 0x00, 0xFE, 0xFF, 0x34, 0x12]);
    }

    #[test]
    fn test_峰值与均方根() {
        let buf = PcmBuffer::from(vec![3, -4, i16::MIN, 0]);
        assert_eq!(buf.peak(), 32768);

        let flat = PcmBuffer::from(vec![100; 8]);
        assert!((flat.rms() - 100.0).abs() < 1e-9);
        assert_eq!(PcmBuffer::default().rms(), 0.0);
    }

    #[test]
    fn test_切片访问() {
        let buf = PcmBuffer::from(vec![5, 6, 7]);
        assert_eq!(buf.len(), 3);
        assert_eq!(&buf[1..], &[6, 7]);
        assert_eq!(buf.into_samples(), vec![5, 6, 7]);
    }
}
