//! µ-law 解压查找表与参考编码器.
//!
//! µ-law 码字以按位取反的形式存储. 取反后:
//! ```text
//! bit 7     : 符号 (1 = 负)
//! bit 6..4  : 指数 (段号)
//! bit 3..0  : 尾数
//! ```
//! 展开公式 (标准 G.711):
//! `s = ((mantissa << 3) + 0x84) << exponent; s -= 0x84`
//!
//! 查找表在编译期由同一个 `const fn` 生成, 进程内只有一份, 只读共享.

use std::ops::Index;

/// 查找表项数, 每个 8 位码字一项
pub const MULAW_TABLE_SIZE: usize = 256;

/// 线性码偏置
const BIAS: i32 = 0x84;
/// 编码前的幅度上限, 加上偏置后恰好不溢出 15 位
const CLIP: i32 = 32635;

/// µ-law → PCM16 解压表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuLawTable {
    entries: [i16; MULAW_TABLE_SIZE],
}

/// 进程级共享的解压表 (编译期构建)
pub static MULAW_TABLE: MuLawTable = build_mulaw_table();

/// 构建 256 项 µ-law 解压表
///
/// 确定性, 无输入. 与 [`MULAW_TABLE`] 逐项相同.
pub const fn build_mulaw_table() -> MuLawTable {
    let mut entries = [0i16; MULAW_TABLE_SIZE];
    let mut i = 0;
    while i < MULAW_TABLE_SIZE {
        entries[i] = expand_code(i as u8);
        i += 1;
    }
    MuLawTable { entries }
}

/// 单个码字展开, 仅在建表时使用
const fn expand_code(code: u8) -> i16 {
    let u = !code;
    let sign = u & 0x80;
    let exponent = (u >> 4) & 0x07;
    let mantissa = u & 0x0F;

    let mut s = (((mantissa as i32) << 3) + BIAS) << exponent;
    s -= BIAS;

    if sign != 0 { -s as i16 } else { s as i16 }
}

impl MuLawTable {
    /// 查询单个码字
    #[inline]
    pub fn get(&self, code: u8) -> i16 {
        self.entries[code as usize]
    }

    /// 全部表项
    pub fn as_array(&self) -> &[i16; MULAW_TABLE_SIZE] {
        &self.entries
    }

    /// 批量查表: `dst[k] = table[src[k]]`
    ///
    /// 解码热路径. `src` 与 `dst` 长度必须相同.
    #[inline]
    pub fn decode_into(&self, src: &[u8], dst: &mut [i16]) {
        debug_assert_eq!(src.len(), dst.len(), "输入码字与输出槽位数量不一致");
        for (out, &code) in dst.iter_mut().zip(src) {
            *out = self.entries[code as usize];
        }
    }
}

impl Default for MuLawTable {
    fn default() -> Self {
        build_mulaw_table()
    }
}

impl Index<u8> for MuLawTable {
    type Output = i16;

    fn index(&self, code: u8) -> &i16 {
        &self.entries[code as usize]
    }
}

/// G.711 µ-law 编码 (PCM16 → 8 位码字)
///
/// 幅度超过 32635 的采样被削顶. 输出已按位取反, 可直接写入 AU 负载.
pub fn encode_mulaw(sample: i16) -> u8 {
    let mut magnitude = i32::from(sample);
    let sign: u8 = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0x00
    };

    // 范围 [0x84, 0x7FFF], 最高位落在 bit 7..=14
    let biased = magnitude.min(CLIP) + BIAS;
    let exponent = (31 - biased.leading_zeros() - 7) as u8;
    let mantissa = ((biased >> (exponent + 3)) & 0x0F) as u8;

    !(sign | (exponent << 4) | mantissa)
}

/// 批量编码
pub fn encode_mulaw_slice(samples: &[i16]) -> Vec<u8> {
    samples.iter().map(|&s| encode_mulaw(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 按定义逐步计算, 与建表实现相互独立
    fn closed_form(i: u8) -> i16 {
        let u = (!u32::from(i)) & 0xFF;
        let sign = u & 0x80;
        let exponent = (u >> 4) & 0x07;
        let mantissa = u & 0x0F;
        let s = (((mantissa << 3) + 0x84) << exponent) as i32 - 0x84;
        if sign != 0 { -s as i16 } else { s as i16 }
    }

    #[test]
    fn test_查找表_与闭式公式一致() {
        let table = build_mulaw_table();
        for i in 0..=255u8 {
            assert_eq!(table[i], closed_form(i), "码字 0x{:02X}", i);
        }
    }

    #[test]
    fn test_静态表与构建结果相同() {
        assert_eq!(MULAW_TABLE, build_mulaw_table());
        assert_eq!(MuLawTable::default(), MULAW_TABLE);
    }

    #[test]
    fn test_查找表_典型码字() {
        assert_eq!(MULAW_TABLE[0xFF], 0);
        assert_eq!(MULAW_TABLE[0x7F], 0);
        assert_eq!(MULAW_TABLE[0x00], -32124);
        assert_eq!(MULAW_TABLE[0x80], 32124);
        assert_eq!(MULAW_TABLE[0xFE], 8);
        assert_eq!(MULAW_TABLE[0x7E], -8);
    }

    #[test]
    fn test_查找表_符号位对称() {
        for i in 0..=255u8 {
            assert_eq!(MULAW_TABLE[i], -MULAW_TABLE[i ^ 0x80], "码字 0x{:02X}", i);
        }
    }

    #[test]
    fn test_查找表_幅度单调递增() {
        // 取反后的低 7 位即无符号幅度码; 正半区码字为 0xFF - k
        let mut prev = -1i32;
        for k in 0..128u8 {
            let magnitude = i32::from(MULAW_TABLE[0xFF - k]);
            assert!(magnitude > prev, "幅度码 {} 未递增", k);
            prev = magnitude;
        }
        let mut prev = -1i32;
        for k in 0..128u8 {
            let magnitude = -i32::from(MULAW_TABLE[0x7F - k]);
            assert!(magnitude > prev, "负半区幅度码 {} 未递增", k);
            prev = magnitude;
        }
    }

    #[test]
    fn test_批量查表() {
        let src = [0xFF, 0x7F, 0x00, 0x80];
        let mut dst = [1i16; 4];
        MULAW_TABLE.decode_into(&src, &mut dst);
        assert_eq!(dst, [0, 0, -32124, 32124]);
    }

    #[test]
    fn test_编码_典型值() {
        assert_eq!(encode_mulaw(0), 0xFF);
        assert_eq!(encode_mulaw(-1), 0x7F);
        assert_eq!(encode_mulaw(32124), 0x80);
        assert_eq!(encode_mulaw(-32124), 0x00);
        // 削顶
        assert_eq!(encode_mulaw(i16::MAX), 0x80);
        assert_eq!(encode_mulaw(i16::MIN), 0x00);
    }

    #[test]
    fn test_编码再解码_误差不超过半个量化步长() {
        for sample in (-CLIP..=CLIP).step_by(7) {
            let code = encode_mulaw(sample as i16);
            let decoded = i32::from(MULAW_TABLE[code]);
            let exponent = ((!code) >> 4) & 0x07;
            let half_step = 4i32 << exponent;
            assert!(
                (decoded - sample).abs() <= half_step,
                "采样 {} -> 码字 0x{:02X} -> {}",
                sample,
                code,
                decoded
            );
        }
    }

    #[test]
    fn test_码字往返_除负零外一致() {
        for code in 0..=255u8 {
            if code == 0x7F {
                // 负零解码为 0, 重新编码得到正零
                assert_eq!(encode_mulaw(MULAW_TABLE[code]), 0xFF);
                continue;
            }
            assert_eq!(encode_mulaw(MULAW_TABLE[code]), code, "码字 0x{:02X}", code);
        }
    }
}
