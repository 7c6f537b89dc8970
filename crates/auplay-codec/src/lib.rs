//! # auplay-codec
//!
//! µ-law (ITU-T G.711) 解压与 PCM 缓冲区.
//!
//! - [`MuLawTable`]: 256 项 µ-law → PCM16 查找表, 解压的唯一途径
//! - [`encode_mulaw`]: 标准 G.711 µ-law 参考编码器, 用于生成测试/演示素材
//! - [`PcmBuffer`]: 解码结果, 构造后只读
//!
//! ## 使用示例
//!
//! ```rust
//! use auplay_codec::{MULAW_TABLE, encode_mulaw};
//!
//! let code = encode_mulaw(1000);
//! let restored = MULAW_TABLE[code];
//! assert!((i32::from(restored) - 1000).abs() <= 32);
//! ```

pub mod mulaw;
pub mod pcm;

// 重导出常用类型
pub use mulaw::{MULAW_TABLE, MuLawTable, build_mulaw_table, encode_mulaw, encode_mulaw_slice};
pub use pcm::PcmBuffer;
