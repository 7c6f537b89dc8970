//! # auplay-format
//!
//! AU (Sun/NeXT `.snd`) 容器处理.
//!
//! AU 文件结构:
//! ```text
//! 0   magic        ".snd" (0x2e736e64)
//! 4   data_offset  负载起始偏移
//! 8   data_size    负载字节数 (0xFFFFFFFF = 未知长度)
//! 12  encoding     1 = 8 位 µ-law
//! 16  sample_rate
//! 20  channels
//! 24  [注释, 直到 data_offset]
//!     负载...
//! ```
//! 全部字段为大端 u32. 仅支持 8000 Hz 单声道 µ-law.

pub mod decode;
pub mod header;
pub mod io;
pub mod wav;
pub mod writer;

// 重导出常用类型
pub use decode::{DECODE_CHUNK_SIZE, decode, load_au, load_au_bytes, load_au_file};
pub use header::{AU_HEADER_SIZE, AU_MAGIC, AuEncoding, AuHeader, parse_header, read_annotation};
pub use io::IoContext;
pub use wav::WavWriter;
pub use writer::{encode_au, write_au_file};
