//! # auplay
//!
//! µ-law AU 解码与音频设备启动/定时播放管线.
//!
//! - **容器**: 解析并校验 AU (`.snd`) 文件头, 以 1 KB 分块流式解码负载
//! - **编解码**: 256 项 µ-law → PCM16 解压表与参考编码器
//! - **设备**: 按固定顺序启动外部 DAC (复位、路由、增益、时钟、稳定)
//! - **播放**: 按片段时长定时循环播放
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use auplay::codec::MULAW_TABLE;
//! use auplay::format::load_au_file;
//!
//! let (header, pcm) = load_au_file("beep.au", &MULAW_TABLE).unwrap();
//! println!("{} Hz, {} 个采样", header.sample_rate, pcm.len());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `auplay-core` | 错误类型与计时抽象 |
//! | `auplay-codec` | µ-law 解压表、编码器、PCM 缓冲区 |
//! | `auplay-format` | AU 文件头、流式解码、AU/WAV 写出 |
//! | `auplay-device` | 编解码芯片/主时钟抽象与启动状态机 |
//! | `auplay-playback` | 输出端抽象与播放循环 |

/// 错误类型与计时抽象
pub use auplay_core as core;

/// µ-law 编解码
pub use auplay_codec as codec;

/// AU 容器处理
pub use auplay_format as format;

/// 设备启动
pub use auplay_device as device;

/// 定时播放
pub use auplay_playback as playback;

/// 获取 auplay 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
