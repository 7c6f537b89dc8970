//! # auplay-playback
//!
//! 定时播放循环.
//!
//! 输出端只提供 "开始播放" 这一非阻塞调用, 没有完成回调.
//! [`PlaybackController`] 按片段时长加保护间隔阻塞等待, 保证同一时刻只有一个片段在播放.

pub mod clip;
pub mod controller;
pub mod sink;

pub use clip::{ClipDescriptor, ClipSource, clip_duration};
pub use controller::{PlaybackConfig, PlaybackController, PlaybackReport};
pub use sink::{AudioSink, LogSink, MockSink, SinkEvent, WavDumpSink};
