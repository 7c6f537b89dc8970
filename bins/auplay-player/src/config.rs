//! 播放器配置.
//!
//! 来源优先级: 命令行 > JSON 配置文件 > 默认值.
//!
//! 配置文件示例:
//! ```json
//! {
//!   "inputs": ["demo.au"],
//!   "master_clock_hz": 15000000,
//!   "device": { "dac_volume_db": -3.0, "headphone_volume_db": -24.0 },
//!   "playback": { "guard_ms": 1000, "passes": 3 }
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use auplay_device::{DeviceSettings, MASTER_CLOCK_HZ};
use auplay_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};

/// 未指定输入时播放的文件
pub const DEFAULT_INPUT: &str = "demo.au";

/// 完整的播放器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// 依次播放的 AU 文件
    pub inputs: Vec<PathBuf>,
    /// 主时钟频率 (Hz)
    pub master_clock_hz: u32,
    pub device: DeviceSettings,
    pub playback: PlaybackConfig,
    /// 额外把播放内容写入该 WAV 文件
    pub dump_wav: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from(DEFAULT_INPUT)],
            master_clock_hz: MASTER_CLOCK_HZ,
            device: DeviceSettings::default(),
            playback: PlaybackConfig::default(),
            dump_wav: None,
        }
    }
}

/// 命令行给出的覆盖项, `None` / 空表示未指定
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub inputs: Vec<PathBuf>,
    pub master_clock_hz: Option<u32>,
    pub dac_volume_db: Option<f32>,
    pub headphone_volume_db: Option<f32>,
    pub settle_ms: Option<u64>,
    pub guard_ms: Option<u64>,
    pub lead_in_ms: Option<u64>,
    pub passes: Option<u32>,
    pub dump_wav: Option<PathBuf>,
}

impl PlayerConfig {
    /// 读取 JSON 配置文件
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))
    }

    /// 合并配置文件与命令行
    ///
    /// 增益在启动主时钟之前检查, 越界时不触碰任何硬件.
    pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.device.validate().context("设备参数无效")?;
        Ok(config)
    }

    /// 用命令行覆盖项替换对应字段
    pub fn apply(&mut self, o: &Overrides) {
        if !o.inputs.is_empty() {
            self.inputs = o.inputs.clone();
        }
        if let Some(v) = o.master_clock_hz {
            self.master_clock_hz = v;
        }
        if let Some(v) = o.dac_volume_db {
            self.device.dac_volume_db = v;
        }
        if let Some(v) = o.headphone_volume_db {
            self.device.headphone_volume_db = v;
        }
        if let Some(v) = o.settle_ms {
            self.device.settle_ms = v;
        }
        if let Some(v) = o.guard_ms {
            self.playback.guard_ms = v;
        }
        if let Some(v) = o.lead_in_ms {
            self.playback.lead_in_ms = v;
        }
        if o.passes.is_some() {
            self.playback.passes = o.passes;
        }
        if o.dump_wav.is_some() {
            self.dump_wav = o.dump_wav.clone();
        }
    }
}
