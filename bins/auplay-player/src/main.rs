//! # auplay-player
//!
//! 8000 Hz 单声道 µ-law AU 文件播放器.
//!
//! 启动主时钟 → 启动 DAC → 解码全部输入 → 循环播放.
//! 主机上没有 I2C/I2S 硬件, 芯片设置只写日志; 指定 `--dump-wav` 时把播放内容写入 WAV 文件.

mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use auplay_codec::MULAW_TABLE;
use auplay_core::{AuError, ThreadSleeper};
use auplay_device::{AudioDeviceSequencer, ClockSource, HostClockSource, HostCodec};
use auplay_format::header::SUPPORTED_SAMPLE_RATE;
use auplay_format::load_au_file;
use auplay_playback::{AudioSink, ClipDescriptor, LogSink, PlaybackController, WavDumpSink};
use clap::Parser;
use log::{error, info};

use crate::config::{Overrides, PlayerConfig};

/// auplay 播放器
#[derive(Parser, Debug)]
#[command(name = "auplay-player", version, about = "µ-law AU 文件播放器 (8000 Hz 单声道)")]
struct Cli {
    /// 依次循环播放的 AU 文件 (默认 demo.au)
    inputs: Vec<PathBuf>,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 主时钟频率 (Hz)
    #[arg(long)]
    mclk_hz: Option<u32>,

    /// 数字增益 (dB, -63.5 ~ 24, 建议保持为负)
    #[arg(long, allow_negative_numbers = true)]
    dac_volume: Option<f32>,

    /// 耳机增益 (dB, -78.3 ~ 0; 耳机建议 -24)
    #[arg(long, allow_negative_numbers = true)]
    headphone_volume: Option<f32>,

    /// 启动后的稳定时间 (毫秒, 不低于 350)
    #[arg(long)]
    settle_ms: Option<u64>,

    /// 每段之后的保护间隔 (毫秒)
    #[arg(long)]
    guard_ms: Option<u64>,

    /// 第一段之前的等待 (毫秒)
    #[arg(long)]
    lead_in_ms: Option<u64>,

    /// 播放遍数 (默认无限循环)
    #[arg(long)]
    passes: Option<u32>,

    /// 同时把播放内容写入 WAV 文件
    #[arg(long)]
    dump_wav: Option<PathBuf>,

    /// 日志详细级别 (-v debug, -vv trace 本项目, -vvv trace 全部)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            inputs: self.inputs.clone(),
            master_clock_hz: self.mclk_hz,
            dac_volume_db: self.dac_volume,
            headphone_volume_db: self.headphone_volume,
            settle_ms: self.settle_ms,
            guard_ms: self.guard_ms,
            lead_in_ms: self.lead_in_ms,
            passes: self.passes,
            dump_wav: self.dump_wav.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(Path::new("logs"), "auplay-player", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    print_banner();

    if let Err(e) = run(&cli) {
        let kind = error_kind(&e).unwrap_or("Error");
        error!("[{kind}] {e:#}");
        eprintln!("错误 [{kind}]: {e:#}");
        process::exit(1);
    }
}

/// 错误链中第一个 [`AuError`] 的类别名
fn error_kind(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AuError>())
        .map(AuError::kind)
}

fn print_banner() {
    println!(
        "
auplay-player {} (8000 Hz, 8 位单声道, µ-law 压扩)
- 注意: 默认音量为线路电平
- 使用耳机时请指定 `--headphone-volume -24`
- 在 Linux 上用 sox 把 16 位 .wav 转为 8 位 µ-law .au:
  `sox demo.wav -r 8000 -t au -e mu-law demo.au`
",
        env!("CARGO_PKG_VERSION")
    );
}

fn run(cli: &Cli) -> Result<()> {
    let config = PlayerConfig::resolve(cli.config.as_deref(), &cli.overrides())?;

    // 1. 主时钟
    let mut mclk = HostClockSource::new();
    mclk.start(config.master_clock_hz)
        .context("启动主时钟失败")?;
    let mclk_hz = mclk.frequency_hz().context("主时钟未运行")?;

    // 2. DAC
    let mut sequencer = AudioDeviceSequencer::new(HostCodec::new(), ThreadSleeper, config.device);
    let codec_config = sequencer
        .bring_up(SUPPORTED_SAMPLE_RATE, mclk_hz)
        .context("音频设备启动失败")?;

    // 3. 解码
    let clips = config
        .inputs
        .iter()
        .map(|path| load_clip(path))
        .collect::<Result<Vec<_>>>()?;

    // 4. 播放
    let sink: Box<dyn AudioSink> = match &config.dump_wav {
        Some(path) => Box::new(
            WavDumpSink::create(path, codec_config.sample_rate(), 1)
                .with_context(|| format!("创建 {} 失败", path.display()))?,
        ),
        None => Box::new(LogSink::new()),
    };
    let mut controller =
        PlaybackController::new(sink, ThreadSleeper, &codec_config, config.playback);
    let report = controller.play_loop(&clips).context("播放失败")?;

    info!(
        "播放结束: {} 遍, {} 个片段, 共等待 {:.3} 秒",
        report.passes,
        report.clips_started,
        report.total_wait.as_secs_f64()
    );
    Ok(())
}

/// 解码一个 AU 文件
fn load_clip(path: &Path) -> Result<ClipDescriptor> {
    let (header, pcm) = load_au_file(path, &MULAW_TABLE)
        .with_context(|| format!("载入 {} 失败", path.display()))?;
    info!(
        "{}: {} 个采样, {:.3} 秒",
        path.display(),
        pcm.len(),
        header.duration_secs().unwrap_or(0.0)
    );
    Ok(ClipDescriptor::from_buffer(
        path.display().to_string(),
        pcm,
        header.sample_rate,
    )?)
}
