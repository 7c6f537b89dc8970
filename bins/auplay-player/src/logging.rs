//! 日志初始化.
//!
//! 双输出, 级别一致:
//! - 控制台: 彩色
//! - 文件: 无色, 按天滚动, 写入 `logs/{prefix}.{date}.log`
//!
//! 级别 (优先级: AUPLAY_LOG 环境变量 > 命令行 > 默认):
//! - 默认:   info  (启动步骤、每遍播放)
//! - `-v`:   debug (状态转换、时钟方案、每段等待)
//! - `-vv`:  trace (仅 auplay crate, 第三方依赖保持 info)
//! - `-vvv`: trace (全局)
//!
//! 库 crate 通过 `log` 宏输出, 由 tracing-subscriber 的 log 桥接收.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 覆盖命令行级别的环境变量
pub const LOG_ENV: &str = "AUPLAY_LOG";

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 本项目 crate 的 target 前缀
const AUPLAY_TARGETS: &[&str] = &[
    "auplay",
    "auplay_core",
    "auplay_codec",
    "auplay_format",
    "auplay_device",
    "auplay_playback",
    "auplay_player",
];

/// 由 verbosity 生成过滤指令
fn filter_directives(verbosity: u8) -> String {
    match verbosity {
        0 => "info".to_string(),
        1 => "debug".to_string(),
        2 => {
            let mut directives: Vec<String> =
                AUPLAY_TARGETS.iter().map(|t| format!("{t}=trace")).collect();
            directives.push("info".to_string());
            directives.join(",")
        }
        _ => "trace".to_string(),
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)))
}

/// 初始化日志
///
/// - `dir`: 日志目录, 不存在时创建
/// - `file_prefix`: 日志文件前缀 (如 "auplay-player")
/// - `verbosity`: 0=info, 1=debug, 2=trace(auplay), 3+=trace(all)
pub fn init(dir: &Path, file_prefix: &str, verbosity: u8) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("创建日志目录 {} 失败", dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build(dir)
        .context("创建日志文件失败")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(LineFormatter { colored: true })
        .with_filter(build_filter(verbosity));

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(LineFormatter { colored: false })
        .with_filter(build_filter(verbosity));

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统已初始化")?;
    Ok(())
}

/// 单行格式: `[月-日 时:分:秒.毫秒] 级别 > 消息`
struct LineFormatter {
    colored: bool,
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let level = *event.metadata().level();
        write!(
            writer,
            "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis(),
        )?;
        if self.colored {
            let color = match level {
                tracing::Level::ERROR => "\x1b[31m",
                tracing::Level::WARN => "\x1b[33m",
                tracing::Level::INFO => "\x1b[32m",
                _ => "\x1b[34m",
            };
            write!(writer, "{color}{level:5}\x1b[0m > ")?;
        } else {
            write!(writer, "{level:5} > ")?;
        }
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_级别指令() {
        assert_eq!(filter_directives(0), "info");
        assert_eq!(filter_directives(1), "debug");
        assert_eq!(filter_directives(3), "trace");
        assert_eq!(filter_directives(9), "trace");
    }

    #[test]
    fn test_定向_trace_只覆盖本项目() {
        let directives = filter_directives(2);
        assert!(directives.starts_with("auplay=trace,"));
        assert!(directives.contains("auplay_device=trace"));
        assert!(directives.ends_with(",info"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
