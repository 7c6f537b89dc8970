//! auplay-probe - AU 文件信息探测工具
//!
//! 显示文件头各字段、校验结果、时长与注释; `--decode` 时解码负载并统计电平.

use std::path::PathBuf;
use std::process;

use auplay_codec::MULAW_TABLE;
use auplay_format::{AuHeader, IoContext, decode, read_annotation};
use clap::Parser;
use log::debug;
use serde::Serialize;

/// auplay AU 文件探测工具
#[derive(Parser, Debug)]
#[command(name = "auplay-probe", version, about = "AU (.snd) 文件信息探测工具")]
struct Cli {
    /// 输入文件路径
    input: PathBuf,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 解码负载并统计电平
    #[arg(long)]
    decode: bool,
}

// ============================================================
// 输出结构体
// ============================================================

/// 完整探测结果
#[derive(Serialize)]
struct ProbeOutput {
    filename: String,
    header: HeaderInfo,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    levels: Option<LevelInfo>,
}

/// 文件头字段
#[derive(Serialize)]
struct HeaderInfo {
    magic: String,
    data_offset: u32,
    data_size: u32,
    encoding: u32,
    encoding_name: String,
    sample_rate: u32,
    channels: u32,
}

/// 校验或解码错误
#[derive(Serialize)]
struct ErrorInfo {
    kind: String,
    message: String,
}

/// 解码后的电平统计
#[derive(Serialize)]
struct LevelInfo {
    samples: usize,
    peak: u16,
    peak_dbfs: f64,
    rms: f64,
}

impl From<&AuHeader> for HeaderInfo {
    fn from(h: &AuHeader) -> Self {
        Self {
            magic: format!("0x{:08x}", h.magic),
            data_offset: h.data_offset,
            data_size: h.data_size,
            encoding: h.encoding,
            encoding_name: h.encoding_kind().name().to_string(),
            sample_rate: h.sample_rate,
            channels: h.channels,
        }
    }
}

impl From<&auplay_core::AuError> for ErrorInfo {
    fn from(e: &auplay_core::AuError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let input = cli.input.display().to_string();
    let mut io = match IoContext::open_read(&cli.input) {
        Ok(io) => io,
        Err(e) => {
            eprintln!("错误: 无法打开文件 '{input}': {e}");
            process::exit(1);
        }
    };

    let header = match AuHeader::read_unvalidated(&mut io) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("错误: 无法读取文件头: {e}");
            process::exit(1);
        }
    };

    let output = probe(&mut io, input, &header, cli.decode);

    if cli.json {
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: JSON 序列化失败: {e}");
                process::exit(1);
            }
        }
    } else {
        print_text(&output);
    }

    if !output.valid {
        process::exit(1);
    }
}

/// 校验文件头, 按需读取注释和解码
fn probe(io: &mut IoContext, filename: String, header: &AuHeader, want_decode: bool) -> ProbeOutput {
    let mut output = ProbeOutput {
        filename,
        header: HeaderInfo::from(header),
        valid: true,
        error: None,
        duration: header.duration_secs(),
        annotation: None,
        levels: None,
    };

    if let Err(e) = header.validate() {
        debug!("文件头校验失败: {e}");
        output.valid = false;
        output.error = Some(ErrorInfo::from(&e));
        return output;
    }

    match read_annotation(io, header) {
        Ok(text) if !text.is_empty() => output.annotation = Some(text),
        Ok(_) => {}
        Err(e) => debug!("读取注释失败: {e}"),
    }

    if want_decode {
        match decode(io, header, &MULAW_TABLE) {
            Ok(pcm) => {
                let peak = pcm.peak();
                output.levels = Some(LevelInfo {
                    samples: pcm.len(),
                    peak,
                    peak_dbfs: dbfs(f64::from(peak)),
                    rms: pcm.rms(),
                });
            }
            Err(e) => {
                output.valid = false;
                output.error = Some(ErrorInfo::from(&e));
            }
        }
    }
    output
}

/// 相对满幅 (32768) 的分贝值, 静音为 -inf
fn dbfs(level: f64) -> f64 {
    20.0 * (level / 32768.0).log10()
}

/// 文本输出
fn print_text(output: &ProbeOutput) {
    let h = &output.header;
    println!("[AU]");
    println!("  文件名       : {}", output.filename);
    println!("  魔数         : {}", h.magic);
    println!("  数据偏移     : {}", h.data_offset);
    if h.data_size == u32::MAX {
        println!("  数据长度     : 未知 (0xffffffff)");
    } else {
        println!("  数据长度     : {} 字节", h.data_size);
    }
    println!("  编码         : {} ({})", h.encoding_name, h.encoding);
    println!("  采样率       : {} Hz", h.sample_rate);
    println!("  声道数       : {}", h.channels);
    if let Some(dur) = output.duration {
        println!("  时长         : {dur:.3} 秒");
    }
    if let Some(ref text) = output.annotation {
        println!("  注释         : {text}");
    }
    println!("[/AU]");
    println!();

    match &output.error {
        None => println!("校验: 通过"),
        Some(err) => println!("校验: 失败 [{}] {}", err.kind, err.message),
    }

    if let Some(ref levels) = output.levels {
        println!();
        println!("[LEVELS]");
        println!("  采样数       : {}", levels.samples);
        println!("  峰值         : {} ({:.1} dBFS)", levels.peak, levels.peak_dbfs);
        println!("  RMS          : {:.1}", levels.rms);
        println!("[/LEVELS]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auplay_format::encode_au;

    fn probe_bytes(data: Vec<u8>, want_decode: bool) -> ProbeOutput {
        let mut io = IoContext::from_memory(data);
        let header = AuHeader::read_unvalidated(&mut io).unwrap();
        probe(&mut io, "test.au".into(), &header, want_decode)
    }

    #[test]
    fn test_校验失败_报告错误类别() {
        let mut header = AuHeader::mulaw(24, 4);
        header.sample_rate = 44100;
        let mut data = header.to_bytes().to_vec();
        data.extend_from_slice(&[0xFF; 4]);

        let output = probe_bytes(data, true);
        assert!(!output.valid);
        assert!(output.levels.is_none());
        let error = output.error.as_ref().unwrap();
        assert_eq!(error.kind, "UnsupportedFormatError");
        assert!(error.message.contains("44100"));

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&output).unwrap()).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"]["kind"], "UnsupportedFormatError");
        assert_eq!(json["header"]["sample_rate"], 44100);
        assert_eq!(json["header"]["magic"], "0x2e736e64");
    }

    #[test]
    fn test_有效文件_注释与电平() {
        let data = encode_au(&[1000i16; 800], "hello").unwrap();
        let output = probe_bytes(data, true);
        assert!(output.valid);
        assert!(output.error.is_none());
        assert_eq!(output.annotation.as_deref(), Some("hello"));
        assert_eq!(output.duration, Some(0.1));

        let levels = output.levels.as_ref().unwrap();
        assert_eq!(levels.samples, 800);
        let restored = MULAW_TABLE[auplay_codec::encode_mulaw(1000)];
        assert_eq!(levels.peak, restored.unsigned_abs());
        assert!(levels.peak_dbfs < 0.0);

        let json = serde_json::to_string(&output).unwrap();
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_截断负载_解码时报告() {
        let mut data = encode_au(&[0i16; 100], "").unwrap();
        data.truncate(24 + 40);
        let output = probe_bytes(data.clone(), false);
        assert!(output.valid);

        let output = probe_bytes(data, true);
        assert!(!output.valid);
        assert_eq!(output.error.unwrap().kind, "TruncatedDataError");
    }

    #[test]
    fn test_分贝换算() {
        assert_eq!(dbfs(32768.0), 0.0);
        assert!((dbfs(16384.0) + 6.0206).abs() < 1e-3);
        assert_eq!(dbfs(0.0), f64::NEG_INFINITY);
    }
}
