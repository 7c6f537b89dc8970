//! 端到端集成测试: 设备启动 → 解码 → 定时播放.
//!
//! 全部等待通过虚拟时钟完成, 不产生真实延迟.

use std::time::Duration;

use auplay::codec::{MULAW_TABLE, PcmBuffer};
use auplay::core::{AuError, VirtualClock};
use auplay::device::{
    AudioDeviceSequencer, BringUpState, ClockSource, CodecCall, CodecOp, DeviceSettings,
    MASTER_CLOCK_HZ, MockClockSource, MockCodec,
};
use auplay::format::{load_au_file, write_au_file};
use auplay::playback::{
    ClipDescriptor, MockSink, PlaybackConfig, PlaybackController, WavDumpSink,
};

fn passes(n: u32) -> PlaybackConfig {
    PlaybackConfig {
        passes: Some(n),
        ..Default::default()
    }
}

#[test]
fn test_完整管线_时序() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.au");
    write_au_file(&path, &[1000i16; 4000], "").unwrap();

    let clock = VirtualClock::new();

    // 1. 主时钟
    let mut mclk = MockClockSource::new();
    mclk.start(MASTER_CLOCK_HZ).unwrap();

    // 2. 设备启动
    let mut sequencer =
        AudioDeviceSequencer::new(MockCodec::new(), clock.clone(), DeviceSettings::default());
    let codec = sequencer
        .bring_up(8000, mclk.frequency_hz().unwrap())
        .unwrap();
    assert_eq!(sequencer.state(), BringUpState::Ready);
    let settled_at = clock.now();
    assert_eq!(settled_at, Duration::from_millis(350));

    // 3. 解码
    let (header, pcm) = load_au_file(&path, &MULAW_TABLE).unwrap();
    let clip = ClipDescriptor::from_buffer("demo", pcm, header.sample_rate).unwrap();

    // 4. 播放两遍
    let sink = MockSink::new(clock.clone());
    let mut controller = PlaybackController::new(sink.clone(), clock.clone(), &codec, passes(2));
    let report = controller.play_loop(&[clip]).unwrap();

    let starts = sink.start_times();
    assert_eq!(starts.len(), 2);
    // 第一次 start 在稳定之后, 且经过引导等待
    assert!(starts[0] >= settled_at + Duration::from_millis(500));
    // 4000 个采样 = 0.5 秒, 加 1 秒保护间隔
    assert_eq!(starts[1] - starts[0], Duration::from_millis(1500));
    assert_eq!(report.clips_started, 2);
    assert_eq!(clock.now(), settled_at + report.total_wait);

    for event in sink.events() {
        assert_eq!(event.sample_rate, 8000);
        assert_eq!(event.channels, 1);
        assert_eq!(event.buffer.len(), 4000);
    }
}

#[test]
fn test_文件片段_每次播放前解码() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.au");
    let b = dir.path().join("b.au");
    write_au_file(&a, &[0i16; 800], "").unwrap();
    write_au_file(&b, &[0i16; 1600], "b").unwrap();

    let clock = VirtualClock::new();
    let mut sequencer =
        AudioDeviceSequencer::new(MockCodec::new(), clock.clone(), DeviceSettings::default());
    let codec = sequencer.bring_up(8000, MASTER_CLOCK_HZ).unwrap();

    let clips = [
        ClipDescriptor::from_au_file(&a).unwrap(),
        ClipDescriptor::from_au_file(&b).unwrap(),
    ];
    let sink = MockSink::new(clock.clone());
    let mut controller = PlaybackController::new(sink.clone(), clock.clone(), &codec, passes(1));
    controller.play_loop(&clips).unwrap();

    let starts = sink.start_times();
    assert_eq!(starts[1] - starts[0], Duration::from_millis(100 + 1000));
    let lens: Vec<usize> = sink.events().iter().map(|e| e.buffer.len()).collect();
    assert_eq!(lens, vec![800, 1600]);
}

#[test]
fn test_启动失败_不产生配置() {
    let clock = VirtualClock::new();
    let mut sequencer = AudioDeviceSequencer::new(
        MockCodec::failing_on(CodecOp::SetDacVolume),
        clock.clone(),
        DeviceSettings::default(),
    );
    let err = sequencer.bring_up(8000, MASTER_CLOCK_HZ).unwrap_err();
    assert!(matches!(err, AuError::DeviceConfig { ref step, .. } if step == "gain"));
    assert_eq!(sequencer.state(), BringUpState::Failed);

    // 失败前的设置已下发, 之后的不再下发
    let calls = sequencer.codec().calls();
    assert_eq!(calls.last(), Some(&CodecCall::DacVolume(-3.0)));
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_wav_转储输出端() {
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("dump.wav");

    let clock = VirtualClock::new();
    let mut sequencer =
        AudioDeviceSequencer::new(MockCodec::new(), clock.clone(), DeviceSettings::default());
    let codec = sequencer.bring_up(8000, MASTER_CLOCK_HZ).unwrap();

    let clip = ClipDescriptor::from_buffer("ramp", PcmBuffer::from_samples((0..100).collect()), 8000)
        .unwrap();
    let sink = WavDumpSink::create(&wav_path, codec.sample_rate(), 1).unwrap();
    let mut controller = PlaybackController::new(sink, clock.clone(), &codec, passes(3));
    controller.play_loop(&[clip]).unwrap();
    assert_eq!(controller.sink().data_bytes(), 600);

    let wav = std::fs::read(&wav_path).unwrap();
    assert_eq!(wav.len(), 44 + 600);
    assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 600);
}
