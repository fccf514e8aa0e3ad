use std::thread;
use std::time::{Duration, Instant};

use sysdash::core::config::Config;
use sysdash::core::system_monitor::{GpuFidelity, MonitorRuntime, Series, SnapshotReader};

use super::common::{Reply, ScriptedHost, ScriptedRunner, NVIDIA_QUERY_OUTPUT};

fn fast_config() -> Config {
    Config {
        interval_ms: 100,
        ..Default::default()
    }
}

/// Poll until `done` holds or the deadline passes
fn wait_for<F: Fn(&SnapshotReader) -> bool>(reader: &SnapshotReader, done: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done(reader) {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn test_runtime_publishes_frames() {
    let host = ScriptedHost::with_cpu(&[15.0, 25.0, 35.0]);
    let runtime = MonitorRuntime::with_sources(
        &fast_config(),
        host.boxed(),
        ScriptedRunner::new(),
        false,
    )
    .unwrap();
    let reader = runtime.reader();

    assert!(wait_for(&reader, |r| r.frame().history.len(Series::Cpu) >= 3));
    assert!(runtime.is_running());

    let frame = reader.frame();
    assert_eq!(&frame.history.snapshot_series(Series::Cpu)[..3], &[15.0, 25.0, 35.0]);
    assert!(frame.snapshot.cpu.is_available());
    assert_eq!(frame.snapshot.gpu.fidelity, GpuFidelity::Estimated);

    runtime.shutdown();
}

#[test]
fn test_runtime_restart_and_shutdown() {
    let runtime = MonitorRuntime::with_sources(
        &fast_config(),
        ScriptedHost::new().boxed(),
        ScriptedRunner::with_nvidia(),
        false,
    )
    .unwrap();
    let reader = runtime.reader();

    assert!(wait_for(&reader, |r| r.latest().gpu.fidelity == GpuFidelity::Measured));
    assert!(runtime.restart_gpu());

    let started = Instant::now();
    runtime.shutdown();
    assert!(started.elapsed() < Duration::from_secs(5));

    // Readers outlive the sampler and keep the last frame
    assert!(reader.latest().cpu.is_available());
}

/// A runtime whose first native GPU read takes `pause`, and a wait until that read has started
fn runtime_with_slow_gpu(pause: Duration) -> (MonitorRuntime, SnapshotReader) {
    let runner = ScriptedRunner::with_nvidia();
    runner.set(
        "nvidia-smi",
        "memory.used",
        Reply::Delayed(pause, NVIDIA_QUERY_OUTPUT.to_string()),
    );
    let config = Config {
        interval_ms: 100,
        probe_timeout_ms: 1_000,
        ..Default::default()
    };
    let runtime =
        MonitorRuntime::with_sources(&config, ScriptedHost::new().boxed(), runner.clone(), false)
            .unwrap();
    let reader = runtime.reader();

    let deadline = Instant::now() + Duration::from_secs(5);
    while runner
        .calls()
        .iter()
        .all(|(_, args, _)| !args.iter().any(|a| a.contains("memory.used")))
    {
        assert!(Instant::now() < deadline, "GPU query never started");
        thread::sleep(Duration::from_millis(5));
    }
    (runtime, reader)
}

#[test]
fn test_shutdown_waits_for_tick_in_progress() {
    let (runtime, reader) = runtime_with_slow_gpu(Duration::from_millis(400));
    assert_eq!(reader.latest().timestamp, 0);

    runtime.shutdown();

    let snapshot = reader.latest();
    assert!(snapshot.timestamp > 0);
    assert_eq!(snapshot.gpu.fidelity, GpuFidelity::Measured);
    assert_eq!(snapshot.gpu.reading.usage_percent, 45.0);
}

#[test]
fn test_dropping_runtime_stops_like_shutdown() {
    let (runtime, reader) = runtime_with_slow_gpu(Duration::from_millis(400));

    drop(runtime);

    let snapshot = reader.latest();
    assert!(snapshot.timestamp > 0);
    assert_eq!(snapshot.gpu.fidelity, GpuFidelity::Measured);
}
