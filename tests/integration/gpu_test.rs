use std::time::Duration;

use sysdash::core::system_monitor::{
    GpuFidelity, GpuProviderKind, GpuProviderResolver, GpuSource, GpuVendor, HostMetrics,
    MAX_PROBE_TIMEOUT,
};

use super::common::{Reply, ScriptedHost, ScriptedRunner};

const ROCM_OUTPUT: &str = "\
device,Temperature (Sensor edge) (C),GPU use (%),VRAM Total Memory (B),VRAM Total Used Memory (B)
card0,52.0,64,8573157376,1073741824
";

#[tokio::test]
async fn test_no_working_probe_resolves_to_fallback() {
    let runner = ScriptedRunner::new();
    let resolver = GpuProviderResolver::new(runner.clone(), Duration::from_secs(1));

    assert_eq!(resolver.resolve().await, GpuProviderKind::HeuristicFallback);
    assert_eq!(runner.call_count("nvidia-smi"), 1);
    assert_eq!(runner.call_count("rocm-smi"), 1);
}

#[tokio::test]
async fn test_nvidia_wins_over_amd() {
    let runner = ScriptedRunner::with_nvidia();
    runner.set("rocm-smi", "", Reply::Stdout(ROCM_OUTPUT.to_string()));
    let resolver = GpuProviderResolver::new(runner.clone(), Duration::from_secs(1));

    assert_eq!(
        resolver.resolve().await,
        GpuProviderKind::NativeVendor(GpuVendor::Nvidia)
    );
    assert_eq!(runner.call_count("rocm-smi"), 0);
}

#[tokio::test]
async fn test_failing_nvidia_falls_through_to_amd() {
    for reply in [Reply::Exit(6), Reply::Timeout, Reply::SpawnExhausted] {
        let runner = ScriptedRunner::new();
        runner.set("nvidia-smi", "", reply);
        runner.set("rocm-smi", "", Reply::Stdout(ROCM_OUTPUT.to_string()));
        let resolver = GpuProviderResolver::new(runner, Duration::from_secs(1));

        assert_eq!(
            resolver.resolve().await,
            GpuProviderKind::NativeVendor(GpuVendor::Amd)
        );
    }
}

#[tokio::test]
async fn test_probe_timeout_is_capped() {
    let runner = ScriptedRunner::new();
    let resolver = GpuProviderResolver::new(runner.clone(), Duration::from_secs(60));
    assert_eq!(resolver.timeout(), MAX_PROBE_TIMEOUT);

    resolver.resolve().await;
    assert!(runner
        .calls()
        .iter()
        .all(|(_, _, timeout)| *timeout <= MAX_PROBE_TIMEOUT));
}

#[tokio::test]
async fn test_amd_source_reads_rocm_smi() {
    let runner = ScriptedRunner::new();
    runner.set("rocm-smi", "", Reply::Stdout(ROCM_OUTPUT.to_string()));
    let mut host = ScriptedHost::new();
    let memory = host.memory().ok();
    let mut source = GpuSource::new(runner, Duration::from_secs(1));

    let sample = source
        .sample(
            GpuProviderKind::NativeVendor(GpuVendor::Amd),
            &mut host,
            memory.as_ref(),
        )
        .await;

    assert!(sample.fault.is_none());
    assert_eq!(sample.snapshot.fidelity, GpuFidelity::Measured);
    assert_eq!(sample.snapshot.reading.usage_percent, 64.0);
    assert_eq!(sample.snapshot.reading.memory_used_bytes, 1_073_741_824);
    assert_eq!(sample.snapshot.reading.temperature_celsius, Some(52.0));
}

#[tokio::test]
async fn test_source_counts_consecutive_failures() {
    let runner = ScriptedRunner::new();
    runner.set("nvidia-smi", "", Reply::Exit(1));
    let mut host = ScriptedHost::new();
    let mut source = GpuSource::new(runner.clone(), Duration::from_secs(1));
    let kind = GpuProviderKind::NativeVendor(GpuVendor::Nvidia);

    for _ in 0..3 {
        let sample = source.sample(kind, &mut host, None).await;
        assert!(sample.fault.is_some());
        assert_eq!(sample.snapshot.kind, kind);
        assert_eq!(sample.snapshot.fidelity, GpuFidelity::Estimated);
        // No memory reading: estimate reports no VRAM
        assert_eq!(sample.snapshot.reading.memory_total_bytes, 0);
    }
    assert_eq!(source.consecutive_failures(), 3);

    runner.set("nvidia-smi", "", Reply::Stdout("5, 10, 20, 30".to_string()));
    let sample = source.sample(kind, &mut host, None).await;
    assert_eq!(sample.snapshot.fidelity, GpuFidelity::Measured);
    assert_eq!(source.consecutive_failures(), 0);
}

#[tokio::test]
async fn test_fallback_source_never_spawns() {
    let runner = ScriptedRunner::with_nvidia();
    let mut host = ScriptedHost::new();
    let mut source = GpuSource::new(runner.clone(), Duration::from_secs(1));

    let sample = source
        .sample(GpuProviderKind::HeuristicFallback, &mut host, None)
        .await;

    assert!(sample.fault.is_none());
    assert_eq!(sample.snapshot.fidelity, GpuFidelity::Estimated);
    assert!(runner.calls().is_empty());
}
