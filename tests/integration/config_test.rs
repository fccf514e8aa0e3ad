use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sysdash::core::config::Config;
use sysdash::core::system_monitor::{
    SchedulerConfig, SnapshotPublisher, MAX_BACKOFF, MAX_HISTORY_SIZE, MAX_PROBE_TIMEOUT,
};
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.interval(), Duration::from_secs(1));
    assert_eq!(config.backoff_multiplier, 5);
    assert_eq!(config.probe_timeout(), MAX_PROBE_TIMEOUT);
    assert_eq!(config.history_capacity, 60);
    assert!(config.disk_mount.is_none());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        interval_ms: 250,
        backoff_multiplier: 3,
        disk_mount: Some("/home".to_string()),
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.disk_mount(), PathBuf::from("/home"));
}

#[test]
fn test_config_missing_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "interval_ms": 2000 }"#).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.interval(), Duration::from_secs(2));
    assert_eq!(loaded.history_capacity, 60);
}

#[test]
fn test_config_corrupt_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    fs::write(&path, "{ not json").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());

    fs::write(&path, "   \n").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_scheduler_config_from_config() {
    let config = Config {
        interval_ms: 500,
        backoff_multiplier: 4,
        probe_timeout_ms: 30_000,
        history_capacity: 0,
        disk_mount: None,
    };
    let scheduler = SchedulerConfig::from(&config);

    assert_eq!(scheduler.interval, Duration::from_millis(500));
    assert_eq!(scheduler.backoff(), Duration::from_secs(2));
    assert_eq!(scheduler.probe_timeout, MAX_PROBE_TIMEOUT);
    assert_eq!(scheduler.history_capacity, 1);
}

#[test]
fn test_oversized_values_are_clamped() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "interval_ms": 18446744073709551615, "history_capacity": 18446744073709551615, "backoff_multiplier": 4294967295 }"#,
    )
    .unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.history_capacity, usize::MAX);

    let scheduler = SchedulerConfig::from(&loaded);
    assert_eq!(scheduler.interval, Duration::from_secs(60 * 60));
    assert_eq!(scheduler.history_capacity, MAX_HISTORY_SIZE);
    assert_eq!(scheduler.backoff(), MAX_BACKOFF);

    // Building the publisher must not try to allocate the raw value
    let (_publisher, reader) = SnapshotPublisher::new(loaded.history_capacity);
    assert_eq!(reader.frame().history.capacity(), MAX_HISTORY_SIZE);
}

#[test]
fn test_backoff_never_overflows() {
    let scheduler = SchedulerConfig {
        interval: Duration::from_secs(u64::MAX / 2),
        backoff_multiplier: u32::MAX,
        ..Default::default()
    };
    assert_eq!(scheduler.backoff(), MAX_BACKOFF);

    let scheduler = SchedulerConfig {
        interval: Duration::from_secs(30 * 60),
        backoff_multiplier: 5,
        ..Default::default()
    };
    assert_eq!(scheduler.backoff(), MAX_BACKOFF);
}

#[test]
fn test_shutdown_grace_covers_slowest_step() {
    let config = Config {
        interval_ms: 60 * 60 * 1000,
        ..Default::default()
    };
    let scheduler = SchedulerConfig::from(&config);

    // Two vendor-tool calls, each allowed the full probe timeout
    assert!(scheduler.shutdown_grace() > MAX_PROBE_TIMEOUT * 2);
    assert!(scheduler.shutdown_grace() < Duration::from_secs(60));
}
