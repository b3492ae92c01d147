//! Binary-level logging: `--log-output file` writes to the platform state
//! directory and keeps stdout clean.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_file_logging_writes_to_state_dir() {
    let temp_dir = TempDir::new().unwrap();
    let state_home = temp_dir.path().join("state");
    let config_home = temp_dir.path().join("config");
    let home = temp_dir.path().join("home");
    fs::create_dir_all(&config_home).unwrap();
    fs::create_dir_all(&home).unwrap();

    let bin = env!("CARGO_BIN_EXE_usage-telemetry");
    let output = Command::new(bin)
        .env("XDG_STATE_HOME", state_home.as_os_str())
        .env("XDG_CONFIG_HOME", config_home.as_os_str())
        .env("HOME", home.as_os_str())
        .env_remove("USAGE_TELEMETRY_LOG")
        .env_remove("USAGE_TELEMETRY_LOG_OUTPUT")
        .args(["--log-output", "file", "--log-level", "info", "session"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let session = stdout.trim();
    assert_eq!(session.len(), 64);
    assert!(session.chars().all(|c| c.is_ascii_hexdigit()));

    let log_path = state_home.join("usage-telemetry").join("usage-telemetry.log");
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("usage-telemetry CLI starting"));
}

#[test]
fn test_unknown_service_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let bin = env!("CARGO_BIN_EXE_usage-telemetry");
    let output = Command::new(bin)
        .env("XDG_CONFIG_HOME", temp_dir.path().as_os_str())
        .env("HOME", temp_dir.path().as_os_str())
        .args(["--log-level", "off", "record", "nope", "f"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown service 'nope'"));
}
