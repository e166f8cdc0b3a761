use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("nested/driftwatch/config.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_driftwatch"))
        .arg("init")
        .arg("--config")
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "driftwatch init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(config_path.exists(), "config file should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[scan]"));
    assert!(content.contains("[advisory]"));

    let config: driftwatch_core::DriftConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.pipeline.concurrency, 4);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_driftwatch"))
        .arg("init")
        .arg("--config")
        .arg(&config_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "# existing");
}
