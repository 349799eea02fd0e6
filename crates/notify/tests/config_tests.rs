//! Integration tests for notify configuration loading and saving

use std::fs;
use tempfile::TempDir;
use usb_notify::NotifyConfig;
use usb_notify::config::{DeviceEntry, load_config};

const FULL_CONFIG: &str = r#"
[notify]
log_level = "debug"

[limits]
max_disable_len = 48
max_whitelist_len = 128
max_allowlist_entries = 10

[features]
hw_param = false
host_notify = false

[[devices]]
name = "usb_control"

[[devices]]
name = "usb_control_2"
host_supported = false
"#;

#[test]
fn test_from_toml_full() {
    let config = NotifyConfig::from_toml(FULL_CONFIG).unwrap();
    assert_eq!(config.notify.log_level, "debug");
    assert_eq!(config.limits.max_disable_len, 48);
    assert_eq!(config.limits.max_whitelist_len, 128);
    assert_eq!(config.limits.max_allowlist_entries, 10);
    // Unset limits keep their defaults
    assert_eq!(config.limits.max_allowlist_len, 1024);
    assert_eq!(config.limits.max_speed_len, 15);
    assert!(!config.features.hw_param);
    assert!(!config.features.host_notify);
    assert!(config.features.lockscreen_restriction);
    assert_eq!(
        config.device_entries(),
        vec![
            DeviceEntry {
                name: "usb_control".to_string(),
                host_supported: true,
            },
            DeviceEntry {
                name: "usb_control_2".to_string(),
                host_supported: false,
            },
        ]
    );
}

#[test]
fn test_from_toml_empty_is_default() {
    let config = NotifyConfig::from_toml("").unwrap();
    let default = NotifyConfig::default();
    assert_eq!(config.limits, default.limits);
    assert_eq!(config.features, default.features);
    assert_eq!(config.device_entries()[0].name, "usb_control");
}

#[test]
fn test_from_toml_rejects_invalid() {
    assert!(NotifyConfig::from_toml("[notify]\nlog_level = \"loud\"\n").is_err());
    assert!(NotifyConfig::from_toml("[limits]\nmax_disable_len = 0\n").is_err());
    assert!(NotifyConfig::from_toml("[limits]\nmax_whitelist_len = 2\n").is_err());
    assert!(NotifyConfig::from_toml("[[devices]]\nname = \"\"\n").is_err());
    assert!(NotifyConfig::from_toml("[limits]\nmax_disable_len = -1\n").is_err());
    assert!(NotifyConfig::from_toml("not toml at all [").is_err());
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("notify.toml");

    let mut config = NotifyConfig::from_toml(FULL_CONFIG).unwrap();
    config.limits.max_card_len = 64;
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = NotifyConfig::load(Some(path)).unwrap();
    assert_eq!(loaded.notify.log_level, "debug");
    assert_eq!(loaded.limits, config.limits);
    assert_eq!(loaded.features, config.features);
    assert_eq!(loaded.devices, config.devices);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.toml");
    assert!(NotifyConfig::load(Some(path)).is_err());
}

#[test]
fn test_load_invalid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("notify.toml");
    fs::write(&path, "[features]\nhw_param = \"yes\"\n").unwrap();

    let err = NotifyConfig::load(Some(path)).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_load_config_plain_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("notify.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_config(path.to_str().unwrap()).unwrap();
    assert_eq!(config.devices.len(), 2);
}

#[test]
fn test_default_path() {
    let path = NotifyConfig::default_path();
    assert!(path.ends_with("usb-notify/notify.toml"));
}
