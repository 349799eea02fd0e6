//! Notify configuration management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub notify: NotifySettings,
    /// Per-attribute input bounds
    #[serde(default)]
    pub limits: Limits,
    /// Build-time feature switches of the driver
    #[serde(default)]
    pub features: Features,
    /// Devices registered by the command-line harness
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    #[serde(default = "NotifySettings::default_log_level")]
    pub log_level: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl NotifySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Input bounds, in bytes unless noted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// `disable` write limit
    pub max_disable_len: usize,
    /// `whitelist_for_mdm` write limit
    pub max_whitelist_len: usize,
    /// `whitelist_for_mdm` write limit for the `VPID:` form
    pub max_allowlist_len: usize,
    /// VID:PID allowlist capacity, in pairs
    pub max_allowlist_entries: usize,
    /// `usb_maximum_speed` write limit
    pub max_speed_len: usize,
    /// `usb_hw_param` write limit
    pub max_hwparam_len: usize,
    /// Ceiling for each value of a counter bulk add
    pub hwparam_data_limit: u64,
    /// `cards` rendering limit
    pub max_card_len: usize,
    /// Number of USB audio card slots
    pub max_audio_cards: usize,
    /// Limit for the remaining writable attributes
    pub page_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_disable_len: 32,
            max_whitelist_len: 256,
            max_allowlist_len: 1024,
            max_allowlist_entries: 100,
            max_speed_len: 15,
            max_hwparam_len: 2048,
            hwparam_data_limit: 10_000_000_000_000_000,
            max_card_len: 256,
            max_audio_cards: 8,
            page_size: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Expose `usb_hw_param` and `hw_param`
    pub hw_param: bool,
    /// VID:PID allowlist and the first-restriction latch
    pub lockscreen_restriction: bool,
    /// Host notify support; without it `support` reports `CLIENT`
    pub host_notify: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            hw_param: true,
            lockscreen_restriction: true,
            host_notify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    /// Whether the simulated controller can act as host
    #[serde(default = "DeviceEntry::default_host_supported")]
    pub host_supported: bool,
}

impl DeviceEntry {
    fn default_host_supported() -> bool {
        true
    }
}

impl NotifyConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/usb-notify/notify.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: NotifyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usb-notify").join("notify.toml")
        } else {
            PathBuf::from(".config/usb-notify/notify.toml")
        }
    }

    /// Devices to register, falling back to a single `usb_control`
    pub fn device_entries(&self) -> Vec<DeviceEntry> {
        if self.devices.is_empty() {
            vec![DeviceEntry {
                name: "usb_control".to_string(),
                host_supported: true,
            }]
        } else {
            self.devices.clone()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.notify.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.notify.log_level,
                valid_levels.join(", ")
            ));
        }

        let limits = &self.limits;
        let sizes = [
            ("max_disable_len", limits.max_disable_len),
            ("max_whitelist_len", limits.max_whitelist_len),
            ("max_allowlist_len", limits.max_allowlist_len),
            ("max_allowlist_entries", limits.max_allowlist_entries),
            ("max_speed_len", limits.max_speed_len),
            ("max_hwparam_len", limits.max_hwparam_len),
            ("max_card_len", limits.max_card_len),
            ("page_size", limits.page_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(anyhow!("Limit '{}' must be greater than 0", name));
        }
        if limits.max_whitelist_len < 3 {
            return Err(anyhow!("Limit 'max_whitelist_len' must be at least 3"));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                return Err(anyhow!("Empty device name in devices list"));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(anyhow!("Duplicate device name '{}'", device.name));
            }
        }

        Ok(())
    }
}

/// Load a configuration file given as a shell-style path (`~` expanded)
pub fn load_config(path: &str) -> Result<NotifyConfig> {
    let path_buf = PathBuf::from(shellexpand::tilde(path).as_ref());
    NotifyConfig::load(Some(path_buf))
}
