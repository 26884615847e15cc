use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

use portwatch::BrandSpec;

#[derive(Debug)]
pub enum Error {
    ReadFailed(()),
    WriteFailed(()),
    ParseFailed(()),
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub monitor: Monitor,
    #[serde(default)]
    pub brands: Vec<BrandSpec>,
    #[serde(default)]
    pub notify: Notify,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Monitor {
    /// Seconds between probe cycles.
    pub interval_seconds: u64,
    /// Per-probe TCP connect timeout, clamped by the engine to [1, 30].
    pub timeout_seconds: u64,
    /// Continuous-closed dwell before the external notifier fires.
    pub escalation_threshold_seconds: u64,
    /// Cadence of the local repeating alarm while a port stays closed.
    pub alarm_interval_seconds: u64,
}

/// Notification channel credentials. Every field is optional; a channel
/// with missing configuration degrades to logging instead of sending.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Notify {
    pub message_url: Option<String>,
    pub message_destination: Option<String>,
    pub email_url: Option<String>,
    pub email_from: Option<String>,
    #[serde(default)]
    pub email_recipients: Vec<String>,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/portwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("portwatch/config.toml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: Monitor {
                interval_seconds: 30,
                timeout_seconds: 5,
                escalation_threshold_seconds: 120,
                alarm_interval_seconds: 2,
            },
            brands: Vec::new(),
            notify: Notify::default(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Cycle Interval (s)", &self.monitor.interval_seconds)?;
        write_1(f, "Probe Timeout (s)", &self.monitor.timeout_seconds)?;
        write_1(f, "Escalation Threshold (s)", &self.monitor.escalation_threshold_seconds)?;
        write_1(f, "Alarm Interval (s)", &self.monitor.alarm_interval_seconds)?;
        write_title_1(f, "Brands")?;
        write_1(f, "Registered", &self.brands.len())?;
        write_title_1(f, "Notify")?;
        write_1(f, "Message Channel", &self.notify.message_url.is_some())?;
        write_1(f, "Email Channel", &self.notify.email_url.is_some())?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/portwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string =
                fs::read_to_string(&config_path).map_err(|_err| Error::ReadFailed(()))?;
            toml::from_str(raw_string.as_str()).map_err(|_err| Error::ParseFailed(()))
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|_err| Error::ParseFailed(()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_err| Error::WriteFailed(()))?;
        }

        std::fs::write(path, config_str).map_err(|_err| Error::WriteFailed(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::from_config(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.monitor.interval_seconds, 30);
        assert_eq!(config.monitor.escalation_threshold_seconds, 120);
        assert!(config.brands.is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_brands() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.brands.push(BrandSpec {
            name: "acme".to_string(),
            port: 443,
            primary_ip: "10.0.0.1".to_string(),
            secondary_ip: String::new(),
        });
        config.write_config(&path).unwrap();

        let loaded = Config::from_config(Some(&path)).unwrap();
        assert_eq!(loaded.brands.len(), 1);
        assert_eq!(loaded.brands[0].name, "acme");
        assert_eq!(loaded.brands[0].port, 443);
        assert!(loaded.brands[0].secondary_ip.is_empty());
    }

    #[test]
    fn test_parse_from_literal() {
        let raw = r#"
            [monitor]
            interval_seconds = 10
            timeout_seconds = 3
            escalation_threshold_seconds = 60
            alarm_interval_seconds = 2

            [[brands]]
            name = "globex"
            port = 8443
            primary_ip = "10.1.0.1"

            [notify]
            message_destination = "+15550100"
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.monitor.interval_seconds, 10);
        assert_eq!(config.brands[0].secondary_ip, "");
        assert_eq!(config.notify.message_destination.as_deref(), Some("+15550100"));
        assert!(config.notify.email_url.is_none());
    }
}
