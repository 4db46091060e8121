use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_target")]
    pub probe_target: String,
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub public_ip: PublicIpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertsConfig {
    #[serde(default = "default_alerts_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ram_threshold_bytes")]
    pub ram_threshold_bytes: u64,
    #[serde(default = "default_disk_threshold_bytes")]
    pub disk_threshold_bytes: u64,
    /// 0 re-fires the alert on every tick while the condition holds.
    #[serde(default)]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicIpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_public_ip_url")]
    pub url: String,
    #[serde(default = "default_public_ip_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_public_ip_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            probe_target: default_probe_target(),
            disk_mount: default_disk_mount(),
            alerts: AlertsConfig::default(),
            public_ip: PublicIpConfig::default(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: default_alerts_enabled(),
            ram_threshold_bytes: default_ram_threshold_bytes(),
            disk_threshold_bytes: default_disk_threshold_bytes(),
            cooldown_secs: 0,
        }
    }
}

impl Default for PublicIpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_public_ip_url(),
            timeout_ms: default_public_ip_timeout_ms(),
            refresh_secs: default_public_ip_refresh_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs < 1 {
            return Err(ConfigError::Validation(
                "interval_secs должно быть >= 1".to_string(),
            ));
        }
        self.probe_addr()?;
        if self.disk_mount.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле disk_mount не должно быть пустым".to_string(),
            ));
        }

        validate_public_ip(&self.public_ip)?;

        Ok(())
    }

    pub fn probe_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = SocketAddr::from_str(self.probe_target.trim()).map_err(|_| {
            ConfigError::Validation(
                "поле probe_target должно быть корректным адресом host:port".to_string(),
            )
        })?;
        if !addr.is_ipv4() {
            return Err(ConfigError::Validation(
                "поле probe_target должно быть IPv4-адресом".to_string(),
            ));
        }
        Ok(addr)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_public_ip(cfg: &PublicIpConfig) -> Result<(), ConfigError> {
    if !cfg.enabled {
        return Ok(());
    }
    if cfg.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "public_ip.url не должен быть пустым".to_string(),
        ));
    }
    if cfg.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "public_ip.timeout_ms должен быть > 0".to_string(),
        ));
    }
    if cfg.refresh_secs < 1 {
        return Err(ConfigError::Validation(
            "public_ip.refresh_secs должно быть >= 1".to_string(),
        ));
    }
    Ok(())
}

const fn default_interval_secs() -> u64 {
    5
}

fn default_probe_target() -> String {
    "8.8.8.8:80".to_string()
}

#[cfg(target_os = "windows")]
fn default_disk_mount() -> String {
    "C:\\".to_string()
}

#[cfg(not(target_os = "windows"))]
fn default_disk_mount() -> String {
    "/".to_string()
}

const fn default_alerts_enabled() -> bool {
    true
}

const fn default_ram_threshold_bytes() -> u64 {
    GIB
}

const fn default_disk_threshold_bytes() -> u64 {
    5 * GIB
}

fn default_public_ip_url() -> String {
    "https://api.ipify.org".to_string()
}

const fn default_public_ip_timeout_ms() -> u64 {
    5000
}

const fn default_public_ip_refresh_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("конфигурация по умолчанию должна быть валидной");
        assert_eq!(cfg.interval_secs, 5);
        assert_eq!(cfg.alerts.ram_threshold_bytes, GIB);
        assert_eq!(cfg.alerts.disk_threshold_bytes, 5 * GIB);
        assert_eq!(cfg.alerts.cooldown_secs, 0);
        assert!(!cfg.public_ip.enabled);
    }

    #[test]
    fn example_yaml_parses_and_validates() {
        let cfg: Config =
            serde_yaml::from_str(Config::example_yaml()).expect("пример должен разбираться");
        cfg.validate().expect("пример должен проходить валидацию");
        assert_eq!(cfg.probe_target, "8.8.8.8:80");
    }

    #[test]
    fn empty_document_falls_back_to_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").expect("пустой YAML");
        assert_eq!(cfg.interval_secs, 5);
        assert!(cfg.alerts.enabled);
    }

    #[test]
    fn rejects_zero_interval() {
        let cfg = Config {
            interval_secs: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_bad_probe_target() {
        let cfg = Config {
            probe_target: "dns.google".to_string(),
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_ipv6_probe_target() {
        let cfg = Config {
            probe_target: "[2001:db8::1]:80".to_string(),
            ..Config::default()
        };
        assert!(matches!(cfg.probe_addr(), Err(ConfigError::Validation(_))));
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn public_ip_checked_only_when_enabled() {
        let mut cfg = Config::default();
        cfg.public_ip.url = String::new();
        cfg.validate().expect("выключенный public_ip не проверяется");

        cfg.public_ip.enabled = true;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = Config::load_from_file("/nonexistent/hostwatch.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
