use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;

/// Where the HTTP surface listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_string(), port: DEFAULT_PORT }
    }
}

/// How the upstream provider is reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [server]
/// port = 5001
///
/// [upstream]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Provider API key. Never defaulted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

/// Immutable settings handed to the relay at startup.
#[derive(Clone)]
pub struct RelaySettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path, or defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-relay", "weather-relay")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay values from an arbitrary variable lookup. Blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get("WEATHER_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port =
                port.parse().with_context(|| format!("PORT must be a port number, got '{port}'"))?;
        }
        if let Some(url) = get("WEATHER_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(secs) = get("WEATHER_TIMEOUT_SECS") {
            self.upstream.timeout_secs = secs.parse().with_context(|| {
                format!("WEATHER_TIMEOUT_SECS must be a whole number of seconds, got '{secs}'")
            })?;
        }

        Ok(())
    }

    /// Convenience helper: set/replace the provider API key.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Freeze the upstream part of the config into the value the relay is built from.
    pub fn relay_settings(&self) -> Result<RelaySettings> {
        let api_key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()).ok_or_else(
            || {
                anyhow!(
                    "No weather provider API key configured.\n\
                     Hint: run `weather-relay configure` or set WEATHER_API_KEY."
                )
            },
        )?;

        if self.upstream.timeout_secs == 0 {
            return Err(anyhow!("upstream.timeout_secs must be greater than zero"));
        }

        let base_url = self.upstream.base_url.trim_end_matches('/');
        reqwest::Url::parse(base_url)
            .with_context(|| format!("upstream.base_url is not a valid URL: '{base_url}'"))?;

        Ok(RelaySettings {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(self.upstream.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_have_no_api_key() {
        let cfg = Config::default();

        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.server.port, 5001);
        assert_eq!(cfg.upstream.timeout_secs, 10);
        assert_eq!(cfg.upstream.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn relay_settings_errors_when_api_key_missing() {
        let err = Config::default().relay_settings().unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("No weather provider API key configured"));
        assert!(msg.contains("Hint: run `weather-relay configure`"));
    }

    #[test]
    fn relay_settings_rejects_blank_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(cfg.relay_settings().is_err());
    }

    #[test]
    fn relay_settings_trims_base_url() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.upstream.base_url = "http://localhost:9000/data/2.5/".into();

        let settings = cfg.relay_settings().expect("settings must build");
        assert_eq!(settings.api_key, "KEY");
        assert_eq!(settings.base_url, "http://localhost:9000/data/2.5");
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn relay_settings_rejects_malformed_base_url() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.upstream.base_url = "not a url".into();

        let err = cfg.relay_settings().unwrap_err();
        assert!(err.to_string().contains("upstream.base_url is not a valid URL"));
    }

    #[test]
    fn relay_settings_debug_redacts_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("SECRET".into());

        let rendered = format!("{:?}", cfg.relay_settings().unwrap());
        assert!(!rendered.contains("SECRET"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.set_api_key("FROM_FILE".into());

        cfg.apply_env_with(env(&[
            ("WEATHER_API_KEY", "FROM_ENV"),
            ("PORT", "8080"),
            ("WEATHER_TIMEOUT_SECS", "3"),
            ("HOST", ""),
        ]))
        .expect("env must apply");

        assert_eq!(cfg.api_key.as_deref(), Some("FROM_ENV"));
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, DEFAULT_HOST);
        assert_eq!(cfg.upstream.timeout_secs, 3);
    }

    #[test]
    fn env_rejects_bad_port() {
        let mut cfg = Config::default();
        let err = cfg.apply_env_with(env(&[("PORT", "fifty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.server.port = 6000;
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[server]\nport = 7000\n").expect("parse");
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.server.host, DEFAULT_HOST);
        assert_eq!(cfg.upstream, UpstreamConfig::default());
        assert!(cfg.api_key.is_none());
    }
}
