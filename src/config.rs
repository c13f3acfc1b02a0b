use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::estimator::EmissionParams;
use crate::history::store::DEFAULT_CAPACITY;
use crate::{CarbonpostError, Result};

/// Top-level `carbonpost.toml` layout. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub estimator: EmissionParams,
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Retention bound: at most this many entries are kept.
    pub capacity: usize,

    /// Optional JSON-lines file the retained window is flushed to.
    pub file: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.thegreenwebfoundation.org/greencheck".to_string(),
            timeout_secs: 5,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history.capacity == 0 {
            return Err(CarbonpostError::Config(
                "history.capacity must be at least 1".to_string(),
            ));
        }
        self.estimator.validate()
    }
}

/// Config file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Config file name
    const CONFIG_FILE: &'static str = "carbonpost.toml";

    /// Load a config file from an explicit path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| CarbonpostError::Config(format!("failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Find and load a config file.
    /// Search order:
    /// 1. Current directory, then parent directories
    /// 2. User config directory ~/.config/carbonpost/
    pub fn find_and_load() -> Option<AppConfig> {
        if let Some(config) = Self::try_load_from_current_dir() {
            return Some(config);
        }

        if let Some(config) = Self::try_load_from_user_dir() {
            return Some(config);
        }

        None
    }

    fn try_load_from_current_dir() -> Option<AppConfig> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Self::load_from_path(&config_path).ok();
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    fn try_load_from_user_dir() -> Option<AppConfig> {
        let home = dirs::home_dir()?;
        let config_path = home
            .join(".config")
            .join("carbonpost")
            .join(Self::CONFIG_FILE);

        if config_path.exists() {
            Self::load_from_path(&config_path).ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.history.capacity, 50);
        assert!(config.history.file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_path() {
        let config_content = r#"
[server]
bind = "0.0.0.0:8080"

[history]
capacity = 100
file = "/tmp/carbonpost-history.jsonl"

[estimator]
grid_intensity = 389.0

[resolver]
timeout_secs = 2
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = ConfigLoader::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.history.capacity, 100);
        assert_eq!(config.estimator.grid_intensity, 389.0);
        // Untouched sections keep their defaults.
        assert_eq!(config.estimator.data_reload_ratio, 0.02);
        assert_eq!(config.resolver.timeout_secs, 2);
    }

    #[test]
    fn test_load_rejects_invalid_estimator() {
        let config_content = r#"
[estimator]
first_visit_percentage = 0.9
return_visit_percentage = 0.9
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(ConfigLoader::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_zero_capacity() {
        let config_content = r#"
[history]
capacity = 0
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(ConfigLoader::load_from_path(temp_file.path()).is_err());
    }
}
