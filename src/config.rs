use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sources: SourcesConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub svg: SvgConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub format: String,
    pub continuous: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 2000,
            format: "text".to_string(),
            continuous: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub stat_path: PathBuf,
    pub meminfo_path: PathBuf,
    pub gpu_enabled: bool,
    pub gpu_command: String,
    pub max_gpus: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            stat_path: PathBuf::from("/proc/stat"),
            meminfo_path: PathBuf::from("/proc/meminfo"),
            gpu_enabled: true,
            gpu_command: "nvidia-smi".to_string(),
            max_gpus: 8,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,
    /// Defaults to the platform's shared memory directory.
    pub region_dir: Option<PathBuf>,
    pub region_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            enabled: true,
            region_dir: None,
            region_prefix: "coremon_shmem".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            json: false,
            file: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    pub width: u32,
    pub bar_height: u32,
}

impl Default for SvgConfig {
    fn default() -> Self {
        SvgConfig {
            width: 290,
            bar_height: 12,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("coremon").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.refresh_rate_ms, 2000);
        assert_eq!(config.general.format, "text");
        assert!(!config.general.continuous);
        assert_eq!(config.sources.stat_path, PathBuf::from("/proc/stat"));
        assert_eq!(config.sources.gpu_command, "nvidia-smi");
        assert_eq!(config.sources.max_gpus, 8);
        assert!(config.store.enabled);
        assert_eq!(config.store.region_prefix, "coremon_shmem");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[general]
refresh_rate_ms = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.refresh_rate_ms, 500);
        // Other fields should be defaults
        assert_eq!(config.general.format, "text");
        assert!(config.sources.gpu_enabled);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
refresh_rate_ms = 1000
format = "svg"
continuous = true

[sources]
stat_path = "/tmp/stat"
gpu_enabled = false
max_gpus = 2

[store]
enabled = false
region_dir = "/run/user/1000"
region_prefix = "mon"

[logging]
level = "debug"
json = true
file = "/tmp/coremon.log"

[svg]
width = 400
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.refresh_rate_ms, 1000);
        assert_eq!(config.general.format, "svg");
        assert!(config.general.continuous);
        assert_eq!(config.sources.stat_path, PathBuf::from("/tmp/stat"));
        assert_eq!(config.sources.meminfo_path, PathBuf::from("/proc/meminfo"));
        assert!(!config.sources.gpu_enabled);
        assert_eq!(config.sources.max_gpus, 2);
        assert!(!config.store.enabled);
        assert_eq!(
            config.store.region_dir,
            Some(PathBuf::from("/run/user/1000"))
        );
        assert_eq!(config.store.region_prefix, "mon");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.svg.width, 400);
        assert_eq!(config.svg.bar_height, 12);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.refresh_rate_ms, 2000);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("coremon_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.general.refresh_rate_ms, 2000);
        let _ = std::fs::remove_file(&temp);
    }
}
