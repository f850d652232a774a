use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "propbook.toml";
pub const DEFAULT_DATA_FILE: &str = "data/propbook.json";
pub const DEFAULT_HISTORY_FILE: &str = "data/history.json";
pub const DEFAULT_EXPORT_DIR: &str = "data/exports";
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("unable to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "CONFIG_INVALID"
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    data_file: Option<PathBuf>,
    history_file: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    history_limit: Option<usize>,
}

/// Resolved settings. Every path is already joined onto the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub data_file: PathBuf,
    pub history_file: PathBuf,
    pub export_dir: PathBuf,
    pub history_limit: usize,
}

impl Config {
    pub fn defaults(root: &Path) -> Self {
        Self::normalize(root, RawConfig::default())
    }

    /// Reads `config_path`, or `<root>/propbook.toml` when none is given.
    /// Only the implicit default location may be absent.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => root.join(path),
            None => root.join(CONFIG_FILE_NAME),
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if config_path.is_some() {
                    return Err(ConfigError::Missing(path));
                }
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::defaults(root));
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::from_toml(root, &raw).map_err(|err| match err {
            ConfigError::Toml { source, .. } => ConfigError::Toml { path, source },
            other => other,
        })
    }

    pub fn from_toml(root: &Path, raw: &str) -> Result<Self, ConfigError> {
        let parsed: RawConfig = toml::from_str(raw).map_err(|source| ConfigError::Toml {
            path: PathBuf::from(CONFIG_FILE_NAME),
            source,
        })?;
        if parsed.history_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(Self::normalize(root, parsed))
    }

    pub fn with_data_file(mut self, root: &Path, data_file: Option<&Path>) -> Self {
        if let Some(path) = data_file {
            self.data_file = root.join(path);
        }
        self
    }

    fn normalize(root: &Path, raw: RawConfig) -> Self {
        let resolve = |value: Option<PathBuf>, default: &str| match value {
            Some(path) => root.join(path),
            None => root.join(default),
        };
        Self {
            data_file: resolve(raw.data_file, DEFAULT_DATA_FILE),
            history_file: resolve(raw.history_file, DEFAULT_HISTORY_FILE),
            export_dir: resolve(raw.export_dir, DEFAULT_EXPORT_DIR),
            history_limit: raw.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn unique_workspace() -> PathBuf {
        let root = std::env::temp_dir().join(format!("propbook-config-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("workspace should be creatable");
        root
    }

    #[test]
    fn defaults_resolve_under_root() {
        let config = Config::defaults(Path::new("/srv/book"));
        assert_eq!(config.data_file, PathBuf::from("/srv/book/data/propbook.json"));
        assert_eq!(config.history_file, PathBuf::from("/srv/book/data/history.json"));
        assert_eq!(config.export_dir, PathBuf::from("/srv/book/data/exports"));
        assert_eq!(config.history_limit, 200);
    }

    #[test]
    fn toml_values_override_defaults_and_absolute_paths_stay_put() {
        let config = Config::from_toml(
            Path::new("/srv/book"),
            "data_file = \"book.json\"\nexport_dir = \"/tmp/out\"\nhistory_limit = 5\n",
        )
        .expect("config should parse");
        assert_eq!(config.data_file, PathBuf::from("/srv/book/book.json"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.history_file, PathBuf::from("/srv/book/data/history.json"));
    }

    #[test]
    fn unknown_keys_and_zero_limit_are_rejected() {
        let err = Config::from_toml(Path::new("."), "datafile = \"x\"\n")
            .expect_err("typo should be rejected");
        assert!(err.to_string().contains("unknown field"));
        assert!(matches!(
            Config::from_toml(Path::new("."), "history_limit = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn data_flag_overrides_config() {
        let config = Config::defaults(Path::new("/srv/book"))
            .with_data_file(Path::new("/srv/book"), Some(Path::new("other.json")));
        assert_eq!(config.data_file, PathBuf::from("/srv/book/other.json"));
    }

    #[test]
    fn load_reads_default_location_and_tolerates_absence() {
        let root = unique_workspace();
        assert_eq!(
            Config::load(&root, None).expect("absent config"),
            Config::defaults(&root)
        );

        std::fs::write(root.join(CONFIG_FILE_NAME), "history_limit = 3\n")
            .expect("config should be writable");
        assert_eq!(Config::load(&root, None).expect("config").history_limit, 3);

        let err = Config::load(&root, Some(Path::new("missing.toml")))
            .expect_err("explicit config must exist");
        assert!(matches!(err, ConfigError::Missing(_)));

        std::fs::write(root.join("broken.toml"), "history_limit = \"many\"\n")
            .expect("config should be writable");
        let err = Config::load(&root, Some(Path::new("broken.toml")))
            .expect_err("wrong type");
        assert!(err.to_string().contains("broken.toml"));

        let _ = std::fs::remove_dir_all(root);
    }
}
