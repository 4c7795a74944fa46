use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use which::which;

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV_VAR: &str = "PLUGFORGE_CONFIG";
/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "plugforge.toml";

pub const DEFAULT_TOOLCHAIN: &str = "go";
pub const DEFAULT_PLUGIN_PATH: &str = "./cmd/cli/plugin";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Toolchain '{name}' not found on PATH: {source}")]
    ToolchainNotFound {
        name: String,
        #[source]
        source: which::Error,
    },
}

/// Settings read from `plugforge.toml`
///
/// Every field is optional; command-line flags take precedence over the
/// file, and the file takes precedence over the built-in defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goprivate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<String>,
}

impl Config {
    /// Location of the config file.
    ///
    /// `PLUGFORGE_CONFIG` wins when set and non-empty, otherwise the
    /// platform config directory is used. `None` when neither is available.
    pub fn path() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir().map(|home| home.join(".config"));

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir();

        base.map(|dir| dir.join("plugforge").join(CONFIG_FILE_NAME))
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the toolchain program to an executable path.
    ///
    /// Values containing a path separator are used as given; bare names are
    /// looked up on `PATH`.
    pub fn resolve_toolchain(&self, flag: Option<&str>) -> Result<PathBuf, ConfigError> {
        let name = flag
            .or(self.toolchain.as_deref())
            .unwrap_or(DEFAULT_TOOLCHAIN);

        if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
            return Ok(PathBuf::from(name));
        }

        which(name).map_err(|source| ConfigError::ToolchainNotFound {
            name: name.to_string(),
            source,
        })
    }

    pub fn command_timeout(&self, flag: Option<u64>) -> Option<Duration> {
        flag.or(self.command_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn plugin_path(&self, flag: Option<&str>) -> PathBuf {
        PathBuf::from(
            flag.or(self.plugin_path.as_deref())
                .unwrap_or(DEFAULT_PLUGIN_PATH),
        )
    }

    pub fn artifacts_dir(&self, flag: Option<&str>) -> PathBuf {
        PathBuf::from(
            flag.or(self.artifacts_dir.as_deref())
                .unwrap_or(DEFAULT_ARTIFACTS_DIR),
        )
    }

    pub fn tags(&self, flag: Option<&str>) -> String {
        flag.or(self.tags.as_deref()).unwrap_or_default().to_string()
    }

    pub fn goprivate(&self, flag: Option<&str>) -> Option<String> {
        flag.or(self.goprivate.as_deref())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        let written = fs::write(
            &path,
            "toolchain = \"/opt/go/bin/go\"\ntags = \"netgo\"\ncommand_timeout_secs = 600\n",
        );
        assert!(written.is_ok());

        let config = Config::load_from(&path).unwrap_or_default();
        assert_eq!(config.toolchain.as_deref(), Some("/opt/go/bin/go"));
        assert_eq!(config.tags(None), "netgo");
        assert_eq!(config.command_timeout(None), Some(Duration::from_secs(600)));
        assert_eq!(config.goprivate(None), None);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        assert!(fs::write(&path, "toolchain = [").is_ok());

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_flags_override_file_values() {
        let config = Config {
            tags: Some("netgo".to_string()),
            artifacts_dir: Some("out".to_string()),
            command_timeout_secs: Some(30),
            ..Default::default()
        };

        assert_eq!(config.tags(Some("osusergo")), "osusergo");
        assert_eq!(config.artifacts_dir(None), PathBuf::from("out"));
        assert_eq!(config.artifacts_dir(Some("dist")), PathBuf::from("dist"));
        assert_eq!(
            config.plugin_path(None),
            PathBuf::from(DEFAULT_PLUGIN_PATH)
        );
        assert_eq!(config.command_timeout(Some(0)), None);
    }

    #[test]
    fn test_toolchain_path_used_verbatim() {
        let config = Config::default();
        let resolved = config.resolve_toolchain(Some("/usr/local/go/bin/go"));
        assert!(resolved.is_ok_and(|p| p == Path::new("/usr/local/go/bin/go")));
    }

    #[test]
    fn test_missing_toolchain_is_reported() {
        let config = Config {
            toolchain: Some("plugforge-no-such-compiler".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_toolchain(None),
            Err(ConfigError::ToolchainNotFound { .. })
        ));
    }
}
