use crate::{ConfigError, CoreError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const SETTINGS_ENV: &str = "REDDITLENS_SETTINGS";
pub const CONFIG_PATH_ENV: &str = "REDDITLENS_CONFIG";

const MAX_STALE_HOURS: u64 = 100 * 365 * 24;

/// Settings of the status tooling itself, as opposed to the pipeline
/// configuration file it manages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub config_path: PathBuf,
    pub data_dirs: Vec<PathBuf>,
    pub warehouse_table: String,
    pub request_timeout_secs: u64,
    pub stale_after_hours: u64,
    pub user_agent: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("airflow/extraction/configuration.conf"),
            data_dirs: vec![PathBuf::from("/tmp"), PathBuf::from("airflow/extraction")],
            warehouse_table: "reddit".to_string(),
            request_timeout_secs: 5,
            stale_after_hours: 24,
            user_agent: None,
        }
    }
}

impl AppSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let settings: AppSettings = toml::from_str(raw).map_err(ConfigError::from)?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::Config(ConfigError::Missing {
                    path: path.display().to_string(),
                })
            } else {
                CoreError::Io(e)
            }
        })?;
        debug!("Loaded settings from {}", path.display());
        Self::from_toml_str(&raw)
    }

    /// Reads the settings file named by `REDDITLENS_SETTINGS` (defaults when unset),
    /// then applies the `REDDITLENS_CONFIG` override.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => {
                info!("{} not set, using default settings", SETTINGS_ENV);
                Self::default()
            }
        };

        if let Some(config_path) = std::env::var_os(CONFIG_PATH_ENV) {
            settings.config_path = PathBuf::from(config_path);
        }
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Capped at a century; anything larger means "never stale" anyway.
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stale_after_hours.min(MAX_STALE_HOURS) as i64)
    }

    pub fn user_agent_for(&self, developer: &str) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            format!(
                "redditlens/{} by u/{}",
                env!("CARGO_PKG_VERSION"),
                if developer.is_empty() { "unknown" } else { developer }
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = AppSettings::from_toml_str(
            r#"
            warehouse_table = "reddit_posts"
            data_dirs = ["/data/extracts"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.warehouse_table, "reddit_posts");
        assert_eq!(settings.data_dirs, vec![PathBuf::from("/data/extracts")]);
        assert_eq!(settings.request_timeout_secs, 5);
        assert_eq!(settings.stale_after_hours, 24);
    }

    #[test]
    fn test_bad_settings_are_config_errors() {
        let result = AppSettings::from_toml_str("request_timeout_secs = \"soon\"");
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::Settings(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 0").unwrap();

        let settings = AppSettings::load(file.path()).unwrap();
        assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_settings_file() {
        let result = AppSettings::load(Path::new("/nonexistent/redditlens.toml"));
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::Missing { .. }))
        ));
    }

    #[test]
    fn test_huge_stale_after_is_capped() {
        let settings = AppSettings::from_toml_str(&format!("stale_after_hours = {}", i64::MAX)).unwrap();
        assert_eq!(
            settings.stale_after(),
            chrono::Duration::hours(MAX_STALE_HOURS as i64)
        );

        let settings = AppSettings::from_toml_str("stale_after_hours = 48").unwrap();
        assert_eq!(settings.stale_after(), chrono::Duration::hours(48));
    }

    #[test]
    fn test_user_agent() {
        let settings = AppSettings::default();
        assert!(settings.user_agent_for("alice").ends_with("by u/alice"));
        assert!(settings.user_agent_for("").ends_with("by u/unknown"));

        let custom = AppSettings {
            user_agent: Some("custom/1.0".to_string()),
            ..Default::default()
        };
        assert_eq!(custom.user_agent_for("alice"), "custom/1.0");
    }
}
