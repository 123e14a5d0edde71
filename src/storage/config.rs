use crate::mapping::MappingConfig;
use crate::storage::directory::{CrmUser, DisabledCalendarRegistry};
use crate::sync::graph_api::DEFAULT_GRAPH_BASE_URL;
use crate::sync::graph_auth::CalendarAccount;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("Invalid application URL: {0}")]
    InvalidAppUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub app: AppConfig,
    pub format: FormatConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub accounts: Vec<CalendarAccount>,
    #[serde(default)]
    pub users: Vec<CrmUser>,
    #[serde(default)]
    pub calendars: CalendarsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Base URL of the CRM, used to build and recognise record deep-links.
    pub url: String,
    /// IANA name of the timezone events are displayed and submitted in.
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// chrono format strings matching what the CRM front end submits and displays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatConfig {
    pub date: String,
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    pub base_url: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalendarsConfig {
    #[serde(default)]
    pub disabled: DisabledCalendarRegistry,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("graph-cal-bridge")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn mapping(&self) -> Result<MappingConfig, ConfigError> {
        let timezone: Tz = self
            .app
            .timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.app.timezone.clone()))?;

        let app_url = self.app.url.trim().trim_end_matches('/');
        if !(app_url.starts_with("http://") || app_url.starts_with("https://")) {
            return Err(ConfigError::InvalidAppUrl(self.app.url.clone()));
        }

        Ok(MappingConfig {
            app_url: app_url.to_string(),
            domain: self.app.domain.clone(),
            timezone,
            date_format: self.format.date.clone(),
            datetime_format: self.format.datetime.clone(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                url: "http://localhost".to_string(),
                timezone: "UTC".to_string(),
                domain: None,
            },
            format: FormatConfig {
                date: "%d/%m/%Y".to_string(),
                datetime: "%d/%m/%Y %H:%M".to_string(),
            },
            graph: GraphConfig::default(),
            accounts: Vec::new(),
            users: Vec::new(),
            calendars: CalendarsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::directory::DisabledCalendars;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
        [app]
        url = "https://crm.example.com/"
        timezone = "Europe/Paris"
        domain = "3"

        [format]
        date = "%d/%m/%Y"
        datetime = "%d/%m/%Y %H:%M"

        [graph]
        base_url = "http://localhost:9000"

        [[accounts]]
        id = "1"
        username = "jane@contoso.com"
        user_id = "7"
        token_cache = "/tmp/token-1.json"

        [[users]]
        username = "jane@contoso.com"
        name = "Jane Doe"
        image = "storage/avatars/jane.png"

        [calendars.disabled]
        "1" = ["cal-2", "cal-3"]
    "#;

    #[test]
    fn default_config_uses_utc() {
        let config = Config::default();
        assert_eq!(config.app.timezone, "UTC");
        assert_eq!(config.graph.base_url, DEFAULT_GRAPH_BASE_URL);
    }

    #[test]
    fn parse_valid_toml_config() {
        let config = Config::from_toml(FULL_CONFIG).unwrap();

        assert_eq!(config.app.domain.as_deref(), Some("3"));
        assert_eq!(config.graph.base_url, "http://localhost:9000");
        assert_eq!(config.accounts[0].user_id, "7");
        assert_eq!(config.users[0].name, "Jane Doe");
        assert_eq!(
            config.calendars.disabled.disabled_calendars("1"),
            vec!["cal-2", "cal-3"]
        );
    }

    #[test]
    fn minimal_config_defaults_optional_sections() {
        let config = Config::from_toml(
            r#"
            [app]
            url = "https://crm.example.com"
            timezone = "UTC"

            [format]
            date = "%Y-%m-%d"
            datetime = "%Y-%m-%d %H:%M"
            "#,
        )
        .unwrap();

        assert!(config.accounts.is_empty());
        assert!(config.calendars.disabled.disabled_calendars("1").is_empty());
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = Config::from_toml("this is not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn mapping_parses_timezone_and_trims_url() {
        let mapping = Config::from_toml(FULL_CONFIG).unwrap().mapping().unwrap();

        assert_eq!(mapping.timezone, chrono_tz::Europe::Paris);
        assert_eq!(mapping.app_url, "https://crm.example.com");
    }

    #[test]
    fn mapping_rejects_unknown_timezone() {
        let mut config = Config::default();
        config.app.timezone = "Mars/Olympus".to_string();

        assert!(matches!(config.mapping(), Err(ConfigError::InvalidTimezone(_))));
    }

    #[test]
    fn mapping_rejects_relative_app_url() {
        let mut config = Config::default();
        config.app.url = "crm.example.com".to_string();

        assert!(matches!(config.mapping(), Err(ConfigError::InvalidAppUrl(_))));
    }

    #[test]
    fn saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let config = Config::from_toml(FULL_CONFIG).unwrap();

        config.save_to(&path).unwrap();
        let loaded = Config::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(loaded, config);
    }
}
