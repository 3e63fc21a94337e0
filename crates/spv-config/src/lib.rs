//! # spv-config
//!
//! Runtime settings, read from `SPV_*` environment variables (a `.env` file
//! is honoured) on top of built-in defaults.

use config::{Config, Environment};
use serde::Deserialize;
use spv_core::catalog::ViewsSort;
use spv_core::models::Period;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Key of the views option in the sort dropdown
    pub sort_key: String,
    pub sort_label: String,
    /// View counter aggregation window to rank by
    pub period: Period,
    pub page_size: i64,
}

impl Settings {
    pub const ENV_PREFIX: &'static str = "SPV";

    /// Loads `.env` (if any), then the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("ignoring unreadable .env file: {e}");
            }
        }
        Self::from_env(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
    }

    /// Builds settings from an explicit environment source.
    pub fn from_env(env: Environment) -> Result<Self, SettingsError> {
        let settings: Self = Config::builder()
            .set_default("database_url", "sqlite:catalog.db")?
            .set_default("bind_host", "127.0.0.1")?
            .set_default("bind_port", 8080)?
            .set_default("sort_key", ViewsSort::DEFAULT_KEY)?
            .set_default("sort_label", "Sort by most viewed")?
            .set_default("period", Period::TOTAL)?
            .set_default("page_size", 24)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.sort_key.trim().is_empty() {
            return Err(SettingsError::Invalid("sort_key", "must not be empty".into()));
        }
        if self.page_size < 1 {
            return Err(SettingsError::Invalid(
                "page_size",
                format!("must be positive, got {}", self.page_size),
            ));
        }
        Ok(())
    }

    pub fn views_sort(&self) -> ViewsSort {
        ViewsSort::new(
            self.sort_key.clone(),
            self.sort_label.clone(),
            self.period.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(Settings::ENV_PREFIX)
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = Settings::from_env(env(&[])).unwrap();

        assert_eq!(settings.database_url, "sqlite:catalog.db");
        assert_eq!(settings.bind_port, 8080);
        assert_eq!(settings.sort_key, "views");
        assert_eq!(settings.period, Period::total());
        assert_eq!(settings.page_size, 24);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_env(env(&[
            ("SPV_PERIOD", "202402"),
            ("SPV_BIND_PORT", "9000"),
            ("SPV_SORT_LABEL", "Sorteren op meest bekeken"),
        ]))
        .unwrap();

        assert_eq!(settings.period.as_str(), "202402");
        assert_eq!(settings.bind_port, 9000);
        assert_eq!(settings.views_sort().period().as_str(), "202402");
    }

    #[test]
    fn unknown_period_is_rejected() {
        let err = Settings::from_env(env(&[("SPV_PERIOD", "total' OR '1'='1")])).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn non_positive_page_size_is_rejected() {
        let err = Settings::from_env(env(&[("SPV_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid("page_size", _)));
    }
}
