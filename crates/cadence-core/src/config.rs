use anyhow::Result;
use config::{Config, Source};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_PRODID, DEFAULT_TIMEZONE, DEFAULT_WINDOW_DAYS, DEFAULT_WINDOW_MULTIPLE,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub search: SearchConfig,
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
}

/// Bounds for first/last occurrence searches.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchConfig {
    /// Width of the initial search window in days.
    pub window_days: u32,
    /// How many times the window may double before giving up.
    pub window_multiple: u32,
}

impl SearchConfig {
    /// ## Summary
    /// Checks that both bounds are usable.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if either bound is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.window_days == 0 {
            return Err(CoreError::ConfigError(
                "search.window_days must be positive".to_string(),
            ));
        }
        if self.window_multiple == 0 {
            return Err(CoreError::ConfigError(
                "search.window_multiple must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            window_multiple: DEFAULT_WINDOW_MULTIPLE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    pub prodid: String,
    pub default_timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            prodid: DEFAULT_PRODID.to_string(),
            default_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from an optional `config.toml` and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the search bounds are unusable.
    pub fn load() -> Result<Self> {
        Self::load_from(
            config::File::with_name("config.toml").required(false),
            environment(),
        )
    }

    /// Layers `file` and then `env` over the defaults. Later sources win.
    fn load_from<F, E>(file: F, env: E) -> Result<Self>
    where
        F: Source + Send + Sync + 'static,
        E: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("search.window_days", i64::from(DEFAULT_WINDOW_DAYS))?
            .set_default("search.window_multiple", i64::from(DEFAULT_WINDOW_MULTIPLE))?
            .set_default("calendar.prodid", DEFAULT_PRODID)?
            .set_default("calendar.default_timezone", DEFAULT_TIMEZONE)?
            .set_default("logging.level", "info")?
            // TOML file
            .add_source(file)
            // Env, e.g. CADENCE_SEARCH__WINDOW_DAYS
            .add_source(env)
            .build()?
            .try_deserialize::<Settings>()?;

        settings.search.validate()?;

        Ok(settings)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("CADENCE")
        .prefix_separator("_")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
