use std::fmt;

use crate::error::ConfigError;

const DEFAULT_MONGO_URL: &str = "mongodb://localhost:27017";
const DEFAULT_DB_NAME: &str = "test_database";

/// Settings read from the environment (or a `.env` file) at startup.
#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub mongo_url: String,
    pub db_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = non_empty("DISCORD_BOT_TOKEN")
            .or_else(|| non_empty("DISCORD_TOKEN"))
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            discord_token,
            mongo_url: non_empty("MONGO_URL").unwrap_or_else(|| DEFAULT_MONGO_URL.to_string()),
            db_name: non_empty("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"***")
            .field("mongo_url", &self.mongo_url)
            .field("db_name", &self.db_name)
            .finish()
    }
}
