use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DISCORD_BOT_TOKEN not found in environment variables")]
    MissingToken,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    // Only the in-memory store used by the tests produces this
    #[cfg(test)]
    #[error("write rejected: {0}")]
    Rejected(&'static str),
}
