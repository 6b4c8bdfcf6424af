use serenity::Client;
use serenity::all::GatewayIntents;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handler;
mod model;
mod store;
mod text_tracker;
mod voice_tracker;

use crate::config::Config;
use crate::handler::ActivityHandler;
use crate::store::MongoStore;

// Dependencies only get to speak up on warnings
const DEFAULT_LOG_FILTER: &str = "info,serenity=warn,mongodb=warn";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("starting activity bot");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "cannot start activity bot");
            return;
        }
    };

    let store = match MongoStore::connect(&config.mongo_url, &config.db_name).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!(error = %err, db = %config.db_name, "cannot open activity database");
            return;
        }
    };

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES | GatewayIntents::GUILD_MESSAGES;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(ActivityHandler::new(store))
        .await
    {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to create client");
            return;
        }
    };

    if let Err(why) = client.start().await {
        error!(error = ?why, "client error");
    }
}
