use std::{env, sync::Arc};

use colored::Colorize;
use eventbook_core::{CoreConfig, Eventbook, LogMailer, PgDatabase, RedisCache};
use eventbook_server::{run_server, ServerContext};
use log::{error, info};
use thiserror::Error;

mod logging;

#[derive(Debug, Error)]
enum StartError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(&'static str),
    #[error("Could not connect to database: {0}")]
    Database(String),
    #[error("Could not connect to cache: {0}")]
    Cache(String),
}

impl StartError {
    fn hint(&self) -> &'static str {
        match self {
            StartError::MissingVariable(_) => {
                "Set DATABASE_URL, REDIS_URL and EVENTBOOK_TOKEN_SECRET before starting."
            }
            StartError::Database(_) => {
                "Make sure the postgres instance is running and DATABASE_URL points at it."
            }
            StartError::Cache(_) => {
                "Make sure the redis instance is running and REDIS_URL points at it."
            }
        }
    }
}

fn required_var(name: &'static str) -> Result<String, StartError> {
    env::var(name).map_err(|_| StartError::MissingVariable(name))
}

async fn init() -> Result<ServerContext, StartError> {
    let database_url = required_var("DATABASE_URL")?;
    let redis_url = required_var("REDIS_URL")?;
    let token_secret = required_var("EVENTBOOK_TOKEN_SECRET")?;

    info!("Connecting to database...");
    let database = PgDatabase::new(&database_url)
        .await
        .map_err(|e| StartError::Database(e.to_string()))?;

    info!("Connecting to cache...");
    let cache = RedisCache::new(&redis_url)
        .await
        .map_err(|e| StartError::Cache(e.to_string()))?;

    let eventbook = Eventbook::new(
        CoreConfig { token_secret },
        database,
        Arc::new(cache),
        Arc::new(LogMailer),
    );

    Ok(ServerContext::new(Arc::new(eventbook)))
}

#[tokio::main]
async fn main() {
    logging::init_logger();

    match init().await {
        Ok(context) => {
            info!("Initialized successfully.");
            run_server(context).await;
        }
        Err(error) => {
            error!("{}", "Eventbook failed to start!".bold());
            error!("{}", error);
            error!("{}", format!("Hint: {}", error.hint()).italic());
        }
    }
}
