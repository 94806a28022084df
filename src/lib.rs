#[macro_use]
extern crate rocket;

use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{Config, Storage};
use crate::data::store::{MemoryStore, MongoStore, Store};
use crate::error::{BackendError, ConfigurationError};
use crate::route::mount_api;
use crate::security::Security;

pub mod config;
pub mod data;
pub mod error;
pub mod middleware;
pub mod permission;
pub mod resp;
pub mod route;
pub mod security;
pub mod util;

#[cfg(test)]
mod testing;

fn init_logging(level: Level) {
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Unable to forward log records: {}", err);
    }

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global logger: {}", err);
    };
}

/// Reads the environment and configuration, connects the document store and
/// builds the server.
pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    if let Some(l) = log_level {
        init_logging(l);
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    tracing::info!("Initializing security information...");
    let security = Security::load()?;

    let store = match c.storage {
        Storage::MongoDb => Store::new(MongoStore::connect(&c.mongodb_uri, &c.mongodb_db).await?),
        Storage::Memory => {
            tracing::warn!("Using in-memory storage. Documents won't survive a restart.");
            Store::new(MemoryStore::new())
        }
    };

    build(c, store, security)
}

/// Assembles the server around an already connected store.
pub fn build(c: Config, store: Store, security: Security) -> Result<Rocket<Build>, BackendError> {
    tracing::info!("Starting HTTP server...");
    let prefix = c.api_prefix.clone();
    let mut r = rocket::build().manage(c).manage(store).manage(security);

    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::All,
        allowed_methods: vec![Method::Get, Method::Put, Method::Post, Method::Delete]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    r = r.attach(cors);

    tracing::info!("Mounting API under '{}'...", prefix);
    r = mount_api(r, &prefix);

    Ok(r)
}
