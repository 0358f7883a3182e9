//! Console client for a customer record service.
//!
//! The `data` feature exposes the domain model and forms only; `client` adds
//! the HTTP repository, the push-channel listener, the list controller and
//! the console front end.

pub mod domain;
pub mod forms;
pub mod models;

#[cfg(feature = "client")]
pub mod console;
#[cfg(feature = "client")]
pub mod notifications;
#[cfg(feature = "client")]
pub mod pagination;
#[cfg(feature = "client")]
pub mod repository;
#[cfg(feature = "client")]
pub mod services;

#[cfg(feature = "client")]
use crate::models::config::ClientConfig;

/// Loads settings from `config/default.yaml`, the `config/{APP_ENV}` profile
/// (defaults to `local`) and `APP_*` environment variables, in that order.
#[cfg(feature = "client")]
pub fn load_config() -> Result<ClientConfig, config::ConfigError> {
    let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    config::Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build()?
        .try_deserialize::<ClientConfig>()
}
