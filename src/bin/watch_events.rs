//! Worker that subscribes to the change topic and logs every classified event.
//! Useful for checking the push channel without the console client.

use std::sync::Arc;

use async_trait::async_trait;
use dotenvy::dotenv;

use crm_client::notifications::{self, ChangeEvent, ChangeHandler, EventKind, ListenerConfig};

struct LogEvents;

#[async_trait]
impl ChangeHandler for LogEvents {
    async fn on_change(&self, event: ChangeEvent) {
        match event.kind {
            EventKind::Added => log::info!("Record added ({:?})", event.name),
            EventKind::Updated => log::info!("Record updated ({:?})", event.name),
            EventKind::Deleted => log::info!("Record deleted ({:?})", event.name),
            EventKind::Unrecognized => log::warn!("Unrecognized event {:?}", event.name),
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let client_config = match crm_client::load_config() {
        Ok(client_config) => client_config,
        Err(err) => {
            log::error!("Error loading client config: {err}");
            std::process::exit(1);
        }
    };

    let listener_config = ListenerConfig::from(&client_config);
    log::info!(
        "Watching {} on {}",
        listener_config.topic,
        listener_config.url
    );

    let listener = notifications::spawn(listener_config, Arc::new(LogEvents));
    let mut channel = listener.subscribe();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::error!("Failed to listen for shutdown signal: {e}");
                }
                break;
            }
            changed = channel.changed() => {
                if changed.is_err() {
                    break;
                }
                log::info!("Push channel {:?}", *channel.borrow_and_update());
            }
        }
    }

    listener.shutdown().await;
}
