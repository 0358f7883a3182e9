//! Configuration model loaded from external sources.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::types::PageSize;

#[derive(Clone, Debug, Deserialize)]
/// Settings shared by the console and the event worker.
pub struct ClientConfig {
    /// Base URL of the record collection, e.g. `http://localhost:8080/digg/user`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Write endpoint tried right after the cached one.
    #[serde(default)]
    pub write_endpoint_override: Option<String>,
    /// Conventional write routes relative to `api_base_url`, probed in order.
    /// An empty entry stands for the base URL itself.
    #[serde(default = "default_write_candidates")]
    pub write_candidates: Vec<String>,
    /// File holding the resolved write endpoints between sessions.
    #[serde(default = "default_endpoint_cache_path")]
    pub endpoint_cache_path: PathBuf,
    /// Bearer token attached to every request.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub page_size: PageSize,
    /// STOMP-over-WebSocket endpoint of the push channel.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Heart-beat interval asked of the broker. The connection is dropped
    /// after three missed beats; zero turns this off.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
    /// Delay before a slow reload raises the loading indicator.
    #[serde(default = "default_loading_debounce_ms")]
    pub loading_debounce_ms: u64,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn loading_debounce(&self) -> Duration {
        Duration::from_millis(self.loading_debounce_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            write_endpoint_override: None,
            write_candidates: default_write_candidates(),
            endpoint_cache_path: default_endpoint_cache_path(),
            auth_token: None,
            request_timeout_ms: default_request_timeout_ms(),
            page_size: PageSize::DEFAULT,
            ws_url: default_ws_url(),
            topic: default_topic(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            heartbeat_ms: default_heartbeat_ms(),
            loading_debounce_ms: default_loading_debounce_ms(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8080/digg/user".to_string()
}

fn default_write_candidates() -> Vec<String> {
    ["", "save", "update", "edit", "add", "create"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_endpoint_cache_path() -> PathBuf {
    PathBuf::from(".crm-client/endpoints.json")
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_ws_url() -> String {
    "ws://localhost:8080/ws/websocket".to_string()
}

fn default_topic() -> String {
    "/topic/users".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_heartbeat_ms() -> u64 {
    10_000
}

fn default_loading_debounce_ms() -> u64 {
    350
}
