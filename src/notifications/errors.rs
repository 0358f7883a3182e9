use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures of the push channel. They are logged and drive the reconnect
/// policy; they never reach the user.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The broker answered with a STOMP `ERROR` frame.
    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed by peer")]
    Closed,

    #[error("No traffic for {0:?}")]
    Idle(std::time::Duration),
}
