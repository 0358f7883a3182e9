//! Push-channel listener: keeps a STOMP subscription open over WebSocket and
//! calls a [`ChangeHandler`] for every message on the subscribed topic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::config::ClientConfig;

pub mod classify;
pub mod errors;
pub mod stomp;

pub use classify::{ChangeEvent, EventKind};
pub use errors::ChannelError;
use stomp::Frame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Missed heart-beats tolerated before the connection counts as dead.
const MISSED_HEARTBEATS: u32 = 3;

/// Lifecycle of the push-channel connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Receives every message delivered on the subscribed topic.
#[async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    async fn on_change(&self, event: ChangeEvent);
}

#[derive(Clone, Debug)]
pub struct ListenerConfig {
    /// WebSocket URL of the STOMP endpoint.
    pub url: String,
    /// Destination to subscribe to, e.g. `/topic/users`.
    pub topic: String,
    pub reconnect_delay: Duration,
    /// Heart-beat interval asked of the broker; zero disables the idle check.
    pub heartbeat: Duration,
}

impl From<&ClientConfig> for ListenerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            topic: config.topic.clone(),
            reconnect_delay: config.reconnect_delay(),
            heartbeat: config.heartbeat(),
        }
    }
}

/// Handle to a running listener. Dropping it does not stop the worker; call
/// [`ListenerHandle::shutdown`].
pub struct ListenerHandle {
    cancel: CancellationToken,
    state: watch::Receiver<ChannelState>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Unsubscribes, closes the connection and cancels any pending reconnect.
    /// No handler call starts after this returns.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::error!("Push channel worker ended abnormally: {e}");
        }
    }
}

/// Starts the listener on the current Tokio runtime.
pub fn spawn<H: ChangeHandler>(config: ListenerConfig, handler: Arc<H>) -> ListenerHandle {
    let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(config, handler, state_tx, cancel.clone()));

    ListenerHandle {
        cancel,
        state: state_rx,
        task,
    }
}

async fn run<H: ChangeHandler>(
    config: ListenerConfig,
    handler: Arc<H>,
    state: watch::Sender<ChannelState>,
    cancel: CancellationToken,
) {
    loop {
        state.send_replace(ChannelState::Connecting);
        match session(&config, handler.as_ref(), &state, &cancel).await {
            Ok(()) => break,
            Err(e) => log::warn!(
                "Push channel {} failed: {e}; reconnecting in {:?}",
                config.url,
                config.reconnect_delay
            ),
        }

        state.send_replace(ChannelState::Reconnecting);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    state.send_replace(ChannelState::Disconnected);
    log::info!("Push channel {} closed", config.url);
}

/// Runs one connection until it fails (`Err`) or is cancelled (`Ok`).
async fn session<H: ChangeHandler>(
    config: &ListenerConfig,
    handler: &H,
    state: &watch::Sender<ChannelState>,
    cancel: &CancellationToken,
) -> Result<(), ChannelError> {
    let (mut ws, _) = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        connected = connect_async(config.url.as_str()) => connected?,
    };

    let connect = Frame::connect(&stomp_host(&config.url), config.heartbeat);
    ws.send(Message::Text(connect.encode())).await?;
    let handshake_limit = idle_limit(Some(config.heartbeat));

    let reply = tokio::select! {
        _ = cancel.cancelled() => {
            close(&mut ws).await;
            return Ok(());
        }
        frame = next_frame(&mut ws, handshake_limit) => frame?,
    };
    match reply.command.as_str() {
        "CONNECTED" => {}
        "ERROR" => return Err(broker_error(&reply)),
        other => {
            return Err(ChannelError::Protocol(format!(
                "expected CONNECTED, got {other}"
            )));
        }
    }

    let idle = idle_limit(reply.incoming_heartbeat(config.heartbeat));
    let subscription = format!("sub-{}", Uuid::new_v4());
    ws.send(Message::Text(
        Frame::subscribe(&subscription, &config.topic).encode(),
    ))
    .await?;

    state.send_replace(ChannelState::Connected);
    log::info!("Subscribed to {} on {}", config.topic, config.url);

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                teardown(&mut ws, &subscription).await;
                return Ok(());
            }
            frame = next_frame(&mut ws, idle) => frame?,
        };

        match frame.command.as_str() {
            "MESSAGE" => {
                if frame
                    .get("subscription")
                    .is_some_and(|id| id != subscription)
                {
                    log::debug!("Ignoring message for foreign subscription");
                    continue;
                }

                let event = ChangeEvent::classify(&frame.body);
                if event.is_recognized() {
                    log::debug!("Change event {:?} ({:?})", event.kind, event.name);
                } else {
                    log::info!("Unrecognized change event {:?}, reloading anyway", event.name);
                }

                if cancel.is_cancelled() {
                    teardown(&mut ws, &subscription).await;
                    return Ok(());
                }
                handler.on_change(event).await;
            }
            "ERROR" => return Err(broker_error(&frame)),
            "RECEIPT" => {}
            other => log::debug!("Ignoring {other} frame"),
        }
    }
}

fn idle_limit(heartbeat: Option<Duration>) -> Option<Duration> {
    heartbeat
        .filter(|interval| !interval.is_zero())
        .map(|interval| interval * MISSED_HEARTBEATS)
}

/// Reads the next frame. Heart-beats are skipped but count as traffic for
/// the `idle` limit.
async fn next_frame(ws: &mut WsStream, idle: Option<Duration>) -> Result<Frame, ChannelError> {
    loop {
        let message = match idle {
            Some(limit) => tokio::time::timeout(limit, ws.next())
                .await
                .map_err(|_| ChannelError::Idle(limit))?,
            None => ws.next().await,
        };
        let Some(message) = message else {
            return Err(ChannelError::Closed);
        };
        let text = match message? {
            Message::Text(text) => text,
            Message::Binary(bytes) => String::from_utf8(bytes)
                .map_err(|e| ChannelError::Protocol(format!("non UTF-8 frame: {e}")))?,
            Message::Close(_) => return Err(ChannelError::Closed),
            _ => continue,
        };
        if let Some(frame) = Frame::decode(&text)? {
            return Ok(frame);
        }
    }
}

async fn teardown(ws: &mut WsStream, subscription: &str) {
    let frames = [
        Frame::unsubscribe(subscription),
        Frame::disconnect(&format!("disconnect-{subscription}")),
    ];
    for frame in frames {
        if let Err(e) = ws.send(Message::Text(frame.encode())).await {
            log::debug!("Could not send {} during teardown: {e}", frame.command);
            break;
        }
    }
    close(ws).await;
}

async fn close(ws: &mut WsStream) {
    if let Err(e) = ws.close(None).await {
        log::debug!("Error closing push channel: {e}");
    }
}

fn broker_error(frame: &Frame) -> ChannelError {
    let message = frame.get("message").unwrap_or_default();
    let detail = frame.body.trim();
    ChannelError::Broker(if detail.is_empty() {
        message.to_string()
    } else {
        format!("{message} {detail}").trim().to_string()
    })
}

fn stomp_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| "localhost".to_string())
}
