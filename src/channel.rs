//! WebSocket channel between the front end and the playback backend.
//!
//! Runs in a Tokio background task and surfaces inbound frames to the event
//! loop through an mpsc queue, preserving arrival order. Outbound commands
//! are queued via `OutboundSender` and sent fire-and-forget; no
//! command/acknowledgement correlation is tracked; the UI allows one
//! in-flight command at a time and the backend's acknowledgements are the
//! sole driver of activity transitions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::protocol::{Ack, Command, ConnectionStatus, EVENT_GET_FILE, Frame};

/// Link state shared between the channel task and the event loop.
pub type SharedLink = Arc<Mutex<Link>>;

/// Connection health of the single backend link.
#[derive(Debug, Clone)]
pub struct Link {
    pub url: String,
    pub status: ConnectionStatus,
    pub last_inbound: Option<DateTime<Utc>>,
}

impl Link {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status: ConnectionStatus::Connecting,
            last_inbound: None,
        }
    }
}

/// Inbound channel traffic, delivered to the event loop in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A backend acknowledgement (`main:playing` / `main:paused` /
    /// `main:stopped` / `error`).
    Ack(Ack),
    /// The backend asked for the current editor text (`get-file`).
    FileRequested,
}

/// Cloneable handle for queueing outbound frames. Sends are fire-and-forget:
/// a severed channel drops them silently and the machines stay in their last
/// acknowledged state.
#[derive(Clone)]
pub struct OutboundSender {
    tx: mpsc::UnboundedSender<Frame>,
}

impl OutboundSender {
    pub fn new(tx: mpsc::UnboundedSender<Frame>) -> Self {
        Self { tx }
    }

    /// Send a playback command with no payload.
    pub fn emit(&self, command: Command) {
        info!(target: "channel", command = command.wire_name(), "emit");
        let _ = self.tx.send(Frame::command(command));
    }

    /// Reply to `get-file` with the current editor text.
    pub fn send_editor_file(&self, text: &str) {
        let _ = self.tx.send(Frame::editor_file(text));
    }
}

/// Spawn the channel client task for the backend endpoint.
///
/// Returns:
/// - `SharedLink`: live connection status for the event loop,
/// - `OutboundSender`: queues frames toward the backend,
/// - the receiver of inbound `ChannelEvent`s.
pub fn spawn_client(
    runtime: &tokio::runtime::Handle,
    url: String,
    reconnect: Duration,
) -> (
    SharedLink,
    OutboundSender,
    mpsc::UnboundedReceiver<ChannelEvent>,
) {
    let shared = Arc::new(Mutex::new(Link::new(url.clone())));
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Frame>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ChannelEvent>();

    runtime.spawn(client_loop(Arc::clone(&shared), url, reconnect, out_rx, in_tx));

    (shared, OutboundSender::new(out_tx), in_rx)
}

/// Reconnecting client loop for the backend link.
async fn client_loop(
    shared: SharedLink,
    url: String,
    reconnect: Duration,
    mut outbound_rx: mpsc::UnboundedReceiver<Frame>,
    inbound_tx: mpsc::UnboundedSender<ChannelEvent>,
) {
    loop {
        shared.lock().unwrap().status = ConnectionStatus::Connecting;

        match connect_async(&url).await {
            Ok((ws_stream, _response)) => {
                shared.lock().unwrap().status = ConnectionStatus::Connected;
                info!(target: "channel", url = %url, "connected to backend");

                let (mut write, mut read) = ws_stream.split();

                loop {
                    tokio::select! {
                        // Inbound: acknowledgements and file requests
                        msg_result = read.next() => {
                            match msg_result {
                                Some(Ok(Message::Text(text))) => {
                                    handle_inbound(&shared, &inbound_tx, &text);
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    let _ = write.send(Message::Pong(data)).await;
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    info!(target: "channel", url = %url, "closed by backend");
                                    break;
                                }
                                Some(Err(e)) => {
                                    error!(target: "channel", url = %url, "channel error: {}", e);
                                    shared.lock().unwrap().status =
                                        ConnectionStatus::Error(format!("channel error: {}", e));
                                    break;
                                }
                                _ => {}
                            }
                        }

                        // Outbound: commands and editor:file replies
                        Some(frame) = outbound_rx.recv() => {
                            let msg = Message::Text(frame.to_json().into());
                            if let Err(e) = write.send(msg).await {
                                error!(target: "channel", "failed to send frame: {}", e);
                                break;
                            }
                        }
                    }
                }

                let mut link = shared.lock().unwrap();
                if link.status == ConnectionStatus::Connected {
                    link.status = ConnectionStatus::Disconnected;
                }
            }
            Err(e) => {
                warn!(
                    target: "channel",
                    url = %url,
                    "connect failed: {} — retrying in {:?}", e, reconnect
                );
                shared.lock().unwrap().status =
                    ConnectionStatus::Error(format!("connect failed: {}", e));
            }
        }

        tokio::time::sleep(reconnect).await;
    }
}

/// Parse one inbound frame and queue the matching channel event.
fn handle_inbound(
    shared: &SharedLink,
    inbound_tx: &mpsc::UnboundedSender<ChannelEvent>,
    text: &str,
) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(target: "channel", "dropping unparseable frame: {}", e);
            return;
        }
    };

    shared.lock().unwrap().last_inbound = Some(frame.timestamp);

    if frame.event == EVENT_GET_FILE {
        let _ = inbound_tx.send(ChannelEvent::FileRequested);
        return;
    }

    match Ack::from_frame(&frame) {
        Some(ack) => {
            let _ = inbound_tx.send(ChannelEvent::Ack(ack));
        }
        None => {
            warn!(target: "channel", event = %frame.event, "unknown inbound event");
        }
    }
}
