//! Playback backend: the run/pause/stop engine process.
//!
//! A WebSocket server the front end connects to. Each connection gets its
//! own `Engine`, which applies playback commands and emits acknowledgement
//! frames; the engine is pure (commands in, frames out) so the protocol
//! behaviour is testable without a socket.
//!
//! On an admitted `play` the engine acknowledges `main:playing` and then
//! requests the current editor text with `get-file`; the front end's
//! `editor:file` reply is stored as the current script. A declined `play`
//! is answered with an explicit `error` frame carrying the rejection reason
//! instead of silence, so the front end can freeze and report it.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::protocol::{
    Ack, Command, EVENT_EDITOR_FILE, EVENT_GET_FILE, Frame, REASON_REJECTED,
};

// ---------------------------------------------------------------------------
// Admission policy
// ---------------------------------------------------------------------------

/// Decides whether a `play` request is admitted. Injected so tests can pin
/// the decision and the binary can simulate a flaky computation service.
pub trait AdmissionPolicy: Send {
    fn admit(&mut self) -> bool;
}

/// Admits all but a configured fraction of play requests, at random.
pub struct RandomAdmission {
    reject_rate: f64,
}

impl RandomAdmission {
    pub fn new(reject_rate: f64) -> Self {
        Self {
            reject_rate: reject_rate.clamp(0.0, 1.0),
        }
    }
}

impl AdmissionPolicy for RandomAdmission {
    fn admit(&mut self) -> bool {
        rand::thread_rng().r#gen::<f64>() >= self.reject_rate
    }
}

/// Fixed-decision policy for tests.
pub struct FixedAdmission(pub bool);

impl AdmissionPolicy for FixedAdmission {
    fn admit(&mut self) -> bool {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Engine playback state, reported to the front end via acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Playing,
    Paused,
}

/// The playback engine for one connection: applies commands, returns the
/// frames to send back, in emit order.
pub struct Engine {
    state: EngineState,
    policy: Box<dyn AdmissionPolicy>,
    script: Option<String>,
}

impl Engine {
    pub fn new(policy: Box<dyn AdmissionPolicy>) -> Self {
        Self {
            state: EngineState::Stopped,
            policy,
            script: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Handle one inbound frame from the front end.
    pub fn handle_frame(&mut self, frame: &Frame) -> Vec<Frame> {
        if frame.event == EVENT_EDITOR_FILE {
            let text = frame.payload_text().unwrap_or_default();
            info!(target: "backend", bytes = text.len(), "received editor text");
            self.script = Some(text.to_string());
            return Vec::new();
        }

        match Command::from_wire(&frame.event) {
            Some(command) => self.apply(command),
            None => {
                warn!(target: "backend", event = %frame.event, "unknown inbound event");
                Vec::new()
            }
        }
    }

    /// Apply a playback command and return the acknowledgement frames.
    pub fn apply(&mut self, command: Command) -> Vec<Frame> {
        match command {
            Command::Play => {
                if self.policy.admit() {
                    info!(target: "backend", "playing");
                    self.state = EngineState::Playing;
                    vec![
                        Frame::ack(&Ack::Playing),
                        // pull the script to run
                        Frame::named(EVENT_GET_FILE),
                    ]
                } else {
                    info!(target: "backend", "play request rejected");
                    vec![Frame::ack(&Ack::Error {
                        reason: Some(REASON_REJECTED.to_string()),
                    })]
                }
            }
            Command::Resume => {
                info!(target: "backend", "resuming");
                self.state = EngineState::Playing;
                vec![Frame::ack(&Ack::Playing)]
            }
            Command::Pause => {
                info!(target: "backend", "pausing");
                self.state = EngineState::Paused;
                vec![Frame::ack(&Ack::Paused)]
            }
            Command::Stop => {
                // Stopping an already-stopped engine is not acknowledged.
                if self.state != EngineState::Stopped {
                    info!(target: "backend", "stopping");
                    self.state = EngineState::Stopped;
                    vec![Frame::ack(&Ack::Stopped)]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Accept front-end connections forever, one engine per connection.
pub async fn serve(listen: &str, reject_rate: f64) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind backend listener on {listen}"))?;
    info!(target: "backend", listen, reject_rate, "backend listening");

    loop {
        let (socket, peer) = listener
            .accept()
            .await
            .context("backend accept failed")?;
        info!(target: "backend", %peer, "front end connected");
        tokio::spawn(connection_loop(socket, reject_rate));
    }
}

/// Serve one front-end connection until it closes.
async fn connection_loop(socket: TcpStream, reject_rate: f64) {
    let ws_stream = match accept_async(socket).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(target: "backend", "websocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let mut engine = Engine::new(Box::new(RandomAdmission::new(reject_rate)));

    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let frame: Frame = match serde_json::from_str(&text) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!(target: "backend", "dropping unparseable frame: {}", e);
                        continue;
                    }
                };
                for reply in engine.handle_frame(&frame) {
                    let msg = Message::Text(reply.to_json().into());
                    if let Err(e) = write.send(msg).await {
                        error!(target: "backend", "failed to send reply: {}", e);
                        return;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                info!(target: "backend", "front end disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!(target: "backend", "channel error: {}", e);
                break;
            }
        }
    }
}
