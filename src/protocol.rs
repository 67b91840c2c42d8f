//! Wire protocol between the studio front end and the playback backend.
//!
//! Defines the JSON frame structure exchanged over the WebSocket channel and
//! the typed views of it: outbound `Command`s (front end → backend) and
//! inbound `Ack`s (backend → front end). Event names are the stable wire
//! contract; the enums exist so the rest of the crate never matches on raw
//! strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event names (wire-level contract)
// ---------------------------------------------------------------------------

pub const EVENT_PLAY: &str = "output:play";
pub const EVENT_PAUSE: &str = "output:pause";
pub const EVENT_RESUME: &str = "output:resume";
pub const EVENT_STOP: &str = "output:stop";

pub const EVENT_PLAYING: &str = "main:playing";
pub const EVENT_PAUSED: &str = "main:paused";
pub const EVENT_STOPPED: &str = "main:stopped";
pub const EVENT_ERROR: &str = "error";

/// Backend asks the front end for the current editor text.
pub const EVENT_GET_FILE: &str = "get-file";
/// Front end replies with the editor text as the payload.
pub const EVENT_EDITOR_FILE: &str = "editor:file";

/// Rejection reason: the admission policy declined the play request.
pub const REASON_REJECTED: &str = "rejected";
/// Rejection reason: the engine failed internally.
pub const REASON_ENGINE: &str = "engine";

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A single message on the wire. Most events carry no payload; `editor:file`
/// carries the editor text, `error` carries an optional rejection reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// A bare frame with no payload.
    pub fn named(event: &str) -> Self {
        Self {
            event: event.to_string(),
            payload: None,
            timestamp: Utc::now(),
        }
    }

    pub fn command(command: Command) -> Self {
        Self::named(command.wire_name())
    }

    pub fn ack(ack: &Ack) -> Self {
        let mut frame = Self::named(ack.wire_name());
        if let Ack::Error { reason: Some(reason) } = ack {
            frame.payload = Some(serde_json::Value::String(reason.clone()));
        }
        frame
    }

    pub fn editor_file(text: &str) -> Self {
        let mut frame = Self::named(EVENT_EDITOR_FILE);
        frame.payload = Some(serde_json::Value::String(text.to_string()));
        frame
    }

    /// Serialize to a JSON string for transmission.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// The payload as a string, if present and a string.
    pub fn payload_text(&self) -> Option<&str> {
        self.payload.as_ref().and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Commands (outbound, front end → backend)
// ---------------------------------------------------------------------------

/// A playback request. Sending a command never changes local state; the
/// matching acknowledgement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Resume,
    Stop,
}

impl Command {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Command::Play => EVENT_PLAY,
            Command::Pause => EVENT_PAUSE,
            Command::Resume => EVENT_RESUME,
            Command::Stop => EVENT_STOP,
        }
    }

    pub fn from_wire(event: &str) -> Option<Command> {
        match event {
            EVENT_PLAY => Some(Command::Play),
            EVENT_PAUSE => Some(Command::Pause),
            EVENT_RESUME => Some(Command::Resume),
            EVENT_STOP => Some(Command::Stop),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Acknowledgements (inbound, backend → front end)
// ---------------------------------------------------------------------------

/// The backend's report of its actual playback state. The sole driver of
/// activity transitions; `Error` freezes them instead (see the status cell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Playing,
    Paused,
    Stopped,
    Error { reason: Option<String> },
}

impl Ack {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Ack::Playing => EVENT_PLAYING,
            Ack::Paused => EVENT_PAUSED,
            Ack::Stopped => EVENT_STOPPED,
            Ack::Error { .. } => EVENT_ERROR,
        }
    }

    /// Typed view of an inbound frame. Returns `None` for events that are
    /// not acknowledgements (e.g. `get-file`).
    pub fn from_frame(frame: &Frame) -> Option<Ack> {
        match frame.event.as_str() {
            EVENT_PLAYING => Some(Ack::Playing),
            EVENT_PAUSED => Some(Ack::Paused),
            EVENT_STOPPED => Some(Ack::Stopped),
            EVENT_ERROR => Some(Ack::Error {
                reason: frame.payload_text().map(str::to_string),
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Connection status
// ---------------------------------------------------------------------------

/// Connection status of the channel link, shared with the event loop so the
/// console `status` command can surface a stalled backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::Connecting
    }
}
