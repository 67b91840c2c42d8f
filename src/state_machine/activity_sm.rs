//! Activity state machine.
//!
//! Tracks playback intent for the output panel:
//! ```text
//! Stopped → Running ⇄ Paused
//!    ↑         │        │
//!    └─────────┴────────┘   (on main:stopped)
//! ```
//!
//! Transitions are driven exclusively by backend acknowledgements; a user
//! action only emits a command and leaves the state untouched, so the UI can
//! never drift ahead of what the backend actually did. Unlisted
//! (state, event) pairs are deliberate no-ops.

use statig::prelude::*;
use tracing::info;

use crate::channel::OutboundSender;
use crate::protocol::{Ack, Command};
use crate::stage::{CLASS_ICON_PAUSE, CLASS_ICON_PLAY, RUN_ICON, SharedStage};
use crate::status::StatusCell;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A user action on the playback controls. `Run` is a toggle: what it
/// requests depends on the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIntent {
    Run,
    Stop,
}

/// Events dispatched to the activity state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// User-originated run/stop request; emits a command, never transitions.
    Intent(PlaybackIntent),
    /// Backend acknowledgement; the sole driver of transitions.
    Ack(Ack),
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

/// Shared storage for the activity state machine.
///
/// Holds the collaborator handles every state needs:
/// - `stage`: for the run-icon class swaps
/// - `outbound`: command emission over the message channel
/// - `status`: the freeze guard written by the acknowledgement path
pub struct ActivityMachine {
    stage: SharedStage,
    outbound: OutboundSender,
    status: StatusCell,
}

impl ActivityMachine {
    pub fn new(stage: SharedStage, outbound: OutboundSender, status: StatusCell) -> Self {
        Self {
            stage,
            outbound,
            status,
        }
    }

    /// Freeze guard: after a reported failure every acknowledgement is
    /// ignored until the status is cleared.
    fn admit<'a>(&self, ack: &'a Ack) -> Option<&'a Ack> {
        if self.status.is_error() {
            info!(target: "activity", ack = ack.wire_name(), "status is error, holding state");
            None
        } else {
            Some(ack)
        }
    }

    fn swap_run_icon(&self, from: &str, to: &str) {
        self.stage.lock().unwrap().replace_class(RUN_ICON, from, to);
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

/// The activity machine's state. Constructors are public so integration
/// tests can name the expected state; statig only generates private
/// constructors, so the enum is supplied via `state(custom)`.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Stopped {},
    Running {},
    Paused {},
}

impl State {
    pub fn stopped() -> Self {
        State::Stopped {}
    }
    pub fn running() -> Self {
        State::Running {}
    }
    pub fn paused() -> Self {
        State::Paused {}
    }
}

#[state_machine(
    initial = "State::stopped()",
    state(name = "State", custom)
)]
impl ActivityMachine {
    /// No computation running.
    #[state]
    fn stopped(&mut self, event: &ActivityEvent) -> Outcome<State> {
        match event {
            ActivityEvent::Intent(PlaybackIntent::Run) => {
                self.outbound.emit(Command::Play);
                Handled
            }
            // Nothing to stop.
            ActivityEvent::Intent(PlaybackIntent::Stop) => Handled,
            ActivityEvent::Ack(ack) => match self.admit(ack) {
                Some(Ack::Playing) => {
                    info!(target: "activity", "stopped → running");
                    self.swap_run_icon(CLASS_ICON_PLAY, CLASS_ICON_PAUSE);
                    Transition(State::running())
                }
                _ => Handled,
            },
        }
    }

    /// Computation in flight; the run button now means pause.
    #[state]
    fn running(&mut self, event: &ActivityEvent) -> Outcome<State> {
        match event {
            ActivityEvent::Intent(PlaybackIntent::Run) => {
                self.outbound.emit(Command::Pause);
                Handled
            }
            ActivityEvent::Intent(PlaybackIntent::Stop) => {
                self.outbound.emit(Command::Stop);
                Handled
            }
            ActivityEvent::Ack(ack) => match self.admit(ack) {
                Some(Ack::Paused) => {
                    info!(target: "activity", "running → paused");
                    self.swap_run_icon(CLASS_ICON_PAUSE, CLASS_ICON_PLAY);
                    Transition(State::paused())
                }
                Some(Ack::Stopped) => {
                    info!(target: "activity", "running → stopped");
                    self.swap_run_icon(CLASS_ICON_PAUSE, CLASS_ICON_PLAY);
                    Transition(State::stopped())
                }
                _ => Handled,
            },
        }
    }

    /// Computation suspended; the run button now means resume.
    #[state]
    fn paused(&mut self, event: &ActivityEvent) -> Outcome<State> {
        match event {
            ActivityEvent::Intent(PlaybackIntent::Run) => {
                self.outbound.emit(Command::Resume);
                Handled
            }
            ActivityEvent::Intent(PlaybackIntent::Stop) => {
                self.outbound.emit(Command::Stop);
                Handled
            }
            ActivityEvent::Ack(ack) => match self.admit(ack) {
                Some(Ack::Playing) => {
                    info!(target: "activity", "paused → running");
                    self.swap_run_icon(CLASS_ICON_PLAY, CLASS_ICON_PAUSE);
                    Transition(State::running())
                }
                Some(Ack::Stopped) => {
                    info!(target: "activity", "paused → stopped");
                    self.swap_run_icon(CLASS_ICON_PAUSE, CLASS_ICON_PLAY);
                    Transition(State::stopped())
                }
                _ => Handled,
            },
        }
    }
}
