//! Window state machine.
//!
//! Tracks the output panel's presence and size:
//! ```text
//! Initial → Shrunk ⇄ Expanded
//!              │        │
//!              └────────┴──→ Standby  (on quit; `run` re-opens via Shrunk)
//! ```
//!
//! State names describe the editor container: `Shrunk` means the container
//! is minimized and the output panel fills the window, `Expanded` the
//! reverse mid-toggle dimensioning. Layout changes ride on 300 ms transition
//! animations; the matching animation-end signal swaps the shrink control's
//! icon so the final frame matches the control's next meaning.
//!
//! Two transitions resolve by delegation: a direct call into another
//! state's handler, bounded at one hop by construction:
//! - `Initial`/`Standby` + `run` delegate to `Shrunk`'s `run` handling
//!   (which never delegates further),
//! - `Shrunk`/`Expanded` + `quit` delegate to `Standby`'s `quit` handling
//!   (which never delegates further).
//!
//! Playback-affecting events are forwarded to the activity machine; this
//! machine never touches the run icon or the channel itself.

use std::sync::{Arc, Mutex};

use statig::prelude::*;
use tracing::info;

use crate::stage::{
    ANIM_EXPAND, ANIM_SHRINK, ANIM_TRAN_EXPAND, ANIM_TRAN_MAX_EXPAND, ANIM_TRAN_SHRINK, Animation,
    BODY, CLASS_CONTAINER_MAX, CLASS_CONTAINER_MIN, CLASS_CONTAINER_TRAN, CLASS_ICON_MINIMIZE,
    CLASS_ICON_QUIT, CLASS_ICON_RESTORE, CLASS_OUTPUT_BUTTONS, CLASS_OUTPUT_MAX, CLASS_OUTPUT_MIN,
    CONTAINER, OUTPUT_PANEL, OUTPUT_TITLEBAR, QUIT_BUTTON, QUIT_ICON, SHRINK_BUTTON, SHRINK_ICON,
    SharedStage, UiEvent,
};
use crate::state_machine::activity_sm::{ActivityEvent, ActivityMachine, PlaybackIntent};

/// The activity machine, shared with the coordinator so button paths that
/// bypass this machine (the stop button) reach the same instance.
pub type SharedActivity = Arc<Mutex<StateMachine<ActivityMachine>>>;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events dispatched to the window state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// A user action (run button or an output-panel control).
    Ui(UiEvent),
    /// The container's transition animation began.
    AnimationStart,
    /// The container's transition animation finished.
    AnimationEnd,
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

/// Shared storage for the window state machine.
pub struct WindowMachine {
    stage: SharedStage,
    activity: SharedActivity,
}

impl WindowMachine {
    pub fn new(stage: SharedStage, activity: SharedActivity) -> Self {
        Self { stage, activity }
    }

    /// Build the output panel's chrome on first `run`: title bar, quit and
    /// shrink controls wired to re-dispatch their events into this machine,
    /// and the panel itself, all appended to the document body. Also
    /// subscribes the container to animation lifecycle signals.
    fn build_output_chrome(&mut self) {
        info!(target: "window", "building output panel chrome");
        let mut stage = self.stage.lock().unwrap();

        stage.create(OUTPUT_TITLEBAR);
        stage.create(OUTPUT_PANEL);
        stage.create(QUIT_BUTTON);
        stage.create(QUIT_ICON);
        stage.create(SHRINK_BUTTON);
        stage.create(SHRINK_ICON);

        stage.add_class(QUIT_BUTTON, CLASS_OUTPUT_BUTTONS);
        stage.add_class(QUIT_ICON, CLASS_ICON_QUIT);
        stage.add_class(QUIT_ICON, CLASS_OUTPUT_BUTTONS);
        stage.add_class(SHRINK_BUTTON, CLASS_OUTPUT_BUTTONS);
        stage.add_class(SHRINK_ICON, CLASS_ICON_MINIMIZE);

        stage.append(QUIT_BUTTON, QUIT_ICON);
        stage.append(SHRINK_BUTTON, SHRINK_ICON);
        stage.append(OUTPUT_TITLEBAR, QUIT_BUTTON);
        stage.append(OUTPUT_TITLEBAR, SHRINK_BUTTON);
        stage.append(BODY, OUTPUT_TITLEBAR);
        stage.append(BODY, OUTPUT_PANEL);

        // control clicks re-enter this machine as UI events
        stage.bind_click(SHRINK_BUTTON, UiEvent::Shrink);
        stage.bind_click(QUIT_BUTTON, UiEvent::Quit);

        stage.observe_animations(CONTAINER);
    }

    fn forward_to_activity(&mut self, intent: PlaybackIntent) {
        self.activity
            .lock()
            .unwrap()
            .handle(&ActivityEvent::Intent(intent));
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

/// The window machine's state. Constructors are public so integration
/// tests can name the expected state; statig only generates private
/// constructors, so the enum is supplied via `state(custom)`.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Initial {},
    Standby {},
    Shrunk {},
    Expanded {},
}

impl State {
    pub fn initial() -> Self {
        State::Initial {}
    }
    pub fn standby() -> Self {
        State::Standby {}
    }
    pub fn shrunk() -> Self {
        State::Shrunk {}
    }
    pub fn expanded() -> Self {
        State::Expanded {}
    }
}

#[state_machine(
    initial = "State::initial()",
    state(name = "State", custom)
)]
impl WindowMachine {
    /// No output panel exists yet.
    #[state]
    fn initial(&mut self, event: &WindowEvent) -> Outcome<State> {
        match event {
            WindowEvent::Ui(UiEvent::Run) => {
                self.build_output_chrome();
                // Resolves by delegating to Shrunk's handling of `run`.
                self.shrunk(event)
            }
            WindowEvent::Ui(UiEvent::Quit) => {
                let mut stage = self.stage.lock().unwrap();
                stage.detach(BODY, OUTPUT_PANEL);
                stage.detach(BODY, OUTPUT_TITLEBAR);
                Handled
            }
            // `shrink` has nothing to act on before the panel exists.
            _ => Handled,
        }
    }

    /// The panel was quit; chrome exists but playback is parked.
    #[state]
    fn standby(&mut self, event: &WindowEvent) -> Outcome<State> {
        match event {
            WindowEvent::Ui(UiEvent::Run) => {
                // Resolves by delegating to Shrunk's handling of `run`.
                self.shrunk(event)
            }
            WindowEvent::Ui(UiEvent::Quit) => {
                // Stop playback before parking the panel.
                self.forward_to_activity(PlaybackIntent::Stop);
                Transition(State::standby())
            }
            _ => Handled,
        }
    }

    /// Container minimized; the output panel has the window.
    #[state]
    fn shrunk(&mut self, event: &WindowEvent) -> Outcome<State> {
        match event {
            WindowEvent::Ui(UiEvent::Run) => {
                {
                    let mut stage = self.stage.lock().unwrap();
                    stage.play_animation(CONTAINER, Animation::transition(ANIM_SHRINK));
                    stage.remove_class(CONTAINER, CLASS_CONTAINER_MAX);
                    stage.add_class(CONTAINER, CLASS_CONTAINER_MIN);
                    stage.add_class(OUTPUT_PANEL, CLASS_OUTPUT_MAX);
                }
                self.forward_to_activity(PlaybackIntent::Run);
                info!(target: "window", "shrunk → expanded (run)");
                Transition(State::expanded())
            }
            WindowEvent::Ui(UiEvent::Shrink) => {
                let mut stage = self.stage.lock().unwrap();
                stage.play_animation(CONTAINER, Animation::transition(ANIM_TRAN_SHRINK));
                stage.remove_class(CONTAINER, CLASS_CONTAINER_TRAN);
                stage.add_class(CONTAINER, CLASS_CONTAINER_MIN);
                stage.replace_class(OUTPUT_PANEL, CLASS_OUTPUT_MIN, CLASS_OUTPUT_MAX);
                info!(target: "window", "shrunk → expanded (shrink toggle)");
                Transition(State::expanded())
            }
            WindowEvent::Ui(UiEvent::Quit) => {
                {
                    let mut stage = self.stage.lock().unwrap();
                    stage.play_animation(CONTAINER, Animation::transition(ANIM_TRAN_MAX_EXPAND));
                    stage.remove_class(CONTAINER, CLASS_CONTAINER_TRAN);
                    stage.add_class(CONTAINER, CLASS_CONTAINER_MAX);
                    stage.remove_class(OUTPUT_PANEL, CLASS_OUTPUT_MIN);
                }
                // Resolves by delegating to Standby's handling of `quit`.
                self.standby(event)
            }
            WindowEvent::AnimationEnd => {
                let mut stage = self.stage.lock().unwrap();
                stage.remove_class(SHRINK_ICON, CLASS_ICON_MINIMIZE);
                stage.add_class(SHRINK_ICON, CLASS_ICON_RESTORE);
                Handled
            }
            _ => Handled,
        }
    }

    /// Container restored mid-toggle; the panel is reduced.
    #[state]
    fn expanded(&mut self, event: &WindowEvent) -> Outcome<State> {
        match event {
            WindowEvent::Ui(UiEvent::Shrink) => {
                let mut stage = self.stage.lock().unwrap();
                stage.play_animation(CONTAINER, Animation::transition(ANIM_TRAN_EXPAND));
                stage.remove_class(CONTAINER, CLASS_CONTAINER_MIN);
                stage.add_class(CONTAINER, CLASS_CONTAINER_TRAN);
                stage.replace_class(OUTPUT_PANEL, CLASS_OUTPUT_MAX, CLASS_OUTPUT_MIN);
                info!(target: "window", "expanded → shrunk");
                Transition(State::shrunk())
            }
            WindowEvent::Ui(UiEvent::Quit) => {
                {
                    let mut stage = self.stage.lock().unwrap();
                    stage.play_animation(CONTAINER, Animation::transition(ANIM_EXPAND));
                    stage.remove_class(CONTAINER, CLASS_CONTAINER_MIN);
                    stage.add_class(CONTAINER, CLASS_CONTAINER_MAX);
                    stage.remove_class(OUTPUT_PANEL, CLASS_OUTPUT_MAX);
                }
                // Resolves by delegating to Standby's handling of `quit`.
                self.standby(event)
            }
            WindowEvent::Ui(UiEvent::Run) => {
                // Panel already shown; `run` only toggles playback.
                self.forward_to_activity(PlaybackIntent::Run);
                Handled
            }
            WindowEvent::AnimationEnd => {
                let mut stage = self.stage.lock().unwrap();
                stage.remove_class(SHRINK_ICON, CLASS_ICON_RESTORE);
                stage.add_class(SHRINK_ICON, CLASS_ICON_MINIMIZE);
                Handled
            }
            _ => Handled,
        }
    }
}
