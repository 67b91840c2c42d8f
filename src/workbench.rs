//! Front-end coordinator.
//!
//! Owns the stage, the editor surface, both state machines and the animation
//! bridge, and exposes one entry point per asynchronous source (clicks,
//! channel events, animation signals, relayout frames). The host loop calls
//! these one at a time, so every dispatch runs to completion before the next
//! begins and neither machine can observe the other mid-transition.

use std::sync::{Arc, Mutex};

use statig::prelude::*;
use tracing::{info, warn};

use crate::animation::{AnimationBridge, AnimationSignal, RelayoutLoop, SharedRelayout};
use crate::channel::{ChannelEvent, OutboundSender};
use crate::editor::EditorSurface;
use crate::protocol::Ack;
use crate::stage::{AnimationRequest, RUN_BUTTON, STOP_BUTTON, SharedStage, Stage, UiEvent};
use crate::state_machine::activity_sm::{self, ActivityEvent, ActivityMachine, PlaybackIntent};
use crate::state_machine::window_sm::{self, SharedActivity, WindowEvent, WindowMachine};
use crate::status::{SessionStatus, StatusCell};

pub struct Workbench {
    stage: SharedStage,
    activity: SharedActivity,
    window: StateMachine<WindowMachine>,
    bridge: AnimationBridge,
    relayout: SharedRelayout,
    status: StatusCell,
    outbound: OutboundSender,
    editor: Box<dyn EditorSurface>,
}

impl Workbench {
    /// Wire up both trackers against a fresh stage. Button clicks are bound
    /// here, at construction, exactly once for the process lifetime.
    pub fn new(
        outbound: OutboundSender,
        status: StatusCell,
        editor: Box<dyn EditorSurface>,
    ) -> Self {
        let stage: SharedStage = Arc::new(Mutex::new(Stage::new()));
        let relayout: SharedRelayout = Arc::new(Mutex::new(RelayoutLoop::new()));

        {
            let mut stage = stage.lock().unwrap();
            stage.bind_click(RUN_BUTTON, UiEvent::Run);
            stage.bind_click(STOP_BUTTON, UiEvent::Stop);
        }

        let activity: SharedActivity = Arc::new(Mutex::new(
            ActivityMachine::new(Arc::clone(&stage), outbound.clone(), status.clone())
                .state_machine(),
        ));
        let window =
            WindowMachine::new(Arc::clone(&stage), Arc::clone(&activity)).state_machine();
        let bridge = AnimationBridge::new(Arc::clone(&stage), Arc::clone(&relayout));

        Self {
            stage,
            activity,
            window,
            bridge,
            relayout,
            status,
            outbound,
            editor,
        }
    }

    // -- event-source entry points ------------------------------------------

    /// A click on the element with the given identifier.
    pub fn click(&mut self, element: &str) {
        let target = self.stage.lock().unwrap().click_target(element);
        match target {
            // Stop bypasses the window machine entirely; it is also the
            // user's recovery path out of a frozen error status.
            Some(UiEvent::Stop) => {
                self.status.clear();
                self.activity
                    .lock()
                    .unwrap()
                    .handle(&ActivityEvent::Intent(PlaybackIntent::Stop));
            }
            Some(event) => {
                self.window.handle(&WindowEvent::Ui(event));
            }
            None => {
                warn!(target: "workbench", element, "click on unbound element");
            }
        }
    }

    /// One inbound channel event, in arrival order.
    pub fn channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Ack(Ack::Error { reason }) => {
                info!(target: "workbench", ?reason, "backend reported an error, freezing activity");
                // The acknowledgement path is the only writer of the cell.
                self.status.set_error(reason);
            }
            ChannelEvent::Ack(ack) => {
                self.activity.lock().unwrap().handle(&ActivityEvent::Ack(ack));
            }
            ChannelEvent::FileRequested => {
                self.outbound.send_editor_file(&self.editor.text());
            }
        }
    }

    /// One animation lifecycle signal from the visual layer.
    pub fn animation_signal(&mut self, signal: &AnimationSignal) {
        self.bridge.forward(signal, &mut self.window);
    }

    /// One frame tick; relayouts the editor while the loop is live.
    pub fn relayout_frame(&mut self) -> bool {
        let live = self.relayout.lock().unwrap().frame();
        if live {
            self.editor.relayout();
        }
        live
    }

    // -- host plumbing ------------------------------------------------------

    /// Animations triggered since the last call, for the host to run.
    pub fn take_animation_requests(&mut self) -> Vec<AnimationRequest> {
        self.stage.lock().unwrap().take_animation_requests()
    }

    pub fn editor_text(&self) -> String {
        self.editor.text()
    }

    pub fn set_editor_text(&mut self, text: &str) {
        self.editor.set_text(text);
    }

    // -- introspection (console `status`, tests) ----------------------------

    pub fn window_state(&self) -> window_sm::State {
        self.window.state().clone()
    }

    pub fn activity_state(&self) -> activity_sm::State {
        self.activity.lock().unwrap().state().clone()
    }

    pub fn session_status(&self) -> SessionStatus {
        self.status.snapshot()
    }

    pub fn stage(&self) -> SharedStage {
        Arc::clone(&self.stage)
    }

    pub fn relayout_loop(&self) -> SharedRelayout {
        Arc::clone(&self.relayout)
    }
}
