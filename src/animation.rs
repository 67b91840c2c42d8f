//! Animation lifecycle bridge and the editor relayout loop.
//!
//! While a container transition animation is in flight, the editor must be
//! re-laid-out every frame so its content tracks the moving layout. The
//! bridge enforces the ordering both directions need:
//! - on animation-start the relayout loop is running *before* any
//!   state-specific hook that might read layout,
//! - on animation-end the loop stops only *after* the state's icon swap, so
//!   the final rendered frame matches the new icon.

use std::sync::{Arc, Mutex};

use statig::prelude::StateMachine;
use tracing::debug;

use crate::stage::SharedStage;
use crate::state_machine::window_sm::{WindowEvent, WindowMachine};

// ---------------------------------------------------------------------------
// Relayout loop
// ---------------------------------------------------------------------------

pub type SharedRelayout = Arc<Mutex<RelayoutLoop>>;

/// Best-effort frame loop driving `EditorSurface::relayout` while a
/// transition animation runs. The host ticks it; this type only tracks
/// whether a tick should relayout.
#[derive(Debug, Default)]
pub struct RelayoutLoop {
    running: bool,
    frames: u64,
}

impl RelayoutLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.frames = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Count one frame; the caller relayouts the editor when this returns
    /// true.
    pub fn frame(&mut self) -> bool {
        if self.running {
            self.frames += 1;
        }
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

// ---------------------------------------------------------------------------
// Lifecycle signals and the bridge
// ---------------------------------------------------------------------------

/// A lifecycle signal from the visual layer for one element's animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationSignal {
    Started { element: String },
    Ended { element: String },
}

impl AnimationSignal {
    fn element(&self) -> &str {
        match self {
            AnimationSignal::Started { element } | AnimationSignal::Ended { element } => element,
        }
    }
}

/// Forwards animation lifecycle signals into the window machine, toggling
/// the relayout loop around the state-specific work.
pub struct AnimationBridge {
    stage: SharedStage,
    relayout: SharedRelayout,
}

impl AnimationBridge {
    pub fn new(stage: SharedStage, relayout: SharedRelayout) -> Self {
        Self { stage, relayout }
    }

    /// Deliver one signal. Signals for elements nobody subscribed are
    /// dropped (the container is subscribed when the panel chrome is built).
    pub fn forward(&self, signal: &AnimationSignal, window: &mut StateMachine<WindowMachine>) {
        let observed = self.stage.lock().unwrap().observes_animations(signal.element());
        if !observed {
            debug!(target: "animation", element = signal.element(), "signal for unobserved element");
            return;
        }

        match signal {
            AnimationSignal::Started { .. } => {
                // Loop first: state hooks may read layout.
                self.relayout.lock().unwrap().start();
                window.handle(&WindowEvent::AnimationStart);
            }
            AnimationSignal::Ended { .. } => {
                // Icon swap first: the last frame must show the new icon.
                window.handle(&WindowEvent::AnimationEnd);
                self.relayout.lock().unwrap().stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relayout_loop_counts_frames_only_while_running() {
        let mut rl = RelayoutLoop::new();
        assert!(!rl.frame());
        rl.start();
        assert!(rl.frame());
        assert!(rl.frame());
        assert_eq!(rl.frames(), 2);
        rl.stop();
        assert!(!rl.frame());
        assert_eq!(rl.frames(), 0);
    }
}
