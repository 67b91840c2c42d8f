//! ripple-studio: coordination core for a two-pane script workbench.
//!
//! A front-end process owns an editor pane and a run/pause/stop-controlled
//! output panel; a backend process does the actual playback work and reports
//! outcomes asynchronously. Two coupled state machines, activity (playback)
//! and window (panel layout), serialize user input, backend
//! acknowledgements and animation lifecycle signals into one consistent
//! state. See `workbench::Workbench` for the wiring.

pub mod animation;
pub mod backend;
pub mod channel;
pub mod config;
pub mod editor;
pub mod hub;
pub mod logging;
pub mod protocol;
pub mod stage;
pub mod state_machine;
pub mod status;
pub mod workbench;
