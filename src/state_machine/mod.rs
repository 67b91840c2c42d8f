//! Coupled state machines for playback and panel layout.
//!
//! The window machine owns layout and delegates playback-affecting events to
//! the activity machine; the activity machine owns playback intent and is
//! driven only by backend acknowledgements. The only cycle between the two
//! (activity → channel → activity) is broken by the asynchronous channel
//! hop, so no dispatch can re-enter the handler that started it.

pub mod activity_sm;
pub mod window_sm;
