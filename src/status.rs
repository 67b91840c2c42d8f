//! Shared session status cell.
//!
//! Replaces the ambient `status` global of the reference behaviour with an
//! explicit cell handed to both trackers' surroundings at construction.
//!
//! Access rules:
//! - the inbound acknowledgement path is the only writer (`set_error`),
//! - the activity machine's guard is the reader (`is_error`),
//! - a user `stop` action is the only clear path (`clear`).

use std::sync::{Arc, Mutex};

/// Process-wide session health. While `Error`, the activity machine ignores
/// every acknowledgement and holds its current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Ok,
    Error {
        reason: Option<String>,
    },
}

/// Cloneable handle to the shared status value.
#[derive(Clone, Default)]
pub struct StatusCell {
    inner: Arc<Mutex<SessionStatus>>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, reason: Option<String>) {
        *self.inner.lock().unwrap() = SessionStatus::Error { reason };
    }

    pub fn clear(&self) {
        *self.inner.lock().unwrap() = SessionStatus::Ok;
    }

    pub fn is_error(&self) -> bool {
        matches!(*self.inner.lock().unwrap(), SessionStatus::Error { .. })
    }

    pub fn snapshot(&self) -> SessionStatus {
        self.inner.lock().unwrap().clone()
    }
}
