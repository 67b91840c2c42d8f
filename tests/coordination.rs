//! Scenario tests for the coupled activity and window state machines.
//!
//! These run against the real `Workbench` wiring with the channel replaced
//! by a capturing queue: outbound frames land in an mpsc receiver, inbound
//! acknowledgements are injected as `ChannelEvent`s, and animation lifecycle
//! signals are delivered by hand. This mirrors how the host loop drives the
//! workbench, one event at a time.

use tokio::sync::mpsc;

use ripple_studio::animation::AnimationSignal;
use ripple_studio::channel::{ChannelEvent, OutboundSender};
use ripple_studio::editor::ScratchEditor;
use ripple_studio::protocol::{
    Ack, EVENT_EDITOR_FILE, EVENT_PAUSE, EVENT_PLAY, EVENT_STOP, Frame, REASON_REJECTED,
};
use ripple_studio::stage::{
    ANIM_SHRINK, ANIM_TRAN_EXPAND, CLASS_CONTAINER_MAX, CLASS_CONTAINER_MIN, CLASS_ICON_PAUSE,
    CLASS_ICON_PLAY, CLASS_ICON_RESTORE, CLASS_OUTPUT_MAX, CONTAINER, OUTPUT_PANEL,
    OUTPUT_TITLEBAR, QUIT_BUTTON, RUN_BUTTON, RUN_ICON, SHRINK_BUTTON, SHRINK_ICON, STOP_BUTTON,
};
use ripple_studio::state_machine::activity_sm::State as ActivityState;
use ripple_studio::state_machine::window_sm::State as WindowState;
use ripple_studio::status::{SessionStatus, StatusCell};
use ripple_studio::workbench::Workbench;

struct Harness {
    workbench: Workbench,
    outbound_rx: mpsc::UnboundedReceiver<Frame>,
}

fn harness() -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let status = StatusCell::new();
    let workbench = Workbench::new(
        OutboundSender::new(tx),
        status,
        Box::new(ScratchEditor::new()),
    );
    Harness {
        workbench,
        outbound_rx: rx,
    }
}

impl Harness {
    /// Event names of every frame sent since the last call.
    fn sent(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        while let Ok(frame) = self.outbound_rx.try_recv() {
            events.push(frame.event);
        }
        events
    }

    fn ack(&mut self, ack: Ack) {
        self.workbench.channel_event(ChannelEvent::Ack(ack));
    }

    /// Deliver start and end signals for every pending animation.
    fn finish_animations(&mut self) {
        for request in self.workbench.take_animation_requests() {
            self.workbench.animation_signal(&AnimationSignal::Started {
                element: request.element.clone(),
            });
            self.workbench.animation_signal(&AnimationSignal::Ended {
                element: request.element,
            });
        }
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.workbench.stage().lock().unwrap().has_class(id, class)
    }

    fn is_attached(&self, id: &str) -> bool {
        self.workbench.stage().lock().unwrap().is_attached(id)
    }

    fn revision(&self) -> u64 {
        self.workbench.stage().lock().unwrap().revision()
    }
}

// ---------------------------------------------------------------------------
// First run: panel construction and command emission
// ---------------------------------------------------------------------------

#[test]
fn run_from_initial_builds_panel_and_requests_play() {
    let mut h = harness();

    h.workbench.click(RUN_BUTTON);

    assert_eq!(h.workbench.window_state(), WindowState::expanded());
    assert!(h.is_attached(OUTPUT_PANEL));
    assert!(h.is_attached(OUTPUT_TITLEBAR));
    assert!(h.is_attached(QUIT_BUTTON));
    assert!(h.has_class(CONTAINER, CLASS_CONTAINER_MIN));
    assert!(!h.has_class(CONTAINER, CLASS_CONTAINER_MAX));
    assert!(h.has_class(OUTPUT_PANEL, CLASS_OUTPUT_MAX));

    // the container animates into the shrunk layout
    let stage = h.workbench.stage();
    let animation = stage.lock().unwrap().animation(CONTAINER).unwrap();
    assert_eq!(animation.name, ANIM_SHRINK);

    // play was requested, but activity waits for the acknowledgement
    assert_eq!(h.sent(), vec![EVENT_PLAY.to_string()]);
    assert_eq!(h.workbench.activity_state(), ActivityState::stopped());
    assert!(h.has_class(RUN_ICON, CLASS_ICON_PLAY));
}

#[test]
fn playing_ack_transitions_activity_and_swaps_icon() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);

    h.ack(Ack::Playing);

    assert_eq!(h.workbench.activity_state(), ActivityState::running());
    assert!(h.has_class(RUN_ICON, CLASS_ICON_PAUSE));
    assert!(!h.has_class(RUN_ICON, CLASS_ICON_PLAY));
}

/// `Initial`'s `run` is a pure delegation to `Shrunk`'s `run` handling: both
/// paths end in the same window state with the same container layout.
#[test]
fn initial_run_matches_shrunk_run() {
    let mut from_initial = harness();
    from_initial.workbench.click(RUN_BUTTON);

    let mut from_shrunk = harness();
    from_shrunk.workbench.click(RUN_BUTTON);
    from_shrunk.workbench.click(SHRINK_BUTTON); // Expanded → Shrunk
    from_shrunk.workbench.click(RUN_BUTTON); // Shrunk + run

    assert_eq!(
        from_initial.workbench.window_state(),
        from_shrunk.workbench.window_state()
    );
    for class in [CLASS_CONTAINER_MIN, CLASS_CONTAINER_MAX] {
        assert_eq!(
            from_initial.has_class(CONTAINER, class),
            from_shrunk.has_class(CONTAINER, class),
        );
    }
}

// ---------------------------------------------------------------------------
// No-op transitions
// ---------------------------------------------------------------------------

#[test]
fn unlisted_pairs_are_silent_noops() {
    let mut h = harness();

    // shrink before the panel exists: twice, no state or visual change
    let before = h.revision();
    for _ in 0..2 {
        h.workbench.click(SHRINK_BUTTON); // unbound yet, dropped
        assert_eq!(h.workbench.window_state(), WindowState::initial());
    }
    assert_eq!(h.revision(), before);

    // acknowledgements with no table entry for Stopped
    let before = h.revision();
    for _ in 0..2 {
        h.ack(Ack::Stopped);
        h.ack(Ack::Paused);
        assert_eq!(h.workbench.activity_state(), ActivityState::stopped());
    }
    assert_eq!(h.revision(), before);
}

// ---------------------------------------------------------------------------
// Activity round trip and freeze guard
// ---------------------------------------------------------------------------

#[test]
fn activity_round_trip_restores_icon() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    let baseline = h
        .workbench
        .stage()
        .lock()
        .unwrap()
        .classes(RUN_ICON);

    h.ack(Ack::Playing); // Stopped → Running
    h.ack(Ack::Paused); // Running → Paused
    h.ack(Ack::Playing); // Paused → Running
    h.ack(Ack::Stopped); // Running → Stopped

    assert_eq!(h.workbench.activity_state(), ActivityState::stopped());
    assert_eq!(
        h.workbench.stage().lock().unwrap().classes(RUN_ICON),
        baseline
    );
}

#[test]
fn error_status_freezes_every_acknowledgement() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    h.ack(Ack::Playing);
    assert_eq!(h.workbench.activity_state(), ActivityState::running());

    h.ack(Ack::Error {
        reason: Some(REASON_REJECTED.to_string()),
    });
    assert_eq!(
        h.workbench.session_status(),
        SessionStatus::Error {
            reason: Some(REASON_REJECTED.to_string())
        }
    );

    let before = h.revision();
    for ack in [Ack::Playing, Ack::Paused, Ack::Stopped] {
        h.ack(ack);
        assert_eq!(h.workbench.activity_state(), ActivityState::running());
    }
    assert_eq!(h.revision(), before);
    assert!(h.has_class(RUN_ICON, CLASS_ICON_PAUSE));
}

#[test]
fn stop_clears_a_frozen_error() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    h.ack(Ack::Error {
        reason: Some(REASON_REJECTED.to_string()),
    });

    // frozen: the successful play report is ignored
    h.ack(Ack::Playing);
    assert_eq!(h.workbench.activity_state(), ActivityState::stopped());

    h.workbench.click(STOP_BUTTON);
    assert_eq!(h.workbench.session_status(), SessionStatus::Ok);

    h.ack(Ack::Playing);
    assert_eq!(h.workbench.activity_state(), ActivityState::running());
}

// ---------------------------------------------------------------------------
// Shrink toggle with animation lifecycle
// ---------------------------------------------------------------------------

#[test]
fn shrink_from_expanded_ends_with_restore_icon() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    h.ack(Ack::Playing);
    h.finish_animations();

    h.workbench.click(SHRINK_BUTTON);
    assert_eq!(h.workbench.window_state(), WindowState::shrunk());
    let stage = h.workbench.stage();
    let animation = stage.lock().unwrap().animation(CONTAINER).unwrap();
    assert_eq!(animation.name, ANIM_TRAN_EXPAND);

    // relayout runs between animation start and end, then stops
    for request in h.workbench.take_animation_requests() {
        h.workbench.animation_signal(&AnimationSignal::Started {
            element: request.element.clone(),
        });
        assert!(h.workbench.relayout_frame());
        h.workbench.animation_signal(&AnimationSignal::Ended {
            element: request.element,
        });
        assert!(!h.workbench.relayout_frame());
    }

    assert!(h.has_class(SHRINK_ICON, CLASS_ICON_RESTORE));
}

// ---------------------------------------------------------------------------
// Stop while paused, independent of window state
// ---------------------------------------------------------------------------

#[test]
fn stop_while_paused_reverts_to_play_icon() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    h.ack(Ack::Playing);
    h.workbench.click(RUN_BUTTON); // Expanded: run only toggles playback
    h.ack(Ack::Paused);
    assert_eq!(h.workbench.activity_state(), ActivityState::paused());
    assert_eq!(
        h.sent(),
        vec![
            EVENT_PLAY.to_string(),
            EVENT_PAUSE.to_string(),
        ]
    );

    h.workbench.click(STOP_BUTTON);
    assert_eq!(h.sent(), vec![EVENT_STOP.to_string()]);

    h.ack(Ack::Stopped);
    assert_eq!(h.workbench.activity_state(), ActivityState::stopped());
    assert!(h.has_class(RUN_ICON, CLASS_ICON_PLAY));
    // the window machine was never involved
    assert_eq!(h.workbench.window_state(), WindowState::expanded());
}

// ---------------------------------------------------------------------------
// Quit parks the panel in standby
// ---------------------------------------------------------------------------

#[test]
fn quit_from_expanded_stops_playback_and_parks() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    h.ack(Ack::Playing);
    h.sent();

    h.workbench.click(QUIT_BUTTON);

    assert_eq!(h.workbench.window_state(), WindowState::standby());
    assert_eq!(h.sent(), vec![EVENT_STOP.to_string()]);
    assert!(h.has_class(CONTAINER, CLASS_CONTAINER_MAX));
    assert!(!h.has_class(OUTPUT_PANEL, CLASS_OUTPUT_MAX));
}

#[test]
fn run_from_standby_reopens_the_panel() {
    let mut h = harness();
    h.workbench.click(RUN_BUTTON);
    h.ack(Ack::Playing);
    h.workbench.click(QUIT_BUTTON);
    h.ack(Ack::Stopped);
    h.sent();

    h.workbench.click(RUN_BUTTON);

    assert_eq!(h.workbench.window_state(), WindowState::expanded());
    assert!(h.has_class(OUTPUT_PANEL, CLASS_OUTPUT_MAX));
    assert_eq!(h.sent(), vec![EVENT_PLAY.to_string()]);
}

// ---------------------------------------------------------------------------
// Editor text exchange
// ---------------------------------------------------------------------------

#[test]
fn file_request_is_answered_with_editor_text() {
    let mut h = harness();
    h.workbench.set_editor_text("order_target(context.asset, 10)\n");

    h.workbench.channel_event(ChannelEvent::FileRequested);

    let frame = h.outbound_rx.try_recv().unwrap();
    assert_eq!(frame.event, EVENT_EDITOR_FILE);
    assert_eq!(
        frame.payload_text(),
        Some("order_target(context.asset, 10)\n")
    );
}
