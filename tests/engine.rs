//! Backend engine behaviour: admission, acknowledgement ordering, the
//! stop guard, and a full front-end/backend exchange run without sockets by
//! piping frames between the engine and the workbench.

use tokio::sync::mpsc;

use ripple_studio::backend::{Engine, EngineState, FixedAdmission};
use ripple_studio::channel::{ChannelEvent, OutboundSender};
use ripple_studio::editor::ScratchEditor;
use ripple_studio::protocol::{
    Ack, Command, EVENT_GET_FILE, EVENT_PLAYING, Frame, REASON_REJECTED,
};
use ripple_studio::stage::RUN_BUTTON;
use ripple_studio::state_machine::activity_sm::State as ActivityState;
use ripple_studio::status::StatusCell;
use ripple_studio::workbench::Workbench;

fn engine(admit: bool) -> Engine {
    Engine::new(Box::new(FixedAdmission(admit)))
}

#[test]
fn admitted_play_acknowledges_then_requests_the_script() {
    let mut engine = engine(true);
    let replies = engine.apply(Command::Play);

    let events: Vec<&str> = replies.iter().map(|f| f.event.as_str()).collect();
    assert_eq!(events, vec![EVENT_PLAYING, EVENT_GET_FILE]);
    assert_eq!(engine.state(), EngineState::Playing);
}

#[test]
fn rejected_play_reports_an_explicit_reason() {
    let mut engine = engine(false);
    let replies = engine.apply(Command::Play);

    assert_eq!(replies.len(), 1);
    assert_eq!(
        Ack::from_frame(&replies[0]),
        Some(Ack::Error {
            reason: Some(REASON_REJECTED.to_string())
        })
    );
    // a declined play leaves the engine stopped
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn stop_is_only_acknowledged_when_something_runs() {
    let mut engine = engine(true);
    assert!(engine.apply(Command::Stop).is_empty());

    engine.apply(Command::Play);
    let replies = engine.apply(Command::Stop);
    assert_eq!(replies.len(), 1);
    assert_eq!(Ack::from_frame(&replies[0]), Some(Ack::Stopped));
    assert_eq!(engine.state(), EngineState::Stopped);

    assert!(engine.apply(Command::Stop).is_empty());
}

#[test]
fn pause_and_resume_acknowledge_unconditionally() {
    let mut engine = engine(true);

    let replies = engine.apply(Command::Pause);
    assert_eq!(Ack::from_frame(&replies[0]), Some(Ack::Paused));
    assert_eq!(engine.state(), EngineState::Paused);

    let replies = engine.apply(Command::Resume);
    assert_eq!(Ack::from_frame(&replies[0]), Some(Ack::Playing));
    assert_eq!(engine.state(), EngineState::Playing);
}

#[test]
fn editor_file_is_stored_as_the_current_script() {
    let mut engine = engine(true);
    let replies = engine.handle_frame(&Frame::editor_file("x = 1\n"));
    assert!(replies.is_empty());
    assert_eq!(engine.script(), Some("x = 1\n"));
}

#[test]
fn unknown_events_are_ignored() {
    let mut engine = engine(true);
    assert!(engine.handle_frame(&Frame::named("main:playing")).is_empty());
    assert_eq!(engine.state(), EngineState::Stopped);
}

// ---------------------------------------------------------------------------
// Full exchange, no sockets
// ---------------------------------------------------------------------------

/// Pump every queued front-end frame through the engine and feed the
/// replies back, until both sides drain.
fn pump(
    workbench: &mut Workbench,
    outbound_rx: &mut mpsc::UnboundedReceiver<Frame>,
    engine: &mut Engine,
) {
    loop {
        let Ok(frame) = outbound_rx.try_recv() else {
            break;
        };
        for reply in engine.handle_frame(&frame) {
            // what channel::spawn_client does with inbound frames
            let event = if reply.event == EVENT_GET_FILE {
                ChannelEvent::FileRequested
            } else {
                ChannelEvent::Ack(Ack::from_frame(&reply).expect("backend sent unknown event"))
            };
            workbench.channel_event(event);
        }
    }
}

#[test]
fn play_exchange_reaches_running_and_ships_the_script() {
    let (tx, mut outbound_rx) = mpsc::unbounded_channel();
    let mut workbench = Workbench::new(
        OutboundSender::new(tx),
        StatusCell::new(),
        Box::new(ScratchEditor::new()),
    );
    let mut engine = engine(true);

    workbench.set_editor_text("record(price=data.current(context.asset, 'price'))\n");
    workbench.click(RUN_BUTTON);
    pump(&mut workbench, &mut outbound_rx, &mut engine);

    assert_eq!(workbench.activity_state(), ActivityState::running());
    assert_eq!(engine.state(), EngineState::Playing);
    assert_eq!(
        engine.script(),
        Some("record(price=data.current(context.asset, 'price'))\n")
    );
}

#[test]
fn rejected_play_freezes_the_front_end() {
    let (tx, mut outbound_rx) = mpsc::unbounded_channel();
    let mut workbench = Workbench::new(
        OutboundSender::new(tx),
        StatusCell::new(),
        Box::new(ScratchEditor::new()),
    );
    let mut engine = engine(false);

    workbench.click(RUN_BUTTON);
    pump(&mut workbench, &mut outbound_rx, &mut engine);

    assert_eq!(workbench.activity_state(), ActivityState::stopped());
    assert!(matches!(
        workbench.session_status(),
        ripple_studio::status::SessionStatus::Error { .. }
    ));
}
