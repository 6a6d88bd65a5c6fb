//! Tests for the command dispatcher

use super::*;
use crate::bindings::{ButtonState, ControllerBinding, Direction, EncoderId, NamedButton, ValueMatch};
use crate::components::{ListNavigator, Parameter, ParameterBank};
use crate::listener::CommandListener;
use crate::midi::{classify, Classification, MidiMessage};
use crate::relay;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::io;
use std::sync::Arc;
use std::time::Duration;

type Log = Rc<RefCell<Vec<String>>>;

/// Records every notification it gets, prefixed with its name
struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Rc<Self> {
        Rc::new(Self { name, log: log.clone() })
    }

    fn push(&self, what: &str) {
        self.log.borrow_mut().push(format!("{}.{}", self.name, what));
    }
}

impl CommandListener for Recorder {
    fn controller_event_received(&self, controller: u8, value: u8) {
        self.push(&format!("cc({},{})", controller, value));
    }
    fn encoder1_increased(&self) {
        self.push("encoder1_increased");
    }
    fn encoder1_decreased(&self) {
        self.push("encoder1_decreased");
    }
    fn encoder1_button_pressed(&self) {
        self.push("encoder1_button_pressed");
    }
    fn encoder1_button_released(&self) {
        self.push("encoder1_button_released");
    }
    fn play_button_pressed(&self) {
        self.push("play_button_pressed");
    }
}

/// Panics on play, for checking that handler failures are not swallowed
struct FailingListener;

impl CommandListener for FailingListener {
    fn play_button_pressed(&self) {
        panic!("listener failed on play");
    }
}

/// In-memory log sink for a thread-local subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn cc(number: u8, value: u8) -> MidiEvent {
    MidiEvent::controller("test-device", number, value)
}

fn enc(id: u8) -> EncoderId {
    EncoderId::new(id).unwrap()
}

#[test]
fn test_encoder1_scenarios() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    assert_eq!(
        dispatcher.handle_event(&cc(1, 1)),
        Some(SemanticCommand::Encoder { id: enc(1), direction: Direction::Increase })
    );
    assert_eq!(
        dispatcher.handle_event(&cc(1, 127)),
        Some(SemanticCommand::Encoder { id: enc(1), direction: Direction::Decrease })
    );
    dispatcher.handle_event(&cc(64, 127));
    dispatcher.handle_event(&cc(64, 0));

    assert_eq!(
        *log.borrow(),
        vec![
            "l.cc(1,1)",
            "l.encoder1_increased",
            "l.cc(1,127)",
            "l.encoder1_decreased",
            "l.cc(64,127)",
            "l.encoder1_button_pressed",
            "l.cc(64,0)",
            "l.encoder1_button_released",
        ]
    );
}

#[test]
fn test_unmapped_controller_only_passes_through() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    for value in [0, 1, 64, 127] {
        assert_eq!(dispatcher.handle_event(&cc(99, value)), None);
    }

    assert_eq!(
        *log.borrow(),
        vec!["l.cc(99,0)", "l.cc(99,1)", "l.cc(99,64)", "l.cc(99,127)"]
    );
}

#[test]
fn test_encoder_ignores_other_values_but_passes_through() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    assert_eq!(dispatcher.handle_event(&cc(1, 64)), None);
    assert_eq!(*log.borrow(), vec!["l.cc(1,64)"]);
}

#[test]
fn test_channel_mode_messages_still_pass_through() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    let all_notes_off = cc(123, 0);
    let all_sound_off = cc(120, 0);
    assert_eq!(classify(&all_notes_off), Classification::AllNotesOff);
    assert_eq!(classify(&all_sound_off), Classification::AllSoundOff);

    assert_eq!(dispatcher.handle_event(&all_notes_off), None);
    assert_eq!(dispatcher.handle_event(&all_sound_off), None);
    assert_eq!(*log.borrow(), vec!["l.cc(123,0)", "l.cc(120,0)"]);
}

#[test]
#[should_panic(expected = "listener failed on play")]
fn test_listener_panic_is_not_caught() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));
    dispatcher.add_listener(Rc::new(FailingListener));

    dispatcher.handle_event(&cc(39, 127));
}

#[test]
fn test_non_controller_messages_reach_nobody() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    let note = MidiEvent::from_message("keys", MidiMessage::NoteOn { channel: 0, note: 60, velocity: 90 });
    let garbage = MidiEvent::from_raw(Arc::from("keys"), &[0x01, 0x02]);

    assert_eq!(dispatcher.handle_event(&note), None);
    assert_eq!(dispatcher.handle_event(&garbage), None);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_play_pressed_reaches_both_listeners_in_order() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l1", &log));
    dispatcher.add_listener(Recorder::new("l2", &log));

    dispatcher.handle_event(&cc(39, 127));

    let plays: Vec<_> = log
        .borrow()
        .iter()
        .filter(|entry| entry.ends_with("play_button_pressed"))
        .cloned()
        .collect();
    assert_eq!(plays, vec!["l1.play_button_pressed", "l2.play_button_pressed"]);
}

#[test]
fn test_removed_listener_stops_receiving() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    let recorder: ListenerRef = Recorder::new("l", &log);
    dispatcher.add_listener(recorder.clone());
    dispatcher.remove_listener(&recorder);

    dispatcher.handle_event(&cc(39, 127));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_only_focused_list_moves() {
    let dispatcher = CommandDispatcher::default();
    let tracks = Rc::new(ListNavigator::new(
        dispatcher.focus(),
        "Tracks",
        vec!["Drums".into(), "Bass".into(), "Keys".into()],
    ));
    let plugins = Rc::new(ListNavigator::new(
        dispatcher.focus(),
        "Plugins",
        vec!["Reverb".into(), "Delay".into()],
    ));
    dispatcher.add_listener(tracks.clone());
    dispatcher.add_listener(plugins.clone());

    tracks.grab_focus();
    dispatcher.handle_event(&cc(1, 1));
    dispatcher.handle_event(&cc(1, 1));
    assert_eq!(tracks.selected_index(), 2);
    assert_eq!(plugins.selected_index(), 0);

    plugins.grab_focus();
    dispatcher.handle_event(&cc(1, 1));
    dispatcher.handle_event(&cc(1, 127));
    dispatcher.handle_event(&cc(1, 1));
    assert_eq!(tracks.selected_index(), 2);
    assert_eq!(plugins.selected_index(), 1);
}

#[test]
fn test_open_pushes_new_component_and_moves_focus() {
    let dispatcher = Rc::new(CommandDispatcher::default());
    let pushed: Rc<RefCell<Vec<Rc<ListNavigator>>>> = Rc::default();

    let sequencers = Rc::new(ListNavigator::new(
        dispatcher.focus(),
        "Sequencers",
        vec!["Step".into(), "Euclid".into()],
    ));
    {
        let dispatcher = dispatcher.clone();
        let pushed = pushed.clone();
        sequencers.set_on_open(Box::new(move |list, index| {
            let view = Rc::new(ListNavigator::new(
                dispatcher.focus(),
                format!("{} / {}", list.title(), index),
                vec!["a".into(), "b".into(), "c".into()],
            ));
            dispatcher.add_listener(view.clone());
            view.grab_focus();
            pushed.borrow_mut().push(view);
        }));
    }
    dispatcher.add_listener(sequencers.clone());
    sequencers.grab_focus();

    dispatcher.handle_event(&cc(1, 1));
    dispatcher.handle_event(&cc(64, 127));
    dispatcher.handle_event(&cc(64, 0));

    let view = pushed.borrow()[0].clone();
    assert_eq!(view.title(), "Sequencers / 1");
    assert_eq!(dispatcher.focus().focused_component(), Some(view.id()));

    // The new view did not see the release that created it; it reacts from now on
    dispatcher.handle_event(&cc(1, 1));
    assert_eq!(view.selected_index(), 1);
    assert_eq!(sequencers.selected_index(), 1);
}

#[test]
fn test_shift_bank_with_custom_bindings() {
    let mut bindings = crate::bindings::default_bindings();
    bindings.push(ControllerBinding {
        cc: 20,
        value: ValueMatch::Exact(127),
        command: SemanticCommand::Button { name: NamedButton::Shift, state: ButtonState::Pressed },
    });
    bindings.push(ControllerBinding {
        cc: 20,
        value: ValueMatch::Exact(0),
        command: SemanticCommand::Button { name: NamedButton::Shift, state: ButtonState::Released },
    });
    let dispatcher = CommandDispatcher::new(BindingTable::from_bindings(&bindings).unwrap());

    let params = (0..16)
        .map(|i| Parameter::new(format!("p{}", i), 0.0, 10.0, 1.0))
        .collect();
    let bank = Rc::new(ParameterBank::new(params));
    dispatcher.add_listener(bank.clone());

    dispatcher.handle_event(&cc(2, 1));
    dispatcher.handle_event(&cc(20, 127));
    dispatcher.handle_event(&cc(2, 1));
    dispatcher.handle_event(&cc(2, 1));
    dispatcher.handle_event(&cc(20, 0));

    assert_eq!(bank.value(1), Some(1.0));
    assert_eq!(bank.value(9), Some(2.0));
    assert!(!bank.is_shift_down());
}

#[tokio::test]
async fn test_run_drains_relay_in_order() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    let (tx, rx) = relay::channel(16);
    let source: Arc<str> = Arc::from("hw");
    let producer = std::thread::spawn(move || {
        tx.on_hardware_message(&source, &[0xB0, 1, 1]);
        tx.on_hardware_message(&source, &[0xB0, 39, 127]);
        tx.on_hardware_message(&source, &[0xB0, 1, 127]);
    });
    producer.join().unwrap();

    dispatcher.run(rx, std::future::pending::<()>()).await;

    let semantic: Vec<_> = log
        .borrow()
        .iter()
        .filter(|entry| !entry.contains(".cc("))
        .cloned()
        .collect();
    assert_eq!(
        semantic,
        vec!["l.encoder1_increased", "l.play_button_pressed", "l.encoder1_decreased"]
    );
}

#[tokio::test]
async fn test_shutdown_drops_pending_events() {
    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    let (tx, rx) = relay::channel(16);
    let source: Arc<str> = Arc::from("hw");
    tx.on_hardware_message(&source, &[0xB0, 39, 127]);

    dispatcher.run(rx, std::future::ready(())).await;

    assert!(log.borrow().is_empty());
    assert!(!tx.on_hardware_message(&source, &[0xB0, 39, 127]));
}

#[tokio::test]
async fn test_run_waits_for_shutdown_while_a_sender_is_held() {
    let dispatcher = CommandDispatcher::default();

    let (_idle, rx) = relay::channel(4);
    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        dispatcher.run(rx, std::future::pending::<()>()),
    )
    .await;
    assert!(outcome.is_err(), "run returned with a sender still alive");

    let (idle, rx) = relay::channel(4);
    dispatcher
        .run(rx, tokio::time::sleep(Duration::from_millis(20)))
        .await;
    assert!(idle.is_closed());
}

#[tokio::test]
async fn test_run_warns_when_relay_overflowed() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let log = Log::default();
    let dispatcher = CommandDispatcher::default();
    dispatcher.add_listener(Recorder::new("l", &log));

    let (tx, rx) = relay::channel(1);
    let source: Arc<str> = Arc::from("hw");
    assert!(tx.on_hardware_message(&source, &[0xB0, 39, 127]));
    assert!(!tx.on_hardware_message(&source, &[0xB0, 40, 127]));
    drop(tx);

    dispatcher.run(rx, std::future::pending::<()>()).await;

    assert_eq!(*log.borrow(), vec!["l.cc(39,127)", "l.play_button_pressed"]);
    assert!(logs.text().contains("1 event(s) dropped so far"));
}
