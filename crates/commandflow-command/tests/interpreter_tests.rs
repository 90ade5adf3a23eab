//! Interpreter and processor behavior with a recording injector.

use commandflow_command::window::StaticWindowProbe;
use commandflow_command::{
    Command, CommandError, CommandInterpreter, CommandOutcome, CommandProcessor, CursorTarget,
    InputInjector, InterpreterConfig, KeyChord, NullWindowProbe,
};
use commandflow_stt::TranscriptionEvent;
use commandflow_telemetry::PipelineMetrics;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Move { x: i32, y: i32 },
    Chord(KeyChord),
}

#[derive(Default)]
struct RecordingInjector {
    actions: Mutex<Vec<Action>>,
    fail: bool,
}

impl RecordingInjector {
    fn failing() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl InputInjector for RecordingInjector {
    async fn move_cursor(&self, x: i32, y: i32, _duration: Duration) -> Result<(), CommandError> {
        if self.fail {
            return Err(CommandError::InjectionFailed("rigged to fail".into()));
        }
        self.actions.lock().unwrap().push(Action::Move { x, y });
        Ok(())
    }

    async fn key_chord(&self, chord: KeyChord) -> Result<(), CommandError> {
        if self.fail {
            return Err(CommandError::InjectionFailed("rigged to fail".into()));
        }
        self.actions.lock().unwrap().push(Action::Chord(chord));
        Ok(())
    }

    async fn screen_size(&self) -> Result<(i32, i32), CommandError> {
        Ok((2560, 1440))
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

fn interpreter(
    config: InterpreterConfig,
    injector: Arc<RecordingInjector>,
) -> CommandInterpreter {
    CommandInterpreter::new(config, injector, Arc::new(NullWindowProbe::new()))
}

#[tokio::test]
async fn move_mouse_lands_on_default_position() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(InterpreterConfig::default(), injector.clone());

    let outcome = interp.handle("move the mouse").await;
    assert_eq!(
        outcome,
        CommandOutcome::Executed(Command::MoveCursor {
            target: CursorTarget::Default
        })
    );
    assert_eq!(injector.actions(), vec![Action::Move { x: 200, y: 200 }]);
}

#[tokio::test]
async fn top_right_resolves_against_screen_geometry() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(InterpreterConfig::default(), injector.clone());

    let outcome = interp.handle("move mouse to the top right corner").await;
    assert!(matches!(outcome, CommandOutcome::Executed(_)));
    assert_eq!(injector.actions(), vec![Action::Move { x: 2559, y: 0 }]);
}

#[tokio::test]
async fn close_window_issues_alt_f4() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(InterpreterConfig::default(), injector.clone());

    let outcome = interp.handle("please close window").await;
    assert_eq!(outcome, CommandOutcome::Executed(Command::CloseWindow));
    assert_eq!(injector.actions(), vec![Action::Chord(KeyChord::AltF4)]);
}

#[tokio::test]
async fn unmatched_text_does_nothing() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(InterpreterConfig::default(), injector.clone());

    assert_eq!(interp.handle("tell me a story").await, CommandOutcome::NoMatch);
    assert!(injector.actions().is_empty());
}

#[tokio::test]
async fn blocklisted_app_suppresses_command() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = CommandInterpreter::new(
        InterpreterConfig {
            blocklist: vec!["screenshare".into()],
            ..Default::default()
        },
        injector.clone(),
        Arc::new(StaticWindowProbe::new("Weekly Sync", "ScreenShare Pro")),
    );

    let outcome = interp.handle("close window").await;
    assert_eq!(
        outcome,
        CommandOutcome::SuppressedByFocus {
            app_name: Some("ScreenShare Pro".into())
        }
    );
    assert!(injector.actions().is_empty());
}

#[tokio::test]
async fn unknown_focus_suppresses_when_policy_says_so() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(
        InterpreterConfig {
            act_on_unknown_focus: false,
            ..Default::default()
        },
        injector.clone(),
    );

    let outcome = interp.handle("close window").await;
    assert_eq!(
        outcome,
        CommandOutcome::SuppressedByFocus { app_name: None }
    );
    assert!(injector.actions().is_empty());
}

#[tokio::test]
async fn injector_failure_reports_failed_outcome() {
    let injector = Arc::new(RecordingInjector::failing());
    let interp = interpreter(InterpreterConfig::default(), injector);

    let outcome = interp.handle("close window").await;
    assert!(matches!(outcome, CommandOutcome::Failed(_)));
}

#[tokio::test]
async fn processor_counts_outcomes_and_ignores_non_final_events() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(InterpreterConfig::default(), injector.clone());
    let metrics = Arc::new(PipelineMetrics::default());

    let (event_tx, event_rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let processor =
        CommandProcessor::new(interp, event_rx, shutdown_rx).with_metrics(metrics.clone());
    let handle = tokio::spawn(processor.run());

    event_tx
        .send(TranscriptionEvent::Final {
            utterance_id: 1,
            text: "move mouse".into(),
        })
        .await
        .unwrap();
    event_tx
        .send(TranscriptionEvent::NoSpeech { utterance_id: 2 })
        .await
        .unwrap();
    event_tx
        .send(TranscriptionEvent::Error {
            utterance_id: 3,
            message: "backend died".into(),
        })
        .await
        .unwrap();
    event_tx
        .send(TranscriptionEvent::Final {
            utterance_id: 4,
            text: "gibberish".into(),
        })
        .await
        .unwrap();
    drop(event_tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(metrics.commands_executed.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.commands_unmatched.load(Ordering::Relaxed), 1);
    assert_eq!(injector.actions(), vec![Action::Move { x: 200, y: 200 }]);
}

#[tokio::test]
async fn processor_stops_on_shutdown_signal() {
    let injector = Arc::new(RecordingInjector::default());
    let interp = interpreter(InterpreterConfig::default(), injector);

    let (_event_tx, event_rx) = mpsc::channel::<TranscriptionEvent>(8);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let processor = CommandProcessor::new(interp, event_rx, shutdown_rx);
    let handle = tokio::spawn(processor.run());

    shutdown_tx.send(()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
