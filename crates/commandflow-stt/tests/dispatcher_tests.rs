//! Dispatcher behavior with scripted transcriber backends.

use commandflow_stt::types::{DispatchConfig, SttError, TranscriptionEvent};
use commandflow_stt::{Transcriber, TranscriptionDispatcher};
use commandflow_vad::Utterance;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn utterance(samples: usize) -> Utterance {
    Utterance {
        samples: vec![1000i16; samples],
        sample_rate: 48_000,
        started_at_ms: 0,
        duration_ms: (samples as u64 * 1000) / 48_000,
        chunks: 1,
    }
}

struct ScriptedTranscriber {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe_wav(&self, wav_path: &Path) -> Result<Option<String>, SttError> {
        assert!(wav_path.exists(), "WAV must exist during transcription");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct FailingTranscriber;

#[async_trait::async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe_wav(&self, _wav_path: &Path) -> Result<Option<String>, SttError> {
        Err(SttError::Backend {
            backend: "failing",
            message: "model exploded".into(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn recognized_text_comes_back_as_final_event() {
    let (utt_tx, utt_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::channel(8);
    let calls = Arc::new(AtomicUsize::new(0));

    let dispatcher = TranscriptionDispatcher::new(
        utt_rx,
        event_tx,
        Arc::new(ScriptedTranscriber {
            reply: Some("move the mouse".into()),
            calls: calls.clone(),
        }),
        DispatchConfig::default(),
    )
    .unwrap();
    let handle = dispatcher.spawn();

    utt_tx.send(utterance(4800)).await.unwrap();
    drop(utt_tx);

    let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        TranscriptionEvent::Final { text, utterance_id } => {
            assert_eq!(text, "move the mouse");
            assert!(utterance_id > 0);
        }
        other => panic!("expected Final, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let _ = handle.await;
}

#[tokio::test]
async fn empty_recognition_becomes_no_speech() {
    let (utt_tx, utt_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    let dispatcher = TranscriptionDispatcher::new(
        utt_rx,
        event_tx,
        Arc::new(ScriptedTranscriber {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        DispatchConfig::default(),
    )
    .unwrap();
    let handle = dispatcher.spawn();

    utt_tx.send(utterance(480)).await.unwrap();
    drop(utt_tx);

    let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, TranscriptionEvent::NoSpeech { .. }));
    let _ = handle.await;
}

#[tokio::test]
async fn backend_failure_becomes_error_event() {
    let (utt_tx, utt_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    let dispatcher = TranscriptionDispatcher::new(
        utt_rx,
        event_tx,
        Arc::new(FailingTranscriber),
        DispatchConfig::default(),
    )
    .unwrap();
    let handle = dispatcher.spawn();

    utt_tx.send(utterance(480)).await.unwrap();
    drop(utt_tx);

    let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        TranscriptionEvent::Error { message, .. } => {
            assert!(message.contains("model exploded"));
        }
        other => panic!("expected Error, got {:?}", other),
    }
    let _ = handle.await;
}

#[tokio::test]
async fn every_queued_utterance_gets_exactly_one_event() {
    let (utt_tx, utt_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let calls = Arc::new(AtomicUsize::new(0));

    let dispatcher = TranscriptionDispatcher::new(
        utt_rx,
        event_tx,
        Arc::new(ScriptedTranscriber {
            reply: Some("ok".into()),
            calls: calls.clone(),
        }),
        DispatchConfig {
            workers: 2,
            ..Default::default()
        },
    )
    .unwrap();
    let handle = dispatcher.spawn();

    for _ in 0..10 {
        utt_tx.send(utterance(480)).await.unwrap();
    }
    drop(utt_tx);

    let mut ids = Vec::new();
    for _ in 0..10 {
        let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        ids.push(event.utterance_id());
    }
    assert!(event_rx.recv().await.is_none());

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10, "utterance ids must be unique");
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    let _ = handle.await;
}

#[tokio::test]
async fn disabled_dispatch_exits_without_consuming() {
    let (utt_tx, utt_rx) = mpsc::channel::<Utterance>(8);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    let dispatcher = TranscriptionDispatcher::new(
        utt_rx,
        event_tx,
        Arc::new(ScriptedTranscriber {
            reply: Some("never".into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        DispatchConfig {
            enabled: false,
            ..Default::default()
        },
    )
    .unwrap();

    dispatcher.spawn().await.unwrap();
    drop(utt_tx);
    assert!(event_rx.recv().await.is_none());
}
