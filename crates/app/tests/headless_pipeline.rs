//! Headless end-to-end test: synthetic chunks through segmentation,
//! dispatch, and command interpretation, with no audio hardware.

use commandflow_app::pipeline::{SegmentationNotice, SegmenterStage};
use commandflow_audio::AudioChunk;
use commandflow_command::{
    CommandError, CommandInterpreter, CommandProcessor, InputInjector, InterpreterConfig,
    KeyChord, NullWindowProbe,
};
use commandflow_stt::types::{DispatchConfig, SttError};
use commandflow_stt::{Transcriber, TranscriptionDispatcher, TranscriptionEvent};
use commandflow_telemetry::PipelineMetrics;
use commandflow_vad::{SegmenterConfig, Utterance, UtteranceSegmenter};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};

const CHUNK: usize = 512;

struct PhraseTranscriber(&'static str);

#[async_trait::async_trait]
impl Transcriber for PhraseTranscriber {
    async fn transcribe_wav(&self, _wav_path: &Path) -> Result<Option<String>, SttError> {
        Ok(Some(self.0.to_string()))
    }

    fn name(&self) -> &'static str {
        "phrase"
    }
}

#[derive(Default)]
struct CapturingInjector {
    moves: Mutex<Vec<(i32, i32)>>,
    chords: Mutex<Vec<KeyChord>>,
}

#[async_trait::async_trait]
impl InputInjector for CapturingInjector {
    async fn move_cursor(&self, x: i32, y: i32, _d: Duration) -> Result<(), CommandError> {
        self.moves.lock().unwrap().push((x, y));
        Ok(())
    }

    async fn key_chord(&self, chord: KeyChord) -> Result<(), CommandError> {
        self.chords.lock().unwrap().push(chord);
        Ok(())
    }

    async fn screen_size(&self) -> Result<(i32, i32), CommandError> {
        Ok((1920, 1080))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "capturing"
    }
}

fn chunk(samples: Vec<i16>) -> AudioChunk {
    AudioChunk {
        samples,
        sample_rate: 48_000,
        timestamp: Instant::now(),
    }
}

#[tokio::test]
async fn spoken_command_drives_injection_end_to_end() {
    let metrics = Arc::new(PipelineMetrics::default());

    // Segmentation stage fed directly from a chunk broadcast.
    let segmenter = UtteranceSegmenter::new(SegmenterConfig {
        chunk_size_samples: CHUNK,
        silence_chunks: 2,
        max_utterance_chunks: None,
        ..Default::default()
    })
    .unwrap();
    let (chunk_tx, _) = broadcast::channel::<AudioChunk>(64);
    let (notice_tx, mut notice_rx) = broadcast::channel::<SegmentationNotice>(16);
    let (utterance_tx, utterance_rx) = mpsc::channel::<Utterance>(8);
    let segmenter_handle = SegmenterStage::new(
        Box::new(segmenter),
        chunk_tx.subscribe(),
        notice_tx,
        utterance_tx,
    )
    .with_metrics(metrics.clone())
    .spawn();

    // Dispatch with a transcriber that always hears the move command.
    let (event_tx, event_rx) = mpsc::channel::<TranscriptionEvent>(8);
    let dispatcher_handle = TranscriptionDispatcher::new(
        utterance_rx,
        event_tx,
        Arc::new(PhraseTranscriber("move mouse to the top right")),
        DispatchConfig::default(),
    )
    .unwrap()
    .with_metrics(metrics.clone())
    .spawn();

    // Command processing with a capturing injector.
    let injector = Arc::new(CapturingInjector::default());
    let interpreter = CommandInterpreter::new(
        InterpreterConfig::default(),
        injector.clone(),
        Arc::new(NullWindowProbe::new()),
    );
    let (_shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    let command_handle = tokio::spawn(
        CommandProcessor::new(interpreter, event_rx, shutdown_rx)
            .with_metrics(metrics.clone())
            .run(),
    );

    // Speak: 3 loud chunks, then 2 silent ones close the utterance.
    for _ in 0..3 {
        chunk_tx.send(chunk(vec![4000i16; CHUNK])).unwrap();
    }
    for _ in 0..2 {
        chunk_tx.send(chunk(vec![0i16; CHUNK])).unwrap();
    }

    // Observe segmentation notices.
    let start = tokio::time::timeout(Duration::from_secs(5), notice_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(start, SegmentationNotice::SpeechStart { .. }));
    let complete = tokio::time::timeout(Duration::from_secs(5), notice_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        complete,
        SegmentationNotice::UtteranceComplete { chunks: 5, .. }
    ));

    // Close the audio source; every stage should wind down in order.
    drop(chunk_tx);
    tokio::time::timeout(Duration::from_secs(5), segmenter_handle)
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), command_handle)
        .await
        .unwrap()
        .unwrap();

    // The recognized phrase reached the injector as a top-right move.
    assert_eq!(injector.moves.lock().unwrap().clone(), vec![(1919, 0)]);
    assert!(injector.chords.lock().unwrap().is_empty());

    assert_eq!(metrics.utterances_segmented.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.utterances_dispatched.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.transcriptions_ok.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.commands_executed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn stopping_mid_speech_flushes_partial_utterance() {
    let segmenter = UtteranceSegmenter::new(SegmenterConfig {
        chunk_size_samples: CHUNK,
        silence_chunks: 8,
        max_utterance_chunks: None,
        ..Default::default()
    })
    .unwrap();
    let (chunk_tx, _) = broadcast::channel::<AudioChunk>(64);
    let (notice_tx, _) = broadcast::channel::<SegmentationNotice>(16);
    let (utterance_tx, mut utterance_rx) = mpsc::channel::<Utterance>(8);
    let handle = SegmenterStage::new(
        Box::new(segmenter),
        chunk_tx.subscribe(),
        notice_tx,
        utterance_tx,
    )
    .spawn();

    // Speech begins but the source stops before trailing silence arrives.
    for _ in 0..4 {
        chunk_tx.send(chunk(vec![4000i16; CHUNK])).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(chunk_tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    let utterance = utterance_rx.recv().await.expect("flushed utterance");
    assert_eq!(utterance.chunks, 4);
    assert!(utterance_rx.recv().await.is_none());
}
