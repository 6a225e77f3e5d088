//! Scenario tests for the orchestrator.

use super::*;
use futures::StreamExt;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use vocalis_audio::codec::{DisabledEncoder, wav};
use vocalis_audio::{AudioPostProcessor, RawAudio, ResponseFormat};
use vocalis_engine::{
    AudioSegments, EngineError, FeatureMatrix, ModelGateway, SpeakerProfile, TextSegments,
};
use vocalis_profile::CloneRequest;

const RATE: u32 = 16000;
const SEGMENT_SAMPLES: usize = 100;

// ============================================================================
// Mock Gateway
// ============================================================================

/// Splits text on `|`. Each segment becomes one audio segment of
/// `SEGMENT_SAMPLES` samples. A segment containing `FAIL_CALL` fails the
/// synthesize call; one containing `FAIL_ITER` yields an error item; one
/// containing `PANIC` panics.
struct MockGateway {
    ready: AtomicBool,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    synth_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    registered: AtomicUsize,
    normalized: StdMutex<Vec<String>>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            delay: Duration::from_millis(2),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            synth_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            registered: AtomicUsize::new(0),
            normalized: StdMutex::new(Vec::new()),
        }
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn last_normalized(&self) -> String {
        self.normalized.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl ModelGateway for MockGateway {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn sample_rate(&self) -> u32 {
        RATE
    }

    fn normalize(&self, text: &str) -> vocalis_engine::Result<TextSegments<'_>> {
        self.enter();
        self.normalized.lock().unwrap().push(text.to_string());
        let segments: Vec<String> = text
            .split('|')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.exit();
        Ok(Box::new(segments.into_iter()))
    }

    fn extract_embedding(&self, _sample: &RawAudio) -> vocalis_engine::Result<Vec<f32>> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0.5; 8])
    }

    fn extract_features(&self, _sample: &RawAudio) -> vocalis_engine::Result<FeatureMatrix> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        FeatureMatrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0])
    }

    fn extract_tokens(&self, _sample: &RawAudio) -> vocalis_engine::Result<Vec<i32>> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![5, 6, 7])
    }

    fn synthesize<'a>(
        &'a self,
        text: &str,
        _profile: &SpeakerProfile,
        _stream: bool,
    ) -> vocalis_engine::Result<AudioSegments<'a>> {
        self.enter();
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("PANIC") {
            self.exit();
            panic!("engine crashed");
        }
        let result: vocalis_engine::Result<AudioSegments<'a>> = if text.contains("FAIL_CALL") {
            Err(EngineError::engine("device lost"))
        } else if text.contains("FAIL_ITER") {
            Ok(Box::new(std::iter::once(Err(EngineError::engine(
                "decoder diverged",
            )))))
        } else {
            let audio = RawAudio::new(vec![0.1; SEGMENT_SAMPLES], RATE);
            Ok(Box::new(std::iter::once(Ok(audio))))
        };
        self.exit();
        result
    }

    fn register_speaker(&self, _profile: &SpeakerProfile) -> vocalis_engine::Result<()> {
        self.registered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    dir: TempDir,
    gw: Arc<MockGateway>,
    orch: Arc<Orchestrator>,
}

fn sample_wav() -> Vec<u8> {
    wav::encode(&RawAudio::new(vec![0.2; 1600], RATE)).unwrap()
}

fn config_in(dir: &TempDir) -> Config {
    Config {
        voices_dir: dir.path().join("voices"),
        bundle_dir: dir.path().join("bundles"),
        ..Config::default()
    }
}

fn orchestrator(config: Config, gw: Arc<MockGateway>) -> Arc<Orchestrator> {
    let post = AudioPostProcessor::new(Arc::new(DisabledEncoder));
    Arc::new(Orchestrator::with_post_processor(config, gw, post))
}

async fn fixture_with(configure: impl FnOnce(&mut Config)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    configure(&mut config);

    let gw = Arc::new(MockGateway::new());
    let orch = orchestrator(config, gw.clone());
    orch.initialize().await.unwrap();
    orch.clone_and_persist(CloneRequest {
        voice_id: "v1".to_string(),
        speaker_label: "S".to_string(),
        customer_id: "c1".to_string(),
        sample: sample_wav(),
        prompt_text: "hello".to_string(),
    })
    .await
    .unwrap();

    Fixture { dir, gw, orch }
}

async fn fixture() -> Fixture {
    fixture_with(|_| {}).await
}

fn decoded_len(out: &SynthesisOutput) -> usize {
    wav::decode(&out.audio).unwrap().len()
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn test_batch_concatenates_segments() {
    let f = fixture().await;
    let out = f
        .orch
        .synthesize(SynthesisRequest::new("a|b|c", "v1"))
        .await
        .unwrap();

    assert_eq!(out.format, ResponseFormat::Wav);
    assert_eq!(out.content_type(), "audio/wav");
    assert_eq!(decoded_len(&out), 3 * SEGMENT_SAMPLES);
    assert!(!out.is_degraded());
}

#[tokio::test]
async fn test_batch_failure_has_no_output() {
    let f = fixture().await;
    let err = f
        .orch
        .synthesize(SynthesisRequest::new("a|FAIL_CALL|c", "v1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SynthesisFailure);

    let err = f
        .orch
        .synthesize(SynthesisRequest::new("a|FAIL_ITER", "v1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SynthesisFailure);
}

#[tokio::test]
async fn test_model_not_ready() {
    let f = fixture().await;
    f.gw.ready.store(false, Ordering::SeqCst);

    let err = f
        .orch
        .synthesize(SynthesisRequest::new("hi", "v1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelNotReady);

    let err = f
        .orch
        .synthesize_stream(SynthesisRequest::new("hi", "v1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelNotReady);
    assert_eq!(f.gw.synth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_voice_not_found() {
    let f = fixture().await;
    let err = f
        .orch
        .synthesize(SynthesisRequest::new("hi", "nobody"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VoiceNotFound);

    let err = f
        .orch
        .synthesize_stream(SynthesisRequest::new("hi", "nobody"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VoiceNotFound);
}

#[tokio::test]
async fn test_text_truncated() {
    let f = fixture_with(|c| c.max_text_length = 5).await;

    f.orch
        .synthesize(SynthesisRequest::new("abcdefghij", "v1"))
        .await
        .unwrap();
    assert_eq!(f.gw.last_normalized(), "abcde");

    f.orch
        .synthesize(SynthesisRequest::new("你好世界你好世界", "v1"))
        .await
        .unwrap();
    assert_eq!(f.gw.last_normalized(), "你好世界你");

    f.orch
        .synthesize(SynthesisRequest::new("abc", "v1"))
        .await
        .unwrap();
    assert_eq!(f.gw.last_normalized(), "abc");
}

#[tokio::test]
async fn test_mp3_degrades_to_wav() {
    let f = fixture().await;
    let out = f
        .orch
        .synthesize(SynthesisRequest::new("a|b", "v1").with_format(ResponseFormat::Mp3))
        .await
        .unwrap();

    assert_eq!(out.format, ResponseFormat::Wav);
    assert!(out.is_degraded());
    assert_eq!(decoded_len(&out), 2 * SEGMENT_SAMPLES);
}

#[tokio::test]
async fn test_speed_applied() {
    let f = fixture().await;
    let out = f
        .orch
        .synthesize(SynthesisRequest::new("a|b|c", "v1").with_speed(2.0))
        .await
        .unwrap();
    assert_eq!(decoded_len(&out), 3 * SEGMENT_SAMPLES / 2);
}

#[tokio::test]
async fn test_flac_output() {
    let f = fixture().await;
    let out = f
        .orch
        .synthesize(SynthesisRequest::new("a", "v1").with_format(ResponseFormat::Flac))
        .await
        .unwrap();
    assert_eq!(out.content_type(), "audio/flac");
    assert_eq!(&out.audio[..4], b"fLaC");
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test]
async fn test_stream_yields_each_segment() {
    let f = fixture().await;
    let mut stream = f
        .orch
        .synthesize_stream(SynthesisRequest::new("a|b|c", "v1"))
        .await
        .unwrap();

    let mut chunks = Vec::new();
    while let Some(item) = stream.next().await {
        chunks.push(item.unwrap());
    }
    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        assert_eq!(decoded_len(chunk), SEGMENT_SAMPLES);
    }
}

#[tokio::test]
async fn test_stream_failure_after_first_chunk() {
    for text in ["a|FAIL_CALL|c", "a|FAIL_ITER|c"] {
        let f = fixture().await;
        let mut stream = f
            .orch
            .synthesize_stream(SynthesisRequest::new(text, "v1"))
            .await
            .unwrap();

        let first = stream.next().await.unwrap();
        assert!(first.is_ok());

        let second = stream.next().await.unwrap();
        assert_eq!(second.unwrap_err().kind(), ErrorKind::SynthesisFailure);

        assert!(stream.next().await.is_none());
        assert_eq!(f.gw.synth_calls.load(Ordering::SeqCst), 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_panic_ends_with_error() {
    let f = fixture().await;
    let mut stream = f
        .orch
        .synthesize_stream(SynthesisRequest::new("a|PANIC|c", "v1"))
        .await
        .unwrap();

    assert!(stream.next().await.unwrap().is_ok());
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, SynthError::Worker(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(stream.next().await.is_none());

    let err = f
        .orch
        .synthesize(SynthesisRequest::new("PANIC", "v1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::Worker(_)));

    let out = tokio::time::timeout(
        Duration::from_secs(10),
        f.orch.synthesize(SynthesisRequest::new("a", "v1")),
    )
    .await
    .expect("engine was not released")
    .unwrap();
    assert_eq!(decoded_len(&out), SEGMENT_SAMPLES);
}

#[tokio::test]
async fn test_streaming_disabled() {
    let f = fixture_with(|c| c.streaming_enabled = false).await;
    let err = f
        .orch
        .synthesize_stream(SynthesisRequest::new("a", "v1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StreamingDisabled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_abandoned_stream_releases_engine() {
    let f = fixture_with(|c| c.concurrent_requests = 1).await;
    let text = vec!["x"; 50].join("|");

    let mut stream = f
        .orch
        .synthesize_stream(SynthesisRequest::new(text, "v1"))
        .await
        .unwrap();
    assert!(stream.next().await.unwrap().is_ok());
    drop(stream);

    let out = tokio::time::timeout(
        Duration::from_secs(10),
        f.orch.synthesize(SynthesisRequest::new("a", "v1")),
    )
    .await
    .expect("engine was not released")
    .unwrap();
    assert_eq!(decoded_len(&out), SEGMENT_SAMPLES);

    // 50 stream segments would have been produced without the release.
    assert!(f.gw.synth_calls.load(Ordering::SeqCst) < 10);
}

// ============================================================================
// Serialization
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overlap() {
    let f = fixture_with(|c| c.concurrent_requests = 4).await;
    let calls_before = f.gw.synth_calls.load(Ordering::SeqCst);

    let mut batch = Vec::new();
    for i in 0..6 {
        let orch = f.orch.clone();
        let text = vec!["seg"; i % 3 + 1].join("|");
        batch.push(tokio::spawn(async move {
            let out = orch.synthesize(SynthesisRequest::new(text, "v1")).await.unwrap();
            (i % 3 + 1, decoded_len(&out))
        }));
    }

    let mut streams = Vec::new();
    for _ in 0..2 {
        let orch = f.orch.clone();
        streams.push(tokio::spawn(async move {
            let mut stream = orch
                .synthesize_stream(SynthesisRequest::new("s|s|s|s", "v1"))
                .await
                .unwrap();
            let mut n = 0;
            while let Some(item) = stream.next().await {
                item.unwrap();
                n += 1;
            }
            n
        }));
    }

    let mut expected_segments = 0;
    for t in batch {
        let (segments, samples) = t.await.unwrap();
        assert_eq!(samples, segments * SEGMENT_SAMPLES);
        expected_segments += segments;
    }
    for t in streams {
        assert_eq!(t.await.unwrap(), 4);
        expected_segments += 4;
    }

    assert_eq!(f.gw.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(
        f.gw.synth_calls.load(Ordering::SeqCst) - calls_before,
        expected_segments
    );
}

// ============================================================================
// Voice Management
// ============================================================================

#[tokio::test]
async fn test_list_voices() {
    let f = fixture().await;
    let voices = f.orch.list_voices().await;
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].id, "v1");
    assert_eq!(voices[0].name, "S");
    assert_eq!(voices[0].voice_type, "custom");
}

#[tokio::test]
async fn test_clone_and_persist_duplicate() {
    let f = fixture().await;
    let err = f
        .orch
        .clone_and_persist(CloneRequest {
            voice_id: "v1".to_string(),
            speaker_label: "Other".to_string(),
            customer_id: "c2".to_string(),
            sample: sample_wav(),
            prompt_text: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateSpeaker);
    assert_eq!(f.orch.list_voices().await.len(), 1);
}

#[tokio::test]
async fn test_clone_invalid_sample() {
    let f = fixture().await;
    let err = f
        .orch
        .clone_and_persist(CloneRequest {
            voice_id: "v2".to_string(),
            speaker_label: "T".to_string(),
            customer_id: "c1".to_string(),
            sample: b"not audio".to_vec(),
            prompt_text: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(!f.dir.path().join("voices").join("v2.wav").exists());
}

#[tokio::test]
async fn test_clone_rejects_path_voice_id() {
    let f = fixture().await;
    let err = f
        .orch
        .clone_and_persist(CloneRequest {
            voice_id: "../escaped".to_string(),
            speaker_label: "T".to_string(),
            customer_id: "c1".to_string(),
            sample: sample_wav(),
            prompt_text: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(!f.dir.path().join("escaped.wav").exists());
    assert_eq!(f.orch.list_voices().await.len(), 1);
}

#[tokio::test]
async fn test_clone_voice_ephemeral() {
    let f = fixture().await;
    let id = f
        .orch
        .clone_voice(sample_wav(), "Bob".to_string(), "prompt".to_string())
        .await
        .unwrap();
    assert_eq!(id, "Bob");
    assert_eq!(f.gw.registered.load(Ordering::SeqCst), 1);

    let voices = f.orch.list_voices().await;
    let bob = voices.iter().find(|v| v.id == "Bob").unwrap();
    assert_eq!(bob.voice_type, "custom");

    let out = f
        .orch
        .synthesize(SynthesisRequest::new("a", "Bob"))
        .await
        .unwrap();
    assert_eq!(decoded_len(&out), SEGMENT_SAMPLES);

    // Re-cloning the same label replaces the voice.
    f.orch
        .clone_voice(sample_wav(), "Bob".to_string(), "again".to_string())
        .await
        .unwrap();
    assert_eq!(f.orch.list_voices().await.len(), 2);
}

#[tokio::test]
async fn test_delete_voice() {
    let f = fixture().await;
    assert!(!f.orch.delete_voice("unknown").await.unwrap());
    assert!(f.orch.delete_voice("v1").await.unwrap());

    let err = f
        .orch
        .synthesize(SynthesisRequest::new("a", "v1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VoiceNotFound);
    assert!(!f.orch.delete_voice("v1").await.unwrap());
}

#[tokio::test]
async fn test_restart_reuses_bundles() {
    let f = fixture().await;
    let extracted = f.gw.extract_calls.load(Ordering::SeqCst);
    assert_eq!(extracted, 3);

    let gw = Arc::new(MockGateway::new());
    let restarted = orchestrator(config_in(&f.dir), gw.clone());
    let report = restarted.initialize().await.unwrap();

    assert_eq!(report.loaded, vec!["v1".to_string()]);
    assert_eq!(report.extracted, 0);
    assert_eq!(gw.extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(restarted.list_voices().await, f.orch.list_voices().await);
}

#[tokio::test]
async fn test_health() {
    let f = fixture().await;
    let health = f.orch.health().await;
    assert!(health.model_ready);
    assert_eq!(health.voices, 1);
    assert!(health.streaming_enabled);
    assert_eq!(health.workers, 4);
}

#[test]
fn test_error_kinds() {
    use vocalis_profile::ProfileError;

    assert_eq!(SynthError::ModelNotReady.kind(), ErrorKind::ModelNotReady);
    assert_eq!(
        SynthError::from(ProfileError::ProfileLoad {
            voice_id: "v".to_string(),
            reason: "missing".to_string(),
        })
        .kind(),
        ErrorKind::ProfileLoad
    );
    assert_eq!(
        SynthError::from(EngineError::NotReady).kind(),
        ErrorKind::ModelNotReady
    );
    assert_eq!(
        SynthError::from(ProfileError::Extraction(EngineError::NotReady)).kind(),
        ErrorKind::ModelNotReady
    );
    assert_eq!(
        SynthError::Config("x".to_string()).kind(),
        ErrorKind::Internal
    );
}
