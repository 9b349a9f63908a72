// Integration tests for the analysis queue and spoken results

mod common;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use common::{MockAnalyzer, MockGlasses, MockSpeech};
use snapshop::analysis::{AnalysisJob, AnalysisQueue, AnalysisWorker};
use snapshop::session::ActiveSession;
use snapshop::speech::{Announcer, AudioClipStore, Spoken};
use snapshop::{PhotoCapture, PhotoStore, SessionRegistry, SpeechSynthesizer, VisionAnalyzer};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};

const ANALYSIS: &str = "PRODUCT: Oat milk 1L\nBEST DEAL: Aldi $2.19\nSUMMARY: Cheapest at Aldi for $2.19.";

async fn photo(store: &PhotoStore, user: &str, id: &str) -> AnalysisJob {
    let bytes = Bytes::from_static(b"\xff\xd8jpeg");
    store
        .append(
            user,
            PhotoCapture {
                request_id: id.to_string(),
                mime_type: "image/jpeg".to_string(),
                bytes: bytes.clone(),
                captured_at: Utc::now(),
            },
        )
        .await;

    AnalysisJob {
        user_id: user.to_string(),
        request_id: id.to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes,
    }
}

#[tokio::test]
async fn test_worker_records_analysis() {
    let photos = Arc::new(PhotoStore::new());
    let analyzer = MockAnalyzer::ok(ANALYSIS);
    let (queue, rx) = AnalysisQueue::channel();
    let worker = AnalysisWorker::new(analyzer.clone(), photos.clone(), "prompt").spawn(rx);

    queue.enqueue(photo(&photos, "alice", "p1").await).unwrap();
    queue.enqueue(photo(&photos, "alice", "p2").await).unwrap();

    // Closing the queue lets the worker drain and exit.
    drop(queue);
    worker.await.unwrap();

    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
    for id in ["p1", "p2"] {
        let photo = photos.get("alice", id).await.unwrap();
        assert_eq!(photo.analysis.as_deref(), Some(ANALYSIS));
    }
}

#[tokio::test]
async fn test_worker_stores_error_text_on_failure() {
    let photos = Arc::new(PhotoStore::new());
    let (queue, rx) = AnalysisQueue::channel();
    let worker =
        AnalysisWorker::new(MockAnalyzer::failing("model overloaded"), photos.clone(), "prompt")
            .spawn(rx);

    queue.enqueue(photo(&photos, "alice", "p1").await).unwrap();
    drop(queue);
    worker.await.unwrap();

    let analysis = photos.get("alice", "p1").await.unwrap().analysis.unwrap();
    assert!(analysis.starts_with("Error:"), "got {analysis}");
    assert!(analysis.contains("model overloaded"));
}

#[tokio::test]
async fn test_duplicate_job_does_not_rewrite_result() {
    let photos = Arc::new(PhotoStore::new());
    let (queue, rx) = AnalysisQueue::channel();
    let worker = AnalysisWorker::new(MockAnalyzer::ok("first"), photos.clone(), "prompt").spawn(rx);

    let job = photo(&photos, "alice", "p1").await;
    queue.enqueue(job.clone()).unwrap();
    drop(queue);
    worker.await.unwrap();

    let (queue, rx) = AnalysisQueue::channel();
    let worker = AnalysisWorker::new(MockAnalyzer::ok("second"), photos.clone(), "prompt").spawn(rx);
    queue.enqueue(job).unwrap();
    drop(queue);
    worker.await.unwrap();

    assert_eq!(
        photos.get("alice", "p1").await.unwrap().analysis.as_deref(),
        Some("first")
    );
}

#[tokio::test]
async fn test_enqueue_fails_once_worker_is_gone() {
    let (queue, rx) = AnalysisQueue::channel();
    drop(rx);

    let photos = PhotoStore::new();
    assert!(queue.enqueue(photo(&photos, "alice", "p1").await).is_err());
}

/// Never answers for images equal to `stall_on`
struct StallingAnalyzer {
    stall_on: &'static [u8],
}

#[async_trait]
impl VisionAnalyzer for StallingAnalyzer {
    async fn analyze(&self, image: &[u8], _mime_type: &str, _prompt: &str) -> anyhow::Result<String> {
        if image == self.stall_on {
            std::future::pending::<()>().await;
        }
        Ok("PRODUCT: Oat milk".to_string())
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_analysis_does_not_hold_up_other_users() {
    let photos = Arc::new(PhotoStore::new());
    let (queue, rx) = AnalysisQueue::channel();
    let _worker = AnalysisWorker::new(
        Arc::new(StallingAnalyzer { stall_on: b"alice" }),
        photos.clone(),
        "prompt",
    )
    .spawn(rx);

    for user in ["alice", "bob"] {
        let bytes = Bytes::from(user);
        photos
            .append(
                user,
                PhotoCapture {
                    request_id: format!("{user}-1"),
                    mime_type: "image/jpeg".to_string(),
                    bytes: bytes.clone(),
                    captured_at: Utc::now(),
                },
            )
            .await;
        queue
            .enqueue(AnalysisJob {
                user_id: user.to_string(),
                request_id: format!("{user}-1"),
                mime_type: "image/jpeg".to_string(),
                bytes,
            })
            .unwrap();
    }

    time::sleep(Duration::from_secs(3600)).await;

    assert_eq!(
        photos.get("bob", "bob-1").await.unwrap().analysis.as_deref(),
        Some("PRODUCT: Oat milk")
    );
    assert!(photos.get("alice", "alice-1").await.unwrap().analysis.is_none());
}

// ---------------------------------------------------------------------------
// Speaking results
// ---------------------------------------------------------------------------

async fn registry_with(user: &str, glasses: Arc<MockGlasses>) -> Arc<SessionRegistry> {
    let registry = Arc::new(SessionRegistry::new());
    registry
        .insert(user, ActiveSession::new(1, glasses, Instant::now()))
        .await;
    registry
}

#[tokio::test]
async fn test_announce_plays_synthesized_clip() {
    let glasses = MockGlasses::new("s1");
    let clips = Arc::new(AudioClipStore::new());
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(MockSpeech { fail: false });
    let announcer = Announcer::new(
        registry_with("alice", glasses.clone()).await,
        Some(speech),
        clips.clone(),
        "https://shop.example/",
    );

    let Spoken::Clip(id) = announcer.announce("alice", ANALYSIS).await.unwrap() else {
        panic!("expected a synthesized clip");
    };

    assert_eq!(
        glasses.played(),
        vec![format!("https://shop.example/api/audio/{id}")]
    );
    let clip = clips.get(&id).await.unwrap();
    assert_eq!(clip.bytes, Bytes::from("ID3:Cheapest at Aldi for $2.19."));
    assert!(glasses.spoken().is_empty());
}

#[tokio::test]
async fn test_announce_falls_back_to_glasses_voice() {
    let glasses = MockGlasses::new("s1");
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(MockSpeech { fail: true });
    let announcer = Announcer::new(
        registry_with("alice", glasses.clone()).await,
        Some(speech),
        Arc::new(AudioClipStore::new()),
        "http://localhost:8080",
    );

    assert_eq!(
        announcer.announce("alice", ANALYSIS).await.unwrap(),
        Spoken::Builtin
    );
    assert_eq!(glasses.spoken(), vec!["Cheapest at Aldi for $2.19."]);
    assert!(glasses.played().is_empty());
}

#[tokio::test]
async fn test_announce_without_session_or_speaker_fails() {
    let announcer = Announcer::new(
        Arc::new(SessionRegistry::new()),
        None,
        Arc::new(AudioClipStore::new()),
        "http://localhost:8080",
    );
    assert!(announcer.announce("nobody", ANALYSIS).await.is_err());

    let announcer = Announcer::new(
        registry_with("alice", MockGlasses::broken_speaker("s1")).await,
        None,
        Arc::new(AudioClipStore::new()),
        "http://localhost:8080",
    );
    assert!(announcer.announce("alice", ANALYSIS).await.is_err());
}

#[tokio::test]
async fn test_worker_auto_speaks_successful_analysis() {
    let glasses = MockGlasses::new("s1");
    let announcer = Arc::new(Announcer::new(
        registry_with("alice", glasses.clone()).await,
        None,
        Arc::new(AudioClipStore::new()),
        "http://localhost:8080",
    ));
    let photos = Arc::new(PhotoStore::new());
    let (queue, rx) = AnalysisQueue::channel();
    let worker = AnalysisWorker::new(MockAnalyzer::ok(ANALYSIS), photos.clone(), "prompt")
        .with_announcer(announcer)
        .spawn(rx);

    queue.enqueue(photo(&photos, "alice", "p1").await).unwrap();
    drop(queue);
    worker.await.unwrap();

    assert_eq!(glasses.spoken(), vec!["Cheapest at Aldi for $2.19."]);
}

#[tokio::test]
async fn test_worker_does_not_speak_errors() {
    let glasses = MockGlasses::new("s1");
    let announcer = Arc::new(Announcer::new(
        registry_with("alice", glasses.clone()).await,
        None,
        Arc::new(AudioClipStore::new()),
        "http://localhost:8080",
    ));
    let photos = Arc::new(PhotoStore::new());
    let (queue, rx) = AnalysisQueue::channel();
    let worker = AnalysisWorker::new(MockAnalyzer::failing("boom"), photos.clone(), "prompt")
        .with_announcer(announcer)
        .spawn(rx);

    queue.enqueue(photo(&photos, "alice", "p1").await).unwrap();
    drop(queue);
    worker.await.unwrap();

    assert!(glasses.spoken().is_empty());
}
