use super::vision::VisionAnalyzer;
use crate::photos::PhotoStore;
use crate::speech::Announcer;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

/// A captured photo waiting for analysis
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub user_id: String,
    pub request_id: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Sending half of the analysis queue, handed to capture paths
///
/// Unbounded: enqueueing never waits, so capture latency is independent of
/// how far behind analysis is.
#[derive(Clone)]
pub struct AnalysisQueue {
    tx: mpsc::UnboundedSender<AnalysisJob>,
}

impl AnalysisQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AnalysisJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hand a photo to the analysis worker without waiting.
    pub fn enqueue(&self, job: AnalysisJob) -> Result<()> {
        self.tx
            .send(job)
            .ok()
            .context("Analysis worker is gone")
    }
}

/// Single consumer of the analysis queue
///
/// Each job runs in its own task, so a stalled vision call only holds up the
/// photo it belongs to. Results still go through `PhotoStore::record_analysis`,
/// which only accepts the first write per photo.
pub struct AnalysisWorker {
    analyzer: Arc<dyn VisionAnalyzer>,
    photos: Arc<PhotoStore>,
    prompt: String,
    announcer: Option<Arc<Announcer>>,
}

impl AnalysisWorker {
    pub fn new(
        analyzer: Arc<dyn VisionAnalyzer>,
        photos: Arc<PhotoStore>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            analyzer,
            photos,
            prompt: prompt.into(),
            announcer: None,
        }
    }

    /// Speak every successful analysis on the wearer's glasses
    pub fn with_announcer(mut self, announcer: Arc<Announcer>) -> Self {
        self.announcer = Some(announcer);
        self
    }

    /// Drain the queue until every sender is gone, then wait for the jobs
    /// still in flight.
    pub fn spawn(self, mut rx: mpsc::UnboundedReceiver<AnalysisJob>) -> JoinHandle<()> {
        let worker = Arc::new(self);

        tokio::spawn(async move {
            info!("Analysis worker started ({})", worker.analyzer.name());
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    job = rx.recv() => match job {
                        Some(job) => {
                            let worker = Arc::clone(&worker);
                            in_flight.spawn(async move { worker.process(job).await });
                        }
                        None => break,
                    },
                    Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = finished {
                            error!("Analysis task failed: {}", e);
                        }
                    }
                }
            }

            while let Some(finished) = in_flight.join_next().await {
                if let Err(e) = finished {
                    error!("Analysis task failed: {}", e);
                }
            }

            info!("Analysis worker stopped");
        })
    }

    async fn process(&self, job: AnalysisJob) {
        info!(
            "Analyzing photo {} for {} ({} bytes)",
            job.request_id,
            job.user_id,
            job.bytes.len()
        );

        let (text, succeeded) = match self
            .analyzer
            .analyze(&job.bytes, &job.mime_type, &self.prompt)
            .await
        {
            Ok(text) => (text, true),
            Err(e) => {
                error!("Analysis failed for photo {}: {:#}", job.request_id, e);
                (format!("Error: {e:#}"), false)
            }
        };

        if !self
            .photos
            .record_analysis(&job.user_id, &job.request_id, text.clone())
            .await
        {
            return;
        }

        info!("Analysis stored for photo {}", job.request_id);

        if let (true, Some(announcer)) = (succeeded, &self.announcer) {
            if let Err(e) = announcer.announce(&job.user_id, &text).await {
                warn!("Could not speak analysis for {}: {:#}", job.user_id, e);
            }
        }
    }
}
