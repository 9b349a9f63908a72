use super::config::TrackerConfig;
use super::registry::{ActiveSession, SessionRegistry};
use super::state::SessionStatus;
use crate::analysis::{AnalysisJob, AnalysisQueue};
use crate::glasses::{ButtonPress, GlassesSession, PhotoCapture, PressKind};
use crate::photos::PhotoStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// What a tick did for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// User has no active session
    NoSession,
    /// Streaming is off
    Idle,
    /// Streaming, but the next capture is not allowed yet
    CoolingDown,
    /// Captured a photo with this request id
    Captured(String),
    /// Capture was attempted and failed; the cooldown stays in place
    Failed,
}

/// What a button press did for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonOutcome {
    NoSession,
    /// Long press: streaming is now on or off
    StreamingToggled(bool),
    /// Short press captured a photo with this request id
    Captured(String),
    CaptureFailed,
}

/// Turns glasses events and timer ticks into captures
///
/// Never fails upward: every collaborator error is logged and the session
/// carries on, with the next tick or button press as the retry.
#[derive(Clone)]
pub struct SessionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    config: TrackerConfig,
    registry: Arc<SessionRegistry>,
    photos: Arc<PhotoStore>,
    analysis: AnalysisQueue,
    next_epoch: AtomicU64,
}

impl SessionTracker {
    pub fn new(
        config: TrackerConfig,
        registry: Arc<SessionRegistry>,
        photos: Arc<PhotoStore>,
        analysis: AnalysisQueue,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                config,
                registry,
                photos,
                analysis,
                next_epoch: AtomicU64::new(1),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Start tracking a user. A session already active for the user is replaced.
    pub async fn on_session_start(&self, user_id: &str, handle: Arc<dyn GlassesSession>) {
        let epoch = self.inner.next_epoch.fetch_add(1, Ordering::SeqCst);
        info!(
            "Session {} started for {} (epoch {})",
            handle.session_id(),
            user_id,
            epoch
        );

        let mut session = ActiveSession::new(epoch, handle, Instant::now());
        session.attach_ticker(self.spawn_ticker(user_id.to_string()));

        if let Some(previous) = self.inner.registry.insert(user_id, session).await {
            warn!(
                "Replaced existing session {} for {}",
                previous.handle.session_id(),
                user_id
            );
        }
    }

    /// Stop tracking a user. Photos already captured are kept.
    pub async fn on_session_stop(&self, user_id: &str, reason: &str) -> bool {
        match self.inner.registry.remove(user_id).await {
            Some(mut session) => {
                session.state.end();
                info!(
                    "Session {} stopped for {}: {}",
                    session.handle.session_id(),
                    user_id,
                    reason
                );
                true
            }
            None => {
                warn!("Stop for {} without an active session ({})", user_id, reason);
                false
            }
        }
    }

    pub async fn on_button_press(&self, user_id: &str, press: ButtonPress) -> ButtonOutcome {
        match press.kind {
            PressKind::Long => {
                let toggled = self
                    .inner
                    .registry
                    .with_session(user_id, |s| s.state.toggle_streaming())
                    .await;
                match toggled {
                    Some(streaming) => {
                        info!(
                            "Streaming {} for {} (button {})",
                            if streaming { "enabled" } else { "disabled" },
                            user_id,
                            press.button_id
                        );
                        ButtonOutcome::StreamingToggled(streaming)
                    }
                    None => ButtonOutcome::NoSession,
                }
            }
            PressKind::Short => {
                let Some(handle) = self.inner.registry.handle(user_id).await else {
                    return ButtonOutcome::NoSession;
                };

                info!("Button {} pressed by {}, taking photo", press.button_id, user_id);
                match handle.request_photo().await {
                    Ok(capture) => ButtonOutcome::Captured(self.store_capture(user_id, capture).await),
                    Err(e) => {
                        error!("Photo request failed for {}: {:#}", user_id, e);
                        ButtonOutcome::CaptureFailed
                    }
                }
            }
        }
    }

    /// One timer tick for a user.
    pub async fn on_tick(&self, user_id: &str) -> TickOutcome {
        let cooldown = self.inner.config.cooldown;

        // Claim the capture and push the cooldown out before the request goes
        // out, all under one lock.
        let claimed = self
            .inner
            .registry
            .with_session(user_id, |s| {
                let now = Instant::now();
                if !s.state.is_streaming() {
                    return Err(TickOutcome::Idle);
                }
                if !s.state.begin_tick_capture(now, cooldown) {
                    return Err(TickOutcome::CoolingDown);
                }
                Ok((s.epoch, Arc::clone(&s.handle)))
            })
            .await;

        let (epoch, handle) = match claimed {
            None => return TickOutcome::NoSession,
            Some(Err(outcome)) => return outcome,
            Some(Ok(claim)) => claim,
        };

        match handle.request_photo().await {
            Ok(capture) => {
                self.inner
                    .registry
                    .with_session(user_id, |s| {
                        if s.epoch == epoch {
                            s.state.tick_capture_succeeded(Instant::now());
                        }
                    })
                    .await;
                TickOutcome::Captured(self.store_capture(user_id, capture).await)
            }
            Err(e) => {
                warn!(
                    "Streaming photo failed for {}, next try in {:?}: {:#}",
                    user_id, cooldown, e
                );
                TickOutcome::Failed
            }
        }
    }

    pub async fn status(&self, user_id: &str) -> Option<SessionStatus> {
        self.inner.registry.status(user_id).await
    }

    async fn store_capture(&self, user_id: &str, capture: PhotoCapture) -> String {
        let request_id = capture.request_id.clone();
        let job = AnalysisJob {
            user_id: user_id.to_string(),
            request_id: request_id.clone(),
            mime_type: capture.mime_type.clone(),
            bytes: capture.bytes.clone(),
        };

        let summary = self.inner.photos.append(user_id, capture).await;
        info!(
            "Stored photo {} for {} ({} bytes)",
            summary.request_id, user_id, summary.size_bytes
        );

        if let Err(e) = self.inner.analysis.enqueue(job) {
            error!("Could not queue analysis for photo {}: {:#}", request_id, e);
        }

        request_id
    }

    /// Tick `user_id` every `tick_interval` until aborted. Each tick runs in
    /// its own task so a slow capture never delays the next tick.
    fn spawn_ticker(&self, user_id: String) -> JoinHandle<()> {
        let tracker = self.clone();
        let period = self.inner.config.tick_interval;

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let tracker = tracker.clone();
                let user_id = user_id.clone();
                tokio::spawn(async move {
                    tracker.on_tick(&user_id).await;
                });
            }
        })
    }
}
