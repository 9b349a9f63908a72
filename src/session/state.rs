use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Capture state for one user with an active glasses session
#[derive(Debug, Clone)]
pub struct UserCaptureState {
    is_streaming: bool,
    /// `None` once the session has ended
    next_allowed_capture_at: Option<Instant>,
}

impl UserCaptureState {
    pub fn new(now: Instant) -> Self {
        Self {
            is_streaming: false,
            next_allowed_capture_at: Some(now),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    pub fn next_allowed_capture_at(&self) -> Option<Instant> {
        self.next_allowed_capture_at
    }

    /// Flip streaming mode, returning the new value
    pub fn toggle_streaming(&mut self) -> bool {
        self.is_streaming = !self.is_streaming;
        self.is_streaming
    }

    /// Whether a tick at `now` should capture
    pub fn should_fire(&self, now: Instant) -> bool {
        self.is_streaming && self.next_allowed_capture_at.is_some_and(|at| now > at)
    }

    /// Claim a tick-triggered capture.
    ///
    /// On success the next capture is pushed to `now + cooldown` before the
    /// caller issues the request, so a stalled capture holds off later ticks.
    pub fn begin_tick_capture(&mut self, now: Instant, cooldown: Duration) -> bool {
        if !self.should_fire(now) {
            return false;
        }
        self.next_allowed_capture_at = Some(now + cooldown);
        true
    }

    /// A tick-triggered capture finished at `now`: drop the cooldown ceiling.
    pub fn tick_capture_succeeded(&mut self, now: Instant) {
        if self.next_allowed_capture_at.is_some() {
            self.next_allowed_capture_at = Some(now);
        }
    }

    /// Session is over: stop streaming and forget the cooldown.
    pub fn end(&mut self) {
        self.is_streaming = false;
        self.next_allowed_capture_at = None;
    }

    /// Time until a tick may capture again
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        self.next_allowed_capture_at
            .map(|at| at.saturating_duration_since(now))
    }
}

/// Capture state as reported over HTTP
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub user_id: String,
    pub session_id: String,
    pub is_streaming: bool,
    pub cooldown_remaining_ms: Option<u64>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}
