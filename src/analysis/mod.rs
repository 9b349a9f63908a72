//! Photo analysis
//!
//! Capture paths enqueue `AnalysisJob`s; one `AnalysisWorker` drains the
//! queue and runs each job as its own task, calling the vision model and
//! storing the result in the photo store.

mod queue;
mod vision;

pub use queue::{AnalysisJob, AnalysisQueue, AnalysisWorker};
pub use vision::{GeminiVision, VisionAnalyzer};
