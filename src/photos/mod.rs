mod store;

pub use store::{CapturedPhoto, PhotoStore, PhotoSummary};
