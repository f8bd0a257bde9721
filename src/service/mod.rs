pub mod analysis;
pub mod conversation;
pub mod ingest;
pub mod predict;

pub use predict::{PredictError, PredictionOutcome, PredictionService};
