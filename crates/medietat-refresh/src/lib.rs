//! Refresh orchestration for Medietat: per-source fetch/render, extraction,
//! and store reconciliation, reported per run.

mod pipeline;
mod reconcile;

pub use pipeline::{extract_candidates, RefreshConfig, RefreshPipeline};
pub use reconcile::reconcile_source;

pub const CRATE_NAME: &str = "medietat-refresh";
