//! HTML-to-candidate extraction for Medietat: text normalization, role and
//! city classification, summary generation, and per-source extractors (both
//! declarative config-driven and bespoke).

use scraper::Html;
use thiserror::Error;

use medietat_core::JobCandidate;

pub mod classify;
pub mod config;
pub mod generic;
pub mod normalize;
pub mod registry;
pub mod sites;
pub mod summary;

pub use config::{load_source_configs, SourceConfig, SourceSelectors};
pub use generic::ConfigExtractor;
pub use registry::{builtin_extractors, extractor_for_source, source_ids};

pub const CRATE_NAME: &str = "medietat-extract";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unknown source: {0}")]
    UnknownSource(String),
    #[error("reading source configs: {0}")]
    Config(#[from] anyhow::Error),
}

/// Identity and fetch requirements of one configured source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    pub source_id: String,
    pub base_url: String,
    pub facility_name: String,
    pub city: String,
    pub needs_rendering: bool,
    pub wait_selector: Option<String>,
}

/// One source's extraction logic: given a parsed document, produce cleaned,
/// classified candidates. Declarative configs and bespoke site extractors
/// both implement this and are interchangeable behind the registry.
pub trait Extractor: Send + Sync {
    fn source(&self) -> &SourceMeta;

    fn extract(&self, document: &Html) -> Vec<JobCandidate>;
}
