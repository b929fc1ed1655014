//! binsight: waste scanning and disposal guidance.
//!
//! This crate turns a photo of held-up waste into sorting guidance: which
//! objects are in frame, which bin each belongs in, and why. A small
//! keyword advisor answers free-text disposal questions on the side.
//!
//! # Architecture
//!
//! The service is assembled once in `main` and shared read-only:
//!
//! 1. **Model Loader**: probes fixed filesystem candidates for an ONNX
//!    artifact at startup; a missing model degrades the service instead of
//!    stopping it.
//! 2. **Detection Pipeline**: decodes uploads, runs serialized inference on
//!    a worker thread, and remaps raw boxes into enriched wire items.
//! 3. **Query Advisor**: fixed keyword tables, no model involved.
//!
//! # Module Structure
//!
//! - `detect`: backend trait, ONNX inference, scripted stub, label tables,
//!   model loading, the inference worker
//! - `pipeline`: raw detections to wire items (threshold, exclusions,
//!   category mapping, confidence shaping, knowledge enrichment)
//! - `category` / `knowledge`: disposal vocabulary and per-bin guidance
//! - `advisor`: keyword advice for free-text waste questions
//! - `api`: the HTTP surface (`/health`, `/detect`, `/chat`)
//! - `config`: TOML file plus environment overrides

use anyhow::Result;

pub mod advisor;
pub mod api;
pub mod category;
pub mod config;
pub mod detect;
pub mod knowledge;
pub mod pipeline;

pub use advisor::{ChatAdvice, ChatQuery, QueryAdvisor};
pub use api::{ApiConfig, ApiHandle, ApiServer};
pub use category::{CategoryMap, DisposalCategory};
pub use config::ScanConfig;
pub use knowledge::{ItemMetadata, KnowledgeBase};
pub use pipeline::{
    BoundingBox, DetectedItem, DetectionResponse, PipelineSettings, ScanPipeline,
};

/// Everything a request handler needs, built once and shared behind `Arc`.
pub struct ScanService {
    pub config: ScanConfig,
    pub pipeline: ScanPipeline,
    pub advisor: QueryAdvisor,
}

impl ScanService {
    /// Load the configured model and assemble the service.
    ///
    /// A model that fails to load is not fatal: the pipeline runs degraded
    /// and `/detect` serves empty item lists until the operator fixes it.
    pub fn build(config: ScanConfig) -> Result<Self> {
        let model = detect::load_model(config.model_ref.as_deref());
        let pipeline = ScanPipeline::new(model, config.pipeline_settings())?;
        Ok(Self {
            config,
            pipeline,
            advisor: QueryAdvisor::new(),
        })
    }
}
