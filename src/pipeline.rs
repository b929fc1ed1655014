//! Scan pipeline: decoded photo in, disposal guidance out.
//!
//! Wraps the inference worker and turns its raw candidate boxes into the
//! wire-format item list: threshold and subject filtering, category
//! remapping, display confidence shaping, and knowledge enrichment.
//! `detect` deliberately never fails; a kiosk camera retries on the next
//! frame, so every internal fault degrades to an empty item list.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::category::{self, CategoryMap, DisposalCategory};
use crate::detect::{InferenceWorker, LabelTable, LoadedModel, RawDetection};
use crate::knowledge::{ItemMetadata, KnowledgeBase};

/// Pixel-space box in the wire format: top-left corner plus size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// One classified object, ready for serialization.
#[derive(Clone, Debug, Serialize)]
pub struct DetectedItem {
    pub id: usize,
    #[serde(rename = "itemType")]
    pub item_type: String,
    pub bin: String,
    /// Reserved; always false until contamination scoring lands.
    pub contaminated: bool,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub metadata: ItemMetadata,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DetectionResponse {
    pub items: Vec<DetectedItem>,
}

/// Tunable pipeline knobs, populated from configuration.
#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    pub conf_threshold: f32,
    pub boost_factor: f32,
    pub boost_cap: f32,
    pub max_items: usize,
    pub infer_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            conf_threshold: 0.30,
            boost_factor: 1.1,
            boost_cap: 0.95,
            max_items: 3,
            infer_timeout: Duration::from_millis(10_000),
        }
    }
}

/// Why a scan produced no items. Internal; the wire response is identical
/// (an empty list) for every variant.
#[derive(Debug)]
enum DetectFailure {
    Decode(anyhow::Error),
    ModelAbsent,
    Inference(anyhow::Error),
}

pub struct ScanPipeline {
    worker: Option<InferenceWorker>,
    labels: LabelTable,
    categories: CategoryMap,
    knowledge: KnowledgeBase,
    settings: PipelineSettings,
}

impl ScanPipeline {
    /// Build the pipeline around an already-loaded model, or around no model
    /// at all, in which case every scan degrades to an empty response.
    pub fn new(model: Option<LoadedModel>, settings: PipelineSettings) -> Result<Self> {
        let (worker, labels) = match model {
            Some(model) => {
                log::info!(
                    "detection model active: {} ({} classes)",
                    model.description,
                    model.labels.len()
                );
                (Some(InferenceWorker::spawn(model.backend)?), model.labels)
            }
            None => (None, LabelTable::waste_default()),
        };

        Ok(Self {
            worker,
            labels,
            categories: CategoryMap::new(),
            knowledge: KnowledgeBase::new(),
            settings,
        })
    }

    pub fn has_model(&self) -> bool {
        self.worker.is_some()
    }

    /// Classify one uploaded photo.
    ///
    /// Never fails: decode errors, a missing model, and inference faults all
    /// degrade to an empty item list and are reported in the log only.
    pub fn detect(&self, image_bytes: &[u8]) -> DetectionResponse {
        match self.try_detect(image_bytes) {
            Ok(items) => DetectionResponse { items },
            Err(DetectFailure::Decode(err)) => {
                log::error!("scan dropped: image decode failed: {:#}", err);
                DetectionResponse::default()
            }
            Err(DetectFailure::ModelAbsent) => {
                log::error!("scan dropped: no detection model is active");
                DetectionResponse::default()
            }
            Err(DetectFailure::Inference(err)) => {
                log::error!("scan dropped: inference failed: {:#}", err);
                DetectionResponse::default()
            }
        }
    }

    fn try_detect(&self, image_bytes: &[u8]) -> Result<Vec<DetectedItem>, DetectFailure> {
        let image = image::load_from_memory(image_bytes)
            .map_err(|err| DetectFailure::Decode(err.into()))?;
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();

        let worker = self.worker.as_ref().ok_or(DetectFailure::ModelAbsent)?;
        let raw = worker
            .infer(rgb.into_raw(), width, height, self.settings.infer_timeout)
            .map_err(DetectFailure::Inference)?;

        log::debug!("model returned {} candidate boxes", raw.len());
        Ok(self.enrich(raw))
    }

    /// Turn raw candidate boxes into the final item list.
    fn enrich(&self, detections: Vec<RawDetection>) -> Vec<DetectedItem> {
        let mut items: Vec<DetectedItem> = Vec::new();

        for det in detections {
            if det.confidence < self.settings.conf_threshold {
                continue;
            }
            if !det.is_well_formed() {
                log::warn!("dropping malformed detection for class id {}", det.class_id);
                continue;
            }

            let class_name = match self.labels.name(det.class_id) {
                Some(name) => name.to_string(),
                None => {
                    let placeholder = LabelTable::placeholder_name(det.class_id);
                    log::warn!(
                        "class id {} is outside the label table, using '{}'",
                        det.class_id,
                        placeholder
                    );
                    placeholder
                }
            };
            if category::is_excluded_subject(&class_name) {
                continue;
            }

            let category = self.categories.resolve(&class_name);
            items.push(self.build_item(&class_name, category, &det));
        }

        // Highest confidence first; ties keep model order.
        items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        items.truncate(self.settings.max_items);
        for (index, item) in items.iter_mut().enumerate() {
            item.id = index + 1;
        }
        items
    }

    fn build_item(
        &self,
        class_name: &str,
        category: DisposalCategory,
        det: &RawDetection,
    ) -> DetectedItem {
        let confidence = (det.confidence * self.settings.boost_factor).min(self.settings.boost_cap);
        DetectedItem {
            // Assigned after the final sort.
            id: 0,
            item_type: category::display_item_type(class_name),
            bin: category.bin_label().to_string(),
            contaminated: false,
            confidence,
            bbox: BoundingBox {
                x: det.x1 as i32,
                y: det.y1 as i32,
                w: (det.x2 - det.x1) as i32,
                h: (det.y2 - det.y1) as i32,
            },
            metadata: self.knowledge.metadata(category),
        }
    }
}
