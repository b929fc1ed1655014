//! Model discovery and loading.
//!
//! Runs once at process start. Probes a fixed list of candidate locations,
//! keeps the first one that loads, and reports the artifact fingerprint so
//! operators can tell which weights are live. When nothing loads the service
//! keeps running and every scan yields an empty item list.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::backends::StubBackend;
use crate::detect::labels::LabelTable;

/// A ready-to-use detector with its class label table.
pub struct LoadedModel {
    pub backend: Box<dyn DetectorBackend>,
    pub labels: LabelTable,
    /// Human-readable origin, for startup logs.
    pub description: String,
}

/// Resolve and load a detector.
///
/// `model_ref` may name a model file directly or select the scripted stub
/// backend via the `stub:` scheme. Candidates are probed in order; the first
/// that loads wins. Returns `None` when none do.
pub fn load_model(model_ref: Option<&str>) -> Option<LoadedModel> {
    if let Some(reference) = model_ref {
        if reference.starts_with("stub:") {
            log::info!("using scripted stub detector ({})", reference);
            return Some(LoadedModel {
                backend: Box::new(StubBackend::new()),
                labels: StubBackend::labels(),
                description: reference.to_string(),
            });
        }
    }

    let mut candidates: Vec<(PathBuf, LabelTable)> = Vec::new();
    if let Some(reference) = model_ref {
        candidates.push((PathBuf::from(reference), LabelTable::waste_default()));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push((dir.join("models/waste.onnx"), LabelTable::waste_default()));
        }
    }
    candidates.push((PathBuf::from("models/waste.onnx"), LabelTable::waste_default()));
    candidates.push((PathBuf::from("models/yolov8n.onnx"), LabelTable::coco_default()));

    for (path, builtin_labels) in candidates {
        if !path.exists() {
            log::debug!("model candidate {} not present", path.display());
            continue;
        }
        if let Some(model) = load_candidate(&path, builtin_labels) {
            return Some(model);
        }
    }

    log::error!("no detection model could be loaded; scans will return empty results");
    None
}

fn load_candidate(path: &Path, builtin_labels: LabelTable) -> Option<LoadedModel> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("failed to read model {}: {}", path.display(), err);
            return None;
        }
    };
    log::info!(
        "model candidate {} ({} bytes, sha256 {})",
        path.display(),
        bytes.len(),
        hex::encode(Sha256::digest(&bytes))
    );

    let labels = match LabelTable::from_sibling_file(path) {
        Ok(Some(table)) => {
            log::info!("loaded {} class labels from sibling file", table.len());
            table
        }
        Ok(None) => builtin_labels,
        Err(err) => {
            log::warn!("ignoring label sidecar for {}: {:#}", path.display(), err);
            builtin_labels
        }
    };

    let backend = build_backend(path)?;
    Some(LoadedModel {
        backend,
        labels,
        description: path.display().to_string(),
    })
}

#[cfg(feature = "backend-tract")]
fn build_backend(path: &Path) -> Option<Box<dyn DetectorBackend>> {
    match crate::detect::backends::TractBackend::new(path) {
        Ok(backend) => Some(Box::new(backend)),
        Err(err) => {
            log::warn!("failed to load model {}: {:#}", path.display(), err);
            None
        }
    }
}

#[cfg(not(feature = "backend-tract"))]
fn build_backend(path: &Path) -> Option<Box<dyn DetectorBackend>> {
    log::warn!(
        "model file {} found but ONNX inference is not compiled in; \
         rebuild with --features backend-tract",
        path.display()
    );
    None
}
