#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawDetection;

/// Decode parameters for YOLO-family detection heads.
#[derive(Clone, Copy, Debug)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

/// Tract-based backend for ONNX inference.
///
/// Loads a local YOLO-family model file and decodes its `[1, 4+nc, anchors]`
/// detection head into pixel-space boxes. No network I/O; the model file is
/// the only disk access.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    params: YoloParams,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_params(model_path, YoloParams::default())
    }

    pub fn with_params<P: AsRef<Path>>(model_path: P, params: YoloParams) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = params.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model, params })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("image dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let source = image::RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", width, height))?;
        let size = self.params.input_size;
        let resized = image::imageops::resize(&source, size, size, FilterType::Triangle);

        let size = size as usize;
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
                resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
            });

        Ok(input.into_tensor())
    }

    /// Decode the `[1, 4+nc, anchors]` head into source-image boxes.
    fn decode_output(
        &self,
        outputs: TVec<TValue>,
        width: u32,
        height: u32,
    ) -> Result<Vec<RawDetection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let view = view
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("unexpected detection head rank")?;

        let (batch, rows, anchors) = view.dim();
        if batch != 1 || rows < 5 {
            return Err(anyhow!(
                "unsupported detection head shape [{}, {}, {}]",
                batch,
                rows,
                anchors
            ));
        }
        let class_count = rows - 4;

        let scale_x = width as f32 / self.params.input_size as f32;
        let scale_y = height as f32 / self.params.input_size as f32;

        let mut candidates = Vec::new();
        for anchor in 0..anchors {
            let mut class_id = 0usize;
            let mut score = f32::NEG_INFINITY;
            for class in 0..class_count {
                let value = view[[0, 4 + class, anchor]];
                if value > score {
                    score = value;
                    class_id = class;
                }
            }
            if !score.is_finite() || score < self.params.conf_threshold {
                continue;
            }

            let cx = view[[0, 0, anchor]];
            let cy = view[[0, 1, anchor]];
            let w = view[[0, 2, anchor]];
            let h = view[[0, 3, anchor]];

            let x1 = ((cx - w / 2.0) * scale_x).clamp(0.0, width as f32);
            let y1 = ((cy - h / 2.0) * scale_y).clamp(0.0, height as f32);
            let x2 = ((cx + w / 2.0) * scale_x).clamp(0.0, width as f32);
            let y2 = ((cy + h / 2.0) * scale_y).clamp(0.0, height as f32);
            if x2 <= x1 || y2 <= y1 {
                continue;
            }

            candidates.push(RawDetection {
                class_id,
                confidence: score.min(1.0),
                x1,
                y1,
                x2,
                y2,
            });
        }

        Ok(non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        ))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<RawDetection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_output(outputs, width, height)
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.params.input_size as usize;
        let input = tract_ndarray::Array4::<f32>::zeros((1, 3, size, size)).into_tensor();
        self.model
            .run(tvec!(input.into()))
            .context("warm-up inference failed")?;
        Ok(())
    }
}

/// Greedy per-class suppression of overlapping boxes.
fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
