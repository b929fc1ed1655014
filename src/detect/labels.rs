//! Class id to class name tables.
//!
//! ONNX artifacts do not carry class names, so each model is paired with a
//! label table: either a sibling `<stem>.labels.json` file (a JSON array of
//! names, index = class id) or one of the built-in vocabularies.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Three-class vocabulary used by the waste-trained artifacts.
const WASTE_LABELS: &[&str] = &["recyclable", "organic", "reuse"];

/// COCO vocabulary used by the generic pretrained artifact.
const COCO_LABELS: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Class id to class name mapping for one loaded model.
#[derive(Clone, Debug)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Built-in three-class waste vocabulary.
    pub fn waste_default() -> Self {
        Self::new(WASTE_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// Built-in 80-class COCO vocabulary.
    pub fn coco_default() -> Self {
        Self::new(COCO_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// Load the sibling `<stem>.labels.json` for a model path, when present.
    ///
    /// Returns `Ok(None)` when no sibling file exists. A present but invalid
    /// file is an error; callers decide whether to degrade to a built-in.
    pub fn from_sibling_file(model_path: &Path) -> Result<Option<Self>> {
        let sibling = model_path.with_extension("labels.json");
        if !sibling.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&sibling)
            .with_context(|| format!("read label file {}", sibling.display()))?;
        let names: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("parse label file {}", sibling.display()))?;
        if names.is_empty() {
            return Err(anyhow!("label file {} is empty", sibling.display()));
        }
        Ok(Some(Self::new(names)))
    }

    /// Class name for an id, when the id is inside the table.
    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(|s| s.as_str())
    }

    /// Name used for ids outside the table (class drift).
    pub fn placeholder_name(class_id: usize) -> String {
        format!("class_{}", class_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waste_default_has_three_classes() {
        let labels = LabelTable::waste_default();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.name(0), Some("recyclable"));
        assert_eq!(labels.name(1), Some("organic"));
        assert_eq!(labels.name(2), Some("reuse"));
        assert_eq!(labels.name(3), None);
    }

    #[test]
    fn coco_default_has_eighty_classes() {
        let labels = LabelTable::coco_default();
        assert_eq!(labels.len(), 80);
        assert_eq!(labels.name(0), Some("person"));
        assert_eq!(labels.name(39), Some("bottle"));
        assert_eq!(labels.name(79), Some("toothbrush"));
    }

    #[test]
    fn placeholder_names_carry_the_id() {
        assert_eq!(LabelTable::placeholder_name(7), "class_7");
    }

    #[test]
    fn sibling_file_overrides_builtins() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let model_path = dir.path().join("waste.onnx");
        std::fs::write(
            dir.path().join("waste.labels.json"),
            r#"["cardboard", "glass", "metal", "paper"]"#,
        )?;

        let labels = LabelTable::from_sibling_file(&model_path)?.expect("sibling labels");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.name(2), Some("metal"));
        Ok(())
    }

    #[test]
    fn missing_sibling_file_is_not_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let model_path = dir.path().join("waste.onnx");
        assert!(LabelTable::from_sibling_file(&model_path)?.is_none());
        Ok(())
    }

    #[test]
    fn invalid_sibling_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let model_path = dir.path().join("waste.onnx");
        std::fs::write(dir.path().join("waste.labels.json"), "not json")?;
        assert!(LabelTable::from_sibling_file(&model_path).is_err());
        Ok(())
    }
}
