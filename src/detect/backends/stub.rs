use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::labels::LabelTable;
use crate::detect::result::RawDetection;

/// Scripted backend for demos and tests. Replays a fixed detection list
/// regardless of input pixels.
pub struct StubBackend {
    script: Vec<RawDetection>,
}

impl StubBackend {
    /// Default script: one bottle and one banana peel.
    pub fn new() -> Self {
        Self {
            script: vec![
                RawDetection {
                    class_id: 0,
                    confidence: 0.86,
                    x1: 50.0,
                    y1: 80.0,
                    x2: 150.0,
                    y2: 260.0,
                },
                RawDetection {
                    class_id: 1,
                    confidence: 0.80,
                    x1: 200.0,
                    y1: 120.0,
                    x2: 320.0,
                    y2: 200.0,
                },
            ],
        }
    }

    /// Replay a caller-supplied script instead of the default one.
    pub fn with_detections(script: Vec<RawDetection>) -> Self {
        Self { script }
    }

    /// Label table matching the default script's class ids.
    pub fn labels() -> LabelTable {
        LabelTable::new(vec!["bottle".to_string(), "banana_peel".to_string()])
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<RawDetection>> {
        Ok(self.script.clone())
    }
}
