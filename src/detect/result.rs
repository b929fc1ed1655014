/// One model-produced candidate region, in source-image pixel coordinates.
///
/// Corners satisfy `x1 < x2` and `y1 < y2` for well-formed detections.
/// Instances only live within a single inference call; the pipeline remaps
/// them before anything leaves the process.
#[derive(Clone, Debug)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl RawDetection {
    /// True when every field is finite, confidence is in [0,1], and the
    /// corners are ordered.
    pub fn is_well_formed(&self) -> bool {
        let finite = [self.x1, self.y1, self.x2, self.y2, self.confidence]
            .iter()
            .all(|v| v.is_finite());
        finite && (0.0..=1.0).contains(&self.confidence) && self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    fn intersection_area(&self, other: &RawDetection) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        }
    }

    /// Intersection over union with another detection.
    pub fn iou(&self, other: &RawDetection) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> RawDetection {
        RawDetection {
            class_id: 0,
            confidence: 0.9,
            x1,
            y1,
            x2,
            y2,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn half_overlap_has_expected_iou() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn inverted_or_non_finite_boxes_are_malformed() {
        let inverted = det(10.0, 0.0, 5.0, 10.0);
        assert!(!inverted.is_well_formed());

        let mut nan = det(0.0, 0.0, 10.0, 10.0);
        nan.y2 = f32::NAN;
        assert!(!nan.is_well_formed());

        let mut overconfident = det(0.0, 0.0, 10.0, 10.0);
        overconfident.confidence = 1.4;
        assert!(!overconfident.is_well_formed());

        assert!(det(0.0, 0.0, 10.0, 10.0).is_well_formed());
    }
}
