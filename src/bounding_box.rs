/// A single detection produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum x coordinate of the bounding box.
    pub xmin: f32,
    /// Minimum y coordinate of the bounding box.
    pub ymin: f32,
    /// Maximum x coordinate of the bounding box.
    pub xmax: f32,
    /// Maximum y coordinate of the bounding box.
    pub ymax: f32,
    /// Confidence score of the detection, in `[0, 1]`.
    pub confidence: f32,
    /// Class index into the detector's class-name table.
    pub class: u32,
}

impl BoundingBox {
    /// Area in pixels, counting the boundary pixels.
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin + 1.) * (self.ymax - self.ymin + 1.)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let i_xmin = self.xmin.max(other.xmin);
        let i_xmax = self.xmax.min(other.xmax);
        let i_ymin = self.ymin.max(other.ymin);
        let i_ymax = self.ymax.min(other.ymax);
        let i_area = (i_xmax - i_xmin + 1.).max(0.) * (i_ymax - i_ymin + 1.).max(0.);
        i_area / (self.area() + other.area() - i_area)
    }
}

/// Non-maximum suppression for bounding boxes grouped by class.
///
/// Each inner vector is sorted by descending confidence and boxes whose IoU
/// with an already kept box of the same class exceeds `threshold` are
/// dropped. Boxes with equal confidence keep their input order.
pub fn non_maximum_suppression(bboxes: &mut [Vec<BoundingBox>], threshold: f32) {
    for bboxes_for_class in bboxes.iter_mut() {
        bboxes_for_class.sort_by(|b1, b2| b2.confidence.total_cmp(&b1.confidence));
        let mut kept: Vec<BoundingBox> = Vec::with_capacity(bboxes_for_class.len());
        for bbox in bboxes_for_class.drain(..) {
            if kept.iter().all(|k| k.iou(&bbox) <= threshold) {
                kept.push(bbox);
            }
        }
        *bboxes_for_class = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(xmin: f32, ymin: f32, xmax: f32, ymax: f32, confidence: f32) -> BoundingBox {
        BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
            confidence,
            class: 0,
        }
    }

    #[test]
    fn test_iou() {
        let a = bbox(0.0, 0.0, 9.0, 9.0, 0.9);
        assert_eq!(a.area(), 100.0);
        assert_eq!(a.iou(&a), 1.0);

        let far = bbox(100.0, 100.0, 109.0, 109.0, 0.9);
        assert_eq!(a.iou(&far), 0.0);

        // overlap of 5x10 out of a union of 150
        let half = bbox(5.0, 0.0, 14.0, 9.0, 0.9);
        assert!((a.iou(&half) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_maximum_suppression() {
        let mut bboxes = vec![vec![
            bbox(0.0, 0.0, 1.0, 1.0, 0.5),
            bbox(0.0, 0.0, 1.0, 1.0, 0.5),
        ]];

        non_maximum_suppression(&mut bboxes, 0.5);

        assert_eq!(bboxes[0].len(), 1);
        assert_eq!(bboxes[0][0].confidence, 0.5);
    }

    #[test]
    fn test_non_maximum_suppression_keeps_disjoint_and_sorts() {
        let mut bboxes = vec![
            vec![
                bbox(0.0, 0.0, 9.0, 9.0, 0.3),
                bbox(50.0, 50.0, 59.0, 59.0, 0.8),
                bbox(1.0, 1.0, 9.0, 9.0, 0.6),
            ],
            vec![],
        ];

        non_maximum_suppression(&mut bboxes, 0.7);

        let confidences: Vec<f32> = bboxes[0].iter().map(|b| b.confidence).collect();
        assert_eq!(confidences, vec![0.8, 0.6]);
        assert!(bboxes[1].is_empty());
    }
}
