//! YOLOv8 output decoding and non-maximum suppression

use std::cmp::Ordering;

use contracts::RawDetection;

use super::labels::COCO_LABELS;
use super::letterbox::Letterbox;
use super::YoloConfig;
use crate::error::{DetectionError, Result};

/// Box above the confidence threshold, in model pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// `[x1, y1, x2, y2]`
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: usize,
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Class-aware NMS: a box only suppresses boxes of its own class
///
/// Returns at most `max_detections` boxes, highest score first.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Decode a `[1, 4 + classes, anchors]` output tensor into detections
///
/// Boxes are mapped back to source-frame pixels through `geometry`.
pub fn decode_output(
    output: &[f32],
    shape: &[usize],
    geometry: &Letterbox,
    config: &YoloConfig,
) -> Result<Vec<RawDetection>> {
    let (rows, anchors) = match shape {
        [1, rows, anchors] if *rows > 4 => (*rows, *anchors),
        other => {
            return Err(DetectionError::output_shape(format!(
                "expected [1, 4 + classes, anchors], got {other:?}"
            )))
        }
    };
    if output.len() != rows * anchors {
        return Err(DetectionError::output_shape(format!(
            "shape {shape:?} needs {} values, got {}",
            rows * anchors,
            output.len()
        )));
    }

    let at = |row: usize, anchor: usize| output[row * anchors + anchor];

    let candidates: Vec<Candidate> = (0..anchors)
        .filter_map(|i| {
            let (class_id, score) = (4..rows)
                .map(|row| (row - 4, at(row, i)))
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))?;
            if score < config.confidence {
                return None;
            }
            let (cx, cy, w, h) = (at(0, i), at(1, i), at(2, i), at(3, i));
            Some(Candidate {
                bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
                score,
                class_id,
            })
        })
        .collect();

    Ok(
        non_max_suppression(candidates, config.iou, config.max_detections)
            .into_iter()
            .map(|c| {
                let label = COCO_LABELS.get(c.class_id).copied().unwrap_or("unknown");
                RawDetection::new(geometry.unmap(c.bbox), c.score, label)
            })
            .collect(),
    )
}
