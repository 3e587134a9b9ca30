use claimsight_core::{
    CapabilityError, Detection, DetectionId, DetectionResult, ObjectDetector, Taxonomy,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Damage detection stage: runs the damage model and labels its boxes.
///
/// Detection ids are assigned in model output order, starting at 0.
#[derive(Clone)]
pub struct DamageDetectionStage {
    detector: Arc<dyn ObjectDetector>,
    taxonomy: Arc<Taxonomy>,
}

impl DamageDetectionStage {
    pub fn new(detector: Arc<dyn ObjectDetector>, taxonomy: Arc<Taxonomy>) -> Self {
        Self { detector, taxonomy }
    }

    pub fn run(&self, image: &Path) -> Result<DetectionResult, CapabilityError> {
        let start = Instant::now();
        let boxes = self.detector.detect(image)?;

        let detections: Vec<Detection> = boxes
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Detection {
                id: DetectionId(i as u32),
                bbox: raw.bbox,
                confidence: round2(raw.confidence.clamp(0.0, 1.0)),
                damage_type: self.taxonomy.damage_label(raw.class_id),
            })
            .collect();

        let elapsed = start.elapsed().as_millis() as u64;
        tracing::info!(
            capability = self.detector.id(),
            damages = detections.len(),
            elapsed_ms = elapsed,
            "damage detection complete"
        );

        Ok(DetectionResult {
            detections,
            processing_time_ms: elapsed,
        })
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
