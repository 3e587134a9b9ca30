use crate::association::PartAssociator;
use claimsight_core::{CapabilityError, Detection, ObjectDetector, PartBox, PartMappingResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Part identification stage: runs the part model, then attributes each
/// damage to a part by overlap.
#[derive(Clone)]
pub struct PartIdentificationStage {
    detector: Arc<dyn ObjectDetector>,
    associator: PartAssociator,
}

impl PartIdentificationStage {
    pub fn new(detector: Arc<dyn ObjectDetector>, associator: PartAssociator) -> Self {
        Self { detector, associator }
    }

    pub fn associator(&self) -> &PartAssociator {
        &self.associator
    }

    /// Skips the part model entirely when there is no damage to attribute.
    pub fn run(
        &self,
        image: &Path,
        damages: &[Detection],
    ) -> Result<PartMappingResult, CapabilityError> {
        let start = Instant::now();

        if damages.is_empty() {
            tracing::debug!("no damages to map, part model not invoked");
            return Ok(PartMappingResult::empty(start.elapsed().as_millis() as u64));
        }

        let parts: Vec<PartBox> = self
            .detector
            .detect(image)?
            .into_iter()
            .map(PartBox::from)
            .collect();

        let damaged_parts = self.associator.associate(damages, &parts);

        let elapsed = start.elapsed().as_millis() as u64;
        tracing::info!(
            capability = self.detector.id(),
            parts = parts.len(),
            damages = damages.len(),
            matched = damaged_parts.len(),
            elapsed_ms = elapsed,
            "part identification complete"
        );

        Ok(PartMappingResult {
            damaged_parts,
            processing_time_ms: elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimsight_core::{BoundingBox, DamageType, DetectionId, RawBox, Taxonomy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDetector {
        calls: AtomicUsize,
        boxes: Vec<RawBox>,
    }

    impl ObjectDetector for CountingDetector {
        fn id(&self) -> &'static str {
            "counting"
        }

        fn detect(&self, _image: &Path) -> Result<Vec<RawBox>, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.boxes.clone())
        }
    }

    fn stage(detector: Arc<CountingDetector>) -> PartIdentificationStage {
        PartIdentificationStage::new(detector, PartAssociator::new(Arc::new(Taxonomy::default())))
    }

    #[test]
    fn test_no_damages_skips_part_model() {
        let detector = Arc::new(CountingDetector {
            calls: AtomicUsize::new(0),
            boxes: vec![],
        });
        let result = stage(detector.clone()).run(Path::new("car.jpg"), &[]).unwrap();

        assert!(result.damaged_parts.is_empty());
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_maps_damage_to_part() {
        let detector = Arc::new(CountingDetector {
            calls: AtomicUsize::new(0),
            boxes: vec![RawBox {
                bbox: BoundingBox::new(100.0, 300.0, 500.0, 560.0),
                class_id: 8,
                confidence: 0.8,
            }],
        });
        let damages = [Detection {
            id: DetectionId(0),
            bbox: BoundingBox::new(120.0, 340.0, 450.0, 520.0),
            confidence: 0.92,
            damage_type: DamageType::new("dent"),
        }];

        let result = stage(detector.clone()).run(Path::new("car.jpg"), &damages).unwrap();
        assert_eq!(result.damaged_parts.len(), 1);
        assert_eq!(result.damaged_parts[0].part_name.as_str(), "front_bumper");
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }
}
