use claimsight_core::{CapabilityError, QualityAssessor, QualityResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Quality stage: wraps a quality capability and stamps its timing
#[derive(Clone)]
pub struct QualityStage {
    assessor: Arc<dyn QualityAssessor>,
}

impl QualityStage {
    pub fn new(assessor: Arc<dyn QualityAssessor>) -> Self {
        Self { assessor }
    }

    pub fn capability_id(&self) -> &'static str {
        self.assessor.id()
    }

    pub fn run(&self, image: &Path) -> Result<QualityResult, CapabilityError> {
        let start = Instant::now();
        let assessment = self.assessor.assess(image)?;
        let elapsed = start.elapsed().as_millis() as u64;

        tracing::info!(
            capability = self.assessor.id(),
            score = assessment.quality_score,
            processable = assessment.processable,
            elapsed_ms = elapsed,
            "quality check complete"
        );

        Ok(QualityResult::from_assessment(assessment, elapsed))
    }
}
