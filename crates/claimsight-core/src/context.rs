//! Claim State: the value threaded through the pipeline for one claim.
//!
//! Every update consumes the state and returns the next one, so a snapshot
//! handed to an observer can never change underneath it.
use crate::data_model::{DetectionResult, PartMappingResult, QualityResult, SeverityResult};
use crate::report::Report;
use crate::stage::StageTrace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimState {
    pub claim_id: String,
    pub image_path: PathBuf,
    pub processing_log: Vec<String>,
    pub error_message: Option<String>,
    pub quality: Option<QualityResult>,
    pub detection: Option<DetectionResult>,
    pub part_mapping: Option<PartMappingResult>,
    pub severity: Option<SeverityResult>,
    pub traces: Vec<StageTrace>,
    pub final_report: Option<Report>,
}

impl ClaimState {
    pub fn new(claim_id: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            claim_id: claim_id.into(),
            image_path: image_path.into(),
            processing_log: Vec::new(),
            error_message: None,
            quality: None,
            detection: None,
            part_mapping: None,
            severity: None,
            traces: Vec::new(),
            final_report: None,
        }
    }

    /// Fresh claim id (ex: "CLM-3f2a9c1e")
    pub fn generate_claim_id() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("CLM-{}", &id[..8])
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// File name of the image, used as `image_id` in annotations
    pub fn image_id(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image_path.display().to_string())
    }

    pub fn with_log(mut self, entry: impl Into<String>) -> Self {
        self.processing_log.push(entry.into());
        self
    }

    /// Records an error. The first message wins; later ones are only logged.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if self.error_message.is_none() {
            self.error_message = Some(message.clone());
        }
        self.processing_log.push(format!("Error: {}", message));
        self
    }

    /// Sets the rejection reason unless an error already explains the outcome
    pub fn with_rejection(mut self, reason: impl Into<String>) -> Self {
        if self.error_message.is_none() {
            self.error_message = Some(reason.into());
        }
        self
    }

    pub fn with_quality(mut self, result: QualityResult) -> Self {
        self.quality = Some(result);
        self
    }

    pub fn with_detection(mut self, result: DetectionResult) -> Self {
        self.detection = Some(result);
        self
    }

    pub fn with_part_mapping(mut self, result: PartMappingResult) -> Self {
        self.part_mapping = Some(result);
        self
    }

    pub fn with_severity(mut self, result: SeverityResult) -> Self {
        self.severity = Some(result);
        self
    }

    pub fn with_trace(mut self, trace: StageTrace) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn with_report(mut self, report: Report) -> Self {
        self.final_report = Some(report);
        self
    }

    /// Quality gate outcome; `false` until the quality stage has run
    pub fn is_processable(&self) -> bool {
        self.quality.as_ref().map(|q| q.processable).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functional_updates_leave_snapshots_untouched() {
        let initial = ClaimState::new("CLM-1", "/tmp/photos/front_dark.jpg");
        let snapshot = initial.clone();
        let next = initial.with_log("Step 1: Assessing Image Quality...");

        assert!(snapshot.processing_log.is_empty());
        assert_eq!(next.processing_log.len(), 1);
    }

    #[test]
    fn test_first_error_is_kept() {
        let state = ClaimState::new("CLM-1", "car.jpg")
            .with_error("first")
            .with_error("second");

        assert_eq!(state.error_message.as_deref(), Some("first"));
        assert_eq!(state.processing_log, vec!["Error: first", "Error: second"]);
    }

    #[test]
    fn test_image_id_is_file_name() {
        let state = ClaimState::new("CLM-1", "/data/uploads/car_front.jpg");
        assert_eq!(state.image_id(), "car_front.jpg");
    }

    #[test]
    fn test_not_processable_before_quality() {
        let state = ClaimState::new("CLM-1", "car.jpg");
        assert!(!state.is_processable());

        let state = state.with_quality(QualityResult::failed("timeout", 0));
        assert!(!state.is_processable());
    }

    #[test]
    fn test_generated_claim_ids() {
        let id = ClaimState::generate_claim_id();
        assert!(id.starts_with("CLM-"));
        assert_eq!(id.len(), 12);
        assert_ne!(id, ClaimState::generate_claim_id());
    }
}
