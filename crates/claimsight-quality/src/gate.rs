//! Quality Gate: heuristic image quality assessment
//!
//! Scores an image from markers in its path (a stand-in for a blur /
//! exposure / tamper model) and decides whether it may enter the pipeline.

use super::profile::QualityProfile;
use claimsight_core::{CapabilityError, QualityAssessment, QualityAssessor};
use std::path::Path;

/// Quality gate that evaluates images against a profile
#[derive(Debug, Clone)]
pub struct QualityGate {
    profile: QualityProfile,
}

impl QualityGate {
    pub fn new(profile: QualityProfile) -> Self {
        Self { profile }
    }

    pub fn for_mode(mode: &str) -> Self {
        Self::new(QualityProfile::for_mode(mode))
    }

    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    /// Evaluate an image path against the profile
    pub fn evaluate(&self, image: &Path) -> QualityAssessment {
        let haystack = image.to_string_lossy().to_lowercase();

        let mut issues = Vec::new();
        let mut score = self.profile.clean_score;

        for marker in &self.profile.issue_markers {
            if haystack.contains(&marker.marker.to_lowercase()) && !issues.contains(&marker.issue) {
                issues.push(marker.issue.clone());
                score = score.min(marker.score);
            }
        }

        let manipulation_detected = self
            .profile
            .manipulation_markers
            .iter()
            .any(|m| haystack.contains(&m.to_lowercase()));

        let blocked = issues.iter().any(|i| self.profile.is_blocking(i));
        let processable = !blocked && score >= self.profile.min_processable_score;

        tracing::debug!(
            profile = %self.profile.name,
            score,
            ?issues,
            processable,
            manipulation_detected,
            "quality evaluated"
        );

        QualityAssessment {
            quality_score: score,
            issues,
            processable,
            manipulation_detected,
        }
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QualityProfile::default())
    }
}

impl QualityAssessor for QualityGate {
    fn id(&self) -> &'static str {
        "quality.heuristic.v1"
    }

    fn assess(&self, image: &Path) -> Result<QualityAssessment, CapabilityError> {
        Ok(self.evaluate(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_image_passes() {
        let gate = QualityGate::default();
        let result = gate.evaluate(Path::new("uploads/good_image.jpg"));

        assert!(result.processable);
        assert!(result.issues.is_empty());
        assert!(!result.manipulation_detected);
        assert!(result.quality_score > 0.85);
    }

    #[test]
    fn test_blurry_image_rejected() {
        let gate = QualityGate::default();
        let result = gate.evaluate(Path::new("uploads/Blurry_Bumper.jpg"));

        assert!(!result.processable);
        assert_eq!(result.issues, vec!["blur".to_string()]);
        assert_eq!(result.quality_score, 0.5);
    }

    #[test]
    fn test_dark_image_still_processable() {
        let gate = QualityGate::default();
        let result = gate.evaluate(Path::new("uploads/dark_garage.jpg"));

        assert!(result.processable);
        assert_eq!(result.issues, vec!["low_light".to_string()]);
    }

    #[test]
    fn test_manipulation_is_flagged_not_blocked() {
        let gate = QualityGate::default();
        let result = gate.evaluate(Path::new("uploads/manipulated_door.jpg"));

        assert!(result.processable);
        assert!(result.manipulation_detected);
    }

    #[test]
    fn test_lenient_profile_accepts_blur() {
        let gate = QualityGate::for_mode("lenient");
        let result = gate.evaluate(Path::new("blurry_dark.jpg"));

        assert!(result.processable);
        assert_eq!(result.issues, vec!["blur".to_string(), "low_light".to_string()]);
        assert_eq!(result.quality_score, 0.5);
    }

    #[test]
    fn test_min_score_blocks_without_blocking_issue() {
        let mut profile = QualityProfile::lenient();
        profile.min_processable_score = 0.55;
        let gate = QualityGate::new(profile);

        assert!(!gate.evaluate(Path::new("blurry.jpg")).processable);
        assert!(gate.evaluate(Path::new("dark.jpg")).processable);
    }
}
