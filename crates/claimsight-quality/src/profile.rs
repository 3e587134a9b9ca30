//! Quality Profiles for different intake policies
//!
//! A profile names the issues the heuristic assessor looks for, the score
//! each issue caps the image at, and which issues block processing.

use claimsight_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marks an issue when `marker` appears in the lower-cased image path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueMarker {
    pub marker: String,
    pub issue: String,
    /// Score assigned to an image carrying this issue
    pub score: f32,
}

impl IssueMarker {
    pub fn new(marker: &str, issue: &str, score: f32) -> Self {
        Self {
            marker: marker.to_string(),
            issue: issue.to_string(),
            score,
        }
    }
}

/// Quality profile defining issue detection and gate thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Profile name (e.g., "strict@1.0", "lenient@1.0")
    pub name: String,

    /// Score of an image with no issues
    pub clean_score: f32,

    /// Images scoring below this are not processable
    pub min_processable_score: f32,

    pub issue_markers: Vec<IssueMarker>,

    /// Issues that make an image unprocessable regardless of score
    pub blocking_issues: Vec<String>,

    /// Path markers that raise the manipulation flag
    pub manipulation_markers: Vec<String>,
}

impl QualityProfile {
    /// Blur blocks; poor lighting is flagged but correctable
    pub fn strict() -> Self {
        Self {
            name: "strict@1.0".to_string(),
            clean_score: 0.92,
            min_processable_score: 0.3,
            issue_markers: vec![
                IssueMarker::new("blurry", "blur", 0.5),
                IssueMarker::new("dark", "low_light", 0.6),
            ],
            blocking_issues: vec!["blur".to_string()],
            manipulation_markers: vec!["manipulated".to_string()],
        }
    }

    /// Nothing blocks outright; only very low scores are rejected
    pub fn lenient() -> Self {
        Self {
            name: "lenient@1.0".to_string(),
            clean_score: 0.92,
            min_processable_score: 0.2,
            issue_markers: vec![
                IssueMarker::new("blurry", "blur", 0.5),
                IssueMarker::new("dark", "low_light", 0.6),
            ],
            blocking_issues: Vec::new(),
            manipulation_markers: vec!["manipulated".to_string()],
        }
    }

    /// Load profile from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let profile: QualityProfile = serde_yaml::from_str(yaml)?;
        if !(0.0..=1.0).contains(&profile.min_processable_score) {
            return Err(ConfigError::Invalid(format!(
                "min_processable_score {} outside [0, 1]",
                profile.min_processable_score
            )));
        }
        Ok(profile)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Get profile by name ("strict" or "lenient"), defaulting to strict
    pub fn for_mode(mode: &str) -> Self {
        match mode.split('@').next().unwrap_or(mode) {
            "lenient" => Self::lenient(),
            _ => Self::strict(),
        }
    }

    pub fn is_blocking(&self, issue: &str) -> bool {
        self.blocking_issues.iter().any(|b| b == issue)
    }
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self::strict()
    }
}
