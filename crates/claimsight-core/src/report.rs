//! Report: the terminal, immutable output of one claim run
use crate::data_model::{
    CostRange, DamageType, DetectionId, OverallSeverity, PartName, RepairCategory, SeverityLevel,
};
use crate::geometry::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub claim_id: String,
    pub assessment_result: AssessmentResult,
    /// Per-stage processing time in ms. Absent on the rejection path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_metrics: Option<AgentMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn passed_quality_gate(&self) -> bool {
        self.assessment_result.quality_check.passed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub quality_check: QualityCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_summary: Option<DamageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<ImageAnnotations>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_estimate: Option<RepairEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraud_indicators: Option<FraudIndicators>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_quality: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageSummary {
    pub total_damages_found: usize,
    pub affected_parts: Vec<PartName>,
    pub overall_severity: OverallSeverity,
    pub confidence_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotations {
    pub image_id: String,
    pub detections: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub detection_id: DetectionId,
    pub damage_type: DamageType,
    pub part: PartName,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub severity: SeverityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairEstimate {
    pub cost_range: CostRange,
    pub repair_days: u32,
    pub category: RepairCategory,
}

/// Placeholders until multi-image consistency checks exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudIndicators {
    pub image_manipulation_detected: bool,
    pub consistency_score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub image_quality: u64,
    pub damage_detection: u64,
    pub part_identification: u64,
    pub severity_assessment: u64,
}
