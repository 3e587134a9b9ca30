//! Report Compiler: assembles the final report from a finished claim state
use claimsight_core::report::{
    AgentMetrics, Annotation, AssessmentResult, DamageSummary, FraudIndicators, ImageAnnotations,
    QualityCheck, RepairEstimate,
};
use claimsight_core::{
    ClaimState, DetectionResult, PartMappingResult, QualityResult, Report, SeverityResult, Taxonomy,
};
use std::sync::Arc;

pub const REJECTION_MESSAGE: &str = "Image quality is too low to process.";

/// Fixed until cross-image consistency checks exist
pub const DEFAULT_CONSISTENCY_SCORE: f32 = 0.95;

#[derive(Debug, Clone)]
pub struct ReportCompiler {
    taxonomy: Arc<Taxonomy>,
}

impl ReportCompiler {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// Pure function of the state; never fails
    pub fn compile(&self, state: &ClaimState) -> Report {
        match state.quality.as_ref().filter(|q| q.processable) {
            Some(quality) => self.accepted(state, quality),
            None => self.rejected(state),
        }
    }

    fn rejected(&self, state: &ClaimState) -> Report {
        let issues = state
            .quality
            .as_ref()
            .map(|q| q.issues.clone())
            .unwrap_or_default();

        Report {
            claim_id: state.claim_id.clone(),
            assessment_result: AssessmentResult {
                quality_check: QualityCheck {
                    passed: false,
                    issues: Some(issues),
                    average_quality: None,
                },
                damage_summary: None,
                annotations: None,
                repair_estimate: None,
                fraud_indicators: None,
            },
            agent_metrics: None,
            error: Some(
                state
                    .error_message
                    .clone()
                    .unwrap_or_else(|| REJECTION_MESSAGE.to_string()),
            ),
            generated_at: chrono::Utc::now(),
        }
    }

    fn accepted(&self, state: &ClaimState, quality: &QualityResult) -> Report {
        let no_detections = DetectionResult::default();
        let no_parts = PartMappingResult::default();
        let detection = state.detection.as_ref().unwrap_or(&no_detections);
        let parts = state.part_mapping.as_ref().unwrap_or(&no_parts);
        let severity = state
            .severity
            .clone()
            .unwrap_or_else(|| SeverityResult::no_damage(0));

        let annotations = parts
            .damaged_parts
            .iter()
            .map(|m| {
                let confidence = match detection.get(m.detection_id) {
                    Some(d) => d.confidence,
                    None => {
                        tracing::warn!(
                            claim_id = %state.claim_id,
                            detection_id = %m.detection_id,
                            "part match without a detection; confidence unknown"
                        );
                        0.0
                    }
                };
                Annotation {
                    detection_id: m.detection_id,
                    damage_type: m.damage_type.clone(),
                    part: m.part_name.clone(),
                    bbox: m.bbox,
                    confidence,
                    severity: self.taxonomy.severity_for(&m.damage_type),
                }
            })
            .collect();

        let issues = (!quality.issues.is_empty()).then(|| quality.issues.clone());

        Report {
            claim_id: state.claim_id.clone(),
            assessment_result: AssessmentResult {
                quality_check: QualityCheck {
                    passed: true,
                    issues,
                    average_quality: Some(quality.quality_score),
                },
                damage_summary: Some(DamageSummary {
                    total_damages_found: detection.detections.len(),
                    affected_parts: parts
                        .damaged_parts
                        .iter()
                        .map(|m| m.part_name.clone())
                        .collect(),
                    overall_severity: severity.overall_severity,
                    confidence_score: detection.mean_confidence(),
                }),
                annotations: Some(vec![ImageAnnotations {
                    image_id: state.image_id(),
                    detections: annotations,
                }]),
                repair_estimate: Some(RepairEstimate {
                    cost_range: severity.estimated_cost_range,
                    repair_days: severity.repair_time_days,
                    category: severity.repair_category,
                }),
                fraud_indicators: Some(FraudIndicators {
                    image_manipulation_detected: quality.manipulation_detected,
                    consistency_score: DEFAULT_CONSISTENCY_SCORE,
                }),
            },
            agent_metrics: Some(AgentMetrics {
                image_quality: quality.processing_time_ms,
                damage_detection: detection.processing_time_ms,
                part_identification: parts.processing_time_ms,
                severity_assessment: severity.processing_time_ms,
            }),
            error: state.error_message.clone(),
            generated_at: chrono::Utc::now(),
        }
    }
}
