//! Data Model: detections, part matches and per-stage results
use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the detection stage, carried through part mapping
/// into the report so annotations never have to be re-joined by geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionId(pub u32);

impl fmt::Display for DetectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "det-{}", self.0)
    }
}

/// Damage label from the damage taxonomy (ex: "scratch", "glass-crack")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageType(String);

impl DamageType {
    /// Label for a class id the damage model map does not know
    pub const UNKNOWN_DAMAGE: &'static str = "unknown_damage";
    /// Label for a match whose damage type could not be carried over
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn unknown_damage() -> Self {
        Self::new(Self::UNKNOWN_DAMAGE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DamageType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Part label from the part taxonomy (ex: "front_bumper")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartName(String);

impl PartName {
    pub const UNKNOWN_PART: &'static str = "unknown_part";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN_PART)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One box as produced by an object-detection capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub bbox: BoundingBox,
    pub class_id: u32,
    /// Part models may omit confidence
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: DetectionId,
    pub bbox: BoundingBox,
    /// Confidence in `[0, 1]`, rounded to two decimals
    pub confidence: f32,
    pub damage_type: DamageType,
}

/// A part box from the part detector, before labelling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartBox {
    pub bbox: BoundingBox,
    pub class_id: u32,
}

impl From<RawBox> for PartBox {
    fn from(raw: RawBox) -> Self {
        Self {
            bbox: raw.bbox,
            class_id: raw.class_id,
        }
    }
}

/// A damage attributed to the part it overlaps most
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartMatch {
    pub detection_id: DetectionId,
    pub part_name: PartName,
    /// Display id (ex: "FRON-001")
    pub part_id: String,
    /// Share of the part box covered by the damage box, 0-100
    pub damage_percentage: u8,
    /// Bounding box of the originating damage, not of the part
    pub bbox: BoundingBox,
    pub damage_type: DamageType,
}

/// Output of a quality capability, before the stage stamps its timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub quality_score: f32,
    pub issues: Vec<String>,
    pub processable: bool,
    pub manipulation_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub quality_score: f32,
    pub issues: Vec<String>,
    pub processable: bool,
    pub manipulation_detected: bool,
    pub processing_time_ms: u64,
}

impl QualityResult {
    pub fn from_assessment(assessment: QualityAssessment, processing_time_ms: u64) -> Self {
        Self {
            quality_score: assessment.quality_score,
            issues: assessment.issues,
            processable: assessment.processable,
            manipulation_detected: assessment.manipulation_detected,
            processing_time_ms,
        }
    }

    /// Zeroed result used when the quality capability could not run.
    /// An image whose quality cannot be verified is not processable.
    pub fn failed(issue: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            quality_score: 0.0,
            issues: vec![issue.into()],
            processable: false,
            manipulation_detected: false,
            processing_time_ms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub processing_time_ms: u64,
}

impl DetectionResult {
    pub fn empty(processing_time_ms: u64) -> Self {
        Self {
            detections: Vec::new(),
            processing_time_ms,
        }
    }

    pub fn get(&self, id: DetectionId) -> Option<&Detection> {
        self.detections.iter().find(|d| d.id == id)
    }

    /// Mean confidence rounded to two decimals, `0.0` with no detections
    pub fn mean_confidence(&self) -> f32 {
        if self.detections.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.detections.iter().map(|d| d.confidence).sum();
        round_to(sum / self.detections.len() as f32, 2)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartMappingResult {
    pub damaged_parts: Vec<PartMatch>,
    pub processing_time_ms: u64,
}

impl PartMappingResult {
    pub fn empty(processing_time_ms: u64) -> Self {
        Self {
            damaged_parts: Vec::new(),
            processing_time_ms,
        }
    }
}

/// Severity of a single damage. Ordered: minor < moderate < major < severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Minor,
    Moderate,
    Major,
    Severe,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Minor,
        SeverityLevel::Moderate,
        SeverityLevel::Major,
        SeverityLevel::Severe,
    ];

    /// 1-based rank used for the severity score
    pub fn rank(&self) -> u8 {
        match self {
            SeverityLevel::Minor => 1,
            SeverityLevel::Moderate => 2,
            SeverityLevel::Major => 3,
            SeverityLevel::Severe => 4,
        }
    }

    pub fn repair_category(&self) -> RepairCategory {
        match self {
            SeverityLevel::Minor => RepairCategory::MinorCosmeticRepair,
            SeverityLevel::Moderate => RepairCategory::BodyShopRequired,
            SeverityLevel::Major => RepairCategory::SignificantBodyWork,
            SeverityLevel::Severe => RepairCategory::PotentialTotalLoss,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Minor => "minor",
            SeverityLevel::Moderate => "moderate",
            SeverityLevel::Major => "major",
            SeverityLevel::Severe => "severe",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim-wide severity; `NoDamageDetected` sits outside the level ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSeverity {
    NoDamageDetected,
    Minor,
    Moderate,
    Major,
    Severe,
}

impl OverallSeverity {
    pub fn level(&self) -> Option<SeverityLevel> {
        match self {
            OverallSeverity::NoDamageDetected => None,
            OverallSeverity::Minor => Some(SeverityLevel::Minor),
            OverallSeverity::Moderate => Some(SeverityLevel::Moderate),
            OverallSeverity::Major => Some(SeverityLevel::Major),
            OverallSeverity::Severe => Some(SeverityLevel::Severe),
        }
    }
}

impl From<SeverityLevel> for OverallSeverity {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Minor => OverallSeverity::Minor,
            SeverityLevel::Moderate => OverallSeverity::Moderate,
            SeverityLevel::Major => OverallSeverity::Major,
            SeverityLevel::Severe => OverallSeverity::Severe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairCategory {
    None,
    MinorCosmeticRepair,
    BodyShopRequired,
    SignificantBodyWork,
    PotentialTotalLoss,
}

/// Estimated repair cost, serialized as `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange(pub u32, pub u32);

impl CostRange {
    pub const ZERO: CostRange = CostRange(0, 0);

    pub fn low(&self) -> u32 {
        self.0
    }

    pub fn high(&self) -> u32 {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityResult {
    pub overall_severity: OverallSeverity,
    /// Score out of 10
    pub severity_score: f32,
    pub repair_category: RepairCategory,
    pub estimated_cost_range: CostRange,
    pub repair_time_days: u32,
    pub processing_time_ms: u64,
}

impl SeverityResult {
    pub fn no_damage(processing_time_ms: u64) -> Self {
        Self {
            overall_severity: OverallSeverity::NoDamageDetected,
            severity_score: 0.0,
            repair_category: RepairCategory::None,
            estimated_cost_range: CostRange::ZERO,
            repair_time_days: 0,
            processing_time_ms,
        }
    }
}

pub(crate) fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}
