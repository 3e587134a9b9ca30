//! Stage contracts: the four pipeline stages and the external capabilities
//! they delegate to.
use crate::data_model::{QualityAssessment, RawBox};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The four analysis stages. The string ids double as `agent_metrics` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    ImageQuality,
    DamageDetection,
    PartIdentification,
    SeverityAssessment,
}

impl StageKind {
    pub fn id(&self) -> &'static str {
        match self {
            StageKind::ImageQuality => "image_quality",
            StageKind::DamageDetection => "damage_detection",
            StageKind::PartIdentification => "part_identification",
            StageKind::SeverityAssessment => "severity_assessment",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Image quality capability (blur, lighting, manipulation checks)
pub trait QualityAssessor: Send + Sync {
    /// Capability id (ex: "quality.filename.v1")
    fn id(&self) -> &'static str;

    /// Blocking call; may be long-running
    fn assess(&self, image: &Path) -> Result<QualityAssessment, CapabilityError>;
}

/// Object-detection capability. The damage model and the part model share
/// this shape and differ only in their class taxonomy.
pub trait ObjectDetector: Send + Sync {
    /// Capability id (ex: "yolo.damage.v8")
    fn id(&self) -> &'static str;

    /// Blocking call; may be long-running
    fn detect(&self, image: &Path) -> Result<Vec<RawBox>, CapabilityError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityError {
    /// No model loaded or backend unreachable
    Unavailable(String),
    /// The call ran and failed
    Failed(String),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "CAP/UNAVAILABLE: {}", msg),
            Self::Failed(msg) => write!(f, "CAP/FAILED: {}", msg),
        }
    }
}

impl std::error::Error for CapabilityError {}

/// Record of one stage execution, kept on the claim state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub stage: StageKind,
    pub latency_ms: u64,
    /// blake3 digest of the serialized stage result
    pub out_hash: String,
    /// True when the result is a substitute for a failed invocation
    pub degraded: bool,
}

impl StageTrace {
    pub fn new<T: Serialize>(
        stage: StageKind,
        latency_ms: u64,
        output: &T,
        degraded: bool,
    ) -> Self {
        let bytes = serde_json::to_vec(output).unwrap_or_default();
        Self {
            stage,
            latency_ms,
            out_hash: format!("blake3:{}", blake3::hash(&bytes)),
            degraded,
        }
    }
}
