//! ClaimSight Stages: the four analysis stages run by the claim runner.
//!
//! Each stage is a function of its declared inputs plus configuration and
//! returns a structured result with its processing time. Stages wrap the
//! external capabilities (`QualityAssessor`, `ObjectDetector`) and report
//! capability failures to the caller instead of substituting results; the
//! runner decides how to degrade.
//!
//! # Pipeline Flow
//!
//! ```text
//! Image → Quality ──processable──→ Detection → PartIdentification → Severity → Report
//!            │                         ↓               ↓                ↓
//!            └──rejected──→ Report   Detections    PartMatches     SeverityResult
//! ```

pub mod association;
mod detection;
mod parts;
mod quality;
pub mod severity;
mod sidecar;

pub use association::{PartAssociator, MIN_PART_OVERLAP};
pub use detection::DamageDetectionStage;
pub use parts::PartIdentificationStage;
pub use quality::QualityStage;
pub use severity::{JitterBounds, SeverityStage};
pub use sidecar::SidecarDetector;
