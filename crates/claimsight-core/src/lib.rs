//! ClaimSight Core: data model, geometry, stage contracts and taxonomy
//!
//! Shared vocabulary of the damage-assessment pipeline. Nothing here performs
//! I/O besides loading taxonomy files.

pub mod context;
pub mod data_model;
pub mod error;
pub mod geometry;
pub mod report;
pub mod stage;
pub mod taxonomy;

pub use context::ClaimState;
pub use data_model::{
    CostRange, DamageType, Detection, DetectionId, DetectionResult, OverallSeverity, PartBox,
    PartMappingResult, PartMatch, PartName, QualityAssessment, QualityResult, RawBox,
    RepairCategory, SeverityLevel, SeverityResult,
};
pub use error::{ClaimError, ConfigError};
pub use geometry::{overlap, BoundingBox};
pub use report::Report;
pub use stage::{CapabilityError, ObjectDetector, QualityAssessor, StageKind, StageTrace};
pub use taxonomy::{SeverityRule, Taxonomy};

/// Engine version reported by the service
pub const CLAIMSIGHT_VERSION: &str = "1.0.0";
