//! ClaimSight Quality Gate: Image Quality Evaluation
//!
//! This crate provides the default image quality capability, checking images
//! against configurable profiles (strict vs lenient intake).
//!
//! # Example
//!
//! ```ignore
//! use claimsight_quality::QualityGate;
//! use std::path::Path;
//!
//! let gate = QualityGate::for_mode("strict");
//! let result = gate.evaluate(Path::new("uploads/blurry_front.jpg"));
//! assert!(!result.processable);
//! ```

pub mod gate;
pub mod profile;

pub use gate::QualityGate;
pub use profile::{IssueMarker, QualityProfile};
