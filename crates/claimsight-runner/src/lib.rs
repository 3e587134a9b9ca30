//! ClaimSight Runner: orchestrates claims through the assessment pipeline.
//!
//! # Example
//!
//! ```no_run
//! use claimsight_runner::{ClaimRequest, ClaimRunner, RunnerConfig};
//!
//! # async fn demo() -> Result<(), claimsight_core::ConfigError> {
//! let runner = ClaimRunner::builder()
//!     .config(RunnerConfig::default().from_env()?)
//!     .build()?;
//!
//! let report = runner.assess(ClaimRequest::new("uploads/car_front.jpg")).await;
//! println!("passed quality gate: {}", report.passed_quality_gate());
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod compiler;
pub mod config;
pub mod machine;
pub mod pool;
pub mod runner;

pub use cancel::{CancelHandle, Cancellation};
pub use compiler::{ReportCompiler, DEFAULT_CONSISTENCY_SCORE, REJECTION_MESSAGE};
pub use config::RunnerConfig;
pub use machine::{Event, Step};
pub use pool::{BatchResult, ClaimPool};
pub use runner::{ClaimRequest, ClaimRunner, ClaimRunnerBuilder, SnapshotSender};
