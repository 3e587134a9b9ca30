//! Claim Runner: drives one claim through the step machine.
//!
//! Every capability call runs on the blocking pool under a timeout and races
//! the claim's cancellation token. Failures never escape a run: they are
//! written to the log and `error_message`, and the stage's empty result
//! takes its place, so every claim ends with exactly one report.
use crate::cancel::Cancellation;
use crate::compiler::{ReportCompiler, REJECTION_MESSAGE};
use crate::config::RunnerConfig;
use crate::machine::{Event, Step};
use claimsight_core::{
    CapabilityError, ClaimError, ClaimState, ConfigError, DetectionResult, ObjectDetector,
    PartMappingResult, QualityAssessor, QualityResult, Report, SeverityResult, StageKind,
    StageTrace, Taxonomy,
};
use claimsight_quality::QualityGate;
use claimsight_stages::{
    DamageDetectionStage, PartAssociator, PartIdentificationStage, QualityStage, SeverityStage,
    SidecarDetector,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Receives a `ClaimState` snapshot after every step
pub type SnapshotSender = mpsc::UnboundedSender<ClaimState>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Generated ("CLM-xxxxxxxx") when absent
    #[serde(default)]
    pub claim_id: Option<String>,
    pub image_path: PathBuf,
}

impl ClaimRequest {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            claim_id: None,
            image_path: image_path.into(),
        }
    }

    pub fn with_claim_id(mut self, claim_id: impl Into<String>) -> Self {
        self.claim_id = Some(claim_id.into());
        self
    }
}

pub struct ClaimRunner {
    quality: QualityStage,
    detection: DamageDetectionStage,
    parts: PartIdentificationStage,
    severity: SeverityStage,
    compiler: ReportCompiler,
    taxonomy: Arc<Taxonomy>,
    stage_timeout: Duration,
    severity_seed: Option<u64>,
}

impl ClaimRunner {
    pub fn builder() -> ClaimRunnerBuilder {
        ClaimRunnerBuilder::default()
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    pub fn stage_timeout(&self) -> Duration {
        self.stage_timeout
    }

    /// Assesses one image. Total: always returns a report.
    pub async fn assess(&self, request: ClaimRequest) -> Report {
        let state = self.run(request, Cancellation::never(), None).await;
        self.into_report(state)
    }

    /// Final report of a finished run
    pub fn into_report(&self, mut state: ClaimState) -> Report {
        match state.final_report.take() {
            Some(report) => report,
            None => self.compiler.compile(&state),
        }
    }

    /// Runs the step machine to `Done` and returns the final state
    pub async fn run(
        &self,
        request: ClaimRequest,
        mut cancel: Cancellation,
        observer: Option<&SnapshotSender>,
    ) -> ClaimState {
        let claim_id = request.claim_id.unwrap_or_else(ClaimState::generate_claim_id);
        let mut state = ClaimState::new(claim_id, request.image_path);
        let started = Instant::now();
        let mut step = Step::INITIAL;

        tracing::info!(
            claim_id = %state.claim_id,
            image = %state.image_path.display(),
            "claim received"
        );

        while !step.is_terminal() {
            if let Some(line) = step.description() {
                tracing::debug!(claim_id = %state.claim_id, "{}", line);
                state = state.with_log(line);
            }

            let (next, event) = match step {
                Step::QualityCheck => self.quality_check(state, &mut cancel).await,
                Step::DamageDetection => self.damage_detection(state, &mut cancel).await,
                Step::PartIdentification => self.part_identification(state, &mut cancel).await,
                Step::SeverityAssessment => self.severity_assessment(state, &mut cancel).await,
                Step::CompileReport => self.compile_report(state),
                Step::Done => break,
            };
            state = next;

            step = match step.transition(event) {
                Ok(next) => next,
                Err(err) => {
                    tracing::error!(claim_id = %state.claim_id, error = %err, "claim aborted");
                    state = state.with_error(err.to_string());
                    let report = self.compiler.compile(&state);
                    state = state.with_report(report);
                    Step::Done
                }
            };

            if let Some(tx) = observer {
                let _ = tx.send(state.clone());
            }
        }

        tracing::info!(
            claim_id = %state.claim_id,
            processable = state.is_processable(),
            degraded = state.error_message.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "claim finished"
        );

        state
    }

    async fn quality_check(
        &self,
        state: ClaimState,
        cancel: &mut Cancellation,
    ) -> (ClaimState, Event) {
        let stage = self.quality.clone();
        let image = state.image_path.clone();
        let started = Instant::now();

        let outcome = self
            .invoke(StageKind::ImageQuality, cancel, move || stage.run(&image))
            .await;
        let (state, result) = settle(state, StageKind::ImageQuality, started, outcome, |ms| {
            QualityResult::failed("quality_check_failed", ms)
        });

        let processable = result.processable;
        (state.with_quality(result), Event::QualityAssessed { processable })
    }

    async fn damage_detection(
        &self,
        state: ClaimState,
        cancel: &mut Cancellation,
    ) -> (ClaimState, Event) {
        let stage = self.detection.clone();
        let image = state.image_path.clone();
        let started = Instant::now();

        let outcome = self
            .invoke(StageKind::DamageDetection, cancel, move || stage.run(&image))
            .await;
        let (state, result) = settle(
            state,
            StageKind::DamageDetection,
            started,
            outcome,
            DetectionResult::empty,
        );

        (state.with_detection(result), Event::StageCompleted)
    }

    async fn part_identification(
        &self,
        state: ClaimState,
        cancel: &mut Cancellation,
    ) -> (ClaimState, Event) {
        let stage = self.parts.clone();
        let image = state.image_path.clone();
        let damages = state
            .detection
            .as_ref()
            .map(|d| d.detections.clone())
            .unwrap_or_default();
        let started = Instant::now();

        let outcome = self
            .invoke(StageKind::PartIdentification, cancel, move || {
                stage.run(&image, &damages)
            })
            .await;
        let (state, result) = settle(
            state,
            StageKind::PartIdentification,
            started,
            outcome,
            PartMappingResult::empty,
        );

        (state.with_part_mapping(result), Event::StageCompleted)
    }

    async fn severity_assessment(
        &self,
        state: ClaimState,
        cancel: &mut Cancellation,
    ) -> (ClaimState, Event) {
        let stage = self.severity.clone();
        let matches = state
            .part_mapping
            .as_ref()
            .map(|p| p.damaged_parts.clone())
            .unwrap_or_default();
        let seed = self.claim_seed(&state.claim_id);
        let started = Instant::now();

        let outcome = self
            .invoke(StageKind::SeverityAssessment, cancel, move || {
                let mut rng = StdRng::seed_from_u64(seed);
                Ok(stage.run(&matches, &mut rng))
            })
            .await;
        let (state, result) = settle(
            state,
            StageKind::SeverityAssessment,
            started,
            outcome,
            SeverityResult::no_damage,
        );

        (state.with_severity(result), Event::StageCompleted)
    }

    fn compile_report(&self, state: ClaimState) -> (ClaimState, Event) {
        let processable = state.is_processable();
        let state = if processable {
            state
        } else {
            state.with_rejection(REJECTION_MESSAGE)
        };

        let report = self.compiler.compile(&state);
        let closing = if processable {
            "Process Complete."
        } else {
            "Process Halted: Image Rejected."
        };

        (state.with_report(report).with_log(closing), Event::ReportCompiled)
    }

    /// Runs a blocking capability call bounded by the stage timeout and the
    /// cancellation token. A timed-out call keeps its blocking thread until it
    /// returns; its result is discarded.
    async fn invoke<T, F>(
        &self,
        stage: StageKind,
        cancel: &mut Cancellation,
        call: F,
    ) -> Result<T, ClaimError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CapabilityError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(ClaimError::Cancelled(stage));
        }

        let task = tokio::task::spawn_blocking(call);

        tokio::select! {
            outcome = tokio::time::timeout(self.stage_timeout, task) => match outcome {
                Ok(Ok(result)) => result.map_err(|err| match err {
                    CapabilityError::Unavailable(message) => {
                        ClaimError::DetectionUnavailable { stage, message }
                    }
                    CapabilityError::Failed(message) => {
                        ClaimError::StageInvocation { stage, message }
                    }
                }),
                Ok(Err(join_err)) => Err(ClaimError::StageInvocation {
                    stage,
                    message: format!("stage task aborted: {}", join_err),
                }),
                Err(_) => Err(ClaimError::Timeout {
                    stage,
                    after: self.stage_timeout,
                }),
            },
            _ = cancel.cancelled() => Err(ClaimError::Cancelled(stage)),
        }
    }

    /// Severity jitter seed for one claim: derived from the configured seed
    /// and the claim id, or drawn from the thread RNG when none is set
    fn claim_seed(&self, claim_id: &str) -> u64 {
        match self.severity_seed {
            Some(seed) => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(&seed.to_le_bytes());
                hasher.update(claim_id.as_bytes());
                let digest = hasher.finalize();

                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&digest.as_bytes()[..8]);
                u64::from_le_bytes(bytes)
            }
            None => rand::rng().random(),
        }
    }
}

/// Records the stage outcome on the state, substituting `fallback` on failure
fn settle<T, F>(
    state: ClaimState,
    stage: StageKind,
    started: Instant,
    outcome: Result<T, ClaimError>,
    fallback: F,
) -> (ClaimState, T)
where
    T: Serialize,
    F: FnOnce(u64) -> T,
{
    let elapsed = started.elapsed().as_millis() as u64;

    let (state, result, degraded) = match outcome {
        Ok(result) => (state, result, false),
        Err(err) => {
            tracing::warn!(
                claim_id = %state.claim_id,
                stage = %stage,
                error = %err,
                "stage degraded to empty result"
            );
            (state.with_error(err.to_string()), fallback(elapsed), true)
        }
    };

    let trace = StageTrace::new(stage, elapsed, &result, degraded);
    (state.with_trace(trace), result)
}

/// Builds a `ClaimRunner`. Unset capabilities default to the filename
/// quality heuristic and sidecar detectors.
#[derive(Default)]
pub struct ClaimRunnerBuilder {
    config: RunnerConfig,
    taxonomy: Option<Arc<Taxonomy>>,
    quality: Option<Arc<dyn QualityAssessor>>,
    damage_detector: Option<Arc<dyn ObjectDetector>>,
    part_detector: Option<Arc<dyn ObjectDetector>>,
}

impl ClaimRunnerBuilder {
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides `config.taxonomy_path`
    pub fn taxonomy(mut self, taxonomy: Arc<Taxonomy>) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    pub fn quality_assessor(mut self, assessor: Arc<dyn QualityAssessor>) -> Self {
        self.quality = Some(assessor);
        self
    }

    pub fn damage_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.damage_detector = Some(detector);
        self
    }

    pub fn part_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.part_detector = Some(detector);
        self
    }

    pub fn build(self) -> Result<ClaimRunner, ConfigError> {
        let config = self.config;
        config.validate()?;

        let taxonomy = match self.taxonomy {
            Some(taxonomy) => taxonomy,
            None => config.load_taxonomy()?,
        };
        let quality = match self.quality {
            Some(quality) => quality,
            None => Arc::new(QualityGate::new(config.load_quality_profile()?)),
        };
        let damage_detector = self
            .damage_detector
            .unwrap_or_else(|| Arc::new(SidecarDetector::damage()));
        let part_detector = self
            .part_detector
            .unwrap_or_else(|| Arc::new(SidecarDetector::parts()));

        let associator =
            PartAssociator::with_min_overlap(taxonomy.clone(), config.min_part_overlap);

        tracing::debug!(
            quality = quality.id(),
            damage_detector = damage_detector.id(),
            part_detector = part_detector.id(),
            stage_timeout_ms = config.stage_timeout_ms,
            "claim runner configured"
        );

        Ok(ClaimRunner {
            quality: QualityStage::new(quality),
            detection: DamageDetectionStage::new(damage_detector, taxonomy.clone()),
            parts: PartIdentificationStage::new(part_detector, associator),
            severity: SeverityStage::new(taxonomy.clone(), config.jitter),
            compiler: ReportCompiler::new(taxonomy.clone()),
            taxonomy,
            stage_timeout: config.stage_timeout(),
            severity_seed: config.severity_seed,
        })
    }
}
