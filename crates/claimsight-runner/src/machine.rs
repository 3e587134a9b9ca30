//! Claim state machine: explicit steps and the events that move between them
use claimsight_core::{ClaimError, StageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    QualityCheck,
    DamageDetection,
    PartIdentification,
    SeverityAssessment,
    CompileReport,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The quality gate ran; `processable` decides the branch
    QualityAssessed { processable: bool },
    /// A sequential stage finished, successfully or degraded
    StageCompleted,
    ReportCompiled,
}

impl Step {
    pub const INITIAL: Step = Step::QualityCheck;

    /// `(Step, Event) -> Step`. The quality gate is the only branch; every
    /// other edge is sequential.
    pub fn transition(self, event: Event) -> Result<Step, ClaimError> {
        match (self, event) {
            (Step::QualityCheck, Event::QualityAssessed { processable: true }) => {
                Ok(Step::DamageDetection)
            }
            (Step::QualityCheck, Event::QualityAssessed { processable: false }) => {
                Ok(Step::CompileReport)
            }
            (Step::DamageDetection, Event::StageCompleted) => Ok(Step::PartIdentification),
            (Step::PartIdentification, Event::StageCompleted) => Ok(Step::SeverityAssessment),
            (Step::SeverityAssessment, Event::StageCompleted) => Ok(Step::CompileReport),
            (Step::CompileReport, Event::ReportCompiled) => Ok(Step::Done),
            (from, event) => Err(ClaimError::InvalidTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Step::Done
    }

    /// Stage executed in this step, if any
    pub fn stage(self) -> Option<StageKind> {
        match self {
            Step::QualityCheck => Some(StageKind::ImageQuality),
            Step::DamageDetection => Some(StageKind::DamageDetection),
            Step::PartIdentification => Some(StageKind::PartIdentification),
            Step::SeverityAssessment => Some(StageKind::SeverityAssessment),
            Step::CompileReport | Step::Done => None,
        }
    }

    /// Processing log line written when the step starts
    pub fn description(self) -> Option<&'static str> {
        match self {
            Step::QualityCheck => Some("Step 1: Assessing Image Quality..."),
            Step::DamageDetection => Some("Step 2: Detecting Damage..."),
            Step::PartIdentification => Some("Step 3: Identifying Damaged Parts..."),
            Step::SeverityAssessment => Some("Step 4: Assessing Severity..."),
            Step::CompileReport => Some("Step 5: Compiling Final Report..."),
            Step::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(processable: bool) -> Vec<Step> {
        let mut step = Step::INITIAL;
        let mut visited = vec![step];
        while !step.is_terminal() {
            let event = match step {
                Step::QualityCheck => Event::QualityAssessed { processable },
                Step::CompileReport => Event::ReportCompiled,
                _ => Event::StageCompleted,
            };
            step = step.transition(event).unwrap();
            visited.push(step);
        }
        visited
    }

    #[test]
    fn test_accept_path() {
        assert_eq!(
            walk(true),
            vec![
                Step::QualityCheck,
                Step::DamageDetection,
                Step::PartIdentification,
                Step::SeverityAssessment,
                Step::CompileReport,
                Step::Done,
            ]
        );
    }

    #[test]
    fn test_reject_path_skips_analysis() {
        assert_eq!(walk(false), vec![Step::QualityCheck, Step::CompileReport, Step::Done]);
    }

    #[test]
    fn test_invalid_edges() {
        assert!(Step::QualityCheck.transition(Event::StageCompleted).is_err());
        assert!(Step::DamageDetection.transition(Event::ReportCompiled).is_err());
        assert!(Step::Done.transition(Event::StageCompleted).is_err());

        let err = Step::CompileReport.transition(Event::StageCompleted).unwrap_err();
        assert_eq!(err.to_string(), "FSM/TRANSITION: no edge from CompileReport on StageCompleted");
    }

    #[test]
    fn test_step_metadata() {
        assert_eq!(Step::PartIdentification.stage(), Some(StageKind::PartIdentification));
        assert_eq!(Step::CompileReport.stage(), None);
        assert!(Step::Done.description().is_none());
    }
}
