//! Prometheus counters for assessed claims, served on `/metrics`.
use claimsight_core::Report;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::time::Duration;

pub struct ApiMetrics {
    registry: Registry,
    claims_assessed: IntCounter,
    claims_rejected: IntCounter,
    claims_degraded: IntCounter,
    assessment_seconds: Histogram,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let claims_assessed =
            IntCounter::new("claims_assessed_total", "Claims that produced a report")?;
        let claims_rejected = IntCounter::new(
            "claims_rejected_total",
            "Claims rejected by the image quality gate",
        )?;
        let claims_degraded = IntCounter::new(
            "claims_degraded_total",
            "Accepted claims where a stage failed and was replaced by an empty result",
        )?;
        let assessment_seconds = Histogram::with_opts(
            HistogramOpts::new("claim_assessment_seconds", "Wall time to assess one claim")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;

        registry.register(Box::new(claims_assessed.clone()))?;
        registry.register(Box::new(claims_rejected.clone()))?;
        registry.register(Box::new(claims_degraded.clone()))?;
        registry.register(Box::new(assessment_seconds.clone()))?;

        Ok(Self {
            registry,
            claims_assessed,
            claims_rejected,
            claims_degraded,
            assessment_seconds,
        })
    }

    pub fn observe(&self, report: &Report, elapsed: Duration) {
        self.claims_assessed.inc();
        if !report.passed_quality_gate() {
            self.claims_rejected.inc();
        } else if report.error.is_some() {
            self.claims_degraded.inc();
        }
        self.assessment_seconds.observe(elapsed.as_secs_f64());
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
