//! Runner configuration: YAML file with `CLAIMSIGHT_*` environment overrides
use claimsight_core::{ConfigError, Taxonomy};
use claimsight_quality::QualityProfile;
use claimsight_stages::{JitterBounds, MIN_PART_OVERLAP};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_CONCURRENT_CLAIMS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Upper bound on a single stage invocation
    pub stage_timeout_ms: u64,
    /// Claims assessed at once by a `ClaimPool`
    pub max_concurrent_claims: usize,
    pub min_part_overlap: f64,
    /// Fixed seed for severity jitter; `None` draws from the thread RNG
    pub severity_seed: Option<u64>,
    pub jitter: JitterBounds,
    /// Quality profile mode (ex: "strict", "lenient@1.0")
    pub quality_profile: String,
    /// Custom profile YAML; takes precedence over `quality_profile`
    pub quality_profile_path: Option<PathBuf>,
    /// Taxonomy YAML; the builtin tables are used when absent
    pub taxonomy_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stage_timeout_ms: DEFAULT_STAGE_TIMEOUT_MS,
            max_concurrent_claims: DEFAULT_MAX_CONCURRENT_CLAIMS,
            min_part_overlap: MIN_PART_OVERLAP,
            severity_seed: None,
            jitter: JitterBounds::default(),
            quality_profile: "strict".to_string(),
            quality_profile_path: None,
            taxonomy_path: None,
        }
    }
}

impl RunnerConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Applies overrides from the process environment
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `CLAIMSIGHT_*` overrides resolved through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CLAIMSIGHT_STAGE_TIMEOUT_MS") {
            self.stage_timeout_ms = parse_var("CLAIMSIGHT_STAGE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("CLAIMSIGHT_MAX_CONCURRENT_CLAIMS") {
            self.max_concurrent_claims = parse_var("CLAIMSIGHT_MAX_CONCURRENT_CLAIMS", &value)?;
        }
        if let Some(value) = lookup("CLAIMSIGHT_MIN_PART_OVERLAP") {
            self.min_part_overlap = parse_var("CLAIMSIGHT_MIN_PART_OVERLAP", &value)?;
        }
        if let Some(value) = lookup("CLAIMSIGHT_SEVERITY_SEED") {
            self.severity_seed = Some(parse_var("CLAIMSIGHT_SEVERITY_SEED", &value)?);
        }
        if let Some(value) = lookup("CLAIMSIGHT_QUALITY_PROFILE") {
            self.quality_profile = value;
        }
        if let Some(value) = lookup("CLAIMSIGHT_QUALITY_PROFILE_PATH") {
            self.quality_profile_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("CLAIMSIGHT_TAXONOMY") {
            self.taxonomy_path = Some(PathBuf::from(value));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stage_timeout_ms == 0 {
            return Err(ConfigError::Invalid("stage_timeout_ms must be positive".to_string()));
        }
        if self.max_concurrent_claims == 0 {
            return Err(ConfigError::Invalid("max_concurrent_claims must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.min_part_overlap) {
            return Err(ConfigError::Invalid(format!(
                "min_part_overlap {} outside [0, 1)",
                self.min_part_overlap
            )));
        }
        if !self.jitter.is_valid() {
            return Err(ConfigError::Invalid(format!("invalid jitter bounds {:?}", self.jitter)));
        }
        Ok(())
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn load_quality_profile(&self) -> Result<QualityProfile, ConfigError> {
        match &self.quality_profile_path {
            Some(path) => QualityProfile::from_file(path),
            None => Ok(QualityProfile::for_mode(&self.quality_profile)),
        }
    }

    pub fn load_taxonomy(&self) -> Result<Arc<Taxonomy>, ConfigError> {
        match &self.taxonomy_path {
            Some(path) => Ok(Arc::new(Taxonomy::from_file(path)?)),
            None => Ok(Arc::new(Taxonomy::builtin().clone())),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{}: cannot parse {:?}", key, value)))
}
