//! Binary entrypoint for the ClaimSight API server.
use anyhow::Context;
use claimsight_api::{run, AppState};
use claimsight_runner::{ClaimPool, ClaimRunner, RunnerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional YAML file, then CLAIMSIGHT_* overrides
    let config = match std::env::var("CLAIMSIGHT_CONFIG") {
        Ok(path) => {
            RunnerConfig::from_file(&path).with_context(|| format!("loading {}", path))?
        }
        Err(_) => RunnerConfig::default(),
    }
    .from_env()
    .context("applying CLAIMSIGHT_* overrides")?;

    let runner = ClaimRunner::builder()
        .config(config.clone())
        .build()
        .context("building claim runner")?;
    let pool = ClaimPool::new(Arc::new(runner), config.max_concurrent_claims);
    let mut state =
        AppState::new(pool).map_err(|e| anyhow::anyhow!("registering metrics: {}", e))?;

    // Requested images must live under CLAIMSIGHT_UPLOADS_ROOT when it is set
    match std::env::var("CLAIMSIGHT_UPLOADS_ROOT") {
        Ok(root) => state = state.with_uploads_root(root),
        Err(_) => tracing::warn!(
            "CLAIMSIGHT_UPLOADS_ROOT unset: any readable path can be assessed, \
             expose only to trusted networks"
        ),
    }

    // Default listen address can be overridden with CLAIMSIGHT_ADDR
    let addr = std::env::var("CLAIMSIGHT_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
    run(&addr, state).await.context("server error")?;

    Ok(())
}
