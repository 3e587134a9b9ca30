//! Claim Pool: one task per claim, concurrency bounded by a semaphore
use crate::cancel::Cancellation;
use crate::runner::{ClaimRequest, ClaimRunner};
use claimsight_core::Report;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// A finished claim from `ClaimPool::assess_batch`
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Position of the request in the submitted batch
    pub index: usize,
    pub report: Report,
    pub elapsed: Duration,
}

#[derive(Clone)]
pub struct ClaimPool {
    runner: Arc<ClaimRunner>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ClaimPool {
    pub fn new(runner: Arc<ClaimRunner>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            runner,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn runner(&self) -> &Arc<ClaimRunner> {
        &self.runner
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Claims that could start right now without waiting
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a slot, then assesses the claim
    pub async fn assess(&self, request: ClaimRequest, cancel: Cancellation) -> Report {
        // The semaphore is never closed, so acquiring cannot fail
        let _permit = self.permits.acquire().await.ok();
        let state = self.runner.run(request, cancel, None).await;
        self.runner.into_report(state)
    }

    pub fn submit(&self, request: ClaimRequest) -> JoinHandle<Report> {
        let pool = self.clone();
        tokio::spawn(async move { pool.assess(request, Cancellation::never()).await })
    }

    /// Assesses every request; results stream back as claims complete
    pub fn assess_batch(
        &self,
        requests: Vec<ClaimRequest>,
        cancel: Cancellation,
    ) -> mpsc::Receiver<BatchResult> {
        let (tx, rx) = mpsc::channel(requests.len().max(1));

        tracing::info!(
            claims = requests.len(),
            max_concurrent = self.max_concurrent,
            "batch started"
        );

        for (index, request) in requests.into_iter().enumerate() {
            let tx = tx.clone();
            let pool = self.clone();
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let started = Instant::now();
                let report = pool.assess(request, cancel).await;
                let _ = tx
                    .send(BatchResult {
                        index,
                        report,
                        elapsed: started.elapsed(),
                    })
                    .await;
            });
        }

        rx
    }
}
