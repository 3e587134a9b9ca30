//! Cooperative cancellation shared between a caller and in-flight claims
use tokio::sync::watch;

/// Caller side; cancelling is idempotent
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> Cancellation {
        Cancellation {
            rx: self.tx.subscribe(),
        }
    }
}

/// Claim side. Dropping every `CancelHandle` never counts as cancellation.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn pair() -> (CancelHandle, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Cancellation { rx })
    }

    /// Token that is never cancelled
    pub fn never() -> Self {
        Self::pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is gone first
    pub async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}
