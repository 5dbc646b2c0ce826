//! # Call Context
//!
//! Per-call deadline and cancellation signal handed down by the orchestrator.
//! Cancelling drops the operation future, which aborts any in-flight HTTP request.

use crate::error::ProviderError;
use crate::reconciler::Operation;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Triggers cancellation of every call sharing the same [`CallContext`]
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct CallContext {
    timeout: Option<Duration>,
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            timeout: None,
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Override the configured timeout for this call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.tx),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Run `operation` bounded by the timeout and the cancellation signal
    ///
    /// The context's own timeout wins over `default_timeout`.
    ///
    /// # Errors
    /// `Timeout` when the deadline elapses, `Cancelled` when cancelled first,
    /// otherwise whatever `operation` returns.
    pub async fn run<T, F>(
        &self,
        operation: Operation,
        resource_type: &str,
        default_timeout: Duration,
        future: F,
    ) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let timeout = self.timeout.unwrap_or(default_timeout);
        let mut rx = self.rx.clone();

        tokio::select! {
            biased;
            () = wait_cancelled(&mut rx) => Err(ProviderError::Cancelled {
                operation,
                resource_type: resource_type.to_string(),
            }),
            result = tokio::time::timeout(timeout, future) => result.unwrap_or_else(|_| {
                Err(ProviderError::Timeout {
                    operation,
                    resource_type: resource_type.to_string(),
                    timeout,
                })
            }),
        }
    }
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
