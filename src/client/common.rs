//! Shared helpers for the REST clients

use crate::client::ClientError;
use std::time::Instant;
use tracing::Span;

/// Records outcome and duration on the span of one remote call
///
/// The span must declare `operation.success`, `operation.duration_ms` and
/// `error.message` as empty fields.
pub(crate) struct OperationTracker {
    start: Instant,
    span: Span,
}

impl OperationTracker {
    pub(crate) fn new(span: Span) -> Self {
        Self {
            start: Instant::now(),
            span,
        }
    }

    pub(crate) fn finish<T>(self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        let duration_ms = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.span.record("operation.duration_ms", duration_ms);
        match &result {
            Ok(_) => {
                self.span.record("operation.success", true);
            }
            Err(e) => {
                self.span.record("operation.success", false);
                self.span.record("error.message", e.to_string());
            }
        }
        result
    }
}
