//! # Operation Timeouts
//!
//! Bounded wait for each Create/Read/Update/Delete call.

use crate::constants::{
    DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS,
    DEFAULT_UPDATE_TIMEOUT_SECS,
};
use crate::reconciler::Operation;
use std::time::Duration;

/// Per-operation timeouts
///
/// Import shares the read timeout since it is a read of an externally supplied identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(DEFAULT_CREATE_TIMEOUT_SECS),
            read: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            update: Duration::from_secs(DEFAULT_UPDATE_TIMEOUT_SECS),
            delete: Duration::from_secs(DEFAULT_DELETE_TIMEOUT_SECS),
        }
    }
}

impl OperationTimeouts {
    /// Timeout that applies to `operation`
    #[must_use]
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read | Operation::Import => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}
