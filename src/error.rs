//! # Provider Errors
//!
//! Error kinds surfaced to the orchestrator. Nothing here is retried internally;
//! the orchestrator owns retry and backoff policy.

use crate::client::ClientError;
use crate::identifier::MalformedIdentifierError;
use crate::reconciler::Operation;
use crate::schema::Diagnostic;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Input fails a declared constraint; raised before any remote call
    #[error("invalid {resource_type} configuration: {}", join_diagnostics(.diagnostics))]
    Validation {
        resource_type: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// Stored identifier cannot be split; fatal for the current operation
    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedIdentifierError),

    /// The remote API rejected or failed the call
    #[error("failed to perform {operation} {kind} operation for {scope} ({resource}): {source}")]
    RemoteOperation {
        operation: Operation,
        kind: &'static str,
        scope: String,
        resource: String,
        #[source]
        source: ClientError,
    },

    /// The bounded wait for the operation elapsed
    #[error("{operation} of {resource_type} timed out after {}s", .timeout.as_secs())]
    Timeout {
        operation: Operation,
        resource_type: String,
        timeout: Duration,
    },

    /// The remote resource no longer exists and the not-found policy is `Propagate`
    #[error("{kind} {resource} does not exist in {scope}")]
    NotFound {
        operation: Operation,
        kind: &'static str,
        scope: String,
        resource: String,
    },

    /// The orchestrator cancelled the call
    #[error("{operation} of {resource_type} was cancelled")]
    Cancelled {
        operation: Operation,
        resource_type: String,
    },

    /// Local state could not be decoded into the resource's typed configuration
    #[error("failed to decode {resource_type} state: {source}")]
    Decode {
        resource_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Read/Update/Delete called on a record without an identifier
    #[error("{operation} of {resource_type} requires an identifier")]
    MissingIdentifier {
        operation: Operation,
        resource_type: String,
    },

    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Create made the remote resource but a later step failed
    ///
    /// The orchestrator must record `id`, or the remote resource is orphaned.
    #[error("{id} was created but not fully reconciled: {source}")]
    Incomplete {
        id: String,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Stable label for metrics and log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Validation { .. } => "validation",
            ProviderError::MalformedIdentifier(_) => "malformed_identifier",
            ProviderError::RemoteOperation { .. } => "remote_operation",
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::Cancelled { .. } => "cancelled",
            ProviderError::Decode { .. } => "decode",
            ProviderError::MissingIdentifier { .. } => "missing_identifier",
            ProviderError::UnknownResourceType(_) => "unknown_resource_type",
            ProviderError::Incomplete { source, .. } => source.kind(),
        }
    }

    /// Hint for the orchestrator's retry policy
    ///
    /// Timeouts, transport failures, throttling and server-side errors may succeed on
    /// a later attempt; everything else is deterministic.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } => true,
            ProviderError::RemoteOperation { source, .. } => source.is_transient(),
            ProviderError::Incomplete { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Identifier of a resource that exists remotely even though the call failed
    #[must_use]
    pub fn created_id(&self) -> Option<&str> {
        match self {
            ProviderError::Incomplete { id, .. } => Some(id),
            _ => None,
        }
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
