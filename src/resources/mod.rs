//! # Resources
//!
//! One reconciler per resource type. Each decodes the generic attribute map into
//! a typed configuration struct before building requests.

pub mod ike_policy;
pub mod nlb_dns;

pub use ike_policy::{ike_policy_schema, IkePolicyReconciler};
pub use nlb_dns::{nlb_dns_schema, NlbDnsReconciler};

use crate::client::ClientError;
use crate::error::ProviderError;
use crate::reconciler::Operation;
use crate::schema::Validator;
use regex::Regex;
use std::sync::LazyLock;

static SCOPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^/]+$").expect("Failed to compile SCOPE_PATTERN - this should never happen")
});

/// Parent scope ids end up as the first half of a composite identifier
pub(crate) fn scope_validator() -> Validator {
    Validator::Pattern(SCOPE_PATTERN.clone())
}

/// Map a client failure to the provider error surfaced to the orchestrator
pub(crate) fn remote_error(
    operation: Operation,
    kind: &'static str,
    scope: &str,
    resource: &str,
    source: ClientError,
) -> ProviderError {
    ProviderError::RemoteOperation {
        operation,
        kind,
        scope: scope.to_string(),
        resource: resource.to_string(),
        source,
    }
}

pub(crate) fn not_found_error(
    operation: Operation,
    kind: &'static str,
    scope: &str,
    resource: &str,
) -> ProviderError {
    ProviderError::NotFound {
        operation,
        kind,
        scope: scope.to_string(),
        resource: resource.to_string(),
    }
}
