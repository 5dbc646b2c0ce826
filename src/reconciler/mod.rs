//! # Reconciler
//!
//! Contract between the orchestrator and the per-resource-type CRUD handlers.
//!
//! One reconciler instance serves every resource instance of its type. It is
//! stateless between calls apart from the client handle injected at construction.

pub mod context;
pub mod registry;

pub use context::{CallContext, CancelHandle};
pub use registry::Provider;

use crate::error::ProviderError;
use crate::observability::metrics;
use crate::schema::ResourceSchema;
use crate::state::ResourceData;
use async_trait::async_trait;
use std::fmt;
use tracing::{info, warn};

/// Lifecycle operation requested by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        }
    }

    /// Whether a remote not-found is subject to the [`NotFoundPolicy`]
    ///
    /// Only Read and Delete can find the resource gone; for the other operations the
    /// resource must exist, so a not-found is a remote failure.
    pub fn tolerates_not_found(&self) -> bool {
        matches!(self, Operation::Read | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What Read and Delete do when the remote resource no longer exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
    /// Clear the local identifier and succeed; the orchestrator drops the record
    #[default]
    TreatAsAbsent,
    /// Surface `ProviderError::NotFound` to the orchestrator
    Propagate,
}

impl NotFoundPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundPolicy::TreatAsAbsent => "treat_as_absent",
            NotFoundPolicy::Propagate => "propagate",
        }
    }
}

/// CRUD handler for one resource type
#[async_trait]
pub trait Reconciler: Send + Sync + fmt::Debug {
    fn schema(&self) -> &ResourceSchema;

    /// Create the remote resource from `data`'s current attributes and assign its identifier
    async fn create(&self, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Refresh every attribute from the remote representation
    async fn read(&self, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Send only the attributes that changed since the last reconciliation
    async fn update(&self, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Delete the remote resource and clear the identifier
    async fn delete(&self, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Adopt an existing remote resource by identifier
    async fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.read(data).await
    }
}

/// Apply `policy` to a remote not-found during Read or Delete
///
/// Callers check [`Operation::tolerates_not_found`] first.
///
/// `TreatAsAbsent` empties the record and succeeds; `Propagate` returns `err`.
pub(crate) fn resolve_not_found(
    policy: NotFoundPolicy,
    data: &mut ResourceData,
    resource_type: &str,
    err: ProviderError,
) -> Result<(), ProviderError> {
    match policy {
        NotFoundPolicy::TreatAsAbsent => {
            info!(
                resource.type = resource_type,
                resource.id = data.id().unwrap_or_default(),
                "Remote resource no longer exists, removing from state"
            );
            metrics::increment_resources_gone(resource_type);
            data.mark_absent();
            Ok(())
        }
        NotFoundPolicy::Propagate => {
            warn!(
                resource.type = resource_type,
                resource.id = data.id().unwrap_or_default(),
                "Remote resource no longer exists"
            );
            Err(err)
        }
    }
}

/// Identifier of a record that Read/Update/Delete require to be present
pub(crate) fn require_id<'a>(
    data: &'a ResourceData,
    operation: Operation,
    resource_type: &str,
) -> Result<&'a str, ProviderError> {
    data.id().ok_or_else(|| ProviderError::MissingIdentifier {
        operation,
        resource_type: resource_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AttributeMap;

    fn not_found() -> ProviderError {
        ProviderError::NotFound {
            operation: Operation::Read,
            kind: "IKE policy",
            scope: "s".to_string(),
            resource: "r".to_string(),
        }
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::Import.as_str(), "import");
    }

    #[test]
    fn test_only_read_and_delete_tolerate_not_found() {
        assert!(Operation::Read.tolerates_not_found());
        assert!(Operation::Delete.tolerates_not_found());
        assert!(!Operation::Create.tolerates_not_found());
        assert!(!Operation::Update.tolerates_not_found());
        assert!(!Operation::Import.tolerates_not_found());
    }

    #[test]
    fn test_treat_as_absent_clears_record() {
        let mut data = ResourceData::from_state("s/r", AttributeMap::new());
        let result = resolve_not_found(
            NotFoundPolicy::TreatAsAbsent,
            &mut data,
            "test_type",
            not_found(),
        );
        assert!(result.is_ok());
        assert!(data.is_absent());
    }

    #[test]
    fn test_propagate_keeps_record() {
        let mut data = ResourceData::from_state("s/r", AttributeMap::new());
        let err = resolve_not_found(NotFoundPolicy::Propagate, &mut data, "test_type", not_found())
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(data.id(), Some("s/r"));
    }

    #[test]
    fn test_require_id() {
        let data = ResourceData::for_create(AttributeMap::new());
        let err = require_id(&data, Operation::Delete, "test_type").unwrap_err();
        assert_eq!(err.kind(), "missing_identifier");
    }
}
