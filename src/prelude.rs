//! Common imports for orchestrator integrations and tests

pub use crate::client::{ClientError, ClientSession, NlbDnsApi, VpnPolicyApi};
pub use crate::config::{OperationTimeouts, ProviderConfig};
pub use crate::error::ProviderError;
pub use crate::identifier::CompositeId;
pub use crate::reconciler::{
    CallContext, CancelHandle, NotFoundPolicy, Operation, Provider, Reconciler,
};
pub use crate::resources::{IkePolicyReconciler, NlbDnsReconciler};
pub use crate::schema::{Diagnostic, ResourceSchema};
pub use crate::state::{AttributeMap, ResourceData};
