//! # Remote Clients
//!
//! Typed operations against the cloud APIs, one trait per remote service.
//! Reconcilers only see the traits; the REST implementations share a
//! [`ClientSession`] that is built once from configuration and injected.

pub(crate) mod common;
pub mod container;
pub mod power;
pub mod session;

pub use container::{ContainerNlbClient, NlbConfig, NlbDnsEntry};
pub use power::{IkePolicy, IkePolicyCreate, IkePolicyUpdate, PowerVpnClient};
pub use session::ClientSession;

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single remote call
#[derive(Debug, Error)]
pub enum ClientError {
    /// The addressed resource does not exist remotely
    #[error("resource not found: {message}")]
    NotFound { message: String },

    /// The API answered with a non-success status
    #[error("API error (HTTP {status}{}): {message}", .code.as_deref().map(|c| format!(", code {c}")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Transport failures, throttling and server-side errors
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            ClientError::NotFound { .. } | ClientError::Decode(_) => false,
        }
    }
}

/// Power Virtual Server VPN IKE policy operations, scoped by cloud instance
#[async_trait]
pub trait VpnPolicyApi: Send + Sync {
    async fn create_ike_policy(
        &self,
        cloud_instance_id: &str,
        body: &IkePolicyCreate,
    ) -> Result<IkePolicy, ClientError>;

    async fn get_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
    ) -> Result<IkePolicy, ClientError>;

    /// Partial update; absent fields stay unchanged remotely
    async fn update_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
        body: &IkePolicyUpdate,
    ) -> Result<IkePolicy, ClientError>;

    async fn delete_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
    ) -> Result<(), ClientError>;
}

/// Kubernetes Service NLB DNS operations, scoped by cluster
#[async_trait]
pub trait NlbDnsApi: Send + Sync {
    async fn list_nlb_dns(&self, cluster: &str) -> Result<Vec<NlbDnsEntry>, ClientError>;

    async fn add_nlb_ips(
        &self,
        cluster: &str,
        nlb_host: &str,
        ips: &[String],
    ) -> Result<(), ClientError>;

    async fn remove_nlb_ip(&self, cluster: &str, nlb_host: &str, ip: &str)
        -> Result<(), ClientError>;
}
