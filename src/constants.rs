//! # Constants
//!
//! Shared constants used throughout the provider.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Separator between the parent scope and the resource id in a composite identifier
pub const ID_SEPARATOR: char = '/';

/// Default create timeout (seconds)
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 600;

/// Default read timeout (seconds)
/// Matches the orchestrator's implicit default when a resource declares none
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 1200;

/// Default update timeout (seconds)
pub const DEFAULT_UPDATE_TIMEOUT_SECS: u64 = 600;

/// Default delete timeout (seconds)
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 600;

/// Default timeout for a single HTTP request to a remote API (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default region used to derive the Power Virtual Server endpoint
pub const DEFAULT_REGION: &str = "us-south";

/// Default Kubernetes Service API endpoint
pub const DEFAULT_CONTAINER_ENDPOINT: &str = "https://containers.cloud.ibm.com/global";

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Header carrying the Power Virtual Server workspace CRN
pub const CRN_HEADER: &str = "CRN";

/// Resource type name of the Power Virtual Server IKE policy
pub const IKE_POLICY_TYPE: &str = "ibm_pi_ike_policy";

/// Resource type name of the Kubernetes Service NLB DNS registration
pub const NLB_DNS_TYPE: &str = "ibm_container_nlb_dns";
