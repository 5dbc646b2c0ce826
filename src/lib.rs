//! Cloud Resource Provider Library
//!
//! Declarative cloud resources reconciled through create/read/update/delete calls
//! against the IBM Cloud REST APIs:
//!
//! - `ibm_pi_ike_policy`: Power Virtual Server VPN IKE policies
//! - `ibm_container_nlb_dns`: Kubernetes Service NLB DNS IP registrations
//!
//! An external orchestrator diffs desired against last-known state and calls the
//! matching [`Provider`] entry point; the provider validates the input, runs the
//! resource's [`Reconciler`] under the call's timeout and cancellation signal, and
//! returns the refreshed [`ResourceData`].

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod identifier;
pub mod observability;
pub mod prelude;
pub mod reconciler;
pub mod resources;
pub mod schema;
pub mod state;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use identifier::CompositeId;
pub use reconciler::{CallContext, NotFoundPolicy, Operation, Provider, Reconciler};
pub use state::{AttributeMap, ResourceData};
