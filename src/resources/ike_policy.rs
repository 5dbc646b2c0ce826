//! # `ibm_pi_ike_policy`
//!
//! Power Virtual Server VPN IKE policy, addressed as `"<cloud_instance_id>/<policy_id>"`.
//!
//! - Create sends every configured field, then reads the policy back
//! - Update sends only the fields that changed, then reads the policy back
//! - The preshared key is refreshed only when the API echoes it; otherwise the
//!   locally stored value is kept

use crate::client::{IkePolicy, IkePolicyCreate, IkePolicyUpdate, VpnPolicyApi};
use crate::constants::IKE_POLICY_TYPE;
use crate::error::ProviderError;
use crate::identifier::CompositeId;
use crate::reconciler::{require_id, resolve_not_found, NotFoundPolicy, Operation, Reconciler};
use crate::resources::{not_found_error, remote_error, scope_validator};
use crate::schema::{Attribute, AttributeType, ResourceSchema, Validator};
use crate::state::ResourceData;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const PI_CLOUD_INSTANCE_ID: &str = "pi_cloud_instance_id";
pub const PI_POLICY_NAME: &str = "pi_policy_name";
pub const PI_POLICY_DH_GROUP: &str = "pi_policy_dh_group";
pub const PI_POLICY_ENCRYPTION: &str = "pi_policy_encryption";
pub const PI_POLICY_KEY_LIFETIME: &str = "pi_policy_key_lifetime";
pub const PI_POLICY_VERSION: &str = "pi_policy_version";
pub const PI_POLICY_PRESHARED_KEY: &str = "pi_policy_preshared_key";
pub const PI_POLICY_AUTHENTICATION: &str = "pi_policy_authentication";
pub const POLICY_ID: &str = "policy_id";

const KIND: &str = "IKE policy";

pub const DH_GROUPS: [i64; 7] = [1, 2, 5, 14, 19, 20, 24];
pub const ENCRYPTIONS: [&str; 7] = [
    "3des-cbc",
    "aes-128-cbc",
    "aes-128-gcm",
    "aes-192-cbc",
    "aes-256-cbc",
    "aes-256-gcm",
    "des-cbc",
];
pub const AUTHENTICATIONS: [&str; 4] = ["none", "sha-256", "sha-384", "sha1"];

pub fn ike_policy_schema() -> ResourceSchema {
    ResourceSchema::new(IKE_POLICY_TYPE)
        .with_attribute(
            Attribute::required(PI_CLOUD_INSTANCE_ID, AttributeType::String)
                .with_validator(scope_validator())
                .with_description("PI cloud instance ID")
                .force_new(),
        )
        .with_attribute(
            Attribute::required(PI_POLICY_NAME, AttributeType::String)
                .with_description("Name of the IKE Policy"),
        )
        .with_attribute(
            Attribute::required(PI_POLICY_DH_GROUP, AttributeType::Int)
                .with_validator(Validator::AllowedInts(DH_GROUPS.to_vec()))
                .with_description("DH group of the IKE Policy"),
        )
        .with_attribute(
            Attribute::required(PI_POLICY_ENCRYPTION, AttributeType::String)
                .with_validator(Validator::AllowedStrings(ENCRYPTIONS.to_vec()))
                .with_description("Encryption of the IKE Policy"),
        )
        .with_attribute(
            Attribute::required(PI_POLICY_KEY_LIFETIME, AttributeType::Int)
                .with_validator(Validator::IntRange {
                    min: 180,
                    max: 86400,
                })
                .with_description("Policy key lifetime"),
        )
        .with_attribute(
            Attribute::required(PI_POLICY_VERSION, AttributeType::Int)
                .with_validator(Validator::IntRange { min: 1, max: 2 })
                .with_description("Version of the IKE Policy"),
        )
        .with_attribute(
            Attribute::required(PI_POLICY_PRESHARED_KEY, AttributeType::String)
                .with_validator(Validator::EvenLength)
                .with_description("Preshared key used in this IKE Policy (length must be even)")
                .sensitive(),
        )
        .with_attribute(
            Attribute::optional(PI_POLICY_AUTHENTICATION, AttributeType::String)
                .with_default("none")
                .with_validator(Validator::AllowedStrings(AUTHENTICATIONS.to_vec()))
                .with_description("Authentication for the IKE Policy"),
        )
        .with_attribute(
            Attribute::computed(POLICY_ID, AttributeType::String)
                .with_description("IKE Policy ID"),
        )
}

/// Typed view of the configured attributes
#[derive(Clone, Deserialize)]
struct IkePolicyConfig {
    pi_cloud_instance_id: String,
    pi_policy_name: String,
    pi_policy_dh_group: i64,
    pi_policy_encryption: String,
    pi_policy_key_lifetime: i64,
    pi_policy_version: i64,
    pi_policy_preshared_key: String,
    #[serde(default)]
    pi_policy_authentication: Option<String>,
}

impl std::fmt::Debug for IkePolicyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IkePolicyConfig")
            .field("pi_cloud_instance_id", &self.pi_cloud_instance_id)
            .field("pi_policy_name", &self.pi_policy_name)
            .field("pi_policy_dh_group", &self.pi_policy_dh_group)
            .field("pi_policy_encryption", &self.pi_policy_encryption)
            .field("pi_policy_key_lifetime", &self.pi_policy_key_lifetime)
            .field("pi_policy_version", &self.pi_policy_version)
            .field("pi_policy_authentication", &self.pi_policy_authentication)
            .finish_non_exhaustive()
    }
}

impl IkePolicyConfig {
    fn create_body(&self) -> IkePolicyCreate {
        IkePolicyCreate {
            name: self.pi_policy_name.clone(),
            dh_group: self.pi_policy_dh_group,
            encryption: self.pi_policy_encryption.clone(),
            key_lifetime: self.pi_policy_key_lifetime,
            version: self.pi_policy_version,
            preshared_key: self.pi_policy_preshared_key.clone(),
            authentication: self.pi_policy_authentication.clone(),
        }
    }

    /// Body carrying only the fields `data` reports as changed
    fn update_body(&self, data: &ResourceData) -> IkePolicyUpdate {
        IkePolicyUpdate {
            name: data
                .has_change(PI_POLICY_NAME)
                .then(|| self.pi_policy_name.clone()),
            dh_group: data
                .has_change(PI_POLICY_DH_GROUP)
                .then_some(self.pi_policy_dh_group),
            encryption: data
                .has_change(PI_POLICY_ENCRYPTION)
                .then(|| self.pi_policy_encryption.clone()),
            key_lifetime: data
                .has_change(PI_POLICY_KEY_LIFETIME)
                .then_some(self.pi_policy_key_lifetime),
            version: data
                .has_change(PI_POLICY_VERSION)
                .then_some(self.pi_policy_version),
            preshared_key: data
                .has_change(PI_POLICY_PRESHARED_KEY)
                .then(|| self.pi_policy_preshared_key.clone()),
            authentication: if data.has_change(PI_POLICY_AUTHENTICATION) {
                self.pi_policy_authentication.clone()
            } else {
                None
            },
        }
    }
}

pub struct IkePolicyReconciler {
    api: Arc<dyn VpnPolicyApi>,
    schema: ResourceSchema,
    not_found_policy: NotFoundPolicy,
}

impl std::fmt::Debug for IkePolicyReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IkePolicyReconciler")
            .field("resource_type", &self.schema.type_name)
            .field("not_found_policy", &self.not_found_policy)
            .finish_non_exhaustive()
    }
}

impl IkePolicyReconciler {
    pub fn new(api: Arc<dyn VpnPolicyApi>) -> Self {
        Self {
            api,
            schema: ike_policy_schema(),
            not_found_policy: NotFoundPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_not_found_policy(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found_policy = policy;
        self
    }

    fn parse_id(data: &ResourceData, operation: Operation) -> Result<CompositeId, ProviderError> {
        let id = require_id(data, operation, IKE_POLICY_TYPE)?;
        Ok(CompositeId::parse(id)?)
    }

    /// Read the policy back into `data` on behalf of `operation`
    async fn refresh(
        &self,
        data: &mut ResourceData,
        operation: Operation,
    ) -> Result<(), ProviderError> {
        let id = Self::parse_id(data, operation)?;

        match self
            .api
            .get_ike_policy(id.scope(), id.resource_id())
            .await
        {
            Ok(policy) => {
                apply_policy(data, &id, &policy);
                Ok(())
            }
            Err(source) if source.is_not_found() && operation.tolerates_not_found() => {
                debug!("VPN policy {} does not exist: {}", id, source);
                let err = not_found_error(operation, KIND, id.scope(), id.resource_id());
                resolve_not_found(self.not_found_policy, data, IKE_POLICY_TYPE, err)
            }
            Err(source) => {
                debug!("get VPN policy for {} failed: {}", operation, source);
                Err(remote_error(
                    operation,
                    KIND,
                    id.scope(),
                    id.resource_id(),
                    source,
                ))
            }
        }
    }
}

/// Copy the remote representation onto the local attributes
fn apply_policy(data: &mut ResourceData, id: &CompositeId, policy: &IkePolicy) {
    data.set(PI_CLOUD_INSTANCE_ID, id.scope());
    data.set(POLICY_ID, policy.id.as_str());
    data.set(PI_POLICY_NAME, policy.name.as_str());
    data.set(PI_POLICY_DH_GROUP, policy.dh_group);
    data.set(PI_POLICY_ENCRYPTION, policy.encryption.as_str());
    data.set(PI_POLICY_KEY_LIFETIME, policy.key_lifetime);
    data.set(PI_POLICY_VERSION, policy.version);
    data.set_opt(PI_POLICY_AUTHENTICATION, policy.authentication.clone());
    data.set_opt(PI_POLICY_PRESHARED_KEY, policy.preshared_key.clone());
}

#[async_trait]
impl Reconciler for IkePolicyReconciler {
    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let config: IkePolicyConfig = data.decode(IKE_POLICY_TYPE)?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str();

        let policy = self
            .api
            .create_ike_policy(cloud_instance_id, &config.create_body())
            .await
            .map_err(|source| {
                debug!("create ike policy failed: {}", source);
                remote_error(
                    Operation::Create,
                    KIND,
                    cloud_instance_id,
                    &config.pi_policy_name,
                    source,
                )
            })?;

        let id = CompositeId::new(cloud_instance_id, policy.id.as_str())?;
        data.set_id(id.to_string());

        self.refresh(data, Operation::Create).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.refresh(data, Operation::Read).await
    }

    async fn update(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = Self::parse_id(data, Operation::Update)?;
        let config: IkePolicyConfig = data.decode(IKE_POLICY_TYPE)?;
        let body = config.update_body(data);

        if body.is_empty() {
            debug!("IKE policy {} has no changed fields", id);
        } else {
            debug!(?body, "Updating IKE policy {}", id);
            self.api
                .update_ike_policy(id.scope(), id.resource_id(), &body)
                .await
                .map_err(|source| {
                    remote_error(
                        Operation::Update,
                        KIND,
                        id.scope(),
                        id.resource_id(),
                        source,
                    )
                })?;
        }

        self.refresh(data, Operation::Update).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = Self::parse_id(data, Operation::Delete)?;

        match self
            .api
            .delete_ike_policy(id.scope(), id.resource_id())
            .await
        {
            Ok(()) => {
                data.mark_absent();
                Ok(())
            }
            Err(source) if source.is_not_found() => {
                debug!("VPN policy {} does not exist: {}", id, source);
                let err = not_found_error(Operation::Delete, KIND, id.scope(), id.resource_id());
                resolve_not_found(self.not_found_policy, data, IKE_POLICY_TYPE, err)
            }
            Err(source) => {
                debug!("delete VPN policy failed: {}", source);
                Err(remote_error(
                    Operation::Delete,
                    KIND,
                    id.scope(),
                    id.resource_id(),
                    source,
                ))
            }
        }
    }

    async fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.refresh(data, Operation::Import).await
    }
}
