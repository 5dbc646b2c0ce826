//! # `ibm_container_nlb_dns`
//!
//! Load-balancer IPs registered on an existing NLB DNS host of a cluster,
//! addressed as `"<cluster>/<nlb_host>"`.
//!
//! The host itself is owned by the cluster; this resource only manages which IPs
//! are registered on it. IPs registered by others are left alone, and a host
//! with none of the record's IPs registered reads as absent.

use crate::client::{ClientError, NlbConfig, NlbDnsApi};
use crate::constants::NLB_DNS_TYPE;
use crate::error::ProviderError;
use crate::identifier::CompositeId;
use crate::reconciler::{require_id, resolve_not_found, NotFoundPolicy, Operation, Reconciler};
use crate::resources::{not_found_error, remote_error, scope_validator};
use crate::schema::{Attribute, AttributeType, ResourceSchema, Validator};
use crate::state::ResourceData;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const CLUSTER: &str = "cluster";
pub const NLB_HOST: &str = "nlb_host";
pub const NLB_IPS: &str = "nlb_ips";
pub const RESOURCE_GROUP_ID: &str = "resource_group_id";
pub const NLB_DNS_TYPE_ATTR: &str = "nlb_dns_type";
pub const TYPE: &str = "type";
pub const SECRET_NAMESPACE: &str = "secret_namespace";
pub const NLB_MONITOR_STATE: &str = "nlb_monitor_state";
pub const NLB_SSL_SECRET_NAME: &str = "nlb_ssl_secret_name";
pub const NLB_SSL_SECRET_STATUS: &str = "nlb_ssl_secret_status";

const KIND: &str = "NLB DNS";

pub fn nlb_dns_schema() -> ResourceSchema {
    let computed = |name| Attribute::computed(name, AttributeType::String);

    ResourceSchema::new(NLB_DNS_TYPE)
        .with_attribute(
            Attribute::required(CLUSTER, AttributeType::String)
                .with_validator(scope_validator())
                .with_description("Name or ID of the cluster")
                .force_new(),
        )
        .with_attribute(
            Attribute::required(NLB_HOST, AttributeType::String)
                .with_description("NLB host name")
                .force_new(),
        )
        .with_attribute(
            Attribute::required(NLB_IPS, AttributeType::List(Box::new(AttributeType::String)))
                .with_validator(Validator::IpAddresses)
                .with_description("NLB IPs registered on the host"),
        )
        .with_attribute(
            Attribute::optional(RESOURCE_GROUP_ID, AttributeType::String)
                .with_description("ID of the resource group"),
        )
        .with_attribute(computed(NLB_DNS_TYPE_ATTR).with_description("NLB DNS type"))
        .with_attribute(computed(TYPE).with_description("Type of the NLB"))
        .with_attribute(computed(SECRET_NAMESPACE).with_description("Namespace of the SSL secret"))
        .with_attribute(computed(NLB_MONITOR_STATE).with_description("Health monitor state"))
        .with_attribute(computed(NLB_SSL_SECRET_NAME).with_description("Name of the SSL secret"))
        .with_attribute(computed(NLB_SSL_SECRET_STATUS).with_description("Status of the SSL secret"))
}

/// Typed view of the configured attributes
#[derive(Debug, Clone, Deserialize)]
struct NlbDnsConfig {
    cluster: String,
    nlb_host: String,
    #[serde(default)]
    nlb_ips: Vec<String>,
}

/// IPs of `desired` missing from `current`, in `desired` order without duplicates
fn missing_from<'a>(desired: &'a [String], current: &[String]) -> Vec<&'a String> {
    let mut missing: Vec<&String> = Vec::new();
    for ip in desired {
        if !current.contains(ip) && !missing.contains(&ip) {
            missing.push(ip);
        }
    }
    missing
}

pub struct NlbDnsReconciler {
    api: Arc<dyn NlbDnsApi>,
    schema: ResourceSchema,
    not_found_policy: NotFoundPolicy,
}

impl std::fmt::Debug for NlbDnsReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NlbDnsReconciler")
            .field("resource_type", &self.schema.type_name)
            .field("not_found_policy", &self.not_found_policy)
            .finish_non_exhaustive()
    }
}

impl NlbDnsReconciler {
    pub fn new(api: Arc<dyn NlbDnsApi>) -> Self {
        Self {
            api,
            schema: nlb_dns_schema(),
            not_found_policy: NotFoundPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_not_found_policy(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found_policy = policy;
        self
    }

    fn parse_id(data: &ResourceData, operation: Operation) -> Result<CompositeId, ProviderError> {
        let id = require_id(data, operation, NLB_DNS_TYPE)?;
        Ok(CompositeId::parse(id)?)
    }

    /// The host's registration; an unknown cluster or host is `ClientError::NotFound`
    async fn find_host(&self, id: &CompositeId) -> Result<NlbConfig, ClientError> {
        self.api
            .list_nlb_dns(id.scope())
            .await?
            .into_iter()
            .map(|entry| entry.nlb_config)
            .find(|config| config.nlb_host == id.resource_id())
            .ok_or_else(|| ClientError::NotFound {
                message: format!("NLB host {} is not registered", id),
            })
    }

    /// Registered IPs this record manages, or a not-found when none remain
    ///
    /// An empty `managed` list adopts every registered IP, as Import does.
    async fn find_managed_ips(
        &self,
        id: &CompositeId,
        managed: &[String],
    ) -> Result<(NlbConfig, Vec<String>), ClientError> {
        let config = self.find_host(id).await?;
        let owned = owned_ips(&config.nlb_ip_array, managed);
        if owned.is_empty() {
            return Err(ClientError::NotFound {
                message: format!("no managed IPs are registered on NLB host {}", id),
            });
        }
        Ok((config, owned))
    }

    /// Map a lookup failure, applying the not-found policy where `operation` allows it
    fn resolve_lookup_error(
        &self,
        data: &mut ResourceData,
        id: &CompositeId,
        operation: Operation,
        source: ClientError,
    ) -> Result<(), ProviderError> {
        if source.is_not_found() && operation.tolerates_not_found() {
            debug!("NLB DNS {} does not exist: {}", id, source);
            let err = not_found_error(operation, KIND, id.scope(), id.resource_id());
            return resolve_not_found(self.not_found_policy, data, NLB_DNS_TYPE, err);
        }
        debug!("list NLB DNS for {} failed: {}", operation, source);
        Err(remote_error(operation, KIND, id.scope(), id.resource_id(), source))
    }

    async fn add_ips(
        &self,
        id: &CompositeId,
        ips: &[String],
        operation: Operation,
    ) -> Result<(), ProviderError> {
        if ips.is_empty() {
            return Ok(());
        }
        self.api
            .add_nlb_ips(id.scope(), id.resource_id(), ips)
            .await
            .map_err(|source| {
                debug!("add NLB IPs failed: {}", source);
                remote_error(operation, KIND, id.scope(), id.resource_id(), source)
            })
    }

    /// Deregister `ips`; an IP that is already gone counts as removed
    async fn remove_ips(
        &self,
        id: &CompositeId,
        ips: &[String],
        operation: Operation,
    ) -> Result<(), ProviderError> {
        for ip in ips {
            match self
                .api
                .remove_nlb_ip(id.scope(), id.resource_id(), ip)
                .await
            {
                Ok(()) => {}
                Err(source) if source.is_not_found() => {
                    debug!("NLB IP {} already removed from {}", ip, id);
                }
                Err(source) => {
                    debug!("remove NLB IP {} failed: {}", ip, source);
                    return Err(remote_error(
                        operation,
                        KIND,
                        id.scope(),
                        id.resource_id(),
                        source,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Read the host back into `data`, keeping only the IPs the record manages
    ///
    /// On Import every registered IP becomes managed.
    async fn refresh(
        &self,
        data: &mut ResourceData,
        operation: Operation,
    ) -> Result<(), ProviderError> {
        let id = Self::parse_id(data, operation)?;
        let managed = match operation {
            Operation::Import => Vec::new(),
            _ => data.get_string_list(NLB_IPS),
        };

        let (config, owned) = match self.find_managed_ips(&id, &managed).await {
            Ok(found) => found,
            Err(source) => return self.resolve_lookup_error(data, &id, operation, source),
        };

        data.set(CLUSTER, id.scope());
        data.set(NLB_HOST, id.resource_id());
        data.set(NLB_IPS, owned);
        data.set_opt(NLB_DNS_TYPE_ATTR, config.dns_type);
        data.set_opt(TYPE, config.kind);
        data.set_opt(SECRET_NAMESPACE, config.secret_namespace);
        data.set_opt(NLB_MONITOR_STATE, config.nlb_monitor_state);
        data.set_opt(NLB_SSL_SECRET_NAME, config.nlb_ssl_secret_name);
        data.set_opt(NLB_SSL_SECRET_STATUS, config.nlb_ssl_secret_status);
        Ok(())
    }
}

/// `registered` IPs that appear in `managed`, in registration order; all of them when `managed` is empty
fn owned_ips(registered: &[String], managed: &[String]) -> Vec<String> {
    registered
        .iter()
        .filter(|ip| managed.is_empty() || managed.contains(ip))
        .cloned()
        .collect()
}

#[async_trait]
impl Reconciler for NlbDnsReconciler {
    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let config: NlbDnsConfig = data.decode(NLB_DNS_TYPE)?;
        let id = CompositeId::new(config.cluster.as_str(), config.nlb_host.as_str())?;

        let ips: Vec<String> = missing_from(&config.nlb_ips, &[]).into_iter().cloned().collect();
        self.add_ips(&id, &ips, Operation::Create).await?;
        info!(nlb.host = id.resource_id(), "Registered {} NLB IPs", ips.len());

        data.set_id(id.to_string());
        self.refresh(data, Operation::Create).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.refresh(data, Operation::Read).await
    }

    async fn update(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = Self::parse_id(data, Operation::Update)?;

        if data.has_change(NLB_IPS) {
            let desired = data.get_string_list(NLB_IPS);
            let prior: Vec<String> = data
                .get_prior(NLB_IPS)
                .and_then(serde_json::Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let added: Vec<String> = missing_from(&desired, &prior).into_iter().cloned().collect();
            let removed: Vec<String> = missing_from(&prior, &desired).into_iter().cloned().collect();
            debug!(?added, ?removed, "Updating NLB IPs on {}", id);

            // Add before removing so the host keeps at least one IP throughout
            self.add_ips(&id, &added, Operation::Update).await?;
            self.remove_ips(&id, &removed, Operation::Update).await?;
        }

        self.refresh(data, Operation::Update).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = Self::parse_id(data, Operation::Delete)?;
        let managed = data.get_string_list(NLB_IPS);

        // Only IPs this record manages; others registered on the host stay
        let owned = match self.find_managed_ips(&id, &managed).await {
            Ok((_, owned)) => owned,
            Err(source) => {
                return self.resolve_lookup_error(data, &id, Operation::Delete, source);
            }
        };
        self.remove_ips(&id, &owned, Operation::Delete).await?;

        data.mark_absent();
        Ok(())
    }

    async fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.refresh(data, Operation::Import).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AttributeMap;
    use serde_json::{json, Value};

    fn map(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_schema_accepts_ip_list() {
        let config = map(json!({
            "cluster": "c1",
            "nlb_host": "c1-abc.us-south.containers.appdomain.cloud",
            "nlb_ips": ["168.1.1.1", "168.1.1.2", "168.1.1.3"]
        }));
        assert!(nlb_dns_schema().validate(&config).is_ok());
    }

    #[test]
    fn test_schema_rejects_bad_ip_and_computed_input() {
        let config = map(json!({
            "cluster": "c1",
            "nlb_host": "h",
            "nlb_ips": ["168.1.1.1", "not-an-ip"],
            "nlb_monitor_state": "Enabled"
        }));
        let err = nlb_dns_schema().validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("nlb_ips: must contain only valid IP addresses"));
        assert!(message.contains("nlb_monitor_state: computed attribute cannot be set"));
    }

    #[test]
    fn test_missing_from_preserves_order_and_dedupes() {
        let desired = vec![
            "10.0.0.3".to_string(),
            "10.0.0.1".to_string(),
            "10.0.0.3".to_string(),
        ];
        let current = vec!["10.0.0.1".to_string()];
        assert_eq!(missing_from(&desired, &current), vec!["10.0.0.3"]);
        assert!(missing_from(&current, &desired).is_empty());
    }

    #[test]
    fn test_owned_ips_filters_foreign_registrations() {
        let registered = vec![
            "10.0.0.9".to_string(),
            "10.0.0.1".to_string(),
            "10.0.0.2".to_string(),
        ];
        let managed = vec!["10.0.0.2".to_string(), "10.0.0.1".to_string()];
        assert_eq!(owned_ips(&registered, &managed), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(owned_ips(&registered, &[]), registered);
        assert!(owned_ips(&registered, &["10.0.0.7".to_string()]).is_empty());
    }
}
