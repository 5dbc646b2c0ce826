//! Common test utilities
//!
//! In-memory fakes of the remote client traits. Each fake counts its calls,
//! can delay every call, and can be told to fail the next call with an API status.
//! Delays and failures can also be pinned to one method by name, e.g.
//! `"get_ike_policy"`; a pinned 404 answers with `ClientError::NotFound`.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers")]

use async_trait::async_trait;
use cloud_resource_provider::client::{
    IkePolicy, IkePolicyCreate, IkePolicyUpdate, NlbConfig, NlbDnsEntry,
};
use cloud_resource_provider::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn attrs(value: Value) -> AttributeMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// The example policy: dh_group 2, aes-256-cbc, 3600s, version 1
pub fn ike_policy_config() -> AttributeMap {
    attrs(serde_json::json!({
        "pi_cloud_instance_id": "cloud-instance-1",
        "pi_policy_name": "policy-a",
        "pi_policy_dh_group": 2,
        "pi_policy_encryption": "aes-256-cbc",
        "pi_policy_key_lifetime": 3600,
        "pi_policy_version": 1,
        "pi_policy_preshared_key": "abcdef12"
    }))
}

fn api_error(status: u16) -> ClientError {
    ClientError::Api {
        status,
        code: None,
        message: format!("injected failure with status {status}"),
    }
}

fn method_error(status: u16) -> ClientError {
    if status == 404 {
        ClientError::NotFound {
            message: "injected not found".to_string(),
        }
    } else {
        api_error(status)
    }
}

#[derive(Debug, Default)]
struct FaultInjection {
    delay: Mutex<Option<Duration>>,
    fail_next: Mutex<Option<u16>>,
    method_delays: Mutex<HashMap<&'static str, Duration>>,
    method_failures: Mutex<HashMap<&'static str, u16>>,
}

impl FaultInjection {
    async fn before_call(&self, method: &'static str) -> Result<(), ClientError> {
        let method_delay = self.method_delays.lock().unwrap().get(method).copied();
        let delay = method_delay.or(*self.delay.lock().unwrap());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.fail_next.lock().unwrap().take() {
            return Err(api_error(status));
        }
        let status = self.method_failures.lock().unwrap().get(method).copied();
        match status {
            Some(status) => Err(method_error(status)),
            None => Ok(()),
        }
    }

    fn delay_method(&self, method: &'static str, delay: Duration) {
        self.method_delays.lock().unwrap().insert(method, delay);
    }

    fn fail_method(&self, method: &'static str, status: u16) {
        self.method_failures.lock().unwrap().insert(method, status);
    }
}

/// In-memory Power VPN API
#[derive(Debug, Default)]
pub struct FakeVpnApi {
    policies: Mutex<HashMap<(String, String), IkePolicy>>,
    next_id: AtomicU64,
    echo_preshared_key: bool,
    faults: FaultInjection,
    pub calls: AtomicUsize,
    pub updates: Mutex<Vec<IkePolicyUpdate>>,
}

impl FakeVpnApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A fake whose responses include the stored preshared key
    pub fn echoing_preshared_key() -> Arc<Self> {
        Arc::new(Self {
            echo_preshared_key: true,
            ..Self::default()
        })
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.faults.delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_next(&self, status: u16) {
        *self.faults.fail_next.lock().unwrap() = Some(status);
    }

    /// Every call of `method` waits `delay` first
    pub fn delay_method(&self, method: &'static str, delay: Duration) {
        self.faults.delay_method(method, delay);
    }

    /// Every call of `method` fails with `status`
    pub fn fail_method(&self, method: &'static str, status: u16) {
        self.faults.fail_method(method, status);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stored policy, bypassing the API
    pub fn stored(&self, cloud_instance_id: &str, policy_id: &str) -> Option<IkePolicy> {
        self.policies
            .lock()
            .unwrap()
            .get(&(cloud_instance_id.to_string(), policy_id.to_string()))
            .cloned()
    }

    /// Delete a policy behind the provider's back
    pub fn remove_out_of_band(&self, cloud_instance_id: &str, policy_id: &str) {
        self.policies
            .lock()
            .unwrap()
            .remove(&(cloud_instance_id.to_string(), policy_id.to_string()));
    }

    fn respond(&self, policy: &IkePolicy) -> IkePolicy {
        let mut response = policy.clone();
        if !self.echo_preshared_key {
            response.preshared_key = None;
        }
        response
    }

    fn not_found(policy_id: &str) -> ClientError {
        ClientError::NotFound {
            message: format!("ike policy {policy_id} does not exist"),
        }
    }
}

#[async_trait]
impl VpnPolicyApi for FakeVpnApi {
    async fn create_ike_policy(
        &self,
        cloud_instance_id: &str,
        body: &IkePolicyCreate,
    ) -> Result<IkePolicy, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("create_ike_policy").await?;

        let id = format!("policy-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let policy = IkePolicy {
            id: id.clone(),
            name: body.name.clone(),
            dh_group: body.dh_group,
            encryption: body.encryption.clone(),
            key_lifetime: body.key_lifetime,
            version: body.version,
            authentication: Some(
                body.authentication
                    .clone()
                    .unwrap_or_else(|| "none".to_string()),
            ),
            preshared_key: Some(body.preshared_key.clone()),
        };
        self.policies
            .lock()
            .unwrap()
            .insert((cloud_instance_id.to_string(), id), policy.clone());
        Ok(self.respond(&policy))
    }

    async fn get_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
    ) -> Result<IkePolicy, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("get_ike_policy").await?;

        self.stored(cloud_instance_id, policy_id)
            .map(|policy| self.respond(&policy))
            .ok_or_else(|| Self::not_found(policy_id))
    }

    async fn update_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
        body: &IkePolicyUpdate,
    ) -> Result<IkePolicy, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("update_ike_policy").await?;
        self.updates.lock().unwrap().push(body.clone());

        let mut policies = self.policies.lock().unwrap();
        let policy = policies
            .get_mut(&(cloud_instance_id.to_string(), policy_id.to_string()))
            .ok_or_else(|| Self::not_found(policy_id))?;

        if let Some(name) = &body.name {
            policy.name.clone_from(name);
        }
        if let Some(dh_group) = body.dh_group {
            policy.dh_group = dh_group;
        }
        if let Some(encryption) = &body.encryption {
            policy.encryption.clone_from(encryption);
        }
        if let Some(key_lifetime) = body.key_lifetime {
            policy.key_lifetime = key_lifetime;
        }
        if let Some(version) = body.version {
            policy.version = version;
        }
        if let Some(preshared_key) = &body.preshared_key {
            policy.preshared_key = Some(preshared_key.clone());
        }
        if let Some(authentication) = &body.authentication {
            policy.authentication = Some(authentication.clone());
        }
        let updated = policy.clone();
        drop(policies);
        Ok(self.respond(&updated))
    }

    async fn delete_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
    ) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("delete_ike_policy").await?;

        self.policies
            .lock()
            .unwrap()
            .remove(&(cloud_instance_id.to_string(), policy_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(policy_id))
    }
}

/// In-memory Kubernetes Service NLB DNS API
#[derive(Debug, Default)]
pub struct FakeNlbApi {
    clusters: Mutex<HashMap<String, Vec<NlbConfig>>>,
    faults: FaultInjection,
    pub calls: AtomicUsize,
    pub added: Mutex<Vec<Vec<String>>>,
    pub removed: Mutex<Vec<String>>,
}

impl FakeNlbApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an NLB host with the given IPs, as the cluster does on its own
    pub fn with_host(self: Arc<Self>, cluster: &str, host: &str, ips: &[&str]) -> Arc<Self> {
        self.clusters
            .lock()
            .unwrap()
            .entry(cluster.to_string())
            .or_default()
            .push(NlbConfig {
                cluster: cluster.to_string(),
                nlb_host: host.to_string(),
                nlb_ip_array: ips.iter().map(|ip| (*ip).to_string()).collect(),
                dns_type: Some("public".to_string()),
                kind: Some("public".to_string()),
                secret_namespace: Some("default".to_string()),
                nlb_monitor_state: Some("None".to_string()),
                nlb_ssl_secret_name: Some(format!("{cluster}-secret")),
                nlb_ssl_secret_status: Some("created".to_string()),
            });
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.faults.delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_next(&self, status: u16) {
        *self.faults.fail_next.lock().unwrap() = Some(status);
    }

    /// Every call of `method` waits `delay` first
    pub fn delay_method(&self, method: &'static str, delay: Duration) {
        self.faults.delay_method(method, delay);
    }

    /// Every call of `method` fails with `status`
    pub fn fail_method(&self, method: &'static str, status: u16) {
        self.faults.fail_method(method, status);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// IPs currently registered on `host`
    pub fn registered(&self, cluster: &str, host: &str) -> Vec<String> {
        self.clusters
            .lock()
            .unwrap()
            .get(cluster)
            .and_then(|hosts| hosts.iter().find(|h| h.nlb_host == host))
            .map(|h| h.nlb_ip_array.clone())
            .unwrap_or_default()
    }

    fn with_host_mut<T>(
        &self,
        cluster: &str,
        host: &str,
        f: impl FnOnce(&mut NlbConfig) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let mut clusters = self.clusters.lock().unwrap();
        let config = clusters
            .get_mut(cluster)
            .and_then(|hosts| hosts.iter_mut().find(|h| h.nlb_host == host))
            .ok_or_else(|| ClientError::NotFound {
                message: format!("NLB host {host} not found in cluster {cluster}"),
            })?;
        f(config)
    }
}

#[async_trait]
impl NlbDnsApi for FakeNlbApi {
    async fn list_nlb_dns(&self, cluster: &str) -> Result<Vec<NlbDnsEntry>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("list_nlb_dns").await?;

        self.clusters
            .lock()
            .unwrap()
            .get(cluster)
            .map(|hosts| {
                hosts
                    .iter()
                    .map(|config| NlbDnsEntry {
                        nlb_config: config.clone(),
                        secret_status: config.nlb_ssl_secret_status.clone(),
                    })
                    .collect()
            })
            .ok_or_else(|| ClientError::NotFound {
                message: format!("cluster {cluster} not found"),
            })
    }

    async fn add_nlb_ips(
        &self,
        cluster: &str,
        nlb_host: &str,
        ips: &[String],
    ) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("add_nlb_ips").await?;
        self.added.lock().unwrap().push(ips.to_vec());

        self.with_host_mut(cluster, nlb_host, |config| {
            for ip in ips {
                if !config.nlb_ip_array.contains(ip) {
                    config.nlb_ip_array.push(ip.clone());
                }
            }
            Ok(())
        })
    }

    async fn remove_nlb_ip(
        &self,
        cluster: &str,
        nlb_host: &str,
        ip: &str,
    ) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faults.before_call("remove_nlb_ip").await?;
        self.removed.lock().unwrap().push(ip.to_string());

        self.with_host_mut(cluster, nlb_host, |config| {
            let before = config.nlb_ip_array.len();
            config.nlb_ip_array.retain(|registered| registered != ip);
            if config.nlb_ip_array.len() == before {
                return Err(ClientError::NotFound {
                    message: format!("IP {ip} is not registered on {nlb_host}"),
                });
            }
            Ok(())
        })
    }
}

/// Provider wired to the given fakes
pub fn provider_with(
    vpn: Arc<FakeVpnApi>,
    nlb: Arc<FakeNlbApi>,
    policy: NotFoundPolicy,
) -> Provider {
    let config = ProviderConfig {
        not_found_policy: policy,
        ..ProviderConfig::default()
    };
    let mut provider = Provider::new(config);
    provider.register(Arc::new(
        IkePolicyReconciler::new(vpn).with_not_found_policy(policy),
    ));
    provider.register(Arc::new(
        NlbDnsReconciler::new(nlb).with_not_found_policy(policy),
    ));
    provider
}
