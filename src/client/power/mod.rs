//! Power Virtual Server VPN REST Client
//!
//! IKE policy endpoints of the Power Cloud API, scoped by cloud instance (workspace).
//!
//! References:
//! - [Power Cloud API: VPN policies](https://cloud.ibm.com/apidocs/power-cloud#pcloud-ikepolicies-getall)

mod requests;
mod responses;

pub use requests::*;
pub use responses::*;

use crate::client::common::OperationTracker;
use crate::client::{ClientError, ClientSession, VpnPolicyApi};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug_span, field, info, info_span, Instrument};

const SERVICE: &str = "power";

/// REST implementation of [`VpnPolicyApi`]
#[derive(Debug, Clone)]
pub struct PowerVpnClient {
    session: Arc<ClientSession>,
}

impl PowerVpnClient {
    pub fn new(session: Arc<ClientSession>) -> Self {
        Self { session }
    }

    fn policies_url(&self, cloud_instance_id: &str) -> String {
        format!(
            "{}/pcloud/v1/cloud-instances/{}/vpn/ike-policies",
            self.session.power_endpoint(),
            urlencoding::encode(cloud_instance_id)
        )
    }

    fn policy_url(&self, cloud_instance_id: &str, policy_id: &str) -> String {
        format!(
            "{}/{}",
            self.policies_url(cloud_instance_id),
            urlencoding::encode(policy_id)
        )
    }
}

fn to_body<T: serde::Serialize>(body: &T) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl VpnPolicyApi for PowerVpnClient {
    async fn create_ike_policy(
        &self,
        cloud_instance_id: &str,
        body: &IkePolicyCreate,
    ) -> Result<IkePolicy, ClientError> {
        let span = info_span!(
            "power.ike_policy.create",
            cloud_instance.id = cloud_instance_id,
            policy.name = %body.name,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<IkePolicy, ClientError> = async move {
            let request = self.session.make_power_request(
                Method::POST,
                cloud_instance_id,
                &self.policies_url(cloud_instance_id),
                Some(to_body(body)?),
            );
            let policy: IkePolicy = self.session.send_json(SERVICE, request).await?;
            info!(policy.id = %policy.id, "Created IKE policy");
            Ok(policy)
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }

    async fn get_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
    ) -> Result<IkePolicy, ClientError> {
        let span = debug_span!(
            "power.ike_policy.get",
            cloud_instance.id = cloud_instance_id,
            policy.id = policy_id,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<IkePolicy, ClientError> = async move {
            let request = self.session.make_power_request(
                Method::GET,
                cloud_instance_id,
                &self.policy_url(cloud_instance_id, policy_id),
                None,
            );
            self.session.send_json(SERVICE, request).await
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }

    async fn update_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
        body: &IkePolicyUpdate,
    ) -> Result<IkePolicy, ClientError> {
        let span = info_span!(
            "power.ike_policy.update",
            cloud_instance.id = cloud_instance_id,
            policy.id = policy_id,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<IkePolicy, ClientError> = async move {
            let request = self.session.make_power_request(
                Method::PUT,
                cloud_instance_id,
                &self.policy_url(cloud_instance_id, policy_id),
                Some(to_body(body)?),
            );
            self.session.send_json(SERVICE, request).await
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }

    async fn delete_ike_policy(
        &self,
        cloud_instance_id: &str,
        policy_id: &str,
    ) -> Result<(), ClientError> {
        let span = info_span!(
            "power.ike_policy.delete",
            cloud_instance.id = cloud_instance_id,
            policy.id = policy_id,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<(), ClientError> = async move {
            let request = self.session.make_power_request(
                Method::DELETE,
                cloud_instance_id,
                &self.policy_url(cloud_instance_id, policy_id),
                None,
            );
            self.session.send(SERVICE, request).await.map(|_| ())
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn client() -> PowerVpnClient {
        let config = ProviderConfig {
            iam_token: Some("token".to_string()),
            power_endpoint: "https://power.example".to_string(),
            ..ProviderConfig::default()
        };
        PowerVpnClient::new(Arc::new(ClientSession::new(&config).unwrap()))
    }

    #[test]
    fn test_policy_url_encodes_identifiers() {
        let client = client();
        assert_eq!(
            client.policy_url("cloud-1", "policy-1"),
            "https://power.example/pcloud/v1/cloud-instances/cloud-1/vpn/ike-policies/policy-1"
        );
        assert_eq!(
            client.policy_url("cloud 1", "a/b"),
            "https://power.example/pcloud/v1/cloud-instances/cloud%201/vpn/ike-policies/a%2Fb"
        );
    }
}
