//! Kubernetes Service NLB DNS REST Client
//!
//! Registers and deregisters load-balancer IPs on a cluster's NLB DNS host.

mod requests;
mod responses;

pub use requests::*;
pub use responses::*;

use crate::client::common::OperationTracker;
use crate::client::{ClientError, ClientSession, NlbDnsApi};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug_span, field, info, info_span, Instrument};

const SERVICE: &str = "container";

/// REST implementation of [`NlbDnsApi`]
#[derive(Debug, Clone)]
pub struct ContainerNlbClient {
    session: Arc<ClientSession>,
}

impl ContainerNlbClient {
    pub fn new(session: Arc<ClientSession>) -> Self {
        Self { session }
    }

    fn cluster_url(&self, cluster: &str) -> String {
        format!(
            "{}/v1/nlb-dns/clusters/{}",
            self.session.container_endpoint(),
            urlencoding::encode(cluster)
        )
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> reqwest::RequestBuilder {
        self.session
            .make_request(method, url, body)
            .header("X-Region", self.session.region())
    }
}

#[async_trait]
impl NlbDnsApi for ContainerNlbClient {
    async fn list_nlb_dns(&self, cluster: &str) -> Result<Vec<NlbDnsEntry>, ClientError> {
        let span = debug_span!(
            "container.nlb_dns.list",
            cluster = cluster,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<Vec<NlbDnsEntry>, ClientError> = async move {
            let url = format!(
                "{}/v2/nlb-dns/getNlbDNSList",
                self.session.container_endpoint()
            );
            let request = self.request(Method::GET, &url, None).query(&[("cluster", cluster)]);
            self.session.send_json(SERVICE, request).await
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }

    async fn add_nlb_ips(
        &self,
        cluster: &str,
        nlb_host: &str,
        ips: &[String],
    ) -> Result<(), ClientError> {
        let span = info_span!(
            "container.nlb_dns.add",
            cluster = cluster,
            nlb.host = nlb_host,
            nlb.ip_count = ips.len(),
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<(), ClientError> = async move {
            let body = NlbIpsAdd {
                cluster: cluster.to_string(),
                nlb_host: nlb_host.to_string(),
                nlb_ip_array: ips.to_vec(),
            };
            let body =
                serde_json::to_value(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
            let url = format!("{}/add", self.cluster_url(cluster));
            self.session
                .send(SERVICE, self.request(Method::POST, &url, Some(body)))
                .await?;
            info!(?ips, "Registered NLB IPs");
            Ok(())
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }

    async fn remove_nlb_ip(
        &self,
        cluster: &str,
        nlb_host: &str,
        ip: &str,
    ) -> Result<(), ClientError> {
        let span = info_span!(
            "container.nlb_dns.remove",
            cluster = cluster,
            nlb.host = nlb_host,
            nlb.ip = ip,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        let result: Result<(), ClientError> = async move {
            let url = format!(
                "{}/host/{}/ip/{}/remove",
                self.cluster_url(cluster),
                urlencoding::encode(nlb_host),
                urlencoding::encode(ip)
            );
            self.session
                .send(SERVICE, self.request(Method::DELETE, &url, None))
                .await
                .map(|_| ())
        }
        .instrument(span)
        .await;
        tracker.finish(result)
    }
}
