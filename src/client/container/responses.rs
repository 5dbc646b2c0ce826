//! Kubernetes Service NLB DNS response bodies
//!
//! API Reference: https://containers.cloud.ibm.com/global/swagger-global-api/#/nlb-dns/GetNlbDNSList

use serde::Deserialize;

/// One entry of `GET /v2/nlb-dns/getNlbDNSList`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlbDnsEntry {
    pub nlb_config: NlbConfig,
    #[serde(default)]
    pub secret_status: Option<String>,
}

/// DNS registration of one NLB host
///
/// VPC clusters report the host as `nlbSubdomain`, classic clusters as `nlbHost`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlbConfig {
    #[serde(default)]
    pub cluster: String,
    #[serde(default, alias = "nlbSubdomain", alias = "nlbSubDomain")]
    pub nlb_host: String,
    #[serde(default, rename = "nlbIPArray")]
    pub nlb_ip_array: Vec<String>,
    #[serde(default)]
    pub dns_type: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub secret_namespace: Option<String>,
    #[serde(default)]
    pub nlb_monitor_state: Option<String>,
    #[serde(default)]
    pub nlb_ssl_secret_name: Option<String>,
    #[serde(default)]
    pub nlb_ssl_secret_status: Option<String>,
}
