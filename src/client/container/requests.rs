//! Kubernetes Service NLB DNS request bodies

use serde::Serialize;

/// Request body for `POST /v1/nlb-dns/clusters/{cluster}/add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NlbIpsAdd {
    pub cluster: String,
    pub nlb_host: String,
    #[serde(rename = "nlbIPArray")]
    pub nlb_ip_array: Vec<String>,
}
