//! # Client Session
//!
//! Shared, read-only handle to the cloud APIs: one HTTP connection pool, the
//! service endpoints and the IAM bearer token. Built once per provider from
//! [`ProviderConfig`] and shared by every REST client through an `Arc`.

use crate::client::ClientError;
use crate::config::ProviderConfig;
use crate::constants::{CRN_HEADER, REQUEST_ID_HEADER};
use crate::observability::metrics;
use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

pub struct ClientSession {
    http_client: Client,
    region: String,
    zone: Option<String>,
    account_id: Option<String>,
    power_endpoint: String,
    container_endpoint: String,
    iam_token: String,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("region", &self.region)
            .field("zone", &self.zone)
            .field("power_endpoint", &self.power_endpoint)
            .field("container_endpoint", &self.container_endpoint)
            .finish_non_exhaustive()
    }
}

/// Error body shapes returned by the Power and Kubernetes Service APIs
///
/// Power returns `{"description": ..., "error": ...}`, the container API
/// `{"code": ..., "description": ...}` or `{"message": ...}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ClientSession {
    /// Build the session from provider configuration
    ///
    /// # Errors
    /// No IAM token is configured, or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let iam_token = config
            .iam_token
            .clone()
            .filter(|t| !t.is_empty())
            .context("IC_IAM_TOKEN is not set; an IAM bearer token is required")?;

        let http_client = Client::builder()
            .timeout(config.http_timeout_duration())
            .build()
            .context("Failed to create HTTP client")?;

        debug!(
            region = %config.region,
            power_endpoint = %config.power_endpoint,
            container_endpoint = %config.container_endpoint,
            "Client session initialized"
        );

        Ok(Self {
            http_client,
            region: config.region.clone(),
            zone: config.zone.clone(),
            account_id: config.account_id.clone(),
            power_endpoint: config.power_endpoint.trim_end_matches('/').to_string(),
            container_endpoint: config.container_endpoint.trim_end_matches('/').to_string(),
            iam_token,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn power_endpoint(&self) -> &str {
        &self.power_endpoint
    }

    pub fn container_endpoint(&self) -> &str {
        &self.container_endpoint
    }

    /// Workspace CRN sent to the Power API, when zone and account are known
    pub(crate) fn power_crn(&self, cloud_instance_id: &str) -> Option<String> {
        match (&self.zone, &self.account_id) {
            (Some(zone), Some(account)) => Some(format!(
                "crn:v1:bluemix:public:power-iaas:{zone}:a/{account}:{cloud_instance_id}::"
            )),
            _ => None,
        }
    }

    /// Build an authenticated request tagged with a fresh request id
    pub(crate) fn make_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> RequestBuilder {
        let auth_header = if self.iam_token.starts_with("Bearer ") {
            self.iam_token.clone()
        } else {
            format!("Bearer {}", self.iam_token)
        };

        let mut request = self
            .http_client
            .request(method, url)
            .header("Authorization", auth_header)
            .header("Accept", "application/json")
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if let Some(body) = body {
            request = request.json(&body);
        }

        request
    }

    /// Build a Power API request carrying the workspace CRN header
    pub(crate) fn make_power_request(
        &self,
        method: Method,
        cloud_instance_id: &str,
        url: &str,
        body: Option<Value>,
    ) -> RequestBuilder {
        let request = self.make_request(method, url, body);
        match self.power_crn(cloud_instance_id) {
            Some(crn) => request.header(CRN_HEADER, crn),
            None => request,
        }
    }

    /// Send the request and map any non-success status to a `ClientError`
    pub(crate) async fn send(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::increment_remote_calls(service, "transport_error");
                return Err(ClientError::Transport(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            metrics::increment_remote_calls(service, "success");
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let err = handle_error_response(status, &error_text);
        let outcome = if err.is_not_found() { "not_found" } else { "error" };
        metrics::increment_remote_calls(service, outcome);
        debug!(service, status = status.as_u16(), "Remote call failed: {}", err);
        Err(err)
    }

    /// Send the request and decode a JSON response body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(service, request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Map a non-success response to a `ClientError`
///
/// 404 is always `NotFound`; other statuses carry the most specific message the body offers.
pub(crate) fn handle_error_response(status: StatusCode, error_text: &str) -> ClientError {
    let body: ErrorBody = serde_json::from_str(error_text).unwrap_or_default();
    let message = body
        .description
        .or(body.message)
        .or_else(|| body.error.clone())
        .unwrap_or_else(|| {
            if error_text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                error_text.trim().to_string()
            }
        });

    if status == StatusCode::NOT_FOUND {
        return ClientError::NotFound { message };
    }

    ClientError::Api {
        status: status.as_u16(),
        code: body.code.or(body.error),
        message,
    }
}
