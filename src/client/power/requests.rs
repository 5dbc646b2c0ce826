//! Power Virtual Server VPN request bodies
//!
//! API Reference: https://cloud.ibm.com/apidocs/power-cloud#pcloud-ikepolicies-post

use serde::Serialize;

/// Request body for `POST /pcloud/v1/cloud-instances/{id}/vpn/ike-policies`
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IkePolicyCreate {
    pub name: String,
    pub dh_group: i64,
    pub encryption: String,
    pub key_lifetime: i64,
    pub version: i64,
    pub preshared_key: String,
    /// Omitted to let the API apply its own default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
}

impl std::fmt::Debug for IkePolicyCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IkePolicyCreate")
            .field("name", &self.name)
            .field("dh_group", &self.dh_group)
            .field("encryption", &self.encryption)
            .field("key_lifetime", &self.key_lifetime)
            .field("version", &self.version)
            .field("authentication", &self.authentication)
            .finish_non_exhaustive()
    }
}

/// Request body for `PUT /pcloud/v1/cloud-instances/{id}/vpn/ike-policies/{policy}`
///
/// Only the fields that are set are serialized; the API leaves the rest untouched.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IkePolicyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dh_group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_lifetime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preshared_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
}

impl IkePolicyUpdate {
    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Debug for IkePolicyUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IkePolicyUpdate")
            .field("name", &self.name)
            .field("dh_group", &self.dh_group)
            .field("encryption", &self.encryption)
            .field("key_lifetime", &self.key_lifetime)
            .field("version", &self.version)
            .field(
                "preshared_key",
                &self.preshared_key.as_ref().map(|_| "<redacted>"),
            )
            .field("authentication", &self.authentication)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_body_uses_camel_case() {
        let body = IkePolicyCreate {
            name: "p".to_string(),
            dh_group: 14,
            encryption: "aes-256-cbc".to_string(),
            key_lifetime: 28800,
            version: 2,
            preshared_key: "abcdef12".to_string(),
            authentication: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "name": "p",
                "dhGroup": 14,
                "encryption": "aes-256-cbc",
                "keyLifetime": 28800,
                "version": 2,
                "presharedKey": "abcdef12"
            })
        );
    }

    #[test]
    fn test_update_body_omits_unset_fields() {
        let body = IkePolicyUpdate {
            key_lifetime: Some(3600),
            ..IkePolicyUpdate::default()
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"keyLifetime": 3600}));
        assert!(!body.is_empty());
        assert!(IkePolicyUpdate::default().is_empty());
    }

    #[test]
    fn test_debug_redacts_preshared_key() {
        let create = IkePolicyCreate {
            name: "p".to_string(),
            dh_group: 14,
            encryption: "aes-256-cbc".to_string(),
            key_lifetime: 28800,
            version: 2,
            preshared_key: "topsecret".to_string(),
            authentication: None,
        };
        assert!(!format!("{create:?}").contains("topsecret"));

        let update = IkePolicyUpdate {
            preshared_key: Some("topsecret".to_string()),
            ..IkePolicyUpdate::default()
        };
        assert!(!format!("{update:?}").contains("topsecret"));
    }
}
