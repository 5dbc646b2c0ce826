//! Power Virtual Server VPN response bodies

use serde::Deserialize;

/// IKE policy as returned by the Power API
///
/// The preshared key is only present when the API chooses to echo it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IkePolicy {
    pub id: String,
    pub name: String,
    pub dh_group: i64,
    pub encryption: String,
    pub key_lifetime: i64,
    pub version: i64,
    #[serde(default)]
    pub authentication: Option<String>,
    #[serde(default)]
    pub preshared_key: Option<String>,
}

impl std::fmt::Debug for IkePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IkePolicy")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dh_group", &self.dh_group)
            .field("encryption", &self.encryption)
            .field("key_lifetime", &self.key_lifetime)
            .field("version", &self.version)
            .field("authentication", &self.authentication)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_without_preshared_key() {
        let policy: IkePolicy = serde_json::from_str(
            r#"{"id":"p-1","name":"n","dhGroup":2,"encryption":"aes-128-cbc",
                "keyLifetime":3600,"version":1,"authentication":"sha-256"}"#,
        )
        .unwrap();
        assert_eq!(policy.id, "p-1");
        assert_eq!(policy.authentication.as_deref(), Some("sha-256"));
        assert!(policy.preshared_key.is_none());
    }
}
