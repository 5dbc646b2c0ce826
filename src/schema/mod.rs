//! # Resource Schema
//!
//! Declares, per resource type, each attribute's name, type, presence
//! (required / optional with default / computed), validator and flags.
//! The provider checks a configuration against its schema before Create and
//! Update run, so reconcilers can assume well-formed input.

pub mod validators;

pub use validators::Validator;

use crate::error::ProviderError;
use crate::state::{AttributeMap, ResourceData};
use serde_json::Value;
use std::fmt;

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    List(Box<AttributeType>),
}

impl AttributeType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Int => value.is_i64(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::List(element) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| element.matches(item))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Int => "integer",
            AttributeType::Bool => "boolean",
            AttributeType::List(_) => "list",
        }
    }
}

/// Who supplies the attribute's value
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional { default: Option<Value> },
    /// Only the remote system sets it; read-only to the caller
    Computed,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeType,
    pub presence: Presence,
    pub description: &'static str,
    pub validator: Option<Validator>,
    /// A change cannot be applied in place; the orchestrator must recreate
    pub force_new: bool,
    /// Value never appears in diagnostics or logs
    pub sensitive: bool,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType, presence: Presence) -> Self {
        Self {
            name,
            kind,
            presence,
            description: "",
            validator: None,
            force_new: false,
            sensitive: false,
        }
    }

    pub fn required(name: &'static str, kind: AttributeType) -> Self {
        Self::new(name, kind, Presence::Required)
    }

    pub fn optional(name: &'static str, kind: AttributeType) -> Self {
        Self::new(name, kind, Presence::Optional { default: None })
    }

    pub fn computed(name: &'static str, kind: AttributeType) -> Self {
        Self::new(name, kind, Presence::Computed)
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.presence = Presence::Optional {
            default: Some(default.into()),
        };
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }
}

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub attribute: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.message)
    }
}

/// Schema of one resource type
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check a caller-supplied configuration
    ///
    /// Collects every failure instead of stopping at the first one. Null values count as absent.
    ///
    /// # Errors
    /// `ProviderError::Validation` listing each diagnostic.
    pub fn validate(&self, config: &AttributeMap) -> Result<(), ProviderError> {
        let mut diagnostics = Vec::new();

        for (name, value) in config {
            if value.is_null() {
                continue;
            }
            match self.attribute(name) {
                None => diagnostics.push(Diagnostic::new(name.as_str(), "unknown attribute")),
                Some(attribute) if attribute.is_computed() => diagnostics.push(Diagnostic::new(
                    name.as_str(),
                    "computed attribute cannot be set",
                )),
                Some(_) => {}
            }
        }

        for attribute in &self.attributes {
            let value = config.get(attribute.name).filter(|v| !v.is_null());
            match (value, &attribute.presence) {
                (None, Presence::Required) => diagnostics.push(Diagnostic::new(
                    attribute.name,
                    "required attribute is missing",
                )),
                (Some(value), Presence::Required | Presence::Optional { .. }) => {
                    if let Some(diagnostic) = check_value(attribute, value) {
                        diagnostics.push(diagnostic);
                    }
                }
                _ => {}
            }
        }

        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation {
                resource_type: self.type_name.to_string(),
                diagnostics,
            })
        }
    }

    /// Fill optional attributes that are absent with their declared defaults
    pub fn apply_defaults(&self, config: &mut AttributeMap) {
        for attribute in &self.attributes {
            if let Presence::Optional {
                default: Some(default),
            } = &attribute.presence
            {
                let absent = config.get(attribute.name).is_none_or(Value::is_null);
                if absent {
                    config.insert(attribute.name.to_string(), default.clone());
                }
            }
        }
    }

    /// Copy computed values from the last-known state into the current attributes
    ///
    /// The desired configuration never carries computed values, but they stay valid
    /// until the next Read refreshes them.
    pub fn carry_computed(&self, data: &mut ResourceData) {
        for attribute in self.attributes.iter().filter(|a| a.is_computed()) {
            if data.get(attribute.name).is_none() {
                if let Some(value) = data.get_prior(attribute.name).cloned() {
                    data.set(attribute.name, value);
                }
            }
        }
    }

    /// Changed attributes that cannot be updated in place
    pub fn force_new_changes(&self, data: &ResourceData) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|a| a.force_new && data.has_change(a.name))
            .map(|a| a.name)
            .collect()
    }

    /// Whether the attribute's value must be kept out of logs
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.sensitive)
    }
}

fn check_value(attribute: &Attribute, value: &Value) -> Option<Diagnostic> {
    if !attribute.kind.matches(value) {
        return Some(Diagnostic::new(
            attribute.name,
            format!("expected {}", attribute.kind.as_str()),
        ));
    }
    let validator = attribute.validator.as_ref()?;
    validator.check(value).err().map(|expectation| {
        let message = if attribute.sensitive {
            expectation
        } else {
            format!("{expectation}, got {value}")
        };
        Diagnostic::new(attribute.name, message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ResourceSchema {
        ResourceSchema::new("test_resource")
            .with_attribute(Attribute::required("name", AttributeType::String).force_new())
            .with_attribute(
                Attribute::required("group", AttributeType::Int)
                    .with_validator(Validator::AllowedInts(vec![1, 2, 5])),
            )
            .with_attribute(
                Attribute::required("secret", AttributeType::String)
                    .with_validator(Validator::EvenLength)
                    .sensitive(),
            )
            .with_attribute(Attribute::optional("mode", AttributeType::String).with_default("none"))
            .with_attribute(Attribute::optional(
                "ips",
                AttributeType::List(Box::new(AttributeType::String)),
            ))
            .with_attribute(Attribute::computed("remote_id", AttributeType::String))
    }

    fn map(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn diagnostics(err: ProviderError) -> Vec<Diagnostic> {
        match err {
            ProviderError::Validation { diagnostics, .. } => diagnostics,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = map(json!({"name": "n", "group": 2, "secret": "abcd", "ips": ["a"]}));
        assert!(schema().validate(&config).is_ok());
    }

    #[test]
    fn test_collects_all_diagnostics() {
        let config = map(json!({"group": 3, "secret": "abc", "remote_id": "x", "extra": 1}));
        let diags = diagnostics(schema().validate(&config).unwrap_err());
        let attributes: Vec<&str> = diags.iter().map(|d| d.attribute.as_str()).collect();
        assert!(attributes.contains(&"name"));
        assert!(attributes.contains(&"group"));
        assert!(attributes.contains(&"secret"));
        assert!(attributes.contains(&"remote_id"));
        assert!(attributes.contains(&"extra"));
        assert_eq!(diags.len(), 5);
    }

    #[test]
    fn test_sensitive_values_stay_out_of_diagnostics() {
        let config = map(json!({"name": "n", "group": 2, "secret": "abc"}));
        let diags = diagnostics(schema().validate(&config).unwrap_err());
        assert_eq!(diags, vec![Diagnostic::new("secret", "must have an even length")]);
    }

    #[test]
    fn test_type_mismatch() {
        let config = map(json!({"name": "n", "group": "2", "secret": "ab", "ips": [1]}));
        let diags = diagnostics(schema().validate(&config).unwrap_err());
        assert!(diags.contains(&Diagnostic::new("group", "expected integer")));
        assert!(diags.contains(&Diagnostic::new("ips", "expected list")));
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = map(json!({"name": "n"}));
        schema().apply_defaults(&mut config);
        assert_eq!(config.get("mode"), Some(&json!("none")));

        let mut explicit = map(json!({"mode": "sha1"}));
        schema().apply_defaults(&mut explicit);
        assert_eq!(explicit.get("mode"), Some(&json!("sha1")));
    }

    #[test]
    fn test_force_new_changes() {
        let prior = map(json!({"name": "a", "group": 1}));
        let desired = map(json!({"name": "b", "group": 2}));
        let data = ResourceData::for_update("s/r", prior, desired);
        assert_eq!(schema().force_new_changes(&data), vec!["name"]);
    }

    #[test]
    fn test_carry_computed() {
        let prior = map(json!({"name": "a", "remote_id": "r-1"}));
        let desired = map(json!({"name": "a"}));
        let mut data = ResourceData::for_update("s/r", prior, desired);
        schema().carry_computed(&mut data);
        assert_eq!(data.get_str("remote_id"), Some("r-1"));
        assert!(data.changed_attributes().is_empty());
    }
}
