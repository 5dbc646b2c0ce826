//! # Local State
//!
//! The orchestrator's record of one resource instance: its identifier plus
//! last-known attribute values, accessed by attribute name only.
//!
//! `prior` holds the values from the last successful reconciliation and
//! `current` the values being planned or refreshed. `has_change` compares the two,
//! which is what drives partial updates.

use crate::error::ProviderError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Attribute name to value; values are strings, integers, booleans or lists
pub type AttributeMap = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    prior: AttributeMap,
    current: AttributeMap,
}

impl ResourceData {
    /// Record for a Create call: nothing is known remotely yet
    pub fn for_create(config: AttributeMap) -> Self {
        Self {
            id: None,
            prior: AttributeMap::new(),
            current: config,
        }
    }

    /// Record for Read/Delete: the last-known state is both prior and current
    pub fn from_state(id: impl Into<String>, state: AttributeMap) -> Self {
        Self {
            id: Some(id.into()),
            prior: state.clone(),
            current: state,
        }
    }

    /// Record for Update: last-known state versus the desired configuration
    pub fn for_update(id: impl Into<String>, prior: AttributeMap, desired: AttributeMap) -> Self {
        Self {
            id: Some(id.into()),
            prior,
            current: desired,
        }
    }

    /// Record for Import: only the identifier is known
    pub fn for_import(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            prior: AttributeMap::new(),
            current: AttributeMap::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Drop the identifier; the orchestrator treats the record as gone
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Drop the identifier and every attribute: the remote resource is gone
    pub fn mark_absent(&mut self) {
        self.id = None;
        self.current.clear();
    }

    pub fn is_absent(&self) -> bool {
        self.id.is_none()
    }

    /// Current value, treating JSON null as absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.current.get(name).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Current list-of-strings value; non-string elements are skipped
    pub fn get_string_list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value from the last successful reconciliation
    pub fn get_prior(&self, name: &str) -> Option<&Value> {
        self.prior.get(name).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.current.insert(name.into(), value.into());
    }

    /// Set `name` when the remote returned a value, leave it untouched otherwise
    pub fn set_opt<V: Into<Value>>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.current.remove(name);
    }

    /// Whether the attribute differs from the last successful reconciliation
    pub fn has_change(&self, name: &str) -> bool {
        self.get(name) != self.get_prior(name)
    }

    /// Names of every attribute whose value changed, in name order
    pub fn changed_attributes(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.prior.keys().chain(self.current.keys()).collect();
        names
            .into_iter()
            .filter(|name| self.has_change(name))
            .cloned()
            .collect()
    }

    /// Decode the current attributes into a typed configuration struct
    ///
    /// # Errors
    /// A required field is missing or has the wrong type.
    pub fn decode<T: DeserializeOwned>(&self, resource_type: &str) -> Result<T, ProviderError> {
        let object: AttributeMap = self
            .current
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(object)).map_err(|source| ProviderError::Decode {
            resource_type: resource_type.to_string(),
            source,
        })
    }

    pub fn current(&self) -> &AttributeMap {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut AttributeMap {
        &mut self.current
    }

    pub fn prior(&self) -> &AttributeMap {
        &self.prior
    }

    /// Accept the current values as the new reconciled baseline
    pub fn commit(&mut self) {
        self.prior = self.current.clone();
    }

    /// Identifier and current attributes, for the orchestrator to persist
    pub fn into_parts(self) -> (Option<String>, AttributeMap) {
        (self.id, self.current)
    }
}
