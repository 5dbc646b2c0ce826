//! # Composite Identifier
//!
//! Remote resources are addressed by `"<parentScopeId>/<resourceId>"`.
//! The identifier is assigned once by Create and never rewritten afterwards.

use crate::constants::ID_SEPARATOR;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stored identifier could not be split into its required parts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed identifier {id:?}: {reason}")]
pub struct MalformedIdentifierError {
    pub id: String,
    pub reason: &'static str,
}

impl MalformedIdentifierError {
    fn new(id: &str, reason: &'static str) -> Self {
        Self {
            id: id.to_string(),
            reason,
        }
    }
}

/// Two-part key: parent scope plus resource id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    scope: String,
    resource_id: String,
}

impl CompositeId {
    /// Build an identifier from its parts
    ///
    /// # Errors
    /// Either part is empty, or the scope contains the separator (the join would not split back).
    pub fn new(
        scope: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Result<Self, MalformedIdentifierError> {
        let scope = scope.into();
        let resource_id = resource_id.into();
        let joined = format!("{scope}{ID_SEPARATOR}{resource_id}");

        if scope.is_empty() {
            return Err(MalformedIdentifierError::new(&joined, "empty scope"));
        }
        if resource_id.is_empty() {
            return Err(MalformedIdentifierError::new(&joined, "empty resource id"));
        }
        if scope.contains(ID_SEPARATOR) {
            return Err(MalformedIdentifierError::new(
                &joined,
                "scope contains the separator",
            ));
        }

        Ok(Self { scope, resource_id })
    }

    /// Split a stored identifier on the first separator
    ///
    /// # Errors
    /// Missing separator or an empty part.
    pub fn parse(id: &str) -> Result<Self, MalformedIdentifierError> {
        let Some((scope, resource_id)) = id.split_once(ID_SEPARATOR) else {
            return Err(MalformedIdentifierError::new(id, "missing '/' separator"));
        };
        if scope.is_empty() {
            return Err(MalformedIdentifierError::new(id, "empty scope"));
        }
        if resource_id.is_empty() {
            return Err(MalformedIdentifierError::new(id, "empty resource id"));
        }
        Ok(Self {
            scope: scope.to_string(),
            resource_id: resource_id.to_string(),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scope, ID_SEPARATOR, self.resource_id)
    }
}

impl FromStr for CompositeId {
    type Err = MalformedIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
