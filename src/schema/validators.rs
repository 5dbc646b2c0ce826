//! # Attribute Validators
//!
//! Predicates declared per attribute and checked before Create/Update run.

use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub enum Validator {
    /// Integer must be one of the listed values
    AllowedInts(Vec<i64>),
    /// String must be one of the listed values
    AllowedStrings(Vec<&'static str>),
    /// Integer within an inclusive range
    IntRange { min: i64, max: i64 },
    /// String must match the pattern
    Pattern(Regex),
    /// String length must be even
    EvenLength,
    /// String, or every element of a list, must parse as an IP address
    IpAddresses,
}

impl Validator {
    /// Check `value`, returning the expectation that was violated
    ///
    /// The message never includes the value itself so sensitive attributes can share it.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::AllowedInts(allowed) => match value.as_i64() {
                Some(v) if allowed.contains(&v) => Ok(()),
                _ => Err(format!("must be one of {allowed:?}")),
            },
            Validator::AllowedStrings(allowed) => match value.as_str() {
                Some(v) if allowed.contains(&v) => Ok(()),
                _ => Err(format!("must be one of {allowed:?}")),
            },
            Validator::IntRange { min, max } => match value.as_i64() {
                Some(v) if (*min..=*max).contains(&v) => Ok(()),
                _ => Err(format!("must be between {min} and {max}")),
            },
            Validator::Pattern(regex) => match value.as_str() {
                Some(v) if regex.is_match(v) => Ok(()),
                _ => Err(format!("must match {}", regex.as_str())),
            },
            Validator::EvenLength => match value.as_str() {
                Some(v) if v.chars().count() % 2 == 0 => Ok(()),
                _ => Err("must have an even length".to_string()),
            },
            Validator::IpAddresses => {
                let all_valid = match value {
                    Value::String(s) => s.parse::<IpAddr>().is_ok(),
                    Value::Array(items) => items
                        .iter()
                        .all(|item| item.as_str().is_some_and(|s| s.parse::<IpAddr>().is_ok())),
                    _ => false,
                };
                if all_valid {
                    Ok(())
                } else {
                    Err("must contain only valid IP addresses".to_string())
                }
            }
        }
    }
}
