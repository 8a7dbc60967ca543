use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Operation, OracleError};

/// Named output fields returned by one oracle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleFields {
    operation: Operation,
    fields: BTreeMap<String, String>,
}

impl OracleFields {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            fields: BTreeMap::new(),
        }
    }

    /// Build from literal pairs; mostly useful for scripted oracles
    pub fn from_pairs(operation: Operation, pairs: &[(&str, &str)]) -> Self {
        let mut out = Self::new(operation);
        for (name, value) in pairs {
            out.insert(*name, *value);
        }
        out
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Get a field, treating its absence as a malformed response
    pub fn require(&self, name: &str) -> Result<&str, OracleError> {
        self.get(name).ok_or_else(|| OracleError::MissingField {
            operation: self.operation.to_string(),
            field: name.to_string(),
        })
    }

    /// Remove and return a field, treating its absence as a malformed response
    pub fn take(&mut self, name: &str) -> Result<String, OracleError> {
        self.fields
            .remove(name)
            .ok_or_else(|| OracleError::MissingField {
                operation: self.operation.to_string(),
                field: name.to_string(),
            })
    }

}
