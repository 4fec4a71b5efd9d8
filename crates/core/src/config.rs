use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{AdapterDescriptor, ConfigError, Result};

/// Caller-owned connection settings. Adapters only read it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub name: String,
    pub db_type: String,
    pub server: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub database: String,
    pub options: BTreeMap<String, OptionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Rejects a config whose `db_type` names a different adapter.
    pub fn ensure_db_type(&self, descriptor: &AdapterDescriptor) -> Result<()> {
        if self.db_type == descriptor.db_type {
            return Ok(());
        }

        Err(ConfigError::DbTypeMismatch {
            connection: self.name.clone(),
            expected: descriptor.db_type,
            actual: self.db_type.clone(),
        }
        .into())
    }

    /// `None` for a missing key or an empty string.
    #[must_use]
    pub fn option_str(&self, key: &str) -> Option<String> {
        self.options
            .get(key)
            .map(ToString::to_string)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn option_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.options.get(key) else {
            return Ok(None);
        };

        let parsed = match value {
            OptionValue::Bool(flag) => Some(*flag),
            OptionValue::Integer(0) => Some(false),
            OptionValue::Integer(1) => Some(true),
            OptionValue::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            OptionValue::Integer(_) | OptionValue::Float(_) => None,
        };

        parsed
            .map(Some)
            .ok_or_else(|| invalid_option(key, value, "a boolean"))
    }

    pub fn option_u64(&self, key: &str) -> Result<Option<u64>> {
        let Some(value) = self.options.get(key) else {
            return Ok(None);
        };

        let parsed = match value {
            OptionValue::Integer(number) => u64::try_from(*number).ok(),
            OptionValue::String(raw) => raw.trim().parse::<u64>().ok(),
            OptionValue::Bool(_) | OptionValue::Float(_) => None,
        };

        parsed
            .map(Some)
            .ok_or_else(|| invalid_option(key, value, "a non-negative integer"))
    }

    /// Returns the field value or a `MissingField` error naming it.
    pub fn require<'a>(
        &self,
        descriptor: &AdapterDescriptor,
        field: &'static str,
        value: &'a str,
    ) -> Result<&'a str> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField {
                adapter: descriptor.display_name,
                connection: self.name.clone(),
                field,
            }
            .into());
        }
        Ok(value)
    }

    /// Option keys the adapter does not document. They are ignored, never
    /// rejected.
    #[must_use]
    pub fn unrecognized_options(&self, descriptor: &AdapterDescriptor) -> Vec<&str> {
        self.options
            .keys()
            .map(String::as_str)
            .filter(|key| !descriptor.recognizes_option(key))
            .collect()
    }
}

fn invalid_option(key: &str, value: &OptionValue, expected: &'static str) -> crate::Error {
    ConfigError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
    .into()
}
