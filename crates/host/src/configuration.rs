//! String key/value store shipped with every job to its tasks.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Job configuration.
///
/// All values are stored as strings, typed setters only define the representation which the corresponding typed
/// getters are able to read back. Once tasks start the configuration is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    entries: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns raw value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Sets raw string value of a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, value.to_string());
    }

    /// Stores float using a representation which always keeps the fractional part, so `3.0` is stored as `3.0`.
    pub fn set_float(&mut self, key: impl Into<String>, value: f64) {
        self.set(key, format!("{value:?}"));
    }

    pub fn set_boolean(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, value.to_string());
    }

    /// Stores list of strings joined with `,`.
    pub fn set_strings<S: AsRef<str>>(&mut self, key: impl Into<String>, values: &[S]) {
        let joined = values.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
        self.set(key, joined);
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, HostError> {
        self.get_parsed(key, "integer")
    }

    pub fn get_float(&self, key: &str) -> Result<Option<f64>, HostError> {
        self.get_parsed(key, "float")
    }

    /// Reads boolean, `true` and `false` are accepted in any case.
    pub fn get_boolean(&self, key: &str) -> Result<Option<bool>, HostError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(value) => Err(HostError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                expected: "boolean",
            }),
        }
    }

    /// Reads list stored with [set_strings](Configuration::set_strings). Missing key gives empty list.
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            None => Vec::new(),
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Removes a key, returning its previous value.
    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Copies all entries of `other` into this configuration, overriding existing ones.
    pub fn merge(&mut self, other: &Configuration) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes configuration in the form it is shipped to tasks.
    pub fn to_yaml(&self) -> Result<String, HostError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reads configuration shipped with a job.
    pub fn from_yaml(yaml: &str) -> Result<Self, HostError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn get_parsed<T: FromStr>(&self, key: &str, expected: &'static str) -> Result<Option<T>, HostError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.trim().parse().map(Some).map_err(|_| HostError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                expected,
            }),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Configuration {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
