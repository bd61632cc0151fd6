//! Comma-separated `key=value` specifications.
//!
//! Agent and generation arguments arrive on the command line as strings
//! like `model_name=Qwen/Qwen2-7B-Instruct,temperature=0.0`. [`KwargSpec`]
//! parses them into an ordered mapping where a repeated key keeps its first
//! position but takes the last value.

use crate::core::error::ConfigParseError;
use std::fmt;
use std::str::FromStr;

/// Parsed `key=value` specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KwargSpec {
    entries: Vec<(String, String)>,
}

impl KwargSpec {
    /// Parse a comma-separated specification.
    ///
    /// Keys and values are trimmed. The value is everything after the first
    /// `=`, so values may themselves contain `=`. A blank specification is an
    /// empty mapping; a blank *entry* (`a=1,,b=2`) is malformed.
    pub fn parse(spec: &str) -> Result<Self, ConfigParseError> {
        let mut parsed = Self::default();
        if spec.trim().is_empty() {
            return Ok(parsed);
        }

        for raw in spec.split(',') {
            let entry = raw.trim();
            let Some((key, value)) = entry.split_once('=') else {
                return Err(ConfigParseError::MissingSeparator {
                    entry: entry.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigParseError::EmptyKey {
                    entry: entry.to_string(),
                });
            }
            parsed.insert(key, value.trim());
        }

        Ok(parsed)
    }

    /// Insert or overwrite a key (last value wins, first position kept).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Look up `key` and parse it with [`FromStr`].
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigParseError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigParseError::invalid_value(key, raw, e.to_string())),
        }
    }

    /// Look up a boolean flag; accepts `true/false`, `1/0`, `yes/no`
    /// in any case.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigParseError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigParseError::invalid_value(
                key,
                raw,
                "expected a boolean",
            )),
        }
    }

    /// Look up a key that must be present.
    pub fn require(&self, key: &str) -> Result<&str, ConfigParseError> {
        self.get(key)
            .ok_or_else(|| ConfigParseError::MissingKey(key.to_string()))
    }

    /// Copy of this spec with the given keys removed.
    pub fn without(&self, keys: &[&str]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Keys not contained in `known`, in specification order.
    pub fn unknown_keys<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !known.contains(k))
            .collect()
    }
}

impl FromStr for KwargSpec {
    type Err = ConfigParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KwargSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}
