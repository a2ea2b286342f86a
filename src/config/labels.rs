//! Extra label parsing.
//!
//! Every series emitted by a run carries the same label set, built once from
//! the repeatable `key=value` option.

use crate::domain::errors::ConfigurationError;
use std::collections::{BTreeMap, HashMap};

/// Ordered label mapping attached unchanged to every series of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: BTreeMap<String, String>,
}

impl LabelSet {
    /// Parse `key=value` entries. Splits on the first `=` only and lets the
    /// last occurrence of a key win.
    pub fn parse<I, S>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels = BTreeMap::new();

        for entry in entries {
            let entry = entry.as_ref();
            let (key, value) =
                entry
                    .split_once('=')
                    .ok_or_else(|| ConfigurationError::MalformedLabel {
                        entry: entry.to_string(),
                    })?;

            if !is_valid_label_name(key) {
                return Err(ConfigurationError::InvalidLabelName {
                    name: key.to_string(),
                });
            }

            labels.insert(key.to_string(), value.to_string());
        }

        Ok(Self { labels })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Labels in the shape `prometheus::Opts::const_labels` expects
    pub fn to_const_labels(&self) -> HashMap<String, String> {
        self.labels.clone().into_iter().collect()
    }
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');

    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !name.starts_with("__")
}
