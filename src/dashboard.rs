// src/dashboard.rs - Operator dashboard: live-tunable settings and telemetry
//
// One `Dashboard` is owned by the robot and lent to every controller each
// cycle. Operator-editable values are stored as text exactly as typed;
// typed readers parse on access and fall back to a default.
use crate::tools::parse_number;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DashboardError {
    #[error("dashboard command must look like 'key=value', got '{0}'")]
    MalformedCommand(String),
    #[error("dashboard key is empty")]
    EmptyKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Number(f64),
    Text(String),
    Flag(bool),
}

#[derive(Debug, Default)]
pub struct Dashboard {
    entries: BTreeMap<String, Entry>,
    warned: HashSet<String>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_string(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), Entry::Text(value.to_string()));
    }

    /// Text value of `key`. Numbers and flags are rendered the way an
    /// operator would type them.
    pub fn string(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| match entry {
            Entry::Text(text) => text.clone(),
            Entry::Number(number) => number.to_string(),
            Entry::Flag(flag) => flag.to_string(),
        })
    }

    /// Reads `key` as a float. Missing or malformed values yield `default`
    /// and are reported once per key.
    pub fn number(&mut self, key: &str, default: f64) -> f64 {
        let parsed = match self.entries.get(key) {
            Some(Entry::Number(number)) => Some(*number),
            Some(Entry::Text(text)) => parse_number(text),
            Some(Entry::Flag(_)) | None => None,
        };
        match parsed {
            Some(value) => {
                self.warned.remove(key);
                value
            }
            None => {
                if self.warned.insert(key.to_string()) {
                    tracing::warn!(
                        "Dashboard value for '{}' is {:?}; using {}",
                        key,
                        self.string(key),
                        default
                    );
                }
                default
            }
        }
    }

    /// Like [`Dashboard::number`], truncated towards zero.
    pub fn integer(&mut self, key: &str, default: i64) -> i64 {
        let value = self.number(key, default as f64);
        value.trunc() as i64
    }

    pub fn log_number(&mut self, key: &str, value: f64) {
        self.entries.insert(key.to_string(), Entry::Number(value));
    }

    pub fn log_text(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), Entry::Text(value.into()));
    }

    pub fn log_flag(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_string(), Entry::Flag(value));
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Applies an operator edit of the form `key=value`. Only the first `=`
    /// separates, so keys may contain spaces and `<<`.
    pub fn apply_command(&mut self, command: &str) -> Result<(), DashboardError> {
        let (key, value) = command
            .split_once('=')
            .ok_or_else(|| DashboardError::MalformedCommand(command.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(DashboardError::EmptyKey);
        }
        let value = value.trim();
        tracing::info!("Dashboard edit: '{}' = '{}'", key, value);
        self.put_string(key, value);
        Ok(())
    }

    pub fn snapshot(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }
}
