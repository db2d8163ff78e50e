use crate::domain::ports::PatchableModel;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A single `add_patches` entry as the host would store it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedPatch {
    pub key: String,
    pub strength: f64,
    pub weight: f64,
    pub payload: Value,
}

/// In-memory stand-in for a host model: a key inventory plus the patches
/// applied to it so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryModel {
    keys: BTreeMap<String, Value>,
    applied: Vec<AppliedPatch>,
}

impl MemoryModel {
    pub fn new(keys: BTreeMap<String, Value>) -> Self {
        Self {
            keys,
            applied: Vec::new(),
        }
    }

    /// Inventory whose payloads are all `null`.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(keys.into_iter().map(|k| (k.into(), Value::Null)).collect())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn applied(&self) -> &[AppliedPatch] {
        &self.applied
    }

    /// Summed strength applied to `key` across all patches.
    pub fn net_strength(&self, key: &str) -> f64 {
        self.applied
            .iter()
            .filter(|p| p.key == key)
            .map(|p| p.strength * p.weight)
            .sum()
    }
}

impl PatchableModel for MemoryModel {
    type Patch = Value;

    fn clone_model(&self) -> Self {
        self.clone()
    }

    fn key_patches(&self, prefix: Option<&str>) -> HashMap<String, Value> {
        self.keys
            .iter()
            .filter(|(k, _)| prefix.is_none_or(|p| k.starts_with(p)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn add_patches(&mut self, patches: HashMap<String, Value>, strength: f64, weight: f64) {
        // Hosts ignore keys they do not own.
        let mut entries: Vec<_> = patches
            .into_iter()
            .filter(|(k, _)| self.keys.contains_key(k))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        self.applied
            .extend(entries.into_iter().map(|(key, payload)| AppliedPatch {
                key,
                strength,
                weight,
                payload,
            }));
    }
}
