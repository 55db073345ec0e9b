//! Side-car metadata for the directory-backed drive (`.ltm/meta.json`).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::backend::{FileId, StatusCode};

/// Share settings for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct ItemMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub downloads: u32,
}

/// An item sitting in the recycle bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct Recycled {
    pub name: String,
    /// Relative path the item is restored to.
    pub origin: String,
    pub is_file: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct MetaStore {
    /// Keyed by relative path.
    #[serde(default)]
    items: BTreeMap<String, ItemMeta>,
    /// Keyed by the id the item had before deletion.
    #[serde(default)]
    pub recycled: BTreeMap<FileId, Recycled>,
}

impl MetaStore {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read drive metadata {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse drive metadata {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to encode drive metadata")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text)
            .with_context(|| format!("failed to write drive metadata {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace drive metadata {}", path.display()))?;
        Ok(())
    }

    pub fn item(&self, rel: &str) -> ItemMeta {
        self.items.get(rel).cloned().unwrap_or_default()
    }

    pub fn item_mut(&mut self, rel: &str) -> &mut ItemMeta {
        self.items.entry(rel.to_string()).or_default()
    }

    /// Status to decline with when `supplied` does not unlock `rel`.
    pub fn check_password(&self, rel: &str, supplied: &str) -> Option<StatusCode> {
        let stored = self.items.get(rel).map(|m| m.password.as_str()).unwrap_or("");
        if stored.is_empty() {
            None
        } else if supplied.is_empty() {
            Some(StatusCode::LackPassword)
        } else if supplied != stored {
            Some(StatusCode::PasswordError)
        } else {
            None
        }
    }

    /// Moves the entries of `from` and everything below it to `to`.
    pub fn rekey(&mut self, from: &str, to: &str) {
        let nested = format!("{from}/");
        let moved: Vec<String> = self
            .items
            .keys()
            .filter(|k| k.as_str() == from || k.starts_with(&nested))
            .cloned()
            .collect();
        for key in moved {
            if let Some(meta) = self.items.remove(&key) {
                let new_key = format!("{to}{}", &key[from.len()..]);
                self.items.insert(new_key, meta);
            }
        }
    }

    /// Drops entries that carry nothing.
    pub fn prune(&mut self) {
        self.items.retain(|_, m| *m != ItemMeta::default());
    }
}
