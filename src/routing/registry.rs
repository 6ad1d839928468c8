//! Subdomain → URL table registry.
//!
//! # Responsibilities
//! - Store the configured subdomain registrations
//! - Look up the table for a subdomain label
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - Exact match first, then the wildcard entry
//! - No entry is a normal outcome: the caller falls back to its root table
//! - Duplicate registrations are rejected at build time

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::config::SubdomainConfig;
use crate::routing::table::TableId;

/// Config spelling of the wildcard entry.
pub const WILDCARD: &str = "*";

/// Key of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubdomainKey {
    /// Requests for the bare domain.
    Default,
    /// Any subdomain without its own entry.
    Wildcard,
    /// One specific (lower-cased) label.
    Label(String),
}

impl SubdomainKey {
    /// Key as written in configuration: absent or empty is the bare domain,
    /// `*` is the wildcard.
    pub fn from_config(subdomain: Option<&str>) -> Self {
        match subdomain.map(str::trim) {
            None | Some("") => Self::Default,
            Some(WILDCARD) => Self::Wildcard,
            Some(label) => Self::Label(label.to_ascii_lowercase()),
        }
    }

    /// Exact key for a parsed subdomain label.
    pub fn for_label(label: Option<&str>) -> Self {
        match label {
            None => Self::Default,
            Some(label) => Self::Label(label.to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for SubdomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("(bare domain)"),
            Self::Wildcard => f.write_str(WILDCARD),
            Self::Label(label) => write!(f, "`{}`", label),
        }
    }
}

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("subdomain entry {0} is registered more than once")]
    Duplicate(SubdomainKey),
}

/// Subdomain → table lookup.
#[derive(Debug, Clone, Default)]
pub struct SubdomainRegistry {
    entries: HashMap<SubdomainKey, TableId>,
}

impl SubdomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured entries.
    pub fn from_config(entries: &[SubdomainConfig]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entry in entries {
            registry.insert(
                SubdomainKey::from_config(entry.subdomain.as_deref()),
                TableId::new(entry.table.as_str()),
            )?;
        }
        Ok(registry)
    }

    /// Register a table. Fails if `key` is already registered.
    pub fn insert(&mut self, key: SubdomainKey, table: TableId) -> Result<(), RegistryError> {
        if self.entries.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }
        self.entries.insert(key, table);
        Ok(())
    }

    /// Table for `label` (`None` = bare domain): exact entry, else the
    /// wildcard entry, else `None`.
    pub fn resolve(&self, label: Option<&str>) -> Option<&TableId> {
        self.entries
            .get(&SubdomainKey::for_label(label))
            .or_else(|| self.entries.get(&SubdomainKey::Wildcard))
    }

    /// The bare-domain entry only; the wildcard does not apply.
    pub fn default_table(&self) -> Option<&TableId> {
        self.entries.get(&SubdomainKey::Default)
    }

    /// Entries in key order.
    pub fn entries(&self) -> Vec<(&SubdomainKey, &TableId)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
