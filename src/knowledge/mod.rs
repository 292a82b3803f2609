//! Static exception type to HTTP status knowledge base.
//!
//! Lookups try the canonical name, then the simple (unqualified) name, then
//! the raw input. The table is data only; callers extend it with
//! [`StatusKnowledgeBase::with_entry`] or through configuration.

mod table;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::descriptor::{canonical_name, erasure, simple_name};
use crate::index::ClassIndex;

/// Roots every exception shares; matching one of them through the hierarchy
/// says nothing about the concrete failure.
const GENERIC_ROOTS: &[&str] = &[
    "java.lang.Throwable",
    "java.lang.Exception",
    "java.lang.RuntimeException",
    "java.lang.Error",
];

/// One knowledge-base row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    pub exception_type: String,
    pub status: u16,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct StatusKnowledgeBase {
    entries: BTreeMap<String, KnowledgeEntry>,
    /// Simple name -> key in `entries`
    by_simple: HashMap<String, String>,
}

impl Default for StatusKnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StatusKnowledgeBase {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_simple: HashMap::new(),
        }
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let mut kb = Self::empty();
        for (name, status, description) in table::BUILTIN {
            let key = canonical_name(name);
            kb.by_simple
                .entry(simple_name(&key).to_string())
                .or_insert_with(|| key.clone());
            kb.entries.insert(
                key.clone(),
                KnowledgeEntry {
                    exception_type: key,
                    status: *status,
                    description: description.to_string(),
                },
            );
        }
        kb
    }

    /// Adds or replaces an entry. The new entry also takes over simple-name
    /// lookups for its simple name.
    pub fn with_entry(mut self, exception_type: &str, status: u16, description: &str) -> Self {
        let key = canonical_name(exception_type);
        self.by_simple
            .insert(simple_name(&key).to_string(), key.clone());
        self.entries.insert(
            key.clone(),
            KnowledgeEntry {
                exception_type: key,
                status,
                description: description.to_string(),
            },
        );
        self
    }

    pub fn lookup(&self, exception_type: &str) -> Option<&KnowledgeEntry> {
        let canonical = canonical_name(erasure(exception_type));
        if let Some(entry) = self.entries.get(&canonical) {
            return Some(entry);
        }
        if let Some(entry) = self
            .by_simple
            .get(simple_name(&canonical))
            .and_then(|key| self.entries.get(key))
        {
            return Some(entry);
        }
        self.entries.get(exception_type).or_else(|| {
            self.by_simple
                .get(exception_type)
                .and_then(|key| self.entries.get(key))
        })
    }

    /// Looks up the type, then its indexed superclasses nearest first.
    /// Generic roots such as `java.lang.RuntimeException` are never matched
    /// through the hierarchy.
    pub fn lookup_in_hierarchy(
        &self,
        exception_type: &str,
        index: &ClassIndex,
    ) -> Option<&KnowledgeEntry> {
        self.lookup(exception_type).or_else(|| {
            index
                .ancestors(exception_type)
                .iter()
                .filter(|a| !GENERIC_ROOTS.contains(&a.as_str()))
                .find_map(|a| self.lookup(a))
        })
    }

    pub fn status_for(&self, exception_type: &str) -> Option<u16> {
        self.lookup(exception_type).map(|e| e.status)
    }

    pub fn contains(&self, exception_type: &str) -> bool {
        self.lookup(exception_type).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.values()
    }
}
