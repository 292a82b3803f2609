//! Failure provenance records and their deduplicating set.

use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::descriptor::simple_name;

use super::MethodSignature;

/// Architectural tier at which a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OriginLayer {
    ControllerLayer,
    ValidationLayer,
    DataAccessLayer,
    BusinessLogicLayer,
    MethodSignature,
    ApplicationLayer,
}

impl std::fmt::Display for OriginLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginLayer::ControllerLayer => write!(f, "controller"),
            OriginLayer::ValidationLayer => write!(f, "validation"),
            OriginLayer::DataAccessLayer => write!(f, "data-access"),
            OriginLayer::BusinessLogicLayer => write!(f, "business-logic"),
            OriginLayer::MethodSignature => write!(f, "method-signature"),
            OriginLayer::ApplicationLayer => write!(f, "application"),
        }
    }
}

/// Which detector produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    DirectThrow,
    OptionalUnwrap,
    Precondition,
    NullCheck,
    FinderHeuristic,
    DeclaredThrows,
    FrameworkBinding,
}

impl Evidence {
    pub fn default_confidence(self) -> Confidence {
        match self {
            Evidence::DirectThrow | Evidence::OptionalUnwrap | Evidence::DeclaredThrows => {
                Confidence::Confirmed
            }
            Evidence::Precondition | Evidence::NullCheck | Evidence::FrameworkBinding => {
                Confidence::Inferred
            }
            Evidence::FinderHeuristic => Confidence::Heuristic,
        }
    }
}

/// How much a record can be trusted, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Heuristic,
    Inferred,
    Confirmed,
}

/// Source that decided a record's final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Advice,
    ThrowSite,
    KnowledgeBase,
    Default,
}

/// A discovered possible failure and its evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub exception_type: String,
    /// `None` until resolved, unless the throw site carried a status literal
    pub http_status: Option<u16>,
    pub description: String,
    pub origin_layer: OriginLayer,
    pub evidence: Evidence,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_source: Option<StatusSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodSignature>,
}

impl FailureRecord {
    pub fn new(exception_type: impl Into<String>, origin_layer: OriginLayer, evidence: Evidence) -> Self {
        Self {
            exception_type: exception_type.into(),
            http_status: None,
            description: String::new(),
            origin_layer,
            evidence,
            confidence: evidence.default_confidence(),
            message: None,
            site_status: None,
            response_type: None,
            status_source: None,
            method: None,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Records a status literal found at the throw site.
    pub fn with_site_status(mut self, status: Option<u16>) -> Self {
        self.site_status = status;
        self.http_status = status;
        self
    }

    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.method = Some(method);
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.exception_type)
    }

    pub fn key(&self) -> FailureKey {
        FailureKey {
            exception_type: self.exception_type.clone(),
            http_status: self.http_status,
        }
    }
}

/// Identity of a failure record: `(exception type, status)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FailureKey {
    pub exception_type: String,
    pub http_status: Option<u16>,
}

/// Failure records deduplicated by [`FailureKey`].
///
/// On a key collision the record with higher confidence wins; ties keep
/// the record inserted first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureSet {
    records: BTreeMap<FailureKey, FailureRecord>,
}

impl FailureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record; returns `true` if it is now the stored one.
    pub fn insert(&mut self, record: FailureRecord) -> bool {
        match self.records.entry(record.key()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(mut slot) => {
                if record.confidence > slot.get().confidence {
                    slot.insert(record);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailureRecord> {
        self.records.values()
    }

    pub fn contains_type(&self, exception_type: &str) -> bool {
        self.iter().any(|r| r.exception_type == exception_type)
    }

    pub fn into_vec(self) -> Vec<FailureRecord> {
        self.records.into_values().collect()
    }
}

impl Extend<FailureRecord> for FailureSet {
    fn extend<T: IntoIterator<Item = FailureRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<FailureRecord> for FailureSet {
    fn from_iter<T: IntoIterator<Item = FailureRecord>>(iter: T) -> Self {
        let mut set = FailureSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for FailureSet {
    type Item = FailureRecord;
    type IntoIter = std::collections::btree_map::IntoValues<FailureKey, FailureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}
