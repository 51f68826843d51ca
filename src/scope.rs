use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::models::Record;
use crate::store::RecordStore;

/// The (grade, class section) slice an administrator is authorized to see.
/// `None` in either dimension is an explicit grant of every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessScope {
    pub grade: Option<i32>,
    pub class_section: Option<String>,
}

impl AccessScope {
    pub fn new(grade: Option<i32>, class_section: Option<String>) -> Self {
        Self {
            grade,
            class_section,
        }
    }

    #[cfg(test)]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Combines two scopes. A dimension already fixed here is never widened.
    #[cfg(test)]
    pub fn narrow(&self, other: &AccessScope) -> AccessScope {
        AccessScope {
            grade: self.grade.or(other.grade),
            class_section: self
                .class_section
                .clone()
                .or_else(|| other.class_section.clone()),
        }
    }

    pub fn admits(&self, record: &Record) -> bool {
        self.grade.map_or(true, |grade| record.grade == grade)
            && self
                .class_section
                .as_deref()
                .map_or(true, |section| record.class_section == section)
    }

    pub fn grade_label(&self) -> ScopeLabel<i32> {
        self.grade.map_or(ScopeLabel::All, ScopeLabel::Only)
    }

    pub fn class_label(&self) -> ScopeLabel<String> {
        self.class_section
            .clone()
            .map_or(ScopeLabel::All, ScopeLabel::Only)
    }
}

/// Caller-facing rendering of one scope dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeLabel<T> {
    All,
    Only(T),
}

impl<T: Serialize> Serialize for ScopeLabel<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScopeLabel::All => serializer.serialize_str("All"),
            ScopeLabel::Only(value) => value.serialize(serializer),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ScopeLabel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLabel::All => f.write_str("All"),
            ScopeLabel::Only(value) => value.fmt(f),
        }
    }
}

/// The records of a store that pass an access scope. Only obtainable
/// through [`ScopedView::new`], so downstream code never sees the full store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedView<'a> {
    scope: AccessScope,
    records: Vec<&'a Record>,
}

impl<'a> ScopedView<'a> {
    pub fn new(store: &'a RecordStore, scope: AccessScope) -> Self {
        let records = store.records().iter().filter(|r| scope.admits(r)).collect();
        Self { scope, records }
    }

    /// Applies a further scope to this view. The result never widens it,
    /// and its scope keeps every dimension either side restricted.
    #[cfg(test)]
    pub fn restrict(&self, scope: AccessScope) -> ScopedView<'a> {
        let records = self
            .records
            .iter()
            .copied()
            .filter(|r| scope.admits(r))
            .collect();
        ScopedView {
            scope: self.scope.narrow(&scope),
            records,
        }
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn distinct_students(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.student_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
