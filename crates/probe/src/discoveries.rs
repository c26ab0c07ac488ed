//! What one reconstruction run has learned so far.

use crate::query::OperationKind;
use blindql_types::{Argument, TypeRef};
use dashmap::{DashMap, DashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// A field seen on a type, with whatever is known about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredField {
    /// Return type once resolved.
    pub ty: Option<TypeRef>,
    pub args: BTreeMap<String, Argument>,
}

/// Fields discovered on one type, keyed by name.
pub type DiscoveredFields = BTreeMap<String, DiscoveredField>;

/// Concurrent store of discovered types, written from many probe tasks.
///
/// Field sets only grow. Visiting is tracked separately so a type referenced
/// from several parents is explored once.
#[derive(Debug, Default)]
pub struct Discoveries {
    types: DashMap<String, DiscoveredFields>,
    visited: DashSet<String>,
    query_root: OnceLock<String>,
    mutation_root: OnceLock<String>,
}

impl Discoveries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records fields on `type_name`. An empty set records nothing.
    pub fn add_fields<I, S>(&self, type_name: &str, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = fields.into_iter().peekable();
        if fields.peek().is_none() {
            return;
        }
        let mut entry = self.types.entry(type_name.to_string()).or_default();
        for field in fields {
            entry.entry(field.into()).or_default();
        }
    }

    /// Sets the return type of a known field.
    ///
    /// A resolved type is never replaced by the unknown placeholder.
    pub fn set_field_type(&self, type_name: &str, field: &str, ty: TypeRef) {
        if let Some(mut fields) = self.types.get_mut(type_name) {
            if let Some(entry) = fields.get_mut(field) {
                if ty.is_unknown() && entry.ty.is_some() {
                    return;
                }
                entry.ty = Some(ty);
            }
        }
    }

    pub fn add_argument(&self, type_name: &str, field: &str, argument: Argument) {
        if let Some(mut fields) = self.types.get_mut(type_name) {
            if let Some(entry) = fields.get_mut(field) {
                entry.args.entry(argument.name.clone()).or_insert(argument);
            }
        }
    }

    #[must_use]
    pub fn field_type(&self, type_name: &str, field: &str) -> Option<TypeRef> {
        self.types
            .get(type_name)
            .and_then(|fields| fields.get(field).and_then(|f| f.ty.clone()))
    }

    #[must_use]
    pub fn field_names(&self, type_name: &str) -> Vec<String> {
        self.types
            .get(type_name)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Marks `type_name` visited. Returns false if it already was.
    pub fn mark_visited(&self, type_name: &str) -> bool {
        self.visited.insert(type_name.to_string())
    }

    #[must_use]
    pub fn is_visited(&self, type_name: &str) -> bool {
        self.visited.contains(type_name)
    }

    /// Records the root type name for an operation. The first name wins.
    pub fn set_root(&self, kind: OperationKind, type_name: impl Into<String>) {
        let slot = match kind {
            OperationKind::Query => &self.query_root,
            OperationKind::Mutation => &self.mutation_root,
        };
        let _ = slot.set(type_name.into());
    }

    #[must_use]
    pub fn root(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Query => self.query_root.get(),
            OperationKind::Mutation => self.mutation_root.get(),
        }
        .map(String::as_str)
    }

    /// Number of types with at least one discovered field.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Every discovered field name across all types.
    #[must_use]
    pub fn all_field_names(&self) -> BTreeSet<String> {
        self.types
            .iter()
            .flat_map(|entry| entry.value().keys().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// A copy of every type and its fields, sorted by type name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, DiscoveredFields> {
        self.types
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
