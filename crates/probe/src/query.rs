//! Probe query documents and navigation of their responses.

use serde_json::{Map, Value};
use std::fmt;

/// Root operation a probe is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }

    /// Conventional root type name for this operation.
    #[must_use]
    pub const fn default_root(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_root())
    }
}

/// The chain of field names leading from the root to a nested type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectionPath(Vec<String>);

impl SelectionPath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path extended by `field`.
    #[must_use]
    pub fn child(&self, field: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(field.into());
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Wraps `inner` in one selection set per path segment.
    fn wrap(&self, inner: &str) -> String {
        let mut selection = format!("{{ {inner} }}");
        for segment in self.0.iter().rev() {
            selection = format!("{{ {segment} {selection} }}");
        }
        selection
    }
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Response key for the candidate at `index` in a bucket.
#[must_use]
pub fn alias(index: usize) -> String {
    format!("g{index}")
}

/// Builds one query selecting every name in `bucket` under an alias.
///
/// ```
/// use blindql_probe::query::{bucket_query, OperationKind, SelectionPath};
///
/// let names = vec!["user".to_string(), "me".to_string()];
/// assert_eq!(
///     bucket_query(OperationKind::Query, &SelectionPath::root(), &names),
///     "query BlindProbe { g0: user g1: me }"
/// );
/// assert_eq!(
///     bucket_query(OperationKind::Query, &SelectionPath::root().child("viewer"), &names),
///     "query BlindNestedProbe { viewer { g0: user g1: me } }"
/// );
/// ```
#[must_use]
pub fn bucket_query(kind: OperationKind, path: &SelectionPath, bucket: &[String]) -> String {
    let selections = bucket
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}: {name}", alias(i)))
        .collect::<Vec<_>>()
        .join(" ");
    let name = if path.is_root() {
        "BlindProbe"
    } else {
        "BlindNestedProbe"
    };
    format!("{} {name} {}", kind.keyword(), path.wrap(&selections))
}

/// Builds the query asking for the `__typename` of `field` under `path`.
#[must_use]
pub fn typename_query(path: &SelectionPath, field: &str) -> String {
    format!("query {}", path.wrap(&format!("{field} {{ __typename }}")))
}

/// Objects reached by following `path` from `data`.
///
/// Lists along the way are descended element by element; nulls and scalars
/// end a branch.
#[must_use]
pub fn objects_at_path<'a>(data: &'a Value, path: &SelectionPath) -> Vec<&'a Map<String, Value>> {
    let mut current: Vec<&Value> = vec![data];
    for segment in path.segments() {
        current = current
            .into_iter()
            .filter_map(|value| value.as_object()?.get(segment))
            .flat_map(flatten_lists)
            .collect();
    }
    current
        .into_iter()
        .flat_map(flatten_lists)
        .filter_map(Value::as_object)
        .collect()
}

fn flatten_lists(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(flatten_lists).collect(),
        other => vec![other],
    }
}

/// The `__typename` returned for `field` under `path`, and whether the field
/// came back as a list.
#[must_use]
pub fn typename_at(data: &Value, path: &SelectionPath, field: &str) -> Option<(String, bool)> {
    objects_at_path(data, path).into_iter().find_map(|parent| {
        let value = parent.get(field)?;
        let is_list = value.is_array();
        flatten_lists(value).into_iter().find_map(|item| {
            let typename = item.as_object()?.get("__typename")?.as_str()?;
            Some((typename.to_string(), is_list))
        })
    })
}
