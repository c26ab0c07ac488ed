//! Bucket probes and typed probes.

use crate::bucket::create_buckets;
use crate::classifier::{classify, extract_suggestions, Classification, SignalCategory};
use crate::context::ProbeContext;
use crate::discoveries::Discoveries;
use crate::error::Result;
use crate::query::{
    alias, bucket_query, objects_at_path, typename_at, typename_query, OperationKind,
    SelectionPath,
};
use blindql_transport::GraphQLResponse;
use blindql_types::{Argument, TypeRef};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::task::JoinSet;

/// What one or more bucket probes revealed about a type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Confirmed field names.
    pub fields: BTreeSet<String>,
    /// Return types named by wrong-selection errors, keyed by field.
    pub type_hints: BTreeMap<String, TypeRef>,
    /// Arguments named by missing-argument errors, keyed by field.
    pub argument_hints: BTreeMap<String, Vec<Argument>>,
    /// Parent type names quoted by field-not-found errors.
    pub parent_types: BTreeSet<String>,
}

impl ProbeOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn merge(&mut self, other: Self) {
        self.fields.extend(other.fields);
        for (field, hint) in other.type_hints {
            self.type_hints.entry(field).or_insert(hint);
        }
        for (field, args) in other.argument_hints {
            let known = self.argument_hints.entry(field).or_default();
            for arg in args {
                if !known.iter().any(|k| k.name == arg.name) {
                    known.push(arg);
                }
            }
        }
        self.parent_types.extend(other.parent_types);
    }

    /// The root type name the server itself used, if it named exactly one.
    #[must_use]
    pub fn root_type_name(&self, kind: OperationKind) -> String {
        let mut names = self.parent_types.iter();
        match (names.next(), names.next()) {
            (Some(name), None) => name.clone(),
            _ => kind.default_root().to_string(),
        }
    }

    /// Stores fields and argument hints under `type_name`.
    pub fn record_into(&self, discoveries: &Discoveries, type_name: &str) {
        discoveries.add_fields(type_name, self.fields.iter().cloned());
        for (field, args) in &self.argument_hints {
            for arg in args {
                discoveries.add_argument(type_name, field, arg.clone());
            }
        }
    }
}

/// Reads a bucket probe response.
///
/// An alias present under `data` confirms its candidate, even when its value
/// is null. Errors confirm candidates they describe as real fields with the
/// wrong selection shape, and suggested names are taken as-is.
#[must_use]
pub fn interpret_bucket_response(
    bucket: &[String],
    path: &SelectionPath,
    response: &GraphQLResponse,
) -> ProbeOutcome {
    let mut outcome = ProbeOutcome::default();

    if let Some(data) = &response.data {
        for parent in objects_at_path(data, path) {
            for (i, name) in bucket.iter().enumerate() {
                if parent.contains_key(&alias(i)) {
                    outcome.fields.insert(name.clone());
                }
            }
        }
    }

    for message in response.error_messages() {
        let Some(classification) = classify(&message) else {
            outcome.fields.extend(extract_suggestions(&message));
            continue;
        };

        // Servers repeat argument errors for every field on the path; those
        // say nothing about the nested type's fields.
        let about_ancestor = classification.category.is_argument()
            && path
                .segments()
                .iter()
                .any(|segment| classification.field.as_deref() == Some(segment.as_str()));

        if let Some(field) = classification.confirmed_field() {
            if !about_ancestor && bucket.iter().any(|name| name == field) {
                outcome.fields.insert(field.to_string());
                record_hints(&mut outcome, field, &classification);
            }
        }

        if classification.category == SignalCategory::FieldNotFound {
            if let Some(type_name) = &classification.type_name {
                outcome.parent_types.insert(type_name.clone());
            }
        }

        outcome.fields.extend(classification.suggestions);
    }

    outcome
}

fn record_hints(outcome: &mut ProbeOutcome, field: &str, classification: &Classification) {
    match classification.category {
        SignalCategory::ObjectType | SignalCategory::ScalarType => {
            if let Some(type_ref) = &classification.type_ref {
                outcome
                    .type_hints
                    .entry(field.to_string())
                    .or_insert_with(|| type_ref.clone());
            }
        }
        SignalCategory::RequiredArgument => {
            if let Some(argument) = &classification.argument {
                let ty = classification
                    .type_ref
                    .clone()
                    .unwrap_or_else(TypeRef::unknown);
                let args = outcome.argument_hints.entry(field.to_string()).or_default();
                if !args.iter().any(|a| &a.name == argument) {
                    args.push(Argument::new(argument.clone(), ty));
                }
            }
        }
        _ => {}
    }
}

/// Sends one bucket probe and interprets the response.
#[tracing::instrument(skip(ctx, path, bucket), fields(path = %path, size = bucket.len()))]
pub async fn probe_bucket(
    ctx: &ProbeContext,
    kind: OperationKind,
    path: &SelectionPath,
    bucket: &[String],
) -> ProbeOutcome {
    let query = bucket_query(kind, path, bucket);
    let Some(response) = ctx.execute(&query).await else {
        if !ctx.is_cancelled() {
            ctx.record_probe(false);
        }
        return ProbeOutcome::default();
    };

    let outcome = interpret_bucket_response(bucket, path, &response);
    ctx.record_probe(!outcome.is_empty());
    if !outcome.is_empty() {
        tracing::debug!(fields = ?outcome.fields, "Bucket confirmed fields");
    }
    outcome
}

/// Probes every word under `path`, one concurrent task per bucket.
///
/// Buckets not yet started when the run is cancelled are skipped.
pub async fn probe_fields(
    ctx: &Arc<ProbeContext>,
    kind: OperationKind,
    path: &SelectionPath,
    words: &[String],
    bucket_size: usize,
) -> Result<ProbeOutcome> {
    let mut tasks = JoinSet::new();
    for bucket in create_buckets(words, bucket_size) {
        if ctx.is_cancelled() {
            break;
        }
        let ctx = Arc::clone(ctx);
        let path = path.clone();
        tasks.spawn(async move { probe_bucket(&ctx, kind, &path, &bucket).await });
    }

    let mut outcome = ProbeOutcome::default();
    while let Some(result) = tasks.join_next().await {
        outcome.merge(result?);
    }
    Ok(outcome)
}

/// The return type learned from a typed probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeResolution {
    /// A composite type worth exploring.
    Object(TypeRef),
    /// A scalar or enum.
    Leaf(TypeRef),
    Unresolved,
}

/// Reads the response to a `{ field { __typename } }` probe.
#[must_use]
pub fn interpret_typename_response(
    path: &SelectionPath,
    field: &str,
    response: &GraphQLResponse,
) -> TypeResolution {
    if let Some((name, is_list)) = response
        .data
        .as_ref()
        .and_then(|data| typename_at(data, path, field))
    {
        let mut type_ref = TypeRef::object(name);
        type_ref.is_list = is_list;
        return TypeResolution::Object(type_ref);
    }

    for message in response.error_messages() {
        let Some(classification) = classify(&message) else {
            continue;
        };
        if classification.field.as_deref().is_some_and(|f| f != field) {
            continue;
        }
        match (classification.category, classification.type_ref) {
            (SignalCategory::ObjectType, Some(type_ref)) => {
                return TypeResolution::Object(type_ref);
            }
            (SignalCategory::ScalarType, Some(type_ref)) => {
                return TypeResolution::Leaf(type_ref);
            }
            _ => {}
        }
    }

    TypeResolution::Unresolved
}

/// Resolves the return type of `field` under `path` with a typed probe.
#[tracing::instrument(skip(ctx, path), fields(path = %path))]
pub async fn resolve_field_type(
    ctx: &ProbeContext,
    path: &SelectionPath,
    field: &str,
) -> TypeResolution {
    let query = typename_query(path, field);
    let Some(response) = ctx.execute(&query).await else {
        if !ctx.is_cancelled() {
            ctx.record_probe(false);
        }
        return TypeResolution::Unresolved;
    };

    let resolution = interpret_typename_response(path, field, &response);
    ctx.record_probe(resolution != TypeResolution::Unresolved);
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindql_types::TypeKind;
    use serde_json::json;

    fn bucket(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn response(value: serde_json::Value) -> GraphQLResponse {
        GraphQLResponse::from_value(value)
    }

    #[test]
    fn test_aliases_in_data_confirm_fields() {
        let outcome = interpret_bucket_response(
            &bucket(&["a", "b", "c"]),
            &SelectionPath::root(),
            &response(json!({"data": {"g0": null, "g2": {"x": 1}}})),
        );
        assert_eq!(
            outcome.fields.into_iter().collect::<Vec<_>>(),
            ["a", "c"]
        );
    }

    #[test]
    fn test_nested_data_is_followed_through_lists() {
        let outcome = interpret_bucket_response(
            &bucket(&["id", "title"]),
            &SelectionPath::root().child("posts"),
            &response(json!({"data": {"posts": [{"g1": "x"}, {"g0": "1"}]}})),
        );
        assert_eq!(outcome.fields.len(), 2);
    }

    #[test]
    fn test_wrong_selection_errors_confirm_and_hint() {
        let outcome = interpret_bucket_response(
            &bucket(&["user", "id", "nope"]),
            &SelectionPath::root(),
            &response(json!({"errors": [
                {"message": "Field \"user\" of type \"User\" must have a selection of subfields. Did you mean \"user { ... }\"?"},
                {"message": "Cannot query field \"nope\" on type \"Query\"."}
            ]})),
        );

        assert_eq!(outcome.fields.into_iter().collect::<Vec<_>>(), ["user"]);
        assert_eq!(outcome.type_hints["user"], TypeRef::object("User"));
        assert_eq!(
            outcome.parent_types.into_iter().collect::<Vec<_>>(),
            ["Query"]
        );
    }

    #[test]
    fn test_suggestions_are_added() {
        let outcome = interpret_bucket_response(
            &bucket(&["usr"]),
            &SelectionPath::root(),
            &response(json!({"errors": [
                {"message": "Cannot query field \"usr\" on type \"Query\". Did you mean \"user\" or \"users\"?"}
            ]})),
        );
        assert_eq!(
            outcome.fields.into_iter().collect::<Vec<_>>(),
            ["user", "users"]
        );
    }

    #[test]
    fn test_required_argument_hint() {
        let outcome = interpret_bucket_response(
            &bucket(&["user"]),
            &SelectionPath::root(),
            &response(json!({"errors": [
                {"message": "Field \"user\" argument \"id\" of type \"ID!\" is required, but it was not provided."}
            ]})),
        );
        let args = &outcome.argument_hints["user"];
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].name, "id");
        assert_eq!(args[0].ty.to_string(), "ID!");
    }

    #[test]
    fn test_argument_error_about_path_field_is_ignored() {
        let outcome = interpret_bucket_response(
            &bucket(&["user", "id"]),
            &SelectionPath::root().child("user"),
            &response(json!({"errors": [
                {"message": "Field \"user\" argument \"id\" of type \"ID!\" is required, but it was not provided."}
            ]})),
        );
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_argument_error_about_ancestor_field_is_ignored() {
        let outcome = interpret_bucket_response(
            &bucket(&["user", "title"]),
            &SelectionPath::root().child("user").child("posts"),
            &response(json!({"errors": [
                {"message": "Field \"user\" argument \"id\" of type \"ID!\" is required, but it was not provided."},
                {"message": "Cannot query field \"user\" on type \"Post\"."}
            ]})),
        );
        assert!(!outcome.fields.contains("user"));
        assert!(outcome.argument_hints.is_empty());
        assert_eq!(
            outcome.parent_types.into_iter().collect::<Vec<_>>(),
            ["Post"]
        );
    }

    #[test]
    fn test_root_type_name() {
        let mut outcome = ProbeOutcome::default();
        assert_eq!(outcome.root_type_name(OperationKind::Query), "Query");

        outcome.parent_types.insert("QueryRoot".to_string());
        assert_eq!(outcome.root_type_name(OperationKind::Query), "QueryRoot");

        outcome.parent_types.insert("Other".to_string());
        assert_eq!(outcome.root_type_name(OperationKind::Query), "Query");
    }

    #[test]
    fn test_merge_keeps_first_hint() {
        let mut left = ProbeOutcome::default();
        left.type_hints
            .insert("user".to_string(), TypeRef::object("User"));
        let mut right = ProbeOutcome::default();
        right.fields.insert("me".to_string());
        right
            .type_hints
            .insert("user".to_string(), TypeRef::object("Account"));

        left.merge(right);
        assert_eq!(left.type_hints["user"], TypeRef::object("User"));
        assert!(left.fields.contains("me"));
    }

    #[test]
    fn test_typename_response_resolves_object() {
        let resolution = interpret_typename_response(
            &SelectionPath::root(),
            "users",
            &response(json!({"data": {"users": [{"__typename": "User"}]}})),
        );
        let TypeResolution::Object(type_ref) = resolution else {
            panic!("expected object, got {resolution:?}");
        };
        assert_eq!(type_ref.name, "User");
        assert!(type_ref.is_list);
    }

    #[test]
    fn test_typename_response_object_error() {
        let resolution = interpret_typename_response(
            &SelectionPath::root(),
            "user",
            &response(json!({"errors": [
                {"message": "Field \"user\" of type \"User\" must have a selection of subfields."}
            ]})),
        );
        assert_eq!(resolution, TypeResolution::Object(TypeRef::object("User")));
    }

    #[test]
    fn test_typename_response_scalar_error() {
        let resolution = interpret_typename_response(
            &SelectionPath::root(),
            "version",
            &response(json!({"errors": [
                {"message": "Field \"version\" must not have a selection since type \"String!\" has no subfields."}
            ]})),
        );
        let TypeResolution::Leaf(type_ref) = resolution else {
            panic!("expected leaf, got {resolution:?}");
        };
        assert_eq!(type_ref.kind, TypeKind::Scalar);
        assert_eq!(type_ref.to_string(), "String!");
    }

    #[test]
    fn test_typename_response_ignores_other_fields() {
        let resolution = interpret_typename_response(
            &SelectionPath::root(),
            "user",
            &response(json!({"errors": [
                {"message": "Field \"other\" must not have a selection since type \"String\" has no subfields."}
            ]})),
        );
        assert_eq!(resolution, TypeResolution::Unresolved);
    }
}
