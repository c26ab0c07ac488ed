//! Schema, named types and their members.

use crate::{TypeKind, TypeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::SystemTime;

/// The scalars every GraphQL schema defines.
pub const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

/// Directives every GraphQL schema defines.
const BUILTIN_DIRECTIVES: &[&str] = &["skip", "include", "deprecated", "specifiedBy"];

/// A GraphQL schema, either introspected or reconstructed.
///
/// Types are keyed by name and keep insertion order, so a reconstructed schema
/// lists its root types first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub query_type_name: Option<String>,
    pub mutation_type_name: Option<String>,
    pub subscription_type_name: Option<String>,
    types: IndexMap<String, Type>,
    directives: Vec<Directive>,
    pub source_endpoint: Option<String>,
    pub created_at: SystemTime,
    /// Discovery was incomplete or found nothing.
    pub partial: bool,
    /// Built via blind discovery rather than introspection.
    pub reconstructed: bool,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self {
            query_type_name: None,
            mutation_type_name: None,
            subscription_type_name: None,
            types: IndexMap::new(),
            directives: Vec::new(),
            source_endpoint: None,
            created_at: SystemTime::now(),
            partial: false,
            reconstructed: false,
        }
    }

    /// Creates an empty schema for an endpoint, marked as reconstructed.
    #[must_use]
    pub fn empty_reconstructed(endpoint: impl Into<String>, partial: bool) -> Self {
        let mut schema = Self::new();
        schema.source_endpoint = Some(endpoint.into());
        schema.reconstructed = true;
        schema.partial = partial;
        schema
    }

    /// Adds a type, replacing any existing type with the same name in place.
    pub fn add_type(&mut self, ty: Type) {
        self.types.insert(ty.name.clone(), ty);
    }

    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn get_type_mut(&mut self, name: &str) -> Option<&mut Type> {
        self.types.get_mut(name)
    }

    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    #[must_use]
    pub fn query_type(&self) -> Option<&Type> {
        self.query_type_name.as_deref().and_then(|n| self.types.get(n))
    }

    #[must_use]
    pub fn mutation_type(&self) -> Option<&Type> {
        self.mutation_type_name
            .as_deref()
            .and_then(|n| self.types.get(n))
    }

    #[must_use]
    pub fn subscription_type(&self) -> Option<&Type> {
        self.subscription_type_name
            .as_deref()
            .and_then(|n| self.types.get(n))
    }

    #[must_use]
    pub fn types_by_kind(&self, kind: TypeKind) -> Vec<&Type> {
        self.types.values().filter(|t| t.kind == kind).collect()
    }

    /// Types defined by the server, excluding introspection types and built-in scalars.
    #[must_use]
    pub fn user_types(&self) -> Vec<&Type> {
        self.types
            .values()
            .filter(|t| !t.is_introspection_type() && !t.is_builtin_scalar())
            .collect()
    }

    /// Fields of the query root, empty if there is none.
    #[must_use]
    pub fn queries(&self) -> &[Field] {
        self.query_type()
            .map(|t| t.fields.as_slice())
            .unwrap_or_default()
    }

    /// Fields of the mutation root, empty if there is none.
    #[must_use]
    pub fn mutations(&self) -> &[Field] {
        self.mutation_type()
            .map(|t| t.fields.as_slice())
            .unwrap_or_default()
    }

    pub fn add_directive(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn total_field_count(&self) -> usize {
        self.types.values().map(|t| t.fields.len()).sum()
    }

    /// Object types that are known by name but have no discovered fields.
    #[must_use]
    pub fn unexplored_types(&self) -> Vec<&Type> {
        self.types
            .values()
            .filter(|t| {
                t.kind == TypeKind::Object
                    && !t.has_fields()
                    && !t.is_builtin_scalar()
                    && !t.is_introspection_type()
            })
            .collect()
    }

    /// Finds a route from the query root to `target` by following field return types.
    ///
    /// The result alternates type and field names, starting with the query root
    /// and ending with `target`: `["Query", "viewer", "User"]`. Returns an empty
    /// vector when `target` is unreachable or there is no query root.
    #[must_use]
    pub fn find_path_to_type(&self, target: &str) -> Vec<String> {
        let Some(root) = self.query_type_name.clone() else {
            return Vec::new();
        };

        let mut queue = VecDeque::from([vec![root]]);
        let mut visited = HashSet::new();

        while let Some(path) = queue.pop_front() {
            let Some(current) = path.last() else {
                continue;
            };
            if current == target {
                return path;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(ty) = self.types.get(current) else {
                continue;
            };
            for field in &ty.fields {
                if field.ty.is_unknown() || visited.contains(&field.ty.name) {
                    continue;
                }
                let mut next = path.clone();
                next.push(field.name.clone());
                next.push(field.ty.name.clone());
                queue.push_back(next);
            }
        }

        Vec::new()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Schema[types={}, queries={}, mutations={}, partial={}]",
            self.types.len(),
            self.queries().len(),
            self.mutations().len(),
            self.partial
        )
    }
}

/// A named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub interfaces: Vec<String>,
    /// Member types of a union or implementations of an interface.
    pub possible_types: Vec<String>,
    pub enum_values: Vec<EnumValue>,
    pub input_fields: Vec<Argument>,
}

impl Type {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            fields: Vec::new(),
            interfaces: Vec::new(),
            possible_types: Vec::new(),
            enum_values: Vec::new(),
            input_fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    #[must_use]
    pub fn is_builtin_scalar(&self) -> bool {
        self.kind == TypeKind::Scalar && BUILTIN_SCALARS.contains(&self.name.as_str())
    }

    #[must_use]
    pub fn is_introspection_type(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub args: Vec<Argument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_reason: Option<String>,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            args: Vec::new(),
            description: None,
            is_deprecated: false,
            deprecation_reason: None,
        }
    }

    /// A field whose return type is not yet known.
    #[must_use]
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(name, TypeRef::unknown())
    }

    pub fn add_arg(&mut self, arg: Argument) {
        self.args.push(arg);
    }

    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Argument> {
        self.args.iter().find(|a| a.name == name)
    }
}

/// A field argument or input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Argument {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_reason: Option<String>,
}

impl EnumValue {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_deprecated: false,
            deprecation_reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub name: String,
    pub locations: Vec<String>,
    pub args: Vec<Argument>,
}

impl Directive {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locations: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Returns true for directives the GraphQL spec defines.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        BUILTIN_DIRECTIVES.contains(&self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, fields: &[(&str, TypeRef)]) -> Type {
        let mut ty = Type::new(name, TypeKind::Object);
        for (field, type_ref) in fields {
            ty.add_field(Field::new(*field, type_ref.clone()));
        }
        ty
    }

    fn sample_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_type(object(
            "Query",
            &[
                ("viewer", TypeRef::object("User")),
                ("version", TypeRef::scalar("String")),
            ],
        ));
        schema.add_type(object(
            "User",
            &[
                ("id", TypeRef::scalar("ID")),
                ("organization", TypeRef::object("Organization")),
            ],
        ));
        schema.add_type(object("Organization", &[]));
        schema.add_type(Type::new("String", TypeKind::Scalar));
        schema.add_type(Type::new("__Schema", TypeKind::Object));
        schema.query_type_name = Some("Query".to_string());
        schema
    }

    #[test]
    fn test_root_accessors() {
        let schema = sample_schema();
        assert_eq!(schema.query_type().unwrap().name, "Query");
        assert!(schema.mutation_type().is_none());
        assert_eq!(schema.queries().len(), 2);
        assert!(schema.mutations().is_empty());
    }

    #[test]
    fn test_counts_and_filters() {
        let schema = sample_schema();
        assert_eq!(schema.type_count(), 5);
        assert_eq!(schema.total_field_count(), 4);

        let user_types: Vec<_> = schema.user_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(user_types, vec!["Query", "User", "Organization"]);

        let unexplored: Vec<_> = schema
            .unexplored_types()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(unexplored, vec!["Organization"]);
    }

    #[test]
    fn test_add_type_replaces_in_place() {
        let mut schema = sample_schema();
        schema.add_type(object("Query", &[("me", TypeRef::object("User"))]));
        assert_eq!(schema.type_names().next(), Some("Query"));
        assert_eq!(schema.queries().len(), 1);
    }

    #[test]
    fn test_find_path_to_type() {
        let schema = sample_schema();
        assert_eq!(
            schema.find_path_to_type("Organization"),
            vec!["Query", "viewer", "User", "organization", "Organization"]
        );
        assert_eq!(schema.find_path_to_type("Query"), vec!["Query"]);
        assert!(schema.find_path_to_type("Missing").is_empty());
    }

    #[test]
    fn test_find_path_without_query_root() {
        let mut schema = sample_schema();
        schema.query_type_name = None;
        assert!(schema.find_path_to_type("User").is_empty());
    }

    #[test]
    fn test_empty_reconstructed() {
        let schema = Schema::empty_reconstructed("https://example.com/graphql", true);
        assert!(schema.partial);
        assert!(schema.reconstructed);
        assert_eq!(schema.type_count(), 0);
        assert_eq!(
            schema.source_endpoint.as_deref(),
            Some("https://example.com/graphql")
        );
    }

    #[test]
    fn test_directives() {
        let mut schema = Schema::new();
        schema.add_directive(Directive::new("include"));
        schema.add_directive(Directive::new("auth"));
        assert!(schema.directive("include").unwrap().is_builtin());
        assert!(!schema.directive("auth").unwrap().is_builtin());
        assert!(schema.directive("missing").is_none());
    }

    #[test]
    fn test_field_serializes_type_key() {
        let field = Field::placeholder("user");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"]["name"], "Unknown");
        assert_eq!(json["isDeprecated"], false);
        assert!(json.get("description").is_none());
    }
}
