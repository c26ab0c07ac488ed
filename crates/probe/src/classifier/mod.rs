//! Classification of GraphQL error messages across server dialects.
//!
//! Servers disagree on wording but agree on what their validation errors mean.
//! A message either says a name is not a field, or that it is a field that was
//! selected with the wrong shape, which proves it exists and reveals whether
//! it returns an object or a leaf. The rule table in [`rules`] maps each
//! known phrasing to a [`SignalCategory`].

mod rules;
mod suggestions;

pub use rules::{rules, Rule};
pub use suggestions::extract_suggestions;

use blindql_types::{TypeKind, TypeRef};
use serde::Serialize;

const OBJECT_PHRASES: &[&str] = &[
    "must have a selection",
    "must have a sub selection",
    "must have selections",
    "Subselection required",
];

const SCALAR_PHRASES: &[&str] = &[
    "must not have a selection",
    "cannot have a selection",
    "Subselection not allowed",
    "Selections can't be made on scalars",
];

const ARGUMENT_PHRASES: &[&str] = &["is required", "Unknown argument"];

/// What an error message reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignalCategory {
    /// The name is not a field of the parent type.
    FieldNotFound,
    /// The field exists and returns a composite type.
    ObjectType,
    /// The field exists and returns a leaf type.
    ScalarType,
    UnknownArgument,
    RequiredArgument,
    ArgumentType,
    NotInputType,
    AbstractType,
    ExpectedType,
    EnumValue,
}

impl SignalCategory {
    /// Returns true if a message in this category proves its field exists.
    #[must_use]
    pub const fn confirms_field(self) -> bool {
        matches!(
            self,
            Self::ObjectType
                | Self::ScalarType
                | Self::UnknownArgument
                | Self::RequiredArgument
                | Self::ArgumentType
        )
    }

    #[must_use]
    pub const fn is_argument(self) -> bool {
        matches!(
            self,
            Self::UnknownArgument | Self::RequiredArgument | Self::ArgumentType
        )
    }
}

/// The structured reading of one error message.
///
/// `type_name` depends on the category: the parent type for
/// [`SignalCategory::FieldNotFound`], the field's return type for object and
/// scalar signals, and the argument's type for argument signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: SignalCategory,
    pub dialect: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Type name with list and non-null wrappers removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// The type as written in the message, wrappers included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    /// Offending literal for enum value errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub suggestions: Vec<String>,
}

impl Classification {
    /// The field name this message proves to exist, if any.
    #[must_use]
    pub fn confirmed_field(&self) -> Option<&str> {
        if self.category.confirms_field() {
            self.field.as_deref()
        } else {
            None
        }
    }
}

/// Classifies `message` using the first matching rule.
///
/// Returns `None` when no rule matches, which is a normal outcome for
/// messages that carry no schema information.
///
/// ```
/// use blindql_probe::classifier::{classify, SignalCategory};
///
/// let c = classify(r#"Field "user" of type "User" must have a selection of subfields."#).unwrap();
/// assert_eq!(c.category, SignalCategory::ObjectType);
/// assert_eq!(c.field.as_deref(), Some("user"));
/// assert_eq!(c.type_name.as_deref(), Some("User"));
/// ```
#[must_use]
pub fn classify(message: &str) -> Option<Classification> {
    rules().iter().find_map(|rule| {
        let caps = rule.pattern.captures(message)?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        let raw_type = group("type");
        let type_ref = raw_type
            .as_deref()
            .and_then(TypeRef::parse)
            .map(|type_ref| refine_kind(type_ref, rule.category));

        Some(Classification {
            category: rule.category,
            dialect: rule.dialect,
            field: group("field"),
            type_name: raw_type.as_deref().map(normalize_type_name),
            type_ref,
            argument: group("arg"),
            value: group("value"),
            suggestions: extract_suggestions(message),
        })
    })
}

fn refine_kind(type_ref: TypeRef, category: SignalCategory) -> TypeRef {
    match category {
        SignalCategory::ObjectType => type_ref.with_kind(TypeKind::Object),
        SignalCategory::ScalarType if type_ref.kind != TypeKind::Enum => {
            type_ref.with_kind(TypeKind::Scalar)
        }
        _ => type_ref,
    }
}

fn contains_any(message: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| message.contains(phrase))
}

/// Returns true if `message` says a field exists but returns a composite type.
#[must_use]
pub fn is_object_type_signal(message: &str) -> bool {
    classify(message).is_some_and(|c| c.category == SignalCategory::ObjectType)
        || contains_any(message, OBJECT_PHRASES)
}

/// Returns true if `message` says a field exists but returns a leaf type.
#[must_use]
pub fn is_scalar_type_signal(message: &str) -> bool {
    classify(message).is_some_and(|c| c.category == SignalCategory::ScalarType)
        || contains_any(message, SCALAR_PHRASES)
}

/// Returns true if `message` implies the queried name is a real field.
#[must_use]
pub fn is_valid_field_signal(message: &str) -> bool {
    classify(message).is_some_and(|c| c.category.confirms_field())
        || contains_any(message, OBJECT_PHRASES)
        || contains_any(message, SCALAR_PHRASES)
        || contains_any(message, ARGUMENT_PHRASES)
}

/// Strips list and non-null wrappers: `[User!]!` becomes `User`.
#[must_use]
pub fn normalize_type_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '!'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(message: &str) -> String {
        let Some(c) = classify(message) else {
            return "unmatched".to_string();
        };
        let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();
        let suggestions = if c.suggestions.is_empty() {
            "-".to_string()
        } else {
            c.suggestions.join(",")
        };
        format!(
            "{} {:?} field={} type={} arg={} suggestions={}",
            c.dialect,
            c.category,
            or_dash(c.field.as_deref()),
            or_dash(c.type_name.as_deref()),
            or_dash(c.argument.as_deref()),
            suggestions
        )
    }

    #[test]
    fn test_field_not_found_with_suggestions() {
        let message = r#"Cannot query field "foo" on type "Query". Did you mean "fooBar" or "fooBaz"?"#;
        let c = classify(message).unwrap();

        assert_eq!(c.category, SignalCategory::FieldNotFound);
        assert_eq!(c.dialect, "graphql-js");
        assert_eq!(c.field.as_deref(), Some("foo"));
        assert_eq!(c.type_name.as_deref(), Some("Query"));
        assert_eq!(c.suggestions, ["fooBar", "fooBaz"]);
        assert_eq!(c.suggestions, extract_suggestions(message));
        assert_eq!(c.confirmed_field(), None);
    }

    #[test]
    fn test_object_type_signal() {
        let message = r#"Field "user" of type "User" must have a selection of subfields. Did you mean "user { ... }"?"#;
        let c = classify(message).unwrap();

        assert_eq!(c.category, SignalCategory::ObjectType);
        assert_eq!(c.confirmed_field(), Some("user"));
        assert_eq!(c.type_ref, Some(TypeRef::object("User")));
        assert!(is_object_type_signal(message));
        assert!(!is_scalar_type_signal(message));
        assert!(is_valid_field_signal(message));
    }

    #[test]
    fn test_object_type_keeps_wrappers() {
        let c = classify(r#"Field "users" of type "[User!]!" must have a selection of subfields."#)
            .unwrap();
        let type_ref = c.type_ref.unwrap();

        assert_eq!(c.type_name.as_deref(), Some("User"));
        assert_eq!(type_ref.kind, TypeKind::Object);
        assert!(type_ref.is_list && type_ref.is_non_null && type_ref.is_non_null_item);
    }

    #[test]
    fn test_scalar_type_signal() {
        let message = r#"Field "id" must not have a selection since type "ID!" has no subfields."#;
        let c = classify(message).unwrap();

        assert_eq!(c.category, SignalCategory::ScalarType);
        assert_eq!(c.type_name.as_deref(), Some("ID"));
        let type_ref = c.type_ref.unwrap();
        assert_eq!(type_ref.kind, TypeKind::Scalar);
        assert!(type_ref.is_non_null);
        assert!(is_scalar_type_signal(message));
    }

    #[test]
    fn test_scalar_signal_keeps_enum_kind() {
        let c = classify(r#"Field "role" must not have a selection since type "RoleEnum" has no subfields."#)
            .unwrap();
        assert_eq!(c.type_ref.unwrap().kind, TypeKind::Enum);
    }

    #[test]
    fn test_required_argument_confirms_field() {
        let c = classify(r#"Field "user" argument "id" of type "ID!" is required, but it was not provided."#)
            .unwrap();
        assert_eq!(c.category, SignalCategory::RequiredArgument);
        assert_eq!(c.confirmed_field(), Some("user"));
        assert_eq!(c.argument.as_deref(), Some("id"));
        assert_eq!(c.type_name.as_deref(), Some("ID"));
    }

    #[test]
    fn test_enum_value() {
        let c = classify(r#"Value "ADMN" does not exist in "Role" enum."#).unwrap();
        assert_eq!(c.category, SignalCategory::EnumValue);
        assert_eq!(c.value.as_deref(), Some("ADMN"));
        assert_eq!(c.type_name.as_deref(), Some("Role"));
        assert_eq!(c.confirmed_field(), None);
    }

    #[test]
    fn test_unmatched_message() {
        assert!(classify("Internal server error").is_none());
        assert!(!is_valid_field_signal("Internal server error"));
    }

    #[test]
    fn test_phrase_fallbacks() {
        assert!(is_object_type_signal("Field must have a sub selection"));
        assert!(is_scalar_type_signal("Leaf field cannot have a selection"));
        assert!(is_valid_field_signal("Argument id is required"));
    }

    #[test]
    fn test_value_coercion_does_not_confirm_field() {
        let message = r#"Expected type "Int!", found "abc"."#;
        let c = classify(message).unwrap();
        assert_eq!(c.category, SignalCategory::ExpectedType);
        assert!(!c.category.confirms_field());
        assert!(!is_valid_field_signal(message));
    }

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("[User!]!"), "User");
        assert_eq!(normalize_type_name("String"), "String");
        assert_eq!(normalize_type_name("[[Int]]"), "Int");
    }

    #[test]
    fn test_dialect_corpus() {
        let messages = [
            r#"Cannot query field "foo" on type "Query". Did you mean "fooBar" or "fooBaz"?"#,
            r#"Field "user" of type "User" must have a selection of subfields. Did you mean "user { ... }"?"#,
            r#"Field "id" must not have a selection since type "ID!" has no subfields."#,
            "Validation error (SubselectionRequired@[user]) : Subselection required for type 'User' of field 'user'",
            "Field 'foo' doesn't exist on type 'Query'",
            "The field `foo` does not exist on the type `Query`.",
            "field 'foo' not found in type: 'query_root'",
            r#"Unknown field "foo" on type "Query". Did you mean "food"?"#,
            "Field 'user' argument 'id' of type 'ID!' is required, but it was not provided.",
            "Validation error (FieldUndefined@[foo]) : Field 'foo' in type 'Query' is undefined",
            "Unknown field: foo",
            r#"Expected type "Int!", found "abc"."#,
            "Internal server error",
        ];
        let described: Vec<String> = messages.iter().map(|m| describe(m)).collect();

        insta::assert_snapshot!(described.join("\n"), @r"
        graphql-js FieldNotFound field=foo type=Query arg=- suggestions=fooBar,fooBaz
        graphql-js ObjectType field=user type=User arg=- suggestions=user
        graphql-js ScalarType field=id type=ID arg=- suggestions=-
        graphql-java ObjectType field=user type=User arg=- suggestions=-
        graphql-ruby FieldNotFound field=foo type=Query arg=- suggestions=-
        hotchocolate FieldNotFound field=foo type=Query arg=- suggestions=-
        hasura FieldNotFound field=foo type=query_root arg=- suggestions=-
        async-graphql FieldNotFound field=foo type=Query arg=- suggestions=food
        graphql-js RequiredArgument field=user type=ID arg=id suggestions=-
        graphql-java FieldNotFound field=foo type=Query arg=- suggestions=-
        juniper FieldNotFound field=foo type=- arg=- suggestions=-
        graphql-js ExpectedType field=- type=Int arg=- suggestions=-
        unmatched
        ");
    }
}
