//! Flattened references to GraphQL types.

use crate::TypeKind;
use serde::{Deserialize, Serialize};

/// Placeholder name for a field whose return type has not been resolved.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Scalar names that are inferred as scalars without any other evidence.
const SCALAR_NAMES: &[&str] = &[
    "String", "Int", "Float", "Boolean", "ID", "URL", "URI", "UUID", "JSON", "HTML", "XML", "JWT",
    "AWS", "ISO",
];

/// A reference to a named type with its wrapper flags.
///
/// The six single-level forms `T`, `T!`, `[T]`, `[T!]`, `[T]!` and `[T!]!` are
/// representable. Doubly-nested lists such as `[[T]]` are not: [`TypeRef::parse`]
/// flattens them to a single list of the innermost named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
    pub is_list: bool,
    pub is_non_null: bool,
    pub is_non_null_item: bool,
}

impl TypeRef {
    /// Creates a reference with explicit kind and flags.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: TypeKind,
        is_list: bool,
        is_non_null: bool,
        is_non_null_item: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            is_list,
            is_non_null,
            is_non_null_item,
        }
    }

    /// The placeholder reference used before a field's type is resolved.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TYPE, TypeKind::Object, false, false, false)
    }

    /// A plain nullable reference whose kind is guessed from the name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = infer_kind(&name);
        Self::new(name, kind, false, false, false)
    }

    /// A plain nullable reference to a scalar.
    #[must_use]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Scalar, false, false, false)
    }

    /// A plain nullable reference to an object type.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Object, false, false, false)
    }

    /// Parses GraphQL wrapper syntax such as `[User!]!`.
    ///
    /// The kind is guessed from the base name. Returns `None` when the input
    /// does not contain a type name.
    ///
    /// ```
    /// # use blindql_types::TypeRef;
    /// let type_ref = TypeRef::parse("[User!]!").unwrap();
    /// assert_eq!(type_ref.name, "User");
    /// assert!(type_ref.is_list && type_ref.is_non_null && type_ref.is_non_null_item);
    /// assert_eq!(type_ref.to_string(), "[User!]!");
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (text, is_non_null) = match text.strip_suffix('!') {
            Some(rest) => (rest.trim_end(), true),
            None => (text, false),
        };

        let (inner, is_list) = match text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(inner) => (inner.trim(), true),
            None => (text, false),
        };

        let (inner, is_non_null_item) = if is_list {
            match inner.strip_suffix('!') {
                Some(rest) => (rest, true),
                None => (inner, false),
            }
        } else {
            (inner, false)
        };

        let name: String = inner
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '!'))
            .collect();
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self::new(
            name,
            infer_kind(name),
            is_list,
            is_non_null,
            is_non_null_item,
        ))
    }

    /// Returns a copy with the kind replaced.
    #[must_use]
    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns true while the reference is still the unresolved placeholder.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_TYPE
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.kind == TypeKind::Scalar
    }

    /// Returns true for the five scalars every GraphQL schema defines.
    #[must_use]
    pub fn is_builtin_scalar(&self) -> bool {
        crate::BUILTIN_SCALARS.contains(&self.name.as_str())
    }
}

impl Default for TypeRef {
    fn default() -> Self {
        Self::unknown()
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_list {
            write!(f, "[")?;
        }
        write!(f, "{}", self.name)?;
        if self.is_list {
            if self.is_non_null_item {
                write!(f, "!")?;
            }
            write!(f, "]")?;
        }
        if self.is_non_null {
            write!(f, "!")?;
        }
        Ok(())
    }
}

/// Guesses a kind from naming conventions alone.
fn infer_kind(name: &str) -> TypeKind {
    if SCALAR_NAMES.contains(&name) {
        return TypeKind::Scalar;
    }
    if name.ends_with("Input") {
        return TypeKind::InputObject;
    }
    let all_caps = name.chars().all(|c| !c.is_ascii_lowercase());
    if name.ends_with("Enum") || (all_caps && name.len() > 4) {
        return TypeKind::Enum;
    }
    TypeKind::Object
}
