//! Kinds of named GraphQL types.

use serde::{Deserialize, Serialize};

/// The kind of a named GraphQL type.
///
/// List and non-null are wrappers, not standalone types, so they are modeled as
/// flags on [`crate::TypeRef`] rather than as kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    /// Returns true for kinds that require a selection set when queried.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }

    /// Returns true for kinds that are leaves of a selection.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Scalar | Self::Enum)
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "SCALAR"),
            Self::Object => write!(f, "OBJECT"),
            Self::Interface => write!(f, "INTERFACE"),
            Self::Union => write!(f, "UNION"),
            Self::Enum => write!(f, "ENUM"),
            Self::InputObject => write!(f, "INPUT_OBJECT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_and_leaf() {
        assert!(TypeKind::Object.is_composite());
        assert!(TypeKind::Union.is_composite());
        assert!(!TypeKind::Scalar.is_composite());
        assert!(TypeKind::Enum.is_leaf());
        assert!(!TypeKind::InputObject.is_leaf());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TypeKind::InputObject).unwrap();
        assert_eq!(json, "\"INPUT_OBJECT\"");
        let kind: TypeKind = serde_json::from_str("\"OBJECT\"").unwrap();
        assert_eq!(kind, TypeKind::Object);
    }
}
