//! Dialect rules, in priority order.
//!
//! Each rule is a pattern with named capture groups. The extraction contract
//! is by group name: `field`, `type`, `arg` and `value`, each optional.

use super::SignalCategory;
use regex::Regex;
use std::sync::LazyLock;
use SignalCategory::{
    AbstractType, ArgumentType, EnumValue, ExpectedType, FieldNotFound, NotInputType, ObjectType,
    RequiredArgument, ScalarType, UnknownArgument,
};

/// A compiled classification rule.
#[derive(Debug)]
pub struct Rule {
    /// Server implementation whose phrasing the pattern matches.
    pub dialect: &'static str,
    pub category: SignalCategory,
    pub pattern: Regex,
}

struct RuleSpec {
    dialect: &'static str,
    category: SignalCategory,
    pattern: &'static str,
}

const fn spec(dialect: &'static str, category: SignalCategory, pattern: &'static str) -> RuleSpec {
    RuleSpec {
        dialect,
        category,
        pattern,
    }
}

// Quote characters vary by server: `"`, `'` and backticks all occur.
const RULE_SPECS: &[RuleSpec] = &[
    // Reference phrasing: graphql-js and the servers built on it or copying it
    // (Apollo, Yoga, graphql-php, gqlgen, Absinthe, graphql-core).
    spec(
        "graphql-js",
        FieldNotFound,
        r#"Cannot query field ["'`](?P<field>\w+)["'`] on type ["'`](?P<type>\w+)["'`]"#,
    ),
    spec(
        "graphql-js",
        ObjectType,
        r#"Field ["'`](?P<field>\w+)["'`] of type ["'`](?P<type>[\w!\[\]]+)["'`] must have a (?:sub-?)?selection"#,
    ),
    spec(
        "graphql-js",
        ScalarType,
        r#"Field ["'`](?P<field>\w+)["'`] must not have a selection since type ["'`](?P<type>[\w!\[\]]+)["'`]"#,
    ),
    spec(
        "graphql-js",
        RequiredArgument,
        r#"Field ["'`](?P<field>\w+)["'`] argument ["'`](?P<arg>\w+)["'`] of type ["'`](?P<type>[\w!\[\]]+)["'`] is required"#,
    ),
    spec(
        "graphql-js",
        UnknownArgument,
        r#"Unknown argument ["'`](?P<arg>\w+)["'`] on field ["'`](?:\w+\.)?(?P<field>\w+)["'`]"#,
    ),
    spec(
        "graphql-js",
        ArgumentType,
        r#"Argument ["'`](?P<arg>\w+)["'`] has invalid value"#,
    ),
    // graphql-java, also behind AWS AppSync and Netflix DGS.
    spec(
        "graphql-java",
        ObjectType,
        r#"Sub-?selection required for type ["'`]?(?P<type>[\w!\[\]]+)["'`]? of field ["'`]?(?P<field>\w+)"#,
    ),
    spec(
        "graphql-java",
        ScalarType,
        r#"Sub-?selection not allowed on leaf type ["'`]?(?P<type>[\w!\[\]]+)["'`]? of field ["'`]?(?P<field>\w+)"#,
    ),
    spec(
        "graphql-java",
        FieldNotFound,
        r#"Field ["'`](?P<field>\w+)["'`] in type ["'`](?P<type>\w+)["'`] is undefined"#,
    ),
    spec(
        "graphql-java",
        RequiredArgument,
        r#"MissingFieldArgument@\[(?:\w+/)*(?P<field>\w+)\][^:]*:\s*Missing field argument ["'`]?(?P<arg>\w+)"#,
    ),
    spec(
        "graphql-java",
        UnknownArgument,
        r#"UnknownArgument@\[(?:\w+/)*(?P<field>\w+)\][^:]*:\s*Unknown field argument ["'`]?(?P<arg>\w+)"#,
    ),
    spec(
        "graphql-ruby",
        ObjectType,
        r#"[Ff]ield ["'`](?P<field>\w+)["'`] returns (?P<type>[\w!\[\]]+) but has no selections"#,
    ),
    spec(
        "graphql-ruby",
        ScalarType,
        r#"Selections can't be made on (?:scalars|enums) \(field ["'`](?P<field>\w+)["'`] returns (?P<type>[\w!\[\]]+)"#,
    ),
    spec(
        "graphql-ruby",
        FieldNotFound,
        r#"Field ["'`](?P<field>\w+)["'`] doesn't exist on type ["'`](?P<type>\w+)["'`]"#,
    ),
    spec(
        "graphql-ruby",
        RequiredArgument,
        r#"Field ["'`](?P<field>\w+)["'`] is missing required arguments?: (?P<arg>\w+)"#,
    ),
    // async-graphql and Relay compiler phrasing.
    spec(
        "async-graphql",
        FieldNotFound,
        r#"Unknown field ["'`]?(?P<field>\w+)["'`]? on type ["'`]?(?P<type>\w+)["'`]?"#,
    ),
    spec(
        "hotchocolate",
        FieldNotFound,
        r#"The field ["'`]?(?P<field>\w+)["'`]? does not exist on (?:the )?(?:type )?["'`]?(?P<type>\w+)"#,
    ),
    spec(
        "hotchocolate",
        ObjectType,
        r#"["'`](?P<field>\w+)["'`] (?:returns|is) an? (?:object|interface|union)"#,
    ),
    spec(
        "hotchocolate",
        ScalarType,
        r#"["'`](?P<field>\w+)["'`] returns an? (?:scalar|enum) value"#,
    ),
    spec(
        "hotchocolate",
        RequiredArgument,
        r#"The argument ["'`]?(?P<arg>\w+)["'`]? is required"#,
    ),
    spec(
        "hasura",
        FieldNotFound,
        r#"field ["'`](?P<field>\w+)["'`] not found in type: ["'`](?P<type>\w+)["'`]"#,
    ),
    spec(
        "tartiflette",
        FieldNotFound,
        r"Field (?P<field>\w+) doesn't exist on (?P<type>\w+)",
    ),
    spec(
        "sangria",
        FieldNotFound,
        r#"Field ["'`]?(?P<field>\w+)["'`]? is not defined"#,
    ),
    spec(
        "graphene",
        FieldNotFound,
        r#"Cannot resolve field ["'`]?(?P<field>\w+)"#,
    ),
    spec(
        "juniper",
        FieldNotFound,
        r#"Unknown field:? ["'`]?(?P<field>\w+)"#,
    ),
    spec(
        "appsync",
        FieldNotFound,
        r#"(?i)FieldUndefined:.*?field ["'`]?(?P<field>\w+)"#,
    ),
    spec(
        "postgraphile",
        FieldNotFound,
        r#"(?:Cannot|Unable to) query field ["'`]?(?P<field>\w+)"#,
    ),
    spec(
        "dgs",
        FieldNotFound,
        r#"(?:Field|Property) ["'`]?(?P<field>\w+)["'`]? (?:not found|does not exist)"#,
    ),
    // Type-level signals carry no field name.
    spec(
        "graphql-js",
        NotInputType,
        r#"["'`]?(?P<type>[\w!\[\]]+)["'`]? is not an input type"#,
    ),
    spec(
        "graphql-js",
        AbstractType,
        r#"Abstract type ["'`]?(?P<type>\w+)["'`]? must resolve to"#,
    ),
    spec(
        "graphql-js",
        ExpectedType,
        r#"Expected type ["'`]?(?P<type>[\w!\[\]]+)["'`]?,? found"#,
    ),
    spec(
        "graphql-js",
        EnumValue,
        r#"Enum ["'`]?(?P<type>\w+)["'`]? cannot represent (?:non-enum )?value:? ["'`]?(?P<value>\w+)"#,
    ),
    spec(
        "graphql-js",
        EnumValue,
        r#"Value ["'`](?P<value>\w+)["'`] does not exist in ["'`](?P<type>\w+)["'`] enum"#,
    ),
];

#[allow(clippy::expect_used)]
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_SPECS
        .iter()
        .map(|spec| Rule {
            dialect: spec.dialect,
            category: spec.category,
            pattern: Regex::new(spec.pattern).expect("classifier rule patterns are valid"),
        })
        .collect()
});

/// All rules in the order they are tried.
#[must_use]
pub fn rules() -> &'static [Rule] {
    &RULES
}
