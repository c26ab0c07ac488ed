//! Folding discoveries into a [`Schema`].

use crate::discoveries::{DiscoveredFields, Discoveries};
use crate::query::OperationKind;
use blindql_types::{Field, Schema, Type, TypeKind, TypeRef, BUILTIN_SCALARS};
use std::collections::BTreeMap;

/// Builds the reconstructed schema for `endpoint`.
///
/// Root types come first, then every other explored type by name, the
/// built-in scalars, and finally types that were only seen as field or
/// argument types. Fields whose type was never resolved are typed `Unknown`.
#[must_use]
pub fn assemble(endpoint: &str, discoveries: &Discoveries) -> Schema {
    let mut schema = Schema::empty_reconstructed(endpoint, false);
    let mut explored = discoveries.snapshot();

    for kind in [OperationKind::Query, OperationKind::Mutation] {
        let Some(root) = discoveries.root(kind) else {
            continue;
        };
        let Some(fields) = explored.remove(root) else {
            continue;
        };
        schema.add_type(build_type(root, fields));
        match kind {
            OperationKind::Query => schema.query_type_name = Some(root.to_string()),
            OperationKind::Mutation => schema.mutation_type_name = Some(root.to_string()),
        }
    }

    for (name, fields) in explored {
        schema.add_type(build_type(&name, fields));
    }

    for scalar in BUILTIN_SCALARS {
        if !schema.has_type(scalar) {
            schema.add_type(Type::new(*scalar, TypeKind::Scalar));
        }
    }

    for (name, kind) in referenced_types(&schema) {
        if !schema.has_type(&name) {
            schema.add_type(Type::new(name, kind));
        }
    }

    schema
}

fn build_type(name: &str, fields: DiscoveredFields) -> Type {
    let mut ty = Type::new(name, TypeKind::Object);
    for (field_name, discovered) in fields {
        let mut field = Field::new(field_name, discovered.ty.unwrap_or_else(TypeRef::unknown));
        for argument in discovered.args.into_values() {
            field.add_arg(argument);
        }
        ty.add_field(field);
    }
    ty
}

/// Named types referenced by fields and arguments, in name order.
fn referenced_types(schema: &Schema) -> BTreeMap<String, TypeKind> {
    let mut referenced = BTreeMap::new();
    for field in schema.types().flat_map(|ty| ty.fields.iter()) {
        let refs = std::iter::once(&field.ty).chain(field.args.iter().map(|arg| &arg.ty));
        for type_ref in refs {
            if !type_ref.is_unknown() {
                referenced
                    .entry(type_ref.name.clone())
                    .or_insert(type_ref.kind);
            }
        }
    }
    referenced
}
