use crate::QueryLog;
use async_trait::async_trait;
use blindql_transport::{GraphQLResponse, QueryTransport, Result};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

#[derive(Debug, Clone)]
struct FieldDef {
    name: String,
    /// Type as written, e.g. `[User!]!`.
    written: String,
    base: String,
    is_list: bool,
}

impl FieldDef {
    fn parse(name: &str, written: &str) -> Self {
        let base: String = written
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '!'))
            .collect();
        Self {
            name: name.to_string(),
            written: written.to_string(),
            base,
            is_list: written.contains('['),
        }
    }
}

#[derive(Debug)]
struct Selection {
    alias: Option<String>,
    name: String,
    children: Option<Vec<Selection>>,
}

/// An in-memory GraphQL endpoint for probe queries.
///
/// It understands the subset of the language probes use: an optional
/// operation keyword and name, nested selection sets and aliases. Validation
/// errors use graphql-js wording.
///
/// By default the server is lenient and returns data for every valid
/// selection alongside the errors for invalid ones. [`strict`](Self::strict)
/// switches to graphql-js behavior, where any validation error suppresses
/// `data` entirely.
///
/// ```
/// use blindql_test_utils::SchemaServer;
/// use blindql_transport::QueryTransport;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let server = SchemaServer::new()
///     .object("Query", &[("user", "User"), ("version", "String!")])
///     .object("User", &[("id", "ID!")]);
///
/// let response = server
///     .send_query("http://localhost/graphql", "query { g0: version g1: user }")
///     .await
///     .unwrap();
/// assert!(response.data.as_ref().unwrap()["g0"].is_string());
/// assert_eq!(
///     response.first_error_message().unwrap(),
///     r#"Field "user" of type "User" must have a selection of subfields. Did you mean "user { ... }"?"#
/// );
/// # }
/// ```
#[derive(Debug)]
pub struct SchemaServer {
    types: HashMap<String, Vec<FieldDef>>,
    leaves: HashSet<String>,
    query_root: String,
    mutation_root: Option<String>,
    suggestions: HashMap<String, Vec<String>>,
    required_args: HashMap<(String, String), (String, String)>,
    strict: bool,
    latency: Option<Duration>,
    log: QueryLog,
}

impl Default for SchemaServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            leaves: BUILTIN_SCALARS.iter().map(ToString::to_string).collect(),
            query_root: "Query".to_string(),
            mutation_root: None,
            suggestions: HashMap::new(),
            required_args: HashMap::new(),
            strict: false,
            latency: None,
            log: QueryLog::default(),
        }
    }

    /// Declares an object type with `(field, type)` pairs.
    #[must_use]
    pub fn object(mut self, name: &str, fields: &[(&str, &str)]) -> Self {
        let defs = fields
            .iter()
            .map(|(field, written)| FieldDef::parse(field, written))
            .collect();
        self.types.insert(name.to_string(), defs);
        self
    }

    /// Declares a custom scalar or enum.
    #[must_use]
    pub fn leaf(mut self, name: &str) -> Self {
        self.leaves.insert(name.to_string());
        self
    }

    #[must_use]
    pub fn query_root(mut self, name: &str) -> Self {
        self.query_root = name.to_string();
        self
    }

    #[must_use]
    pub fn mutation_root(mut self, name: &str) -> Self {
        self.mutation_root = Some(name.to_string());
        self
    }

    /// Appends a "Did you mean" clause when `typo` is queried as a field.
    #[must_use]
    pub fn suggest(mut self, typo: &str, names: &[&str]) -> Self {
        self.suggestions.insert(
            typo.to_string(),
            names.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Makes `type_name.field` fail without an `arg` argument.
    #[must_use]
    pub fn require_arg(mut self, type_name: &str, field: &str, arg: &str, arg_type: &str) -> Self {
        self.required_args.insert(
            (type_name.to_string(), field.to_string()),
            (arg.to_string(), arg_type.to_string()),
        );
        self
    }

    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub fn log(&self) -> &QueryLog {
        &self.log
    }

    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.log.all()
    }

    #[must_use]
    pub fn count_matching(&self, needle: &str) -> usize {
        self.log.count_matching(needle)
    }

    /// Evaluates a query document to a response body.
    #[must_use]
    pub fn respond(&self, query: &str) -> Value {
        let tokens = tokenize(query);
        let Some(open) = tokens.iter().position(|t| t == "{") else {
            return error_body(&["Syntax Error: Expected \"{\".".to_string()]);
        };

        let root = if tokens.first().is_some_and(|t| t == "mutation") {
            match &self.mutation_root {
                Some(root) => root.clone(),
                None => {
                    return error_body(&["Schema is not configured for mutations.".to_string()])
                }
            }
        } else {
            self.query_root.clone()
        };

        let mut pos = open;
        let selections = parse_selection_set(&tokens, &mut pos);
        let mut errors = Vec::new();
        let data = self.evaluate(&root, &selections, &mut errors);

        if errors.is_empty() {
            json!({ "data": data })
        } else if self.strict {
            error_body(&errors)
        } else {
            let mut body = error_body(&errors);
            body["data"] = Value::Object(data);
            body
        }
    }

    fn evaluate(
        &self,
        type_name: &str,
        selections: &[Selection],
        errors: &mut Vec<String>,
    ) -> Map<String, Value> {
        let mut object = Map::new();
        for selection in selections {
            let key = selection.alias.as_ref().unwrap_or(&selection.name).clone();
            if selection.name == "__typename" {
                object.insert(key, Value::String(type_name.to_string()));
                continue;
            }

            let Some(def) = self
                .types
                .get(type_name)
                .and_then(|fields| fields.iter().find(|f| f.name == selection.name))
            else {
                errors.push(self.not_found_message(type_name, &selection.name));
                continue;
            };

            if let Some((arg, arg_type)) = self
                .required_args
                .get(&(type_name.to_string(), def.name.clone()))
            {
                errors.push(format!(
                    "Field \"{}\" argument \"{arg}\" of type \"{arg_type}\" is required, but it was not provided.",
                    def.name
                ));
                continue;
            }

            let value = if self.leaves.contains(&def.base) {
                if selection.children.is_some() {
                    errors.push(format!(
                        "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                        def.name, def.written
                    ));
                    continue;
                }
                leaf_value(&def.base)
            } else {
                let Some(children) = &selection.children else {
                    errors.push(format!(
                        "Field \"{0}\" of type \"{1}\" must have a selection of subfields. Did you mean \"{0} {{ ... }}\"?",
                        def.name, def.written
                    ));
                    continue;
                };
                Value::Object(self.evaluate(&def.base, children, errors))
            };

            let value = if def.is_list {
                Value::Array(vec![value])
            } else {
                value
            };
            object.insert(key, value);
        }
        object
    }

    fn not_found_message(&self, type_name: &str, field: &str) -> String {
        let mut message = format!("Cannot query field \"{field}\" on type \"{type_name}\".");
        if let Some(names) = self.suggestions.get(field) {
            let quoted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
            message.push_str(&format!(" Did you mean {}?", quoted.join(" or ")));
        }
        message
    }
}

#[async_trait]
impl QueryTransport for SchemaServer {
    async fn send_query(&self, _endpoint: &str, query: &str) -> Result<GraphQLResponse> {
        self.log.record(query);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(GraphQLResponse::from_value(self.respond(query)))
    }
}

fn error_body(messages: &[String]) -> Value {
    let errors: Vec<Value> = messages
        .iter()
        .map(|message| json!({ "message": message }))
        .collect();
    json!({ "errors": errors })
}

fn leaf_value(type_name: &str) -> Value {
    match type_name {
        "Int" => json!(1),
        "Float" => json!(1.5),
        "Boolean" => json!(true),
        "ID" => json!("1"),
        _ => json!("value"),
    }
}

fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in query.chars() {
        if c == '_' || c.is_ascii_alphanumeric() {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if matches!(c, '{' | '}' | ':') {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parses the selection set opening at `tokens[*pos]`, leaving `pos` after
/// its closing brace.
fn parse_selection_set(tokens: &[String], pos: &mut usize) -> Vec<Selection> {
    let mut selections = Vec::new();
    *pos += 1;
    while let Some(token) = tokens.get(*pos) {
        if token == "}" {
            *pos += 1;
            break;
        }

        let mut name = token.clone();
        let mut alias = None;
        *pos += 1;
        if tokens.get(*pos).is_some_and(|t| t == ":") {
            alias = Some(name);
            name = tokens.get(*pos + 1).cloned().unwrap_or_default();
            *pos += 2;
        }

        let children = if tokens.get(*pos).is_some_and(|t| t == "{") {
            Some(parse_selection_set(tokens, pos))
        } else {
            None
        };
        selections.push(Selection {
            alias,
            name,
            children,
        });
    }
    selections
}
