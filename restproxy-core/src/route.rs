//! # Route Resolution
//!
//! Turns an operation, its contract and the call arguments into the relative URI of the request.
//!
//! 1. The operation's route template is selected (falling back to the contract's).
//! 2. `[controller]` and `[action]` tokens are replaced by the contract and operation names.
//! 3. `{name}` placeholders are replaced, in template order, by the stringified value of the
//!    route-sourced parameter with the same name, percent-encoded as a path segment. Catch-all
//!    placeholders (`{*path}`) keep their `/` separators.
//! 4. Query-sourced parameters are appended as `?a=1&b=2`, in declaration order.
//!
//! Resolution is pure: it never touches the session or the network.
use crate::contract::{Operation, ServiceContract};
use crate::error::ConfigurationError;
use serde_json::Value;
use url::form_urlencoded;

const INTERFACE_MARKER: char = 'I';
const CONTROLLER_SUFFIX: &str = "Controller";

/// The resolved path and query string of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    /// Either empty or starting with `?`.
    pub query: String,
}

impl ResolvedRoute {
    /// The relative URI: path followed by the query string.
    pub fn uri(&self) -> String {
        format!("{}{}", self.path, self.query)
    }
}

/// Resolves the route of `operation` for the given positional arguments.
///
/// Arguments missing at the end of `args` are treated as `null`.
pub fn resolve(
    contract: &ServiceContract,
    operation: &Operation,
    args: &[Value],
) -> Result<ResolvedRoute, ConfigurationError> {
    let template = contract
        .route_template(operation)
        .ok_or_else(|| ConfigurationError::MissingRoute(operation.name.clone()))?;

    let template = template
        .replace("[action]", &operation.name)
        .replace("[controller]", controller_name(&contract.name));

    let path = substitute_placeholders(&template, operation, args)?;
    let query = build_query(operation, args);

    Ok(ResolvedRoute { path, query })
}

/// The contract name as used by the `[controller]` token.
///
/// A leading interface marker (`I` followed by an uppercase letter) and a trailing `Controller`
/// suffix are removed: `IUsersController` becomes `Users`.
pub fn controller_name(contract: &str) -> &str {
    let mut name = contract;

    if let Some(rest) = name.strip_prefix(INTERFACE_MARKER)
        && rest.starts_with(|c: char| c.is_ascii_uppercase())
    {
        name = rest;
    }

    name.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(name)
}

/// The textual form of an argument in a URI: strings verbatim, `null` as empty, anything else
/// as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn substitute_placeholders(
    template: &str,
    operation: &Operation,
    args: &[Value],
) -> Result<String, ConfigurationError> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        resolved.push_str(&rest[..start]);

        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigurationError::UnterminatedPlaceholder(template.to_string()))?;

        let placeholder = &after[..end];
        let name = placeholder_name(placeholder);
        let index = operation
            .parameters
            .iter()
            .position(|p| p.is_route() && p.name == name)
            .ok_or_else(|| ConfigurationError::UnmatchedPlaceholder {
                operation: operation.name.clone(),
                placeholder: name.to_string(),
            })?;

        let value = stringify(args.get(index).unwrap_or(&Value::Null));
        if placeholder.starts_with('*') {
            let segments: Vec<String> = value.split('/').map(encode_segment).collect();
            resolved.push_str(&segments.join("/"));
        } else {
            resolved.push_str(&encode_segment(&value));
        }
        rest = &after[end + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}

/// Percent-encodes a single path segment. Spaces become `%20`, never `+`.
fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Strips catch-all stars, constraints, defaults and the optional marker: `{*id:int=1?}` names `id`.
fn placeholder_name(placeholder: &str) -> &str {
    let name = placeholder.trim_start_matches('*');
    let name = name.split([':', '=']).next().unwrap_or(name);
    name.trim_end_matches('?').trim()
}

fn build_query(operation: &Operation, args: &[Value]) -> String {
    let mut query = String::new();

    for (index, parameter) in operation.parameters.iter().enumerate() {
        if !parameter.is_query() {
            continue;
        }

        query.push(if query.is_empty() { '?' } else { '&' });
        query.push_str(&parameter.name);
        query.push('=');

        let value = stringify(args.get(index).unwrap_or(&Value::Null));
        query.extend(form_urlencoded::byte_serialize(value.as_bytes()));
    }

    query
}
