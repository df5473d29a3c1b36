//! # Service Contract Descriptors
//!
//! This module defines the immutable descriptor table that replaces runtime reflection:
//! a [`ServiceContract`] names a remote interface and lists its [`Operation`]s, each of which
//! declares its HTTP verb, route template, [`Parameter`]s and [`ReturnShape`].
//!
//! Descriptors are plain data. They can be built in code through the builders or loaded from
//! JSON, and they are checked by [`verify::verify`] before any proxy is created from them.
//!
//! ## Example
//!
//! ```rust
//! use restproxy_core::{HttpVerb, Operation, Parameter, ReturnShape, ServiceContract};
//!
//! let contract = ServiceContract::builder("IOrdersController")
//!     .route("api/[controller]/[action]")
//!     .operation(
//!         Operation::builder("Search", HttpVerb::Get)
//!             .parameter(Parameter::new("term", "String").in_query())
//!             .returns(ReturnShape::async_payload("Vec<Order>"))
//!             .build(),
//!     )
//!     .build();
//!
//! assert!(contract.operation("Search").is_some());
//! ```
pub mod verify;

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP verb marker declared on an operation.
///
/// `Head` and `Options` can be declared but are rejected when the operation is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    /// Whether requests with this verb are allowed to carry a body.
    pub fn allows_body(self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Head => "HEAD",
            HttpVerb::Options => "OPTIONS",
        };
        f.write_str(name)
    }
}

/// Where the value of a parameter goes in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Route,
    Query,
    Body,
}

/// A single parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// The declared source. `None` behaves like [`ParameterSource::Route`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ParameterSource>,
    /// Name of the declared type, kept for documentation and diagnostics.
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    /// Creates a parameter with no declared source.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            type_name: type_name.into(),
        }
    }

    /// Declares the source of this parameter.
    pub fn with_source(mut self, source: ParameterSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn in_route(self) -> Self {
        self.with_source(ParameterSource::Route)
    }

    pub fn in_query(self) -> Self {
        self.with_source(ParameterSource::Query)
    }

    pub fn in_body(self) -> Self {
        self.with_source(ParameterSource::Body)
    }

    pub fn is_route(&self) -> bool {
        matches!(self.source, None | Some(ParameterSource::Route))
    }

    pub fn is_query(&self) -> bool {
        self.source == Some(ParameterSource::Query)
    }

    pub fn is_body(&self) -> bool {
        self.source == Some(ParameterSource::Body)
    }
}

/// The declared result type of an operation, inside its (optional) asynchronous marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// The status-bearing action result wrapper, optionally carrying a payload type.
    ActionResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },
    /// Any other type. Contracts declaring it fail verification.
    Other(String),
}

impl ResultType {
    pub fn is_action_result(&self) -> bool {
        matches!(self, ResultType::ActionResult { .. })
    }

    /// The payload type name, if this is an action result carrying one.
    pub fn payload(&self) -> Option<&str> {
        match self {
            ResultType::ActionResult { payload } => payload.as_deref(),
            ResultType::Other(_) => None,
        }
    }
}

/// The declared return shape of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    /// A value of the result type.
    Value(ResultType),
    /// An asynchronous value of the result type.
    Async(ResultType),
    /// The bare asynchronous marker: completion only, no result.
    AsyncUnit,
}

impl ReturnShape {
    /// An asynchronous action result carrying a payload of the named type.
    pub fn async_payload(type_name: impl Into<String>) -> Self {
        ReturnShape::Async(ResultType::ActionResult {
            payload: Some(type_name.into()),
        })
    }

    /// An action result carrying a payload of the named type.
    pub fn payload(type_name: impl Into<String>) -> Self {
        ReturnShape::Value(ResultType::ActionResult {
            payload: Some(type_name.into()),
        })
    }

    /// An asynchronous action result with no payload.
    pub fn async_status() -> Self {
        ReturnShape::Async(ResultType::ActionResult { payload: None })
    }

    /// The result type behind the asynchronous marker, if any.
    pub fn result_type(&self) -> Option<&ResultType> {
        match self {
            ReturnShape::Value(result) | ReturnShape::Async(result) => Some(result),
            ReturnShape::AsyncUnit => None,
        }
    }

    /// Whether a successful response body must be deserialized for this shape.
    pub fn has_payload(&self) -> bool {
        self.result_type().and_then(ResultType::payload).is_some()
    }
}

impl Default for ReturnShape {
    fn default() -> Self {
        ReturnShape::async_status()
    }
}

/// One remote-callable method of a service contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    /// Every HTTP verb marker declared on the operation. A valid operation declares exactly one.
    pub verbs: Vec<HttpVerb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub returns: ReturnShape,
}

impl Operation {
    pub fn builder(name: impl Into<String>, verb: HttpVerb) -> OperationBuilder {
        OperationBuilder {
            operation: Operation {
                name: name.into(),
                verbs: vec![verb],
                route: None,
                parameters: Vec::new(),
                returns: ReturnShape::default(),
            },
        }
    }

    /// The single declared verb, or `None` if the operation declares zero or several.
    pub fn verb(&self) -> Option<HttpVerb> {
        match self.verbs.as_slice() {
            [verb] => Some(*verb),
            _ => None,
        }
    }

    /// Position and descriptor of the first body-sourced parameter.
    pub fn body_parameter(&self) -> Option<(usize, &Parameter)> {
        self.parameters.iter().enumerate().find(|(_, p)| p.is_body())
    }
}

/// Builder for [`Operation`].
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    /// Declares an additional verb marker.
    pub fn verb(mut self, verb: HttpVerb) -> Self {
        self.operation.verbs.push(verb);
        self
    }

    pub fn route(mut self, template: impl Into<String>) -> Self {
        self.operation.route = Some(template.into());
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.operation.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.operation.returns = shape;
        self
    }

    pub fn build(self) -> Operation {
        self.operation
    }
}

/// An abstract description of a remote interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceContract {
    pub name: String,
    /// Contract-level route template, used by operations without their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub operations: Vec<Operation>,
}

impl ServiceContract {
    pub fn builder(name: impl Into<String>) -> ServiceContractBuilder {
        ServiceContractBuilder {
            contract: ServiceContract {
                name: name.into(),
                route: None,
                operations: Vec::new(),
            },
        }
    }

    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// The route template that applies to `operation`: its own, else the contract's.
    pub fn route_template<'a>(&'a self, operation: &'a Operation) -> Option<&'a str> {
        operation.route.as_deref().or(self.route.as_deref())
    }
}

/// Builder for [`ServiceContract`].
#[derive(Debug, Clone)]
pub struct ServiceContractBuilder {
    contract: ServiceContract,
}

impl ServiceContractBuilder {
    pub fn route(mut self, template: impl Into<String>) -> Self {
        self.contract.route = Some(template.into());
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.contract.operations.push(operation);
        self
    }

    pub fn build(self) -> ServiceContract {
        self.contract
    }
}
