//! # Dynamic Dispatch
//!
//! A [`RestProxy`] is the dispatch table of one verified [`ServiceContract`]: operations are
//! looked up by name and invoked with positional [`Arguments`].
//!
//! Each invocation goes through the same steps:
//!
//! 1. The operation is looked up and the argument count checked.
//! 2. The body is taken from the body-sourced parameter, if its argument is not `null`.
//! 3. The URI is resolved by [`crate::route::resolve`].
//! 4. The request is executed by the [`RequestExecutor`] (with its single `401` retry).
//! 5. The response body is rebuilt into the declared [`ReturnShape`].
//!
//! Every registered observer is notified exactly once with the final [`CallOutcome`]. Remote
//! failures are either propagated or, when the proxy was created without `throw_on_failure`,
//! replaced by an empty [`ActionResult`]. Configuration errors are always propagated.
use crate::contract::{Operation, ReturnShape, ServiceContract};
use crate::error::{ConfigurationError, ProxyError, RemoteCallError};
use crate::rest::{RequestDescriptor, RequestExecutor, Session};
use crate::route;
use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Positional arguments of an invocation, as JSON values. `null` means absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the JSON form of `value`.
    pub fn with<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ConfigurationError> {
        self.0.push(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Appends an absent argument.
    pub fn null(mut self) -> Self {
        self.0.push(Value::Null);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// The result of an invocation: the response status and the deserialized payload.
///
/// The default value, with neither, is what a non-throwing proxy returns on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult<T> {
    pub status: Option<StatusCode>,
    pub value: Option<T>,
}

impl<T> Default for ActionResult<T> {
    fn default() -> Self {
        Self {
            status: None,
            value: None,
        }
    }
}

impl<T> ActionResult<T> {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.value.is_none()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// What observers are told once an invocation has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub success: bool,
    pub status: Option<StatusCode>,
    pub message: Option<String>,
}

impl CallOutcome {
    fn from_result<T>(result: &Result<ActionResult<T>, ProxyError>) -> Self {
        match result {
            Ok(action) => Self {
                success: true,
                status: action.status,
                message: None,
            },
            Err(err) => Self {
                success: false,
                status: err.status(),
                message: Some(err.to_string()),
            },
        }
    }
}

/// Callback notified once per finished invocation.
pub type Observer = Arc<dyn Fn(&CallOutcome) + Send + Sync>;

/// Untyped client of one service contract.
#[derive(Clone)]
pub struct RestProxy {
    contract: Arc<ServiceContract>,
    executor: RequestExecutor,
    observers: Arc<[Observer]>,
    throw_on_failure: bool,
}

impl std::fmt::Debug for RestProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestProxy")
            .field("contract", &self.contract.name)
            .field("session", self.executor.session())
            .field("observers", &self.observers.len())
            .field("throw_on_failure", &self.throw_on_failure)
            .finish()
    }
}

impl RestProxy {
    /// Creates a proxy over an already verified contract.
    pub(crate) fn new(
        contract: Arc<ServiceContract>,
        session: Session,
        observers: Arc<[Observer]>,
        throw_on_failure: bool,
    ) -> Self {
        Self {
            contract,
            executor: RequestExecutor::new(session),
            observers,
            throw_on_failure,
        }
    }

    pub fn contract(&self) -> &ServiceContract {
        &self.contract
    }

    pub fn session(&self) -> &Session {
        self.executor.session()
    }

    pub fn throws_on_failure(&self) -> bool {
        self.throw_on_failure
    }

    /// Invokes the operation named `operation` with positional `args`.
    ///
    /// Payloads are decoded with `serde_json`, which matches property names case-sensitively;
    /// payload types declare other casings with `#[serde(rename_all = ...)]` or `#[serde(alias)]`.
    ///
    /// # Returns
    ///
    /// * `Ok(ActionResult)` - The status and, for payload-bearing shapes, the decoded body. An
    ///   empty result if a remote failure was swallowed.
    /// * `Err(ProxyError::Configuration)` - The operation is unknown, the arguments do not fit,
    ///   or the request cannot be built.
    /// * `Err(ProxyError::Remote)` - The call failed and the proxy throws on failure.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: Arguments,
    ) -> Result<ActionResult<T>, ProxyError> {
        let result = self.dispatch(operation, args.as_slice()).await;

        let outcome = CallOutcome::from_result(&result);
        for observer in self.observers.iter() {
            observer(&outcome);
        }

        match result {
            Err(ProxyError::Remote(err)) if !self.throw_on_failure => {
                tracing::warn!(
                    contract = %self.contract.name,
                    operation,
                    status = ?err.status,
                    error = %err,
                    "remote call failed, returning an empty result"
                );
                Ok(ActionResult::default())
            }
            result => result,
        }
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        name: &str,
        args: &[Value],
    ) -> Result<ActionResult<T>, ProxyError> {
        let operation =
            self.contract
                .operation(name)
                .ok_or_else(|| ConfigurationError::UnknownOperation {
                    contract: self.contract.name.clone(),
                    operation: name.to_string(),
                })?;

        if args.len() != operation.parameters.len() {
            return Err(ConfigurationError::ArgumentCount {
                operation: operation.name.clone(),
                expected: operation.parameters.len(),
                actual: args.len(),
            }
            .into());
        }

        let request = self.build_request(operation, args)?;

        tracing::debug!(
            contract = %self.contract.name,
            operation = %operation.name,
            verb = %request.verb,
            uri = %request.uri,
            "dispatching operation"
        );

        let response = self.executor.execute(&request).await?;
        let status = response.status();

        if operation.returns == ReturnShape::AsyncUnit {
            return Ok(ActionResult {
                status: Some(status),
                value: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| RemoteCallError::new(Some(status), err.to_string()).with_source(err))?;

        let value = if operation.returns.has_payload() && !body.trim().is_empty() {
            let value = serde_json::from_str(&body).map_err(|err| {
                RemoteCallError::new(
                    Some(status),
                    format!("Failed to decode the response of '{}': {err}", operation.name),
                )
                .with_source(err)
            })?;
            Some(value)
        } else {
            None
        };

        Ok(ActionResult {
            status: Some(status),
            value,
        })
    }

    fn build_request(
        &self,
        operation: &Operation,
        args: &[Value],
    ) -> Result<RequestDescriptor, ConfigurationError> {
        let verb = operation
            .verb()
            .ok_or_else(|| ConfigurationError::InvalidOperation {
                contract: self.contract.name.clone(),
                operation: operation.name.clone(),
                reason: "exactly one HTTP verb must be declared".to_string(),
            })?;

        let body = operation
            .body_parameter()
            .and_then(|(index, _)| args.get(index))
            .filter(|value| !value.is_null())
            .map(serde_json::to_string)
            .transpose()?;

        let uri = route::resolve(&self.contract, operation, args)?.uri();

        Ok(RequestDescriptor { verb, uri, body })
    }
}
