//! # Restproxy Core
//!
//! `restproxy-core` is the foundational library powering the Restproxy CLI. It turns an abstract
//! description of a REST service (a [`ServiceContract`]) into a client: callers invoke operations
//! by name with positional arguments and receive deserialized results, while the library builds
//! the URI, performs the HTTP call, keeps session cookies, re-authenticates on `401` and
//! (de)serializes JSON.
//!
//! ## Key Components
//!
//! * **[`RestProxyManager`]:** The main entry point. It owns one [`Session`] per base URI, verifies
//!   contracts once per type and hands out typed clients ([`Contract`]) or untyped [`RestProxy`]s.
//! * **[`RestProxy`]:** The dispatch table. [`RestProxy::invoke`] resolves the route, executes the
//!   request and rebuilds the declared return shape as an [`ActionResult`].
//! * **[`ServiceContract`], [`Operation`] & [`Parameter`]:** Immutable descriptors of the remote
//!   interface, built in code or loaded from JSON.
//!
//! ## Internal building blocks
//!
//! * **[`route`]:** The pure route resolver (`[controller]`/`[action]` tokens, `{placeholders}`,
//!   query strings).
//! * **[`rest`]:** The session, its cookie jar and the request executor with the single
//!   re-authentication retry.
//!
//! ## Example
//!
//! ```rust,no_run
//! use restproxy_core::{
//!     ActionResult, Arguments, Contract, HttpVerb, Operation, Parameter, ProxyError,
//!     RestProxy, RestProxyManager, ReturnShape, ServiceContract, SessionConfig,
//! };
//!
//! struct UsersClient(RestProxy);
//!
//! impl Contract for UsersClient {
//!     fn contract() -> ServiceContract {
//!         ServiceContract::builder("IUsersController")
//!             .route("api/[controller]")
//!             .operation(
//!                 Operation::builder("GetUser", HttpVerb::Get)
//!                     .route("api/[controller]/{id}")
//!                     .parameter(Parameter::new("id", "u64"))
//!                     .returns(ReturnShape::async_payload("User"))
//!                     .build(),
//!             )
//!             .build()
//!     }
//!
//!     fn from_proxy(proxy: RestProxy) -> Self {
//!         Self(proxy)
//!     }
//! }
//!
//! impl UsersClient {
//!     async fn get_user(&self, id: u64) -> Result<ActionResult<serde_json::Value>, ProxyError> {
//!         self.0.invoke("GetUser", Arguments::new().with(&id)?).await
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = RestProxyManager::new(SessionConfig::new("http://localhost:8080/"))?;
//! let users: UsersClient = manager.create_client(true)?;
//! let user = users.get_user(42).await?;
//! println!("{:?}", user.value);
//! # Ok(())
//! # }
//! ```
pub mod contract;
pub mod error;
pub mod manager;
pub mod proxy;
pub mod rest;
pub mod route;

pub use contract::{
    HttpVerb, Operation, Parameter, ParameterSource, ResultType, ReturnShape, ServiceContract,
};
pub use error::{ConfigurationError, ProxyError, RemoteCallError};
pub use rest::{RequestDescriptor, Session, SessionBuilder, SessionConfig, TlsTrust};
pub use manager::{Contract, RestProxyManager};
pub use proxy::{ActionResult, Arguments, CallOutcome, RestProxy};

// Re-exports
pub use reqwest;
pub use serde_json;

/// Type alias for the standard boxed error used as a wrapped cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
