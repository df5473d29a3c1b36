#![allow(dead_code)]

use httpmock::MockServer;
use restproxy_core::{
    ActionResult, Arguments, CallOutcome, Contract, HttpVerb, Operation, Parameter, ProxyError,
    RestProxy, RestProxyManager, ReturnShape, ServiceContract, Session, SessionConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub tags: Vec<String>,
}

impl User {
    pub fn ada() -> Self {
        Self {
            id: 42,
            name: "Ada".to_string(),
            tags: vec!["admin".to_string(), "ops".to_string()],
        }
    }
}

/// Typed client used across the integration tests.
pub struct UsersClient(pub RestProxy);

impl Contract for UsersClient {
    fn contract() -> ServiceContract {
        ServiceContract::builder("IUsersController")
            .route("api/[controller]")
            .operation(
                Operation::builder("GetUser", HttpVerb::Get)
                    .route("api/[controller]/{id}/profile")
                    .parameter(Parameter::new("id", "u64"))
                    .returns(ReturnShape::async_payload("User"))
                    .build(),
            )
            .operation(
                Operation::builder("Search", HttpVerb::Get)
                    .route("api/[controller]/search")
                    .parameter(Parameter::new("page", "u32").in_query())
                    .parameter(Parameter::new("size", "u32").in_query())
                    .returns(ReturnShape::async_payload("Vec<User>"))
                    .build(),
            )
            .operation(
                Operation::builder("Create", HttpVerb::Post)
                    .parameter(Parameter::new("user", "User").in_body())
                    .returns(ReturnShape::async_payload("User"))
                    .build(),
            )
            .operation(
                Operation::builder("Remove", HttpVerb::Delete)
                    .route("api/[controller]/{id}")
                    .parameter(Parameter::new("id", "u64"))
                    .parameter(Parameter::new("reason", "String").in_body())
                    .returns(ReturnShape::async_status())
                    .build(),
            )
            .operation(
                Operation::builder("Touch", HttpVerb::Put)
                    .route("api/[controller]/{id}/touch")
                    .parameter(Parameter::new("id", "u64"))
                    .returns(ReturnShape::AsyncUnit)
                    .build(),
            )
            .operation(
                Operation::builder("Step", HttpVerb::Get)
                    .route("session/{step}")
                    .parameter(Parameter::new("step", "u32"))
                    .returns(ReturnShape::async_status())
                    .build(),
            )
            .build()
    }

    fn from_proxy(proxy: RestProxy) -> Self {
        Self(proxy)
    }
}

impl UsersClient {
    pub async fn get_user(&self, id: u64) -> Result<ActionResult<User>, ProxyError> {
        self.0.invoke("GetUser", Arguments::new().with(&id)?).await
    }

    pub async fn search(&self, page: u32, size: u32) -> Result<ActionResult<Vec<User>>, ProxyError> {
        let args = Arguments::new().with(&page)?.with(&size)?;
        self.0.invoke("Search", args).await
    }

    pub async fn create(&self, user: &User) -> Result<ActionResult<User>, ProxyError> {
        self.0.invoke("Create", Arguments::new().with(user)?).await
    }

    pub async fn remove(&self, id: u64, reason: Option<&str>) -> Result<ActionResult<()>, ProxyError> {
        let args = Arguments::new().with(&id)?.with(&reason)?;
        self.0.invoke("Remove", args).await
    }

    pub async fn touch(&self, id: u64) -> Result<ActionResult<()>, ProxyError> {
        self.0.invoke("Touch", Arguments::new().with(&id)?).await
    }

    pub async fn step(&self, step: u32) -> Result<ActionResult<()>, ProxyError> {
        self.0.invoke("Step", Arguments::new().with(&step)?).await
    }
}

pub fn config(server: &MockServer) -> SessionConfig {
    SessionConfig::new(server.base_url())
}

pub fn manager(server: &MockServer) -> RestProxyManager {
    RestProxyManager::new(config(server)).expect("Failed to create manager")
}

pub fn manager_with_session(session: Session) -> RestProxyManager {
    RestProxyManager::from_session(session)
}

/// Registers an observer collecting every outcome it is told about.
pub fn record_outcomes(manager: &mut RestProxyManager) -> Arc<Mutex<Vec<CallOutcome>>> {
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = outcomes.clone();
    manager.on_request_finished(move |outcome| sink.lock().unwrap().push(outcome.clone()));
    outcomes
}
