//! # Proxy Manager
//!
//! The [`RestProxyManager`] owns the [`Session`] of one base URI and the observers notified
//! after every call. It is the factory of typed clients: a type implementing [`Contract`]
//! describes its operations once, the manager verifies that description the first time the type
//! is requested and caches it for every later client.
use crate::contract::{ServiceContract, verify};
use crate::error::ConfigurationError;
use crate::proxy::{CallOutcome, Observer, RestProxy};
use crate::rest::{Session, SessionConfig};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// A typed client of a remote service.
///
/// Implementors describe the service once in [`Contract::contract`] and wrap the
/// [`RestProxy`] they are handed, exposing one typed method per operation.
pub trait Contract: Sized + 'static {
    fn contract() -> ServiceContract;

    fn from_proxy(proxy: RestProxy) -> Self;
}

pub struct RestProxyManager {
    session: Session,
    observers: Vec<Observer>,
    contracts: Mutex<HashMap<TypeId, Arc<ServiceContract>>>,
}

impl std::fmt::Debug for RestProxyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestProxyManager")
            .field("session", &self.session)
            .field("observers", &self.observers.len())
            .field("contracts", &self.contracts.lock().len())
            .finish()
    }
}

impl RestProxyManager {
    /// Creates a manager with a new session built from `config`.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigurationError> {
        Ok(Self::from_session(Session::builder(config).build()?))
    }

    /// Creates a manager around an existing session, e.g. one with re-authentication.
    pub fn from_session(session: Session) -> Self {
        Self {
            session,
            observers: Vec::new(),
            contracts: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Registers an observer notified once per invocation of every proxy created afterwards.
    pub fn on_request_finished<F>(&mut self, observer: F) -> &mut Self
    where
        F: Fn(&CallOutcome) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Creates a typed client.
    ///
    /// The contract of `C` is verified the first time it is requested; later calls reuse it.
    ///
    /// # Returns
    ///
    /// * `Ok(C)` - The client, sharing this manager's session and observers.
    /// * `Err(ConfigurationError)` - If the contract of `C` fails verification.
    pub fn create_client<C: Contract>(
        &self,
        throw_on_failure: bool,
    ) -> Result<C, ConfigurationError> {
        let contract = self.verified_contract::<C>()?;
        Ok(C::from_proxy(self.build_proxy(contract, throw_on_failure)))
    }

    /// Creates an untyped proxy for a contract known only at runtime. It is verified on every
    /// call.
    pub fn proxy(
        &self,
        contract: ServiceContract,
        throw_on_failure: bool,
    ) -> Result<RestProxy, ConfigurationError> {
        verify::verify(&contract)?;
        Ok(self.build_proxy(Arc::new(contract), throw_on_failure))
    }

    fn verified_contract<C: Contract>(&self) -> Result<Arc<ServiceContract>, ConfigurationError> {
        let key = TypeId::of::<C>();

        if let Some(contract) = self.contracts.lock().get(&key) {
            return Ok(contract.clone());
        }

        let contract = C::contract();
        verify::verify(&contract)?;
        tracing::debug!(contract = %contract.name, "verified service contract");

        let contract = Arc::new(contract);
        Ok(self
            .contracts
            .lock()
            .entry(key)
            .or_insert(contract)
            .clone())
    }

    fn build_proxy(&self, contract: Arc<ServiceContract>, throw_on_failure: bool) -> RestProxy {
        RestProxy::new(
            contract,
            self.session.clone(),
            Arc::from(self.observers.as_slice()),
            throw_on_failure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{HttpVerb, Operation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    fn health_contract() -> ServiceContract {
        ServiceContract::builder("IHealthController")
            .route("health")
            .operation(Operation::builder("Ping", HttpVerb::Get).build())
            .build()
    }

    struct Health(RestProxy);

    impl Contract for Health {
        fn contract() -> ServiceContract {
            health_contract()
        }

        fn from_proxy(proxy: RestProxy) -> Self {
            Self(proxy)
        }
    }

    struct CountedHealth(RestProxy);

    impl Contract for CountedHealth {
        fn contract() -> ServiceContract {
            BUILT.fetch_add(1, Ordering::SeqCst);
            health_contract()
        }

        fn from_proxy(proxy: RestProxy) -> Self {
            Self(proxy)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Contract for Broken {
        fn contract() -> ServiceContract {
            ServiceContract::builder("IBroken")
                .operation(Operation::builder("NoRoute", HttpVerb::Get).build())
                .build()
        }

        fn from_proxy(_: RestProxy) -> Self {
            Broken
        }
    }

    fn manager() -> RestProxyManager {
        RestProxyManager::new(SessionConfig::new("http://localhost/")).unwrap()
    }

    #[test]
    fn contract_is_built_and_verified_once_per_type() {
        let manager = manager();

        let first: CountedHealth = manager.create_client(true).unwrap();
        let second: CountedHealth = manager.create_client(false).unwrap();

        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert!(first.0.throws_on_failure());
        assert!(!second.0.throws_on_failure());
        assert_eq!(second.0.contract().name, "IHealthController");
    }

    #[test]
    fn invalid_contract_fails_client_creation() {
        let err = manager().create_client::<Broken>(true).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidOperation { .. }));
    }

    #[test]
    fn proxies_share_the_manager_session() {
        let manager = manager();
        let client: Health = manager.create_client(true).unwrap();

        client.0.session().set_cookie("sid", "abc");

        assert_eq!(manager.session().cookie("sid").as_deref(), Some("abc"));
    }
}
