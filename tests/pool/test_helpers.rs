//! Shared fixtures for pool BDD scenarios.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rstest::fixture;
use tokio::runtime::Runtime;
use vms::deploy::{DeployError, Manager, Pool};
use vms::test_support::{ScriptedApiError, ScriptedDeploymentApi};

pub const ORGANISATION: &str = "acme";
pub const DEPLOYMENT: &str = "web";
pub const STEP_TIMEOUT: Duration = Duration::from_millis(100);

pub type ScriptedManager = Manager<ScriptedDeploymentApi>;
pub type ScriptedPool = Pool<ScriptedDeploymentApi>;

/// Coarse classification of a failed pool or manager operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    Remote,
    Timeout,
    Closed,
    Other,
}

impl FailureKind {
    pub const fn of(err: &DeployError<ScriptedApiError>) -> Self {
        match err {
            DeployError::Remote(_) => Self::Remote,
            DeployError::Timeout { .. } => Self::Timeout,
            DeployError::Closed => Self::Closed,
            _ => Self::Other,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "remote" => Some(Self::Remote),
            "timeout" => Some(Self::Timeout),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// State shared by the steps of one scenario.
///
/// Everything is behind shared handles, so clones handed between steps see
/// the same pool, manager and outcome.
#[derive(Clone, Debug)]
pub struct PoolContext {
    pub runtime: Arc<Runtime>,
    pub api: ScriptedDeploymentApi,
    pub manager: Arc<ScriptedManager>,
    pub pool: Arc<Mutex<Option<Arc<ScriptedPool>>>>,
    pub last_failure: Arc<Mutex<Option<FailureKind>>>,
}

impl PoolContext {
    pub fn pool(&self) -> Option<Arc<ScriptedPool>> {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_pool(&self, pool: Arc<ScriptedPool>) {
        *self.pool.lock().unwrap_or_else(PoisonError::into_inner) = Some(pool);
    }

    pub fn record<T>(&self, result: Result<T, DeployError<ScriptedApiError>>) {
        *self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = result.err().as_ref().map(FailureKind::of);
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        *self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[fixture]
pub fn pool_context() -> PoolContext {
    let runtime = Runtime::new().unwrap_or_else(|err| panic!("tokio runtime: {err}"));
    let api = ScriptedDeploymentApi::new();
    let manager = Manager::new(api.clone()).with_timeout(STEP_TIMEOUT);
    PoolContext {
        runtime: Arc::new(runtime),
        api,
        manager: Arc::new(manager),
        pool: Arc::new(Mutex::new(None)),
        last_failure: Arc::new(Mutex::new(None)),
    }
}
