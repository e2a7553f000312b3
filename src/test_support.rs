//! Test support utilities shared across unit and integration tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::deploy::{DeploymentGoal, DeploymentState, InstanceStatus, PoolKey};
use crate::remote::{ApiFuture, DeploymentApi};

/// Error returned by [`ScriptedDeploymentApi`] when a failure is scripted.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted {operation} failure")]
pub struct ScriptedApiError {
    /// Operation that was scripted to fail.
    pub operation: String,
}

/// Records a single call made through [`ScriptedDeploymentApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiCall {
    /// Operation name (`create`, `push`, `get` or `delete`).
    pub operation: &'static str,
    /// Deployment the call targeted.
    pub key: PoolKey,
}

#[derive(Debug, Default)]
struct Script {
    fail_create: u32,
    fail_push: u32,
    fail_get: u32,
    fail_delete: u32,
    panic_get: bool,
    push_delay: Option<Duration>,
    get_delay: Option<Duration>,
    delete_delay: Option<Duration>,
    deployments: BTreeMap<PoolKey, DeploymentGoal>,
    reported: BTreeMap<PoolKey, DeploymentState>,
    pushes: Vec<DeploymentGoal>,
    calls: Vec<ApiCall>,
    completed_gets: u32,
}

/// In-memory deployment API with scripted failures and delays.
///
/// Pushed goals are remembered per deployment. Unless a state is scripted
/// with [`ScriptedDeploymentApi::report_state`], `get` reports every pushed
/// instance as running, with the instance id as hostname.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDeploymentApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDeploymentApi {
    /// Creates an API that succeeds at everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails the next `count` create calls.
    pub fn fail_create(&self, count: u32) {
        self.script().fail_create = count;
    }

    /// Fails the next `count` push calls.
    pub fn fail_push(&self, count: u32) {
        self.script().fail_push = count;
    }

    /// Fails the next `count` get calls.
    pub fn fail_get(&self, count: u32) {
        self.script().fail_get = count;
    }

    /// Fails the next `count` delete calls.
    pub fn fail_delete(&self, count: u32) {
        self.script().fail_delete = count;
    }

    /// Makes the next get call panic inside the API.
    pub fn panic_on_get(&self) {
        self.script().panic_get = true;
    }

    /// Delays every push call by `delay`, before it is accepted or rejected.
    pub fn delay_push(&self, delay: Duration) {
        self.script().push_delay = Some(delay);
    }

    /// Delays every get call by `delay`.
    pub fn delay_get(&self, delay: Duration) {
        self.script().get_delay = Some(delay);
    }

    /// Delays every delete call by `delay`.
    pub fn delay_delete(&self, delay: Duration) {
        self.script().delete_delay = Some(delay);
    }

    /// Scripts the state reported for `organisation/name`.
    pub fn report_state(&self, organisation: &str, name: &str, state: DeploymentState) {
        self.script()
            .reported
            .insert(PoolKey::new(organisation, name), state);
    }

    /// Returns the goal last accepted for `organisation/name`, if the
    /// deployment exists.
    #[must_use]
    pub fn deployment(&self, organisation: &str, name: &str) -> Option<DeploymentGoal> {
        self.script()
            .deployments
            .get(&PoolKey::new(organisation, name))
            .cloned()
    }

    /// Returns true when `organisation/name` exists remotely.
    #[must_use]
    pub fn exists(&self, organisation: &str, name: &str) -> bool {
        self.deployment(organisation, name).is_some()
    }

    /// Returns every goal accepted by push, oldest first.
    #[must_use]
    pub fn pushes(&self) -> Vec<DeploymentGoal> {
        self.script().pushes.clone()
    }

    /// Returns every call made so far, including failed ones.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.script().calls.clone()
    }

    /// Counts calls of `operation`.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Counts get calls that ran to completion, excluding aborted ones.
    #[must_use]
    pub fn completed_gets(&self) -> u32 {
        self.script().completed_gets
    }

    fn record(&self, operation: &'static str, organisation: &str, name: &str) -> PoolKey {
        let key = PoolKey::new(organisation, name);
        self.script().calls.push(ApiCall {
            operation,
            key: key.clone(),
        });
        key
    }
}

fn take_failure(counter: &mut u32, operation: &str) -> Result<(), ScriptedApiError> {
    if *counter == 0 {
        return Ok(());
    }
    *counter -= 1;
    Err(ScriptedApiError {
        operation: operation.to_owned(),
    })
}

fn running_state(goal: &DeploymentGoal) -> DeploymentState {
    goal.iter()
        .map(|(id, vm)| {
            (
                id.to_owned(),
                InstanceStatus {
                    deployer: String::from("scripted"),
                    app: vm.app.clone(),
                    version: vm.version.clone(),
                    hostname: id.to_owned(),
                    ip: String::from("10.0.0.1"),
                    urls: vec![format!("http://{id}")],
                },
            )
        })
        .collect()
}

impl DeploymentApi for ScriptedDeploymentApi {
    type Error = ScriptedApiError;

    fn create_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let key = self.record("create", organisation, name);
            let mut script = self.script();
            take_failure(&mut script.fail_create, "create")?;
            script.deployments.insert(key, DeploymentGoal::new());
            Ok(())
        })
    }

    fn push_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
        goal: &'a DeploymentGoal,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let key = self.record("push", organisation, name);
            let delay = self.script().push_delay;
            if let Some(duration) = delay {
                sleep(duration).await;
            }
            let mut script = self.script();
            take_failure(&mut script.fail_push, "push")?;
            script.deployments.insert(key, goal.clone());
            script.pushes.push(goal.clone());
            Ok(())
        })
    }

    fn get_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, DeploymentState, Self::Error> {
        Box::pin(async move {
            let key = self.record("get", organisation, name);
            let (delay, should_panic) = {
                let mut script = self.script();
                take_failure(&mut script.fail_get, "get")?;
                (script.get_delay, std::mem::take(&mut script.panic_get))
            };
            if let Some(duration) = delay {
                sleep(duration).await;
            }
            assert!(!should_panic, "scripted get panic");

            let mut script = self.script();
            script.completed_gets += 1;
            if let Some(state) = script.reported.get(&key) {
                return Ok(state.clone());
            }
            Ok(script
                .deployments
                .get(&key)
                .map(running_state)
                .unwrap_or_default())
        })
    }

    fn delete_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let key = self.record("delete", organisation, name);
            let delay = {
                let mut script = self.script();
                take_failure(&mut script.fail_delete, "delete")?;
                script.delete_delay
            };
            if let Some(duration) = delay {
                sleep(duration).await;
            }
            self.script().deployments.remove(&key);
            Ok(())
        })
    }
}

/// Builds a status with only the hostname set.
#[must_use]
pub fn status_with_hostname(hostname: &str) -> InstanceStatus {
    InstanceStatus {
        hostname: hostname.to_owned(),
        ..InstanceStatus::default()
    }
}
