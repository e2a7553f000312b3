//! A manually managed deployment of instances.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::PoolKey;
use super::error::DeployError;
use super::goal::{DeploymentGoal, Vm};
use super::id::InstanceIdSource;
use super::manager::Registry;
use super::state::{DeploymentState, InstanceStatus};
use crate::remote::DeploymentApi;

/// Describes an instance to spawn.
///
/// `app` is the full application path within the organisation's repository.
/// `version` must be a concrete version id, not a tag; resolve tags first with
/// [`resolve_version_to_id`](crate::apps::resolve_version_to_id).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpawnArgs {
    /// Platform to run the instance on.
    pub platform: String,
    /// Application path.
    pub app: String,
    /// Version id.
    pub version: String,
}

impl SpawnArgs {
    /// Creates spawn arguments.
    #[must_use]
    pub fn new(
        platform: impl Into<String>,
        app: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            app: app.into(),
            version: version.into(),
        }
    }
}

impl From<SpawnArgs> for Vm {
    fn from(value: SpawnArgs) -> Self {
        Self {
            platform: value.platform,
            app: value.app,
            version: value.version,
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    goal: DeploymentGoal,
    observed: DeploymentState,
}

/// Client-side handle to one remote deployment.
///
/// Every mutation holds the pool's write lock for its full duration,
/// including the network round-trip, so at most one push or fetch per pool is
/// in flight. Reads take the shared lock.
pub struct Pool<A: DeploymentApi> {
    key: PoolKey,
    api: Arc<A>,
    registry: Weak<Registry<A>>,
    ids: Arc<dyn InstanceIdSource>,
    timeout: Duration,
    // `None` once the remote deployment has been deleted.
    state: RwLock<Option<PoolState>>,
}

impl<A: DeploymentApi> fmt::Debug for Pool<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("key", &self.key)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<A> Pool<A>
where
    A: DeploymentApi + 'static,
{
    pub(super) fn new(
        key: PoolKey,
        api: Arc<A>,
        registry: Weak<Registry<A>>,
        ids: Arc<dyn InstanceIdSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            key,
            api,
            registry,
            ids,
            timeout,
            state: RwLock::new(Some(PoolState::default())),
        }
    }

    /// Returns the pool's deployment key.
    #[must_use]
    pub const fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Returns the alphabetised ids in the goal state.
    ///
    /// Instances scheduled but not yet provisioned are included; instances
    /// already destroyed are excluded even if they still run remotely.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Closed`] once the pool has been closed.
    pub async fn instances(&self) -> Result<Vec<String>, DeployError<A::Error>> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(DeployError::Closed)?;
        Ok(state.goal.ids().map(str::to_owned).collect())
    }

    /// Adds a new instance and returns its generated id.
    ///
    /// The goal is only replaced once the remote API accepts it; on failure
    /// the pool keeps its previous goal.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Closed`] when the pool or its manager is closed
    /// and [`DeployError::Remote`] when the push fails.
    pub async fn spawn(&self, args: SpawnArgs) -> Result<String, DeployError<A::Error>> {
        self.ensure_manager_open()?;
        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(DeployError::Closed)?;

        let id = self.ids.next_id();
        let mut next = state.goal.copy();
        next.attach(id.clone(), Vm::from(args));
        self.push(&next, "spawn", &id).await?;
        state.goal = next;

        info!(deployment = %self.key, instance = %id, "instance spawned");
        Ok(id)
    }

    /// Removes the instance named by `id`.
    ///
    /// Removing an unknown id still pushes the unchanged goal. The goal is
    /// only replaced once the remote API accepts it, so after a failed push
    /// `id` is still listed by [`Pool::instances`].
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Closed`] when the pool or its manager is closed
    /// and [`DeployError::Remote`] when the push fails.
    pub async fn destroy(&self, id: &str) -> Result<(), DeployError<A::Error>> {
        self.ensure_manager_open()?;
        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(DeployError::Closed)?;

        let mut next = state.goal.copy();
        next.detach(id);
        self.push(&next, "destroy", id).await?;
        state.goal = next;

        info!(deployment = %self.key, instance = %id, "instance destroyed");
        Ok(())
    }

    /// Returns the status of `id`.
    ///
    /// An instance that is in the goal but has not reported yet yields an
    /// empty status.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InstanceNotFound`] when `id` is in neither the
    /// goal nor the observed state, and [`DeployError::Closed`] once the pool
    /// has been closed.
    pub async fn status(&self, id: &str) -> Result<InstanceStatus, DeployError<A::Error>> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(DeployError::Closed)?;
        if let Some(status) = state.observed.get(id) {
            return Ok(status.clone());
        }
        if state.goal.contains(id) {
            return Ok(InstanceStatus::default());
        }
        Err(DeployError::InstanceNotFound { id: id.to_owned() })
    }

    /// Returns a copy of the last observed state.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Closed`] once the pool has been closed.
    pub async fn observed(&self) -> Result<DeploymentState, DeployError<A::Error>> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(DeployError::Closed)?;
        Ok(state.observed.clone())
    }

    /// Refreshes the observed state from the remote API.
    ///
    /// The fetch runs on its own task and is aborted if it outlives the
    /// pool's timeout, in which case the observed state is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Timeout`] when the fetch exceeds the timeout,
    /// [`DeployError::Remote`] when it fails, [`DeployError::Task`] when the
    /// task dies, and [`DeployError::Closed`] once the pool or its manager
    /// has been closed.
    pub async fn update(&self) -> Result<(), DeployError<A::Error>> {
        self.ensure_manager_open()?;
        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(DeployError::Closed)?;

        let api = Arc::clone(&self.api);
        let key = self.key.clone();
        let observed = self
            .bounded("update", async move {
                api.get_deployment(&key.organisation, &key.name).await
            })
            .await?;

        debug!(deployment = %self.key, instances = observed.len(), "observed state refreshed");
        state.observed = observed;
        Ok(())
    }

    /// Deletes the remote deployment and releases the pool from its manager.
    ///
    /// Closing an already closed pool succeeds without contacting the API. On
    /// failure the pool stays open and registered.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Timeout`] when the delete exceeds the timeout,
    /// [`DeployError::Remote`] when it fails, and [`DeployError::Task`] when
    /// the task dies.
    pub async fn close(&self) -> Result<(), DeployError<A::Error>> {
        let mut guard = self.state.write().await;
        if guard.is_none() {
            return Ok(());
        }

        let api = Arc::clone(&self.api);
        let key = self.key.clone();
        self.bounded("close", async move {
            api.delete_deployment(&key.organisation, &key.name).await
        })
        .await?;

        *guard = None;
        drop(guard);

        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.key).await;
        }
        info!(deployment = %self.key, "pool closed");
        Ok(())
    }

    /// Returns true once [`Pool::close`] has succeeded.
    pub async fn is_closed(&self) -> bool {
        self.state.read().await.is_none()
    }

    fn ensure_manager_open(&self) -> Result<(), DeployError<A::Error>> {
        if self
            .registry
            .upgrade()
            .is_none_or(|registry| registry.is_closed())
        {
            return Err(DeployError::Closed);
        }
        Ok(())
    }

    async fn push(
        &self,
        goal: &DeploymentGoal,
        operation: &str,
        instance: &str,
    ) -> Result<(), DeployError<A::Error>> {
        goal.push(self.api.as_ref(), &self.key.organisation, &self.key.name)
            .await
            .map_err(|err| {
                warn!(
                    deployment = %self.key,
                    instance,
                    operation,
                    error = %err,
                    "goal push rejected"
                );
                DeployError::Remote(err)
            })
    }

    /// Runs `call` on its own task, aborting it once the timeout elapses.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T, DeployError<A::Error>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, A::Error>> + Send + 'static,
    {
        let mut task = tokio::spawn(call);
        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(result)) => result.map_err(DeployError::Remote),
            Ok(Err(join_error)) => {
                warn!(deployment = %self.key, operation, error = %join_error, "remote task failed");
                Err(DeployError::Task {
                    operation: operation.to_owned(),
                    message: join_error.to_string(),
                })
            }
            Err(_elapsed) => {
                task.abort();
                warn!(
                    deployment = %self.key,
                    operation,
                    timeout = ?self.timeout,
                    "remote call timed out"
                );
                Err(DeployError::Timeout {
                    operation: operation.to_owned(),
                    deployment: self.key.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
