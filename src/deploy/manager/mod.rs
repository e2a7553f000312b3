//! Owner of every pool created during a session.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::PoolKey;
use super::error::DeployError;
use super::id::{InstanceIdSource, RandomInstanceIds};
use super::pool::Pool;
use crate::remote::DeploymentApi;

/// Time budget applied to pool updates and teardown.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

/// Pools owned by a manager, plus its closed flag.
pub(super) struct Registry<A: DeploymentApi> {
    // Mirrors the flag under `pools` so callers can fail fast without locking.
    closed: AtomicBool,
    pools: Mutex<BTreeMap<PoolKey, Arc<Pool<A>>>>,
}

impl<A: DeploymentApi> Registry<A> {
    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(super) async fn remove(&self, key: &PoolKey) {
        self.pools.lock().await.remove(key);
    }
}

/// Creates pools and guarantees their cleanup.
///
/// Everything created through a manager is deleted from the remote platform
/// when [`Manager::close`] succeeds.
pub struct Manager<A: DeploymentApi> {
    api: Arc<A>,
    ids: Arc<dyn InstanceIdSource>,
    timeout: Duration,
    registry: Arc<Registry<A>>,
}

impl<A: DeploymentApi> fmt::Debug for Manager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("timeout", &self.timeout)
            .field("closed", &self.registry.is_closed())
            .finish_non_exhaustive()
    }
}

impl<A> Manager<A>
where
    A: DeploymentApi + 'static,
{
    /// Creates a manager using `api` for every remote call.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::with_shared_api(Arc::new(api))
    }

    /// Creates a manager from an API handle shared with other components.
    #[must_use]
    pub fn with_shared_api(api: Arc<A>) -> Self {
        Self {
            api,
            ids: Arc::new(RandomInstanceIds),
            timeout: DEFAULT_REMOTE_TIMEOUT,
            registry: Arc::new(Registry {
                closed: AtomicBool::new(false),
                pools: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Overrides the time budget for pool updates and teardown.
    ///
    /// Applies to pools created afterwards.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides how instance ids are generated.
    ///
    /// Applies to pools created afterwards.
    #[must_use]
    pub fn with_id_source(mut self, ids: impl InstanceIdSource + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Returns the API handle shared by this manager's pools.
    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Returns true once [`Manager::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.registry.is_closed()
    }

    /// Creates an empty remote deployment and returns the pool managing it.
    ///
    /// The manager lock is held across the remote create call, so pool
    /// creation is serialised per manager.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Closed`] when the manager is closed,
    /// [`DeployError::PoolExists`] when the key is already managed, and
    /// [`DeployError::Remote`] when the remote create fails.
    pub async fn new_pool(
        &self,
        organisation: &str,
        name: &str,
    ) -> Result<Arc<Pool<A>>, DeployError<A::Error>> {
        if self.registry.is_closed() {
            return Err(DeployError::Closed);
        }

        let key = PoolKey::new(organisation, name);
        let mut pools = self.registry.pools.lock().await;
        if self.registry.is_closed() {
            return Err(DeployError::Closed);
        }
        if pools.contains_key(&key) {
            return Err(DeployError::PoolExists {
                key: key.to_string(),
            });
        }

        self.api
            .create_deployment(&key.organisation, &key.name)
            .await
            .map_err(DeployError::Remote)?;

        let pool = Arc::new(Pool::new(
            key.clone(),
            Arc::clone(&self.api),
            Arc::downgrade(&self.registry),
            Arc::clone(&self.ids),
            self.timeout,
        ));
        pools.insert(key, Arc::clone(&pool));
        info!(deployment = %pool.key(), "pool created");
        Ok(pool)
    }

    /// Returns the pool registered under `organisation/name`.
    pub async fn pool(&self, organisation: &str, name: &str) -> Option<Arc<Pool<A>>> {
        let key = PoolKey::new(organisation, name);
        self.registry.pools.lock().await.get(&key).cloned()
    }

    /// Returns the keys of every pool still owned by the manager, sorted.
    pub async fn pools(&self) -> Vec<PoolKey> {
        self.registry.pools.lock().await.keys().cloned().collect()
    }

    /// Stops the manager from creating pools and closes every pool it owns.
    ///
    /// Every pool is attempted even when an earlier one fails; the first
    /// failure is returned. Pools that fail to close stay registered, so a
    /// later call retries them. Once none remain, calling again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeployError`] raised by [`Pool::close`].
    pub async fn close(&self) -> Result<(), DeployError<A::Error>> {
        let snapshot: Vec<Arc<Pool<A>>> = {
            let pools = self.registry.pools.lock().await;
            self.registry.closed.store(true, Ordering::Release);
            pools.values().cloned().collect()
        };

        let mut first_error = None;
        for pool in snapshot {
            if let Err(err) = pool.close().await {
                warn!(deployment = %pool.key(), error = %err, "failed to close pool");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
