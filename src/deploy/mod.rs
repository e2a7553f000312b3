//! Deployment reconciliation: goal state, observed state, pools, managers.
//!
//! A [`Manager`] owns every [`Pool`] it creates. Each pool tracks the goal
//! state it last pushed for one named deployment and the observed state it
//! last fetched. Closing a pool deletes the remote deployment; closing the
//! manager closes every pool it still owns.

mod error;
mod goal;
mod id;
mod manager;
mod pool;
mod state;

use std::fmt;

pub use error::DeployError;
pub use goal::{DeploymentGoal, Vm};
pub use id::{INSTANCE_ID_BYTES, InstanceIdSource, RandomInstanceIds};
pub use manager::{DEFAULT_REMOTE_TIMEOUT, Manager};
pub use pool::{Pool, SpawnArgs};
pub use state::{DeploymentState, InstanceStatus, StateParseError, get_deployment};

/// Identifies a deployment by organisation and name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PoolKey {
    /// Organisation owning the deployment.
    pub organisation: String,
    /// Deployment name within the organisation.
    pub name: String,
}

impl PoolKey {
    /// Creates a key from an organisation and deployment name.
    #[must_use]
    pub fn new(organisation: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            organisation: organisation.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.organisation, self.name)
    }
}
