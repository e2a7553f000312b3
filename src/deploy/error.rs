//! Error types for pools and managers.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by [`Pool`](super::Pool) and [`Manager`](super::Manager)
/// operations.
#[derive(Debug, Error)]
pub enum DeployError<ApiError>
where
    ApiError: std::error::Error + 'static,
{
    /// Raised when the deployment API rejects or fails a call.
    #[error("deployment API call failed: {0}")]
    Remote(#[source] ApiError),
    /// Raised when a bounded remote call exceeds its time budget.
    #[error("{operation} of deployment {deployment} timed out after {timeout:?}")]
    Timeout {
        /// Operation that timed out (`update` or `close`).
        operation: String,
        /// Deployment key (`organisation::name`).
        deployment: String,
        /// Budget that was exceeded.
        timeout: Duration,
    },
    /// Raised when the manager or pool has already been closed.
    #[error("deployment manager or pool is closed")]
    Closed,
    /// Raised when an instance id is in neither the goal nor the observed
    /// state.
    #[error("instance id {id} not found in pool")]
    InstanceNotFound {
        /// Requested instance id.
        id: String,
    },
    /// Raised when a manager already owns a pool with the same key.
    #[error("pool {key} is already managed")]
    PoolExists {
        /// Deployment key (`organisation::name`).
        key: String,
    },
    /// Raised when the isolated task running a remote call fails abnormally.
    #[error("{operation} task failed: {message}")]
    Task {
        /// Operation the task was running.
        operation: String,
        /// Description of the failure.
        message: String,
    },
}
