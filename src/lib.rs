//! Client SDK for the VMS virtual-machine deployment platform.
//!
//! The crate logs in to a VMS domain ([`client`]), answers catalog questions
//! about applications ([`apps`]) and platforms ([`platforms`]), downloads
//! market artifacts ([`market`]), and manages running instances through the
//! [`deploy`] reconciliation layer: a [`Manager`] owns [`Pool`]s, each of which
//! pushes a goal state to one remote deployment and caches the state the
//! platform last reported.

pub mod apps;
pub mod client;
pub mod config;
pub mod deploy;
pub mod market;
pub mod platforms;
pub mod remote;
pub mod test_support;

pub use client::{Client, ClientError, Credentials, OFFICIAL_DOMAIN};
pub use config::{ConfigError, VmsConfig};
pub use deploy::{
    DeployError, DeploymentGoal, DeploymentState, InstanceStatus, Manager, Pool, PoolKey,
    SpawnArgs, Vm,
};
pub use market::{MarketClient, MarketDownload};
pub use remote::{ApiFuture, DeploymentApi};
