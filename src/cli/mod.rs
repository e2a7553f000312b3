//! Command-line interface definitions for the `vms` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `vms` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vms",
    about = "Query the VMS catalog and run short-lived VM deployments",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Report whether an application exists in the organisation.
    #[command(name = "app-exists", about = "Report whether an application exists")]
    AppExists(AppCommand),
    /// Resolve a version tag or id to a version id.
    #[command(
        name = "resolve-version",
        about = "Resolve a version tag or id to a version id"
    )]
    ResolveVersion(ResolveVersionCommand),
    /// Report whether a platform exists in the organisation.
    #[command(name = "platform-exists", about = "Report whether a platform exists")]
    PlatformExists(PlatformCommand),
    /// Download an application from the public market.
    #[command(name = "pull", about = "Download an application from the market")]
    Pull(PullCommand),
    /// Deploy instances, report their status, then tear the deployment down.
    #[command(
        name = "deploy",
        about = "Deploy instances, report their status, then tear them down"
    )]
    Deploy(DeployCommand),
}

/// Arguments naming an application.
#[derive(Debug, Parser)]
pub(crate) struct AppCommand {
    /// Application path within the organisation (for example `team/web`).
    #[arg(value_name = "APP")]
    pub(crate) app: String,
}

/// Arguments for `vms resolve-version`.
#[derive(Debug, Parser)]
pub(crate) struct ResolveVersionCommand {
    /// Application path within the organisation.
    #[arg(value_name = "APP")]
    pub(crate) app: String,
    /// Version id or tag; the latest version when omitted.
    #[arg(long, value_name = "TAG_OR_ID", default_value = "")]
    pub(crate) version: String,
}

/// Arguments for `vms platform-exists`.
#[derive(Debug, Parser)]
pub(crate) struct PlatformCommand {
    /// Platform name.
    #[arg(value_name = "PLATFORM")]
    pub(crate) platform: String,
}

/// Arguments for `vms pull`.
#[derive(Debug, Parser)]
pub(crate) struct PullCommand {
    /// Market project (for example `vorteil/nginx`).
    #[arg(value_name = "PROJECT")]
    pub(crate) project: String,
    /// Reference to download; the market default when omitted.
    #[arg(long, value_name = "REF", default_value = "")]
    pub(crate) version: String,
    /// File to write the artifact to.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub(crate) output: String,
}

/// Arguments for `vms deploy`.
#[derive(Debug, Parser)]
pub(crate) struct DeployCommand {
    /// Platform to run the instances on.
    #[arg(long, value_name = "PLATFORM")]
    pub(crate) platform: String,
    /// Application path within the organisation.
    #[arg(long, value_name = "APP")]
    pub(crate) app: String,
    /// Version id or tag; the latest version when omitted.
    #[arg(long, value_name = "TAG_OR_ID", default_value = "")]
    pub(crate) version: String,
    /// Number of instances to spawn.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub(crate) count: u32,
    /// Deployment name; generated when omitted.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
}
