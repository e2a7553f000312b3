//! Binary entry point for the VMS CLI.

mod cli;

use std::io::{self, Write};
use std::process;

use camino::Utf8Path;
use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use vms::apps::{app_exists, resolve_version_to_id};
use vms::client::{Client, ClientError};
use vms::config::{ConfigError, VmsConfig};
use vms::deploy::{DeployError, InstanceStatus, Manager, Pool, SpawnArgs};
use vms::market::MarketClient;
use vms::platforms::platform_exists;

use cli::{AppCommand, Cli, DeployCommand, PlatformCommand, PullCommand, ResolveVersionCommand};

const LOG_ENV_VAR: &str = "VMS_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("request failed: {0}")]
    Client(#[from] ClientError),
    #[error("deployment failed: {0}")]
    Deploy(#[from] DeployError<ClientError>),
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: &'static str, name: String },
    #[error("invalid output path '{0}': expected a file name")]
    InvalidOutput(String),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(&cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

async fn dispatch(cli: &Cli) -> Result<(), CliError> {
    let config = VmsConfig::load_without_cli_args()?;
    match cli {
        Cli::AppExists(command) => run_app_exists(&config, command).await,
        Cli::ResolveVersion(command) => run_resolve_version(&config, command).await,
        Cli::PlatformExists(command) => run_platform_exists(&config, command).await,
        Cli::Pull(command) => run_pull(&config, command).await,
        Cli::Deploy(command) => run_deploy(&config, command).await,
    }
}

async fn login(config: &VmsConfig) -> Result<Client, CliError> {
    let credentials = config.credentials()?;
    Ok(Client::authenticate(&config.domain, &credentials).await?)
}

async fn run_app_exists(config: &VmsConfig, command: &AppCommand) -> Result<(), CliError> {
    let client = login(config).await?;
    let exists = app_exists(&client, &config.organisation, &command.app).await?;
    writeln!(io::stdout(), "{exists}")?;
    Ok(())
}

async fn run_resolve_version(
    config: &VmsConfig,
    command: &ResolveVersionCommand,
) -> Result<(), CliError> {
    let client = login(config).await?;
    let id = resolve_version_to_id(
        &client,
        &config.organisation,
        &command.app,
        &command.version,
    )
    .await?;
    writeln!(io::stdout(), "{id}")?;
    Ok(())
}

async fn run_platform_exists(config: &VmsConfig, command: &PlatformCommand) -> Result<(), CliError> {
    let client = login(config).await?;
    let exists = platform_exists(&client, &config.organisation, &command.platform).await?;
    writeln!(io::stdout(), "{exists}")?;
    Ok(())
}

async fn run_pull(config: &VmsConfig, command: &PullCommand) -> Result<(), CliError> {
    let (dir, file_name) = split_output(&command.output)?;
    let written = MarketClient::new(&config.market_domain)
        .download(&command.project, &command.version)
        .await?
        .write_to(dir, file_name)
        .await?;
    info!(project = %command.project, bytes = written, "pull complete");
    Ok(())
}

fn split_output(output: &str) -> Result<(&Utf8Path, &str), CliError> {
    let path = Utf8Path::new(output);
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidOutput(output.to_owned()))?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    Ok((dir, file_name))
}

async fn run_deploy(config: &VmsConfig, command: &DeployCommand) -> Result<(), CliError> {
    let client = login(config).await?;
    let organisation = config.organisation.as_str();
    if !platform_exists(&client, organisation, &command.platform).await? {
        return Err(CliError::NotFound {
            kind: "platform",
            name: command.platform.clone(),
        });
    }
    if !app_exists(&client, organisation, &command.app).await? {
        return Err(CliError::NotFound {
            kind: "app",
            name: command.app.clone(),
        });
    }
    let version = resolve_version_to_id(&client, organisation, &command.app, &command.version)
        .await?;

    let manager = Manager::new(client);
    let name = command.name.clone().unwrap_or_else(default_deployment_name);
    let outcome = match manager.new_pool(organisation, &name).await {
        Ok(pool) => populate(&pool, command, &version).await,
        Err(err) => Err(err.into()),
    };
    let closed = manager.close().await;

    outcome?;
    closed?;
    Ok(())
}

async fn populate(
    pool: &Pool<Client>,
    command: &DeployCommand,
    version: &str,
) -> Result<(), CliError> {
    for _ in 0..command.count {
        pool.spawn(SpawnArgs::new(&command.platform, &command.app, version))
            .await?;
    }
    pool.update().await?;

    let mut lines = Vec::new();
    for id in pool.instances().await? {
        let status = pool.status(&id).await?;
        lines.push(render_instance(&id, &status));
    }
    let mut stdout = io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}

fn default_deployment_name() -> String {
    format!("vms-{}", Uuid::new_v4())
}

fn render_instance(id: &str, status: &InstanceStatus) -> String {
    if status.is_empty() {
        return format!("{id}\tpending");
    }
    format!(
        "{id}\t{}\t{}\t{}",
        status.hostname,
        status.ip,
        status.urls.join(",")
    )
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
