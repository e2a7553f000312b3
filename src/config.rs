//! Configuration loading via `ortho-config`.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::client::{Credentials, OFFICIAL_DOMAIN};

/// Account and endpoint settings derived from environment variables and
/// configuration files.
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "VMS",
    discovery(
        app_name = "vms",
        env_var = "VMS_CONFIG_PATH",
        config_file_name = "vms.toml",
        dotfile_name = ".vms.toml",
        project_file_name = "vms.toml"
    )
)]
pub struct VmsConfig {
    /// API domain including the scheme. Defaults to the official service.
    #[ortho_config(default = OFFICIAL_DOMAIN.to_owned())]
    pub domain: String,
    /// Domain hosting the public app market.
    #[ortho_config(default = OFFICIAL_DOMAIN.to_owned())]
    pub market_domain: String,
    /// Account name used to log in.
    #[ortho_config(default = String::new())]
    pub username: String,
    /// Account password used to log in.
    #[ortho_config(default = String::new())]
    pub password: String,
    /// Organisation owning apps, platforms and deployments.
    #[ortho_config(default = String::new())]
    pub organisation: String,
}

impl std::fmt::Debug for VmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmsConfig")
            .field("domain", &self.domain)
            .field("market_domain", &self.market_domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("organisation", &self.organisation)
            .finish()
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl VmsConfig {
    /// Builds a configuration for `organisation` on the official domain.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        organisation: impl Into<String>,
    ) -> Self {
        Self {
            domain: OFFICIAL_DOMAIN.to_owned(),
            market_domain: OFFICIAL_DOMAIN.to_owned(),
            username: username.into(),
            password: password.into(),
            organisation: organisation.into(),
        }
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("vms")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to vms.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Checks that every value needed to log in is present. Error messages
    /// name the environment variable and `vms.toml` key to set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for the first empty field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.domain,
            &FieldMetadata::new("API domain", "VMS_DOMAIN", "domain"),
        )?;
        Self::require_field(
            &self.username,
            &FieldMetadata::new("account username", "VMS_USERNAME", "username"),
        )?;
        Self::require_field(
            &self.password,
            &FieldMetadata::new("account password", "VMS_PASSWORD", "password"),
        )?;
        Self::require_field(
            &self.organisation,
            &FieldMetadata::new("organisation", "VMS_ORGANISATION", "organisation"),
        )?;
        Ok(())
    }

    /// Returns the login credentials after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required value is empty.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.validate()?;
        Ok(Credentials::new(&self.username, &self.password))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
