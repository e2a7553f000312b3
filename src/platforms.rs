//! Platform catalog queries.

use serde::Deserialize;
use tracing::debug;

use crate::client::{Client, ClientError};

/// A platform an organisation can deploy to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Platform {
    /// Platform name used in deployment goals.
    #[serde(alias = "Name")]
    pub name: String,
    /// Hypervisor or provider type.
    #[serde(default, rename = "type", alias = "Type")]
    pub kind: String,
}

/// Lists the platforms visible to `organisation`.
///
/// # Errors
///
/// Returns the client's request errors when the listing fails.
pub async fn list_platforms(
    client: &Client,
    organisation: &str,
) -> Result<Vec<Platform>, ClientError> {
    let path = format!("platforms/api/v3/orgs/{organisation}/platforms/");
    client.get_json(&path, &[]).await
}

/// Reports whether `platform` is visible to `organisation`.
///
/// # Errors
///
/// Returns the client's request errors when the listing fails.
pub async fn platform_exists(
    client: &Client,
    organisation: &str,
    platform: &str,
) -> Result<bool, ClientError> {
    let platforms = list_platforms(client, organisation).await?;
    debug!(org = organisation, listed = platforms.len(), "platforms listed");
    Ok(platforms.iter().any(|entry| entry.name == platform))
}
