//! Observed state decoded from the deployment API.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::remote::DeploymentApi;

/// Status reported for one running instance.
///
/// Absent and `null` fields both decode as empty values.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct InstanceStatus {
    /// Deployer responsible for the instance.
    #[serde(deserialize_with = "null_as_default")]
    pub deployer: String,
    /// Application path the instance runs.
    #[serde(deserialize_with = "null_as_default")]
    pub app: String,
    /// Application version the instance runs.
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    /// Hostname assigned to the instance.
    #[serde(deserialize_with = "null_as_default")]
    pub hostname: String,
    /// IP address assigned to the instance.
    #[serde(deserialize_with = "null_as_default")]
    pub ip: String,
    /// URLs exposed by the instance.
    #[serde(deserialize_with = "null_as_default")]
    pub urls: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl InstanceStatus {
    /// Returns true for the placeholder status of a scheduled instance that
    /// has not reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Errors raised while decoding a state document.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StateParseError {
    /// Raised when the body is not a JSON object.
    #[error("state document is not valid JSON: {message}")]
    Malformed {
        /// Decoder error message.
        message: String,
    },
    /// Raised when the top-level `state` key is absent.
    #[error("missing 'state' key")]
    MissingState,
    /// Raised when a child entry carries no `vm` object.
    #[error("child '{id}' has no 'vm' entry")]
    MissingVm {
        /// Instance id of the offending child.
        id: String,
    },
    /// Raised when a `vm` object does not decode into a status.
    #[error("child '{id}' has an invalid 'vm' entry: {message}")]
    InvalidStatus {
        /// Instance id of the offending child.
        id: String,
        /// Decoder error message.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct StatePayload {
    #[serde(default)]
    children: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    urls: Option<Vec<String>>,
}

/// Last-known status of every instance of a deployment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeploymentState {
    children: BTreeMap<String, InstanceStatus>,
    urls: Vec<String>,
}

impl DeploymentState {
    /// Decodes a state document of the shape
    /// `{"state":{"children":{<id>:{"vm":{..}}},"urls":[..]}}`.
    ///
    /// # Errors
    ///
    /// Returns [`StateParseError`] when the document is not an object, has no
    /// `state` key, or a child lacks a decodable `vm` entry.
    pub fn from_document(document: &[u8]) -> Result<Self, StateParseError> {
        let root: Map<String, Value> =
            serde_json::from_slice(document).map_err(|err| StateParseError::Malformed {
                message: err.to_string(),
            })?;
        let state = root.get("state").ok_or(StateParseError::MissingState)?;
        if state.is_null() {
            return Ok(Self::default());
        }

        let payload =
            StatePayload::deserialize(state).map_err(|err| StateParseError::Malformed {
                message: err.to_string(),
            })?;

        let mut children = BTreeMap::new();
        for (id, child) in payload.children.unwrap_or_default() {
            let Some(vm) = child.get("vm") else {
                return Err(StateParseError::MissingVm { id });
            };
            let status = match Option::<InstanceStatus>::deserialize(vm) {
                Ok(status) => status.unwrap_or_default(),
                Err(err) => {
                    return Err(StateParseError::InvalidStatus {
                        id,
                        message: err.to_string(),
                    });
                }
            };
            children.insert(id, status);
        }

        Ok(Self {
            children,
            urls: payload.urls.unwrap_or_default(),
        })
    }

    /// Returns the status observed for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&InstanceStatus> {
        self.children.get(id)
    }

    /// Returns true when `id` has reported state.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    /// Iterates observed instances in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstanceStatus)> {
        self.children
            .iter()
            .map(|(id, status)| (id.as_str(), status))
    }

    /// URLs reported for the deployment as a whole.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Number of observed instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true when no instance has reported state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl FromIterator<(String, InstanceStatus)> for DeploymentState {
    fn from_iter<T: IntoIterator<Item = (String, InstanceStatus)>>(iter: T) -> Self {
        Self {
            children: iter.into_iter().collect(),
            urls: Vec::new(),
        }
    }
}

/// Fetches the observed state of `organisation/name`.
///
/// # Errors
///
/// Returns the API's error when the fetch fails or the document is malformed.
pub async fn get_deployment<A>(
    api: &A,
    organisation: &str,
    name: &str,
) -> Result<DeploymentState, A::Error>
where
    A: DeploymentApi + ?Sized,
{
    api.get_deployment(organisation, name).await
}
