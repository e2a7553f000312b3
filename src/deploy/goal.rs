//! Goal state: the set of instances a deployment should run.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::remote::DeploymentApi;

const SUBTREE_TYPE: &str = "subtree";
const VM_TYPE: &str = "vm";

/// Specification of one instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vm {
    /// Platform the instance runs on.
    pub platform: String,
    /// Full application path within the organisation's repository.
    pub app: String,
    /// Concrete version id of the application (not a tag).
    pub version: String,
}

impl Vm {
    /// Creates an instance specification.
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

#[derive(Serialize)]
struct VmDocument<'a> {
    platform: &'a str,
    app: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'a str,
    customization: Option<()>,
}

#[derive(Serialize)]
struct GoalDocument<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    children: BTreeMap<&'a str, VmDocument<'a>>,
}

/// Desired state of a deployment, keyed by instance id.
///
/// Specifications are shared between copies, so [`DeploymentGoal::copy`] is
/// cheap and mutating a copy never touches the original.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeploymentGoal {
    children: BTreeMap<String, Arc<Vm>>,
}

impl DeploymentGoal {
    /// Creates an empty goal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the specification for `id`.
    pub fn attach(&mut self, id: impl Into<String>, vm: impl Into<Arc<Vm>>) {
        self.children.insert(id.into(), vm.into());
    }

    /// Removes `id`, returning its specification when it was present.
    pub fn detach(&mut self, id: &str) -> Option<Arc<Vm>> {
        self.children.remove(id)
    }

    /// Returns an independent snapshot with the same entries.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Returns the specification for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Vm> {
        self.children.get(id).map(AsRef::as_ref)
    }

    /// Returns true when `id` is part of the goal.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    /// Iterates instance ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Iterates entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vm)> {
        self.children
            .iter()
            .map(|(id, vm)| (id.as_str(), vm.as_ref()))
    }

    /// Number of instances in the goal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true when the goal holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Renders the goal as the subtree document accepted by the deployment
    /// API.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn to_document(&self) -> Result<String, serde_json::Error> {
        let children = self
            .children
            .iter()
            .map(|(id, vm)| {
                (
                    id.as_str(),
                    VmDocument {
                        platform: &vm.platform,
                        app: &vm.app,
                        kind: VM_TYPE,
                        version: &vm.version,
                        customization: None,
                    },
                )
            })
            .collect();
        serde_json::to_string(&GoalDocument {
            kind: SUBTREE_TYPE,
            children,
        })
    }

    /// Replaces the remote goal of `organisation/name` with this snapshot.
    ///
    /// # Errors
    ///
    /// Returns the API's error when the push is rejected.
    pub async fn push<A>(&self, api: &A, organisation: &str, name: &str) -> Result<(), A::Error>
    where
        A: DeploymentApi + ?Sized,
    {
        api.push_deployment(organisation, name, self).await
    }
}
