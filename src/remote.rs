//! Deployment API abstraction consumed by pools and managers.
//!
//! The remote deployment engine exposes four primitives for a named
//! deployment: create it empty, replace its goal, read its current state, and
//! delete it. [`Client`] implements them over HTTP; tests substitute a
//! scripted implementation.

use std::future::Future;
use std::pin::Pin;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use crate::client::{Client, ClientError};
use crate::deploy::{DeploymentGoal, DeploymentState};

/// Future returned by deployment API operations.
pub type ApiFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Remote operations on a named deployment within an organisation.
pub trait DeploymentApi: Send + Sync {
    /// Error type returned by the implementation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates an empty deployment.
    fn create_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, (), Self::Error>;

    /// Replaces the deployment's goal with `goal`.
    fn push_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
        goal: &'a DeploymentGoal,
    ) -> ApiFuture<'a, (), Self::Error>;

    /// Fetches the deployment's current state.
    fn get_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, DeploymentState, Self::Error>;

    /// Deletes the deployment.
    fn delete_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, (), Self::Error>;
}

fn deployment_path(organisation: &str, name: &str) -> String {
    format!("deployments/api/v3/orgs/{organisation}/deployments/{name}")
}

impl Client {
    async fn send_goal(
        &self,
        method: Method,
        organisation: &str,
        name: &str,
        goal: &DeploymentGoal,
    ) -> Result<(), ClientError> {
        let document = goal.to_document().map_err(|err| ClientError::Encode {
            message: err.to_string(),
        })?;
        let request = self
            .request(method, &deployment_path(organisation, name))
            .header(CONTENT_TYPE, "application/json")
            .body(document);
        self.send(request).await?;
        Ok(())
    }
}

impl DeploymentApi for Client {
    type Error = ClientError;

    fn create_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.send_goal(Method::PUT, organisation, name, &DeploymentGoal::new())
                .await
        })
    }

    fn push_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
        goal: &'a DeploymentGoal,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move { self.send_goal(Method::POST, organisation, name, goal).await })
    }

    fn get_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, DeploymentState, Self::Error> {
        Box::pin(async move {
            let response = self
                .send(self.request(Method::GET, &deployment_path(organisation, name)))
                .await?;
            let body = response.bytes().await?;
            Ok(DeploymentState::from_document(&body)?)
        })
    }

    fn delete_deployment<'a>(
        &'a self,
        organisation: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.send(self.request(Method::DELETE, &deployment_path(organisation, name)))
                .await?;
            Ok(())
        })
    }
}
