//! BDD step definitions for pools and their manager.

use std::time::Duration;

use rstest_bdd_macros::{given, then, when};
use vms::deploy::{DeployError, SpawnArgs};
use vms::test_support::ScriptedApiError;

use super::test_helpers::{DEPLOYMENT, FailureKind, ORGANISATION, PoolContext, ScriptedPool};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn open_pool(context: &PoolContext) -> Result<std::sync::Arc<ScriptedPool>, StepError> {
    context
        .pool()
        .ok_or_else(|| StepError::Assertion(String::from("no pool was created")))
}

fn spawn_args() -> SpawnArgs {
    SpawnArgs::new("kvm", "acme/web", "v1")
}

#[given("a manager with an open pool")]
fn manager_with_pool(pool_context: PoolContext) -> PoolContext {
    let manager = std::sync::Arc::clone(&pool_context.manager);
    let pool = pool_context
        .runtime
        .block_on(async move { manager.new_pool(ORGANISATION, DEPLOYMENT).await })
        .unwrap_or_else(|err| panic!("pool should be created: {err}"));
    pool_context.set_pool(pool);
    pool_context
}

#[given("the next push is rejected")]
fn next_push_rejected(pool_context: PoolContext) -> PoolContext {
    pool_context.api.fail_push(1);
    pool_context
}

#[given("the next delete is rejected")]
fn next_delete_rejected(pool_context: PoolContext) -> PoolContext {
    pool_context.api.fail_delete(1);
    pool_context
}

#[given("the deployment API is slow to report")]
fn slow_reports(pool_context: PoolContext) -> PoolContext {
    pool_context.api.delay_get(Duration::from_secs(5));
    pool_context
}

#[when("I spawn \"{count}\" instances")]
fn spawn_instances(pool_context: PoolContext, count: usize) -> Result<PoolContext, StepError> {
    let pool = open_pool(&pool_context)?;
    let result = pool_context.runtime.block_on(async move {
        for _ in 0..count {
            pool.spawn(spawn_args()).await?;
        }
        Ok::<(), DeployError<ScriptedApiError>>(())
    });
    pool_context.record(result);
    Ok(pool_context)
}

#[when("I refresh the pool")]
fn refresh_pool(pool_context: PoolContext) -> Result<PoolContext, StepError> {
    let pool = open_pool(&pool_context)?;
    let result = pool_context
        .runtime
        .block_on(async move { pool.update().await });
    pool_context.record(result);
    Ok(pool_context)
}

#[when("I close the manager")]
fn close_manager(pool_context: PoolContext) -> PoolContext {
    let manager = std::sync::Arc::clone(&pool_context.manager);
    let result = pool_context
        .runtime
        .block_on(async move { manager.close().await });
    pool_context.record(result);
    pool_context
}

#[then("the pool lists \"{count}\" instances")]
fn pool_lists(pool_context: &PoolContext, count: usize) -> Result<(), StepError> {
    let pool = open_pool(pool_context)?;
    let instances = pool_context
        .runtime
        .block_on(async move { pool.instances().await })
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    if instances.len() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} instances, got {instances:?}"
        )))
    }
}

#[then("every instance reports a hostname")]
fn every_instance_has_hostname(pool_context: &PoolContext) -> Result<(), StepError> {
    let pool = open_pool(pool_context)?;
    let missing = pool_context
        .runtime
        .block_on(async move {
            let mut missing = Vec::new();
            for id in pool.instances().await? {
                if pool.status(&id).await?.hostname.is_empty() {
                    missing.push(id);
                }
            }
            Ok::<_, DeployError<ScriptedApiError>>(missing)
        })
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "instances without hostname: {missing:?}"
        )))
    }
}

#[then("the pool has no observed instances")]
fn no_observed_instances(pool_context: &PoolContext) -> Result<(), StepError> {
    let pool = open_pool(pool_context)?;
    let observed = pool_context
        .runtime
        .block_on(async move { pool.observed().await })
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    if observed.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no observed instances, got {observed:?}"
        )))
    }
}

#[then("the operation fails with \"{kind}\"")]
fn operation_fails_with(pool_context: &PoolContext, kind: String) -> Result<(), StepError> {
    let expected = FailureKind::parse(&kind)
        .ok_or_else(|| StepError::Assertion(format!("unknown failure kind: {kind}")))?;
    match pool_context.last_failure() {
        Some(actual) if actual == expected => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {expected:?} failure, got {other:?}"
        ))),
    }
}

#[then("the remote deployment is deleted")]
fn deployment_deleted(pool_context: &PoolContext) -> Result<(), StepError> {
    if pool_context.api.exists(ORGANISATION, DEPLOYMENT) {
        return Err(StepError::Assertion(String::from(
            "remote deployment still exists",
        )));
    }
    let manager = std::sync::Arc::clone(&pool_context.manager);
    let remaining = pool_context
        .runtime
        .block_on(async move { manager.pools().await });
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "manager still owns {remaining:?}"
        )))
    }
}

#[then("the manager still owns the pool")]
fn manager_owns_pool(pool_context: &PoolContext) -> Result<(), StepError> {
    let manager = std::sync::Arc::clone(&pool_context.manager);
    let owned = pool_context
        .runtime
        .block_on(async move { manager.pool(ORGANISATION, DEPLOYMENT).await });
    if owned.is_some() && pool_context.api.exists(ORGANISATION, DEPLOYMENT) {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "pool should stay registered after a failed close",
        )))
    }
}

#[then("spawning fails because the pool is closed")]
fn spawning_fails_closed(pool_context: &PoolContext) -> Result<(), StepError> {
    let pool = open_pool(pool_context)?;
    let result = pool_context
        .runtime
        .block_on(async move { pool.spawn(spawn_args()).await });
    match result {
        Err(DeployError::Closed) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected Closed, got {other:?}"
        ))),
    }
}
