//! BDD scenarios for deployment pools.

use rstest_bdd_macros::scenario;

use super::test_helpers::{PoolContext, pool_context};

#[scenario(
    path = "tests/features/pool.feature",
    name = "Spawn instances and observe them running"
)]
fn scenario_spawn_and_observe(pool_context: PoolContext) {
    drop(pool_context);
}

#[scenario(
    path = "tests/features/pool.feature",
    name = "Keep the previous goal when a push is rejected"
)]
fn scenario_rejected_push(pool_context: PoolContext) {
    drop(pool_context);
}

#[scenario(
    path = "tests/features/pool.feature",
    name = "Leave observed state untouched when a refresh times out"
)]
fn scenario_refresh_timeout(pool_context: PoolContext) {
    drop(pool_context);
}

#[scenario(
    path = "tests/features/pool.feature",
    name = "Tear down every deployment when the manager closes"
)]
fn scenario_manager_close(pool_context: PoolContext) {
    drop(pool_context);
}

#[scenario(
    path = "tests/features/pool.feature",
    name = "Retry pools that failed to close"
)]
fn scenario_close_retry(pool_context: PoolContext) {
    drop(pool_context);
}
