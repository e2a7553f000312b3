//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn cli_without_arguments_prints_usage() {
    let mut cmd = cargo_bin_cmd!("vms");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn cli_help_lists_every_subcommand() {
    let mut cmd = cargo_bin_cmd!("vms");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("app-exists"))
        .stdout(contains("resolve-version"))
        .stdout(contains("platform-exists"))
        .stdout(contains("pull"))
        .stdout(contains("deploy"));
}

#[test]
fn pull_requires_an_output_file() {
    let mut cmd = cargo_bin_cmd!("vms");
    cmd.args(["pull", "vorteil/nginx"]);
    cmd.assert().failure().stderr(contains("--output"));
}
