//! Builds `vms` invocations isolated from the developer's configuration.

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;

use crate::test_constants::{ORGANISATION, PASSWORD, USERNAME};

/// Returns a `vms` command whose configuration comes only from environment
/// variables pointing at `domain`. `home` doubles as the working directory so
/// no stray `vms.toml` is discovered.
pub fn vms_command(domain: &str, home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("vms");
    cmd.current_dir(home)
        .env_clear()
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("VMS_DOMAIN", domain)
        .env("VMS_MARKET_DOMAIN", domain)
        .env("VMS_USERNAME", USERNAME)
        .env("VMS_PASSWORD", PASSWORD)
        .env("VMS_ORGANISATION", ORGANISATION);
    cmd
}
