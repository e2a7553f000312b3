//! Renders the `vms(1)` man page from the CLI definitions into `OUT_DIR`.

use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

const MAN_PAGE: &str = "vms.1";
const WATCHED: [&str; 2] = ["build.rs", "src/cli/mod.rs"];

fn main() -> Result<(), Box<dyn Error>> {
    let mut cargo = io::stdout().lock();
    for path in WATCHED {
        writeln!(cargo, "cargo:rerun-if-changed={path}")?;
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or("OUT_DIR is not set")?;
    let mut page = Vec::new();
    Man::new(cli::Cli::command()).render(&mut page)?;
    fs::write(out_dir.join(MAN_PAGE), page)?;
    Ok(())
}
