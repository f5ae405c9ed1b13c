//! The building process.
//!
//! This script compiles the shell completions of `farmhand` and places them
//! in `[target_dir]/completions/`.

#![allow(unused)]
#![allow(clippy::missing_docs_in_private_items)]

use std::env;
use std::fs;

use anyhow::anyhow;
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate_to;
use clap_complete::shells::Bash;
use clap_complete::shells::Fish;
use clap_complete::shells::PowerShell;
use clap_complete::shells::Zsh;

include!("src/farmhand/cli/def.rs");

fn main() -> Result<()> {
    println!("cargo::rerun-if-changed=src/farmhand/cli/def.rs");

    let outdir: PathBuf = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    }
    .into();

    let target_dir = outdir
        .ancestors()
        .nth(3)
        .ok_or(anyhow!("Unexpected OUT_DIR layout: {outdir:?}"))?;

    let completions = target_dir.join("completions/");

    let _ = fs::create_dir(&completions);

    let mut completions_command = Cli::command();

    generate_to(Bash, &mut completions_command, "farmhand", &completions)?;
    generate_to(Fish, &mut completions_command, "farmhand", &completions)?;
    generate_to(PowerShell, &mut completions_command, "farmhand", &completions)?;
    generate_to(Zsh, &mut completions_command, "farmhand", &completions)?;

    Ok(())
}
