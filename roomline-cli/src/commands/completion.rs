//! Shell completion scripts for `roomline`.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::{generate, shells::Shell};

const BIN_NAME: &str = "roomline";

/// Writes the completion script for `shell` to `out`.
pub fn generate_completion<W: Write>(shell: Shell, out: &mut W) {
    let mut command = crate::Cli::command();
    generate(shell, &mut command, BIN_NAME, out);
}
