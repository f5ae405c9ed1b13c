//! Farmhand hands large batches of command-line jobs to an LSF farm.

/// Dispatching batches of jobs to the farm, or running them right here.
pub mod dispatch;

/// The command line interface and relevant structures.
pub mod cli;

/// The main CLI entry-point of the `farmhand` utility.
///
/// This function parses command-line arguments and executes
/// sub-commands as specified by the user.
fn main() {
    cli::process::parse_command();
}
