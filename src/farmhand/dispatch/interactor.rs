use std::process::Command;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use farmhand_lib::ctx;
use log::debug;

use super::Scheduler;

/// Talks to LSF by running its command line tools through `sh`.
///
/// Commands are passed to the shell whole, so quoting in submissions and job
/// commands works the way it does on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsfCli;

impl LsfCli {
    fn shell(line: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(line);
        command
    }
}

impl Scheduler for LsfCli {
    fn submit(&self, line: &str) -> Result<String> {
        let output = Self::shell(line).output().with_context(ctx!(
          "Could not run the submission `{line}`", ;
          "Ensure that a shell is available",
        ))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            return Err(anyhow!("The submission failed with {}", output.status)).with_context(
                ctx!(
                  "bsub printed: {}", stderr.trim();
                  "Ensure that you are on a machine that can submit to the farm",
                ),
            );
        }

        debug!("The submission answered {} bytes", stdout.len());

        Ok(stdout)
    }

    fn execute(&self, command: &str) -> Result<i32> {
        let status = Self::shell(command).status().with_context(ctx!(
          "Could not run `{command}`", ;
          "Ensure that a shell is available",
        ))?;

        status
            .code()
            .ok_or(anyhow!("`{command}` was terminated by a signal"))
    }
}

#[cfg(test)]
#[path = "tests/interactor.rs"]
mod tests;
