use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::config::DelayOffset;
use crate::ctx;
use crate::file_system::FileOperations;
use crate::job::Job;
use crate::job::JobBatch;

/// One job of a job-list file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobEntry {
    /// The command to run.
    pub command: String,

    /// A name, needed to depend on this job.
    pub name: Option<String>,

    /// The project label.
    pub group: Option<String>,

    /// The memory to reserve, for example `4g`.
    pub memory: Option<String>,

    /// Where to write the output.
    pub output: Option<PathBuf>,

    /// How long after submission the job may start, `d:h:m`.
    pub delay: Option<DelayOffset>,

    /// Names (or `prefix*` wildcards) of the jobs to wait for.
    #[serde(default)]
    pub after: Vec<String>,
}

/// A TOML file of `[[jobs]]` to dispatch together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct JobList {
    /// The jobs, in file order.
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

impl JobList {
    /// Read a job list from a TOML file.
    pub fn from_file(path: &Path, fs: &impl FileOperations) -> Result<Self> {
        fs.try_read_toml(path).with_context(ctx!(
          "Could not load the job list {path:?}", ;
          "A job list holds [[jobs]] tables with at least a `command`",
        ))
    }

    /// Turn the entries into a validated batch.
    pub fn into_batch(self) -> Result<JobBatch> {
        let mut batch = JobBatch::new();

        for (number, entry) in self.jobs.into_iter().enumerate() {
            let mut builder = Job::builder(entry.command);

            if let Some(name) = entry.name {
                builder = builder.name(name);
            }

            if let Some(group) = entry.group {
                builder = builder.group(group);
            }

            if let Some(memory) = entry.memory {
                builder = builder.memory(memory);
            }

            if let Some(output) = entry.output {
                builder = builder.output(output);
            }

            if let Some(delay) = entry.delay {
                builder = builder.delay(delay);
            }

            for name in entry.after {
                builder = builder.after_name(name);
            }

            let job = builder
                .build()
                .with_context(|| format!("Invalid job number {} in the job list", number + 1))?;

            batch.push(job)?;
        }

        Ok(batch)
    }
}

#[cfg(test)]
#[path = "tests/job_list.rs"]
mod tests;
