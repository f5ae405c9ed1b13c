use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::info;

use crate::bailc;
use crate::constants::CHECKPOINT_SENTINEL;
use crate::constants::PARTITION_CHECKPOINT;
use crate::constants::PARTITION_DIR;
use crate::ctx;
use crate::file_system::FileOperations;
use crate::hashing::xor_combine;
use crate::job::Job;

/// The combined identity of a set of jobs.
///
/// Order independent, and `0` for no jobs.
pub fn fingerprint<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> u64 {
    xor_combine(jobs.into_iter().map(Job::identity_hash))
}

/// What a checkpoint file says about a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// The first `index` jobs were dispatched by earlier runs, and the rest
    /// had this fingerprint.
    Progress {
        /// How many jobs were dispatched already.
        index: usize,

        /// The fingerprint of the jobs from `index` on.
        fingerprint: u64,
    },

    /// Every job was dispatched.
    Drained,
}

impl Checkpoint {
    /// Parse the contents of a checkpoint file.
    ///
    /// Anything after the second line is informational and ignored.
    pub fn parse(text: &str) -> Result<Checkpoint> {
        let mut lines = text.lines().map(str::trim);

        let first = lines.next().unwrap_or_default();

        if first == CHECKPOINT_SENTINEL {
            return Ok(Checkpoint::Drained);
        }

        let index = first
            .parse::<usize>()
            .with_context(|| format!("The resume index `{first}` is not a number"))?;

        let fingerprint = lines
            .next()
            .ok_or(anyhow!("The fingerprint line is missing"))?
            .parse::<u64>()
            .context("The fingerprint is not a number")?;

        Ok(Checkpoint::Progress { index, fingerprint })
    }
}

/// A checkpoint file on disk, letting a batch be dispatched over many runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointFile {
    /// Where the checkpoint lives.
    pub path: PathBuf,
}

impl CheckpointFile {
    /// A checkpoint at `path`, which need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the checkpoint, `None` if there is none yet.
    pub fn read(&self, fs: &impl FileOperations) -> Result<Option<Checkpoint>> {
        if !fs.exists(&self.path) {
            debug!("No checkpoint at {:?}, starting from the first job", self.path);
            return Ok(None);
        }

        let path = &self.path;

        Checkpoint::parse(&fs.read_utf8(path)?)
            .with_context(ctx!(
              "Could not parse the checkpoint {path:?}", ;
              "The file should hold a job index and a fingerprint on separate lines, \
              delete it to start over",
            ))
            .map(Some)
    }

    /// The index to continue dispatching `jobs` from.
    ///
    /// `jobs` is the complete, ordered batch. Fails when the batch was fully
    /// dispatched before, or when the jobs past the index are not the ones
    /// the checkpoint was written for.
    pub fn resume_index(&self, jobs: &[&Job], fs: &impl FileOperations) -> Result<usize> {
        let path = &self.path;

        match self.read(fs)? {
            None => Ok(0),

            Some(Checkpoint::Drained) => {
                bailc!(
                    "All jobs already spawned for this project",;
                    "The checkpoint {path:?} says every job was dispatched",;
                    "Delete the checkpoint to dispatch the whole batch again",
                );
            }

            Some(Checkpoint::Progress { index, fingerprint: stored }) => {
                if index > jobs.len() {
                    let total = jobs.len();
                    bailc!(
                        "The checkpoint is ahead of the batch",;
                        "{path:?} resumes at job {index} but the batch only has {total} jobs",;
                        "The job list changed since the last run, \
                        delete the checkpoint to start over",
                    );
                }

                let actual = fingerprint(jobs[index..].iter().copied());

                if actual != stored {
                    bailc!(
                        "The jobs changed since the last run",;
                        "The fingerprint of the remaining jobs is {actual}, \
                        but {path:?} expects {stored}",;
                        "Restore the original job list, \
                        or delete the checkpoint to start over",
                    );
                }

                info!("Resuming at job {index} of {}", jobs.len());

                Ok(index)
            }
        }
    }

    /// Record that the jobs before `index` were dispatched and `remaining`
    /// are still to go.
    pub fn write_progress(
        &self,
        index: usize,
        remaining: &[&Job],
        fs: &impl FileOperations,
    ) -> Result<()> {
        let first = remaining.first().map(|j| j.command.as_str()).unwrap_or("");

        let contents = format!(
            "{index}\n{}\n{first}\n",
            fingerprint(remaining.iter().copied())
        );

        debug!(
            "Checkpointing {} remaining jobs at {:?}",
            remaining.len(),
            self.path
        );

        fs.write_utf8_truncate(&self.path, &contents)
    }

    /// Record that every job was dispatched.
    pub fn write_drained(&self, fs: &impl FileOperations) -> Result<()> {
        debug!("Marking {:?} as drained", self.path);

        fs.write_utf8_truncate(&self.path, &format!("{CHECKPOINT_SENTINEL}\n"))
    }
}

/// Where a checkpoint goes when none is configured for a partitioned run.
pub fn default_checkpoint_path(output_dir: &Path) -> PathBuf {
    output_dir.join(PARTITION_DIR).join(PARTITION_CHECKPOINT)
}

#[cfg(test)]
#[path = "tests/checkpoint.rs"]
mod tests;
