use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use log::trace;

use crate::bailc;
use crate::config::DelayOffset;
use crate::hashing::stable_hash;
use crate::hashing::xor_combine;
use crate::interval::Interval;

/// The identifier the farm (or a dry run) assigned to a submitted job.
pub type JobId = u64;

/// A handle to a job inside a [JobBatch].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobRef(usize);

impl JobRef {
    /// The position of the job in its batch.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for JobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a job waits for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// A job with this name. A trailing `*` makes it a wildcard over every
    /// job whose name starts with the rest.
    ByName(String),

    /// A specific job of the same batch.
    ByJob(JobRef),
}

impl Dependency {
    /// Whether this is a `name*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Dependency::ByName(name) if name.ends_with('*'))
    }
}

/// What happened to a job once the dispatcher got to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobState {
    /// The farm's id for this job (or a synthetic one on dry runs).
    pub assigned_id: Option<JobId>,

    /// Whether the job has been handed to the farm.
    pub submitted: bool,

    /// The exit status, for jobs executed directly instead of queued.
    pub exit_status: Option<i32>,
}

/// One unit of work: a command line plus everything the farm needs to know
/// about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// The exact command to run.
    pub command: String,

    /// A name unique within the batch, used for dependencies (`bsub -J`).
    pub name: Option<String>,

    /// The project label (`bsub -P`).
    pub group: Option<String>,

    /// The memory to reserve, in megabytes.
    pub memory_mb: Option<u64>,

    /// Where the farm writes the job's stdout and stderr.
    pub output_path: Option<PathBuf>,

    /// Files this job reads, part of its identity.
    pub used_files: Vec<PathBuf>,

    /// The genome intervals this job covers, part of its identity.
    pub intervals: Vec<Interval>,

    /// Do not start before this long after submission.
    delay: Option<DelayOffset>,

    /// Either all by name or all by job, see [JobBuilder::build].
    dependencies: Vec<Dependency>,

    /// Set by the dispatcher.
    state: JobState,
}

impl Job {
    /// Start building a job that runs `command`.
    pub fn builder(command: impl Into<String>) -> JobBuilder {
        JobBuilder {
            command: command.into(),
            name: None,
            group: None,
            memory: None,
            output_path: None,
            used_files: vec![],
            intervals: vec![],
            delay: None,
            dependencies: vec![],
        }
    }

    /// The jobs this one waits for.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// The begin time offset of this job.
    pub fn delay(&self) -> Option<DelayOffset> {
        self.delay
    }

    /// Change the begin time offset. Only possible before submission.
    pub fn set_delay(&mut self, delay: DelayOffset) -> Result<()> {
        self.ensure_unsubmitted()?;
        self.delay = Some(delay);
        Ok(())
    }

    /// The dispatcher-owned state of the job.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Record that the farm accepted this job under `id`.
    pub fn mark_submitted(&mut self, id: JobId) -> Result<()> {
        self.ensure_unsubmitted()?;
        self.state.assigned_id = Some(id);
        self.state.submitted = true;
        Ok(())
    }

    /// Record the exit status of a directly executed job.
    pub fn record_exit(&mut self, status: i32) -> Result<()> {
        self.ensure_unsubmitted()?;
        self.state.exit_status = Some(status);
        self.state.submitted = true;
        Ok(())
    }

    /// A job is dispatched at most once.
    fn ensure_unsubmitted(&self) -> Result<()> {
        if self.state.submitted {
            let job = self.to_string();
            bailc!(
                "The job was already dispatched",;
                "{job} has been submitted before",;
                "",
            );
        }

        Ok(())
    }

    /// `name` if set, otherwise the assigned id, otherwise `UNNAMED`.
    pub fn id_string(&self) -> String {
        match (&self.name, self.state.assigned_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "UNNAMED".to_string(),
        }
    }

    /// A hash identifying this job across runs: the command, the covered
    /// intervals and the used files. Reordering intervals or files does not
    /// change it.
    pub fn identity_hash(&self) -> u64 {
        let intervals = xor_combine(self.intervals.iter().map(Interval::identity_hash));
        let files = xor_combine(
            self.used_files
                .iter()
                .map(|f| stable_hash(&f.display().to_string())),
        );

        stable_hash(&self.command) ^ intervals ^ files
    }
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let deps = self
            .dependencies
            .iter()
            .map(|d| match d {
                Dependency::ByName(name) => name.clone(),
                Dependency::ByJob(job) => job.to_string(),
            })
            .collect::<Vec<String>>()
            .join(",");

        write!(
            f,
            "[JOB: name={} id={} depending on ({}) with cmd={}]",
            self.name.as_deref().unwrap_or("None"),
            self.state
                .assigned_id
                .map(|id| id.to_string())
                .unwrap_or("None".to_string()),
            deps,
            self.command
        )
    }
}

/// Builder for [Job], validating the dependency list and memory request.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    command: String,
    name: Option<String>,
    group: Option<String>,
    memory: Option<String>,
    output_path: Option<PathBuf>,
    used_files: Vec<PathBuf>,
    intervals: Vec<Interval>,
    delay: Option<DelayOffset>,
    dependencies: Vec<Dependency>,
}

impl JobBuilder {
    /// Name the job.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label the job with a project.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Request memory, for example `4g`, `512m` or `2048` (megabytes).
    pub fn memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    /// Capture output in this file.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Note a file the job reads.
    pub fn uses_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.used_files.push(path.into());
        self
    }

    /// Set the intervals covered by the job.
    pub fn intervals(mut self, intervals: Vec<Interval>) -> Self {
        self.intervals = intervals;
        self
    }

    /// Delay the start of the job.
    pub fn delay(mut self, delay: DelayOffset) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait for another job of the batch.
    pub fn after(mut self, job: JobRef) -> Self {
        self.dependencies.push(Dependency::ByJob(job));
        self
    }

    /// Wait for a job by name, or a `prefix*` group of jobs.
    pub fn after_name(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::ByName(name.into()));
        self
    }

    /// Validate and build the job.
    pub fn build(self) -> Result<Job> {
        let by_name = self
            .dependencies
            .iter()
            .filter(|d| matches!(d, Dependency::ByName(_)))
            .count();

        if by_name != 0 && by_name != self.dependencies.len() {
            let command = self.command;
            bailc!(
                "Mixed dependency kinds for `{command}`",;
                "Some dependencies are given by name and some by job",;
                "Refer to all dependencies of a job by name, or all by job",
            );
        }

        let memory_mb = self.memory.as_deref().map(parse_memory_mb).transpose()?;

        if let Some(name) = &self.name {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                bailc!(
                    "Invalid job name `{name}`",;
                    "Job names are passed to the farm as a single word",;
                    "Use a non-empty name without whitespace",
                );
            }
        }

        Ok(Job {
            command: self.command,
            name: self.name,
            group: self.group,
            memory_mb,
            output_path: self.output_path,
            used_files: self.used_files,
            intervals: self.intervals,
            delay: self.delay,
            dependencies: self.dependencies,
            state: JobState::default(),
        })
    }
}

/// Parse a memory request into megabytes.
///
/// Accepts a plain number of megabytes or a number suffixed by `m`/`M`
/// (megabytes) or `g`/`G` (gigabytes).
pub fn parse_memory_mb(request: &str) -> Result<u64> {
    let trimmed = request.trim();

    let (number, factor) = match trimmed.char_indices().last() {
        Some((i, 'g' | 'G')) => (&trimmed[..i], 1024),
        Some((i, 'm' | 'M')) => (&trimmed[..i], 1),
        _ => (trimmed, 1),
    };

    let value = number.parse::<i64>().with_context(|| {
        format!("Invalid memory request `{request}`, expected for example 4g or 4096m")
    })?;

    if value < 0 {
        bailc!(
            "Negative memory request `{request}`",;
            "A job cannot reserve a negative amount of memory",;
            "Give the memory as a positive amount, for example 4g",
        );
    }

    let Some(megabytes) = value.unsigned_abs().checked_mul(factor) else {
        bailc!(
            "Memory request `{request}` is too large",;
            "It does not fit in a number of megabytes",;
            "Give the memory in gigabytes, for example 64g",
        );
    };

    Ok(megabytes)
}

/// The jobs of one dispatch, addressed by [JobRef].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobBatch {
    jobs: Vec<Job>,
}

impl JobBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch of independent jobs or jobs depending on each other by name.
    pub fn from_jobs(jobs: impl IntoIterator<Item = Job>) -> Result<Self> {
        let mut batch = Self::new();
        for job in jobs {
            batch.push(job)?;
        }
        Ok(batch)
    }

    /// Add a job, returning the handle other jobs use to depend on it.
    ///
    /// Fails if a job-handle dependency points to a job not yet in the batch,
    /// if the jobs depended upon mix named and unnamed ones, or if the name
    /// is already taken.
    pub fn push(&mut self, job: Job) -> Result<JobRef> {
        let mut named = 0;
        let mut unnamed = 0;

        for dep in &job.dependencies {
            if let Dependency::ByJob(target) = dep {
                let Some(target) = self.jobs.get(target.index()) else {
                    let target = *target;
                    bailc!(
                        "Unknown dependency {target}",;
                        "A job can only depend on jobs added to the batch before it",;
                        "",
                    );
                };

                if target.name.is_some() {
                    named += 1;
                } else {
                    unnamed += 1;
                }
            }
        }

        if named > 0 && unnamed > 0 {
            let job = job.to_string();
            bailc!(
                "Bad job names: some dependencies are named and some are unnamed",;
                "{job} depends on a mix of named and unnamed jobs",;
                "Name all the jobs of a dependency group, or none of them",
            );
        }

        if let Some(name) = &job.name {
            if self.jobs.iter().any(|j| j.name.as_ref() == Some(name)) {
                bailc!(
                    "Duplicate job name `{name}`",;
                    "Job names identify dependencies and must be unique within a batch",;
                    "",
                );
            }
        }

        trace!("Adding {job}");
        self.jobs.push(job);

        Ok(JobRef(self.jobs.len() - 1))
    }

    /// The job behind a handle.
    pub fn get(&self, job: JobRef) -> &Job {
        &self.jobs[job.0]
    }

    /// The job behind a handle, mutably.
    pub fn get_mut(&mut self, job: JobRef) -> &mut Job {
        &mut self.jobs[job.0]
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the batch has no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// All jobs with their handles, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (JobRef, &Job)> {
        self.jobs.iter().enumerate().map(|(i, j)| (JobRef(i), j))
    }

    /// The job with this exact name.
    pub fn find_by_name(&self, name: &str) -> Option<JobRef> {
        self.jobs
            .iter()
            .position(|j| j.name.as_deref() == Some(name))
            .map(JobRef)
    }
}

#[cfg(test)]
#[path = "tests/job.rs"]
mod tests;
