use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Local;
use farmhand_lib::bailc;
use farmhand_lib::checkpoint::CheckpointFile;
use farmhand_lib::config::Config;
use farmhand_lib::config::QueueLimit;
use farmhand_lib::ctx;
use farmhand_lib::error::CommandFailed;
use farmhand_lib::file_system::FileOperations;
use farmhand_lib::job::Job;
use farmhand_lib::job::JobBatch;
use farmhand_lib::job::JobId;
use farmhand_lib::job::JobRef;
use farmhand_lib::order::order;
use farmhand_lib::submission::parse_acknowledgement;
use farmhand_lib::submission::SubmissionBuilder;
use indicatif::ProgressBar;
use log::debug;
use log::info;
use log::warn;

use super::DispatchReport;
use super::DispatchState;
use super::Dispatched;
use super::OverflowPolicy;
use super::Scheduler;

/// Hands batches of jobs to the farm.
#[derive(Debug)]
pub struct Dispatcher<T>
where
    T: Scheduler,
{
    /// The way of talking to the farm.
    pub internal: T,

    /// The queues, filled in this order. No queues means running locally.
    pub queues: Vec<QueueLimit>,

    /// What to do when the batch does not fit.
    pub policy: OverflowPolicy,

    /// Only print what would be submitted.
    pub dry_run: bool,

    /// Abort when a locally run job fails.
    pub die_on_fail: bool,

    /// Collapse dependency groups into `name*` wildcards.
    pub wildcard_dependencies: bool,

    /// The moment begin times are counted from.
    pub now: DateTime<Local>,

    /// Advanced once per submitted job.
    pub progress: ProgressBar,

    /// The next id handed out on dry runs.
    next_synthetic_id: JobId,

    /// Where this run is at.
    state: DispatchState,
}

impl<T> Dispatcher<T>
where
    T: Scheduler,
{
    /// A dispatcher for the given queues and policy.
    pub fn new(internal: T, queues: Vec<QueueLimit>, policy: OverflowPolicy) -> Self {
        Self {
            internal,
            queues,
            policy,
            dry_run: false,
            die_on_fail: false,
            wildcard_dependencies: true,
            now: Local::now(),
            progress: ProgressBar::hidden(),
            next_synthetic_id: 1,
            state: DispatchState::Pending,
        }
    }

    /// A dispatcher set up by the config.
    pub fn from_config(internal: T, config: &Config, dry_run: bool) -> Result<Self> {
        let mut dispatcher = Self::new(
            internal,
            config.queues.clone(),
            OverflowPolicy::from_config(config)?,
        );

        dispatcher.dry_run = dry_run;
        dispatcher.die_on_fail = config.die_on_fail;
        dispatcher.wildcard_dependencies = config.wildcard_dependencies;

        Ok(dispatcher)
    }

    /// The number of jobs all queues accept at once.
    pub fn capacity(&self) -> usize {
        self.queues.iter().map(|q| q.limit).sum()
    }

    /// Where the current run is at.
    pub fn state(&self) -> DispatchState {
        self.state
    }

    fn transition(&mut self, state: DispatchState) {
        debug!("Dispatch {} -> {state}", self.state);
        self.state = state;
    }

    /// Dispatch every job of `batch`, in dependency order.
    ///
    /// When the batch holds more jobs than the queues, the overflow policy
    /// decides what happens. Without queues the jobs run here, one after
    /// the other.
    pub fn dispatch_all(
        &mut self,
        batch: &mut JobBatch,
        fs: &impl FileOperations,
    ) -> Result<DispatchReport> {
        self.transition(DispatchState::Pending);

        let ordered = order(batch)?;
        self.transition(DispatchState::Ordered);

        if self.queues.is_empty() {
            return self.run_locally(batch, &ordered);
        }

        let capacity = self.capacity();
        if capacity == 0 {
            bailc!(
                "The queues do not accept any jobs",;
                "Every configured queue has a limit of 0",;
                "Give at least one queue a positive limit, for example --queue long:500",
            );
        }

        let mut report = DispatchReport::default();

        match self.policy.clone() {
            OverflowPolicy::Resume { checkpoint } => {
                self.transition(DispatchState::Resuming);
                self.resume(batch, &ordered, &checkpoint, &mut report, fs)?;
            }

            _ if ordered.len() <= capacity => {
                self.transition(DispatchState::Submitting);
                self.submit_wave(batch, &ordered, &mut report)?;
            }

            OverflowPolicy::Fail => {
                let count = ordered.len();
                bailc!(
                    "Number of jobs to dispatch, {count}, exceeds the maximum ({capacity})",;
                    "Nothing was submitted",;
                    "Add queues, raise their limits, or use --overflow space or resume",
                );
            }

            OverflowPolicy::Space {
                increment,
                initial_delay,
            } => {
                self.transition(DispatchState::Deferred);

                for (k, wave) in ordered.chunks(capacity).enumerate() {
                    let delay = initial_delay + increment.times(k as u64);
                    debug!("Wave {k} of {} jobs starts after {delay}", wave.len());

                    for job in wave {
                        batch.get_mut(*job).set_delay(delay)?;
                    }

                    self.submit_wave(batch, wave, &mut report)?;
                }
            }
        }

        self.transition(DispatchState::Submitted);

        Ok(report)
    }

    /// Submit jobs filling the queues in order, each up to its limit.
    fn submit_wave(
        &mut self,
        batch: &mut JobBatch,
        wave: &[JobRef],
        report: &mut DispatchReport,
    ) -> Result<()> {
        let mut jobs = wave.iter();

        for queue in self.queues.clone() {
            for job in jobs.by_ref().take(queue.limit) {
                let id = self.submit(batch, *job, &queue.name)?;

                report.dispatched.push(Dispatched {
                    job: *job,
                    queue: Some(queue.name.clone()),
                    id: Some(id),
                });
            }
        }

        if let Some(left) = jobs.next() {
            let job = batch.get(*left).to_string();
            bailc!(
                "The queues are full",;
                "{job} and possibly more did not fit into any queue",;
                "",
            );
        }

        Ok(())
    }

    /// Submit one job to `queue`.
    fn submit(&mut self, batch: &mut JobBatch, job: JobRef, queue: &str) -> Result<JobId> {
        let builder = SubmissionBuilder {
            now: self.now,
            wildcard_dependencies: self.wildcard_dependencies,
        };

        let line = builder.render(batch.get(job), queue, batch)?;

        let id = if self.dry_run {
            let id = self.next_synthetic_id;
            self.next_synthetic_id += 1;

            info!("{line}");
            info!("Would have submitted job {id} (dry)");

            id
        } else {
            info!("{line}");

            let answer = self.internal.submit(&line)?;
            info!("{}", answer.trim());

            parse_acknowledgement(&answer).with_context(ctx!(
              "The farm did not accept job {}", job;
              "The batch was stopped, jobs submitted before this one are queued",
            ))?
        };

        batch.get_mut(job).mark_submitted(id)?;
        self.progress.inc(1);

        Ok(id)
    }

    /// Dispatch the next window of a checkpointed batch, and record where
    /// the next run continues.
    fn resume(
        &mut self,
        batch: &mut JobBatch,
        ordered: &[JobRef],
        checkpoint: &CheckpointFile,
        report: &mut DispatchReport,
        fs: &impl FileOperations,
    ) -> Result<()> {
        let start = {
            let jobs = ordered.iter().map(|r| batch.get(*r)).collect::<Vec<&Job>>();
            checkpoint.resume_index(&jobs, fs)?
        };

        let end = (start + self.capacity()).min(ordered.len());

        if let Err(e) = self.submit_wave(batch, &ordered[start..end], report) {
            let done = start + report.dispatched.len();
            let remaining = ordered[done..]
                .iter()
                .map(|r| batch.get(*r))
                .collect::<Vec<&Job>>();

            checkpoint.write_progress(done, &remaining, fs)?;
            warn!("Stopped after job {done}, the next run continues from there");

            return Err(e);
        }

        let remaining = ordered[end..]
            .iter()
            .map(|r| batch.get(*r))
            .collect::<Vec<&Job>>();

        if remaining.is_empty() {
            checkpoint.write_drained(fs)?;
            info!("Every job of this batch has been dispatched");
        } else {
            checkpoint.write_progress(end, &remaining, fs)?;
            info!(
                "{} jobs remain, run the same command again to continue",
                remaining.len()
            );
        }

        report.remaining = remaining.len();

        Ok(())
    }

    /// Run every job here, in order, waiting for each to finish.
    fn run_locally(&mut self, batch: &mut JobBatch, ordered: &[JobRef]) -> Result<DispatchReport> {
        self.transition(DispatchState::Submitting);

        let mut report = DispatchReport::default();

        for job in ordered {
            let command = batch.get(*job).command.clone();

            if self.dry_run {
                info!("Would have run `{command}` (dry)");
            } else {
                info!("Running `{command}`");

                let status = self.internal.execute(&command)?;
                batch.get_mut(*job).record_exit(status)?;

                if status != 0 {
                    if self.die_on_fail {
                        return Err(CommandFailed {
                            command,
                            code: status,
                        }
                        .into());
                    }

                    warn!("`{command}` exited with status {status}");
                }
            }

            self.progress.inc(1);

            report.dispatched.push(Dispatched {
                job: *job,
                queue: None,
                id: None,
            });
        }

        self.transition(DispatchState::Submitted);

        Ok(report)
    }
}

#[cfg(test)]
#[path = "tests/handler.rs"]
mod tests;
