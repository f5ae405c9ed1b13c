use std::fmt::Display;

use anyhow::Context;
use anyhow::Result;
use farmhand_lib::bailc;
use farmhand_lib::checkpoint::CheckpointFile;
use farmhand_lib::config::Config;
use farmhand_lib::config::DelayOffset;
use farmhand_lib::config::OverflowKind;
use farmhand_lib::job::JobId;
use farmhand_lib::job::JobRef;

/// The dispatch engine.
pub mod handler;

/// Talking to LSF through its command line tools.
pub mod interactor;

/// The interface to the farm.
///
/// Everything that leaves the process goes through here, so that the
/// dispatcher can be exercised without a farm.
pub trait Scheduler {
    /// Run a complete submission command line, returning what it printed.
    fn submit(&self, line: &str) -> Result<String>;

    /// Run a command on this machine and wait for its exit status.
    fn execute(&self, command: &str) -> Result<i32>;
}

/// What happens to the jobs that do not fit into the queues at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Nothing is submitted.
    Fail,

    /// Everything is submitted, each capacity-sized wave starting
    /// `increment` later than the one before.
    Space {
        /// The offset between consecutive waves.
        increment: DelayOffset,

        /// The offset of the first wave.
        initial_delay: DelayOffset,
    },

    /// One capacity-sized window is submitted per run, the checkpoint
    /// remembers where the next run continues.
    Resume {
        /// Where progress is kept between runs.
        checkpoint: CheckpointFile,
    },
}

impl OverflowPolicy {
    /// Resolve the configured policy, making sure it has what it needs.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.overflow {
            OverflowKind::Fail => Ok(OverflowPolicy::Fail),

            OverflowKind::Space => {
                let Some(increment) = config.spacing_increment else {
                    bailc!(
                        "The `space` overflow policy needs an increment",;
                        "Waves of jobs are spaced apart by the increment",;
                        "Pass --increment d:h:m or set `spacing_increment` in the config",
                    );
                };

                Ok(OverflowPolicy::Space {
                    increment,
                    initial_delay: config.initial_delay.unwrap_or_default(),
                })
            }

            OverflowKind::Resume => {
                let Some(path) = &config.checkpoint else {
                    bailc!(
                        "The `resume` overflow policy needs a checkpoint file",;
                        "Progress between runs is kept in the checkpoint",;
                        "Pass --checkpoint <path> or set `checkpoint` in the config",
                    );
                };

                Ok(OverflowPolicy::Resume {
                    checkpoint: CheckpointFile::new(path),
                })
            }
        }
    }
}

/// Where a dispatch run is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing happened yet.
    Pending,

    /// The jobs are in dependency order.
    Ordered,

    /// Submitting directly, everything fits.
    Submitting,

    /// Submitting in waves with increasing begin times.
    Deferred,

    /// Submitting the next window of a checkpointed batch.
    Resuming,

    /// Done.
    Submitted,
}

impl Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DispatchState::Pending => "pending",
            DispatchState::Ordered => "ordered",
            DispatchState::Submitting => "submitting",
            DispatchState::Deferred => "deferred",
            DispatchState::Resuming => "resuming",
            DispatchState::Submitted => "submitted",
        };

        write!(f, "{name}")
    }
}

/// One job handed to the farm, or run locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// The job.
    pub job: JobRef,

    /// The queue it went to, `None` when it ran locally.
    pub queue: Option<String>,

    /// The id the farm gave it.
    pub id: Option<JobId>,
}

/// The outcome of [handler::Dispatcher::dispatch_all].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Every job dispatched by this run, in dispatch order.
    pub dispatched: Vec<Dispatched>,

    /// Jobs left for a later run of the `resume` policy.
    pub remaining: usize,
}
