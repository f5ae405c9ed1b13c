use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use serde::Deserialize;
use serde::Serialize;

use crate::bailc;
use crate::constants::PRIMARY_STYLE;
use crate::constants::PROJECT_DEFAULT;
use crate::constants::QUEUE_DEFAULT;
use crate::constants::QUEUE_LIMIT_DEFAULT;
use crate::constants::WILDCARD_DEPENDENCIES_DEFAULT;
use crate::error::ctx;
use crate::file_system::FileOperations;

/// Parsing and rendering of `days:hours:minutes` offsets.
pub mod delay;

pub use delay::DelayOffset;

/// A farm queue and the number of jobs it may hold at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueLimit {
    /// The name of the queue, as passed to `bsub -q`.
    pub name: String,

    /// The maximum number of jobs submitted to this queue in one go.
    pub limit: usize,
}

impl Default for QueueLimit {
    fn default() -> Self {
        QueueLimit {
            name: QUEUE_DEFAULT(),
            limit: QUEUE_LIMIT_DEFAULT,
        }
    }
}

impl FromStr for QueueLimit {
    type Err = anyhow::Error;

    /// Parses `name:limit`, or just `name` for the default limit.
    fn from_str(s: &str) -> Result<Self> {
        let (name, limit) = match s.split_once(':') {
            Some((name, limit)) => (
                name,
                limit.parse::<usize>().with_context(ctx!(
                  "Invalid limit in queue `{s}`", ;
                  "Queues are written as name:limit, for example long:500",
                ))?,
            ),
            None => (s, QUEUE_LIMIT_DEFAULT),
        };

        if name.is_empty() {
            bailc!(
                "Invalid queue `{s}`",;
                "The queue name is empty",;
                "Queues are written as name:limit, for example long:500",
            );
        }

        Ok(QueueLimit {
            name: name.to_string(),
            limit,
        })
    }
}

impl Display for QueueLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.limit)
    }
}

/// What to do when a batch holds more jobs than all queues together allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowKind {
    /// Refuse to submit anything.
    #[default]
    Fail,

    /// Submit everything, in waves with increasing begin times.
    Space,

    /// Submit one window now and remember where to continue.
    Resume,
}

impl FromStr for OverflowKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fail" => Ok(OverflowKind::Fail),
            "space" => Ok(OverflowKind::Space),
            "resume" => Ok(OverflowKind::Resume),
            _ => {
                bailc!(
                    "Unknown overflow policy `{s}`",;
                    "The overflow policy decides what happens with jobs beyond the queue capacity",;
                    "Use one of `fail`, `space` or `resume`",
                );
            }
        }
    }
}

/// A config struct used throughout the `farmhand` application.
///
/// Every value can also be given on the command line, which takes
/// precedence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The queues to submit to, in order of preference.
    #[serde(default = "default_queues")]
    pub queues: Vec<QueueLimit>,

    /// The policy for batches larger than the total queue capacity.
    #[serde(default)]
    pub overflow: OverflowKind,

    /// The begin time increment between waves of the `space` policy.
    pub spacing_increment: Option<DelayOffset>,

    /// The begin time offset of the first wave of the `space` policy.
    pub initial_delay: Option<DelayOffset>,

    /// The checkpoint file of the `resume` policy.
    pub checkpoint: Option<PathBuf>,

    /// The project label (`bsub -P`) of generated jobs.
    #[serde(default = "PROJECT_DEFAULT")]
    pub project: String,

    /// Abort the whole run when a directly executed command fails.
    #[serde(default)]
    pub die_on_fail: bool,

    /// Express dependencies on a group of jobs sharing a name prefix as one
    /// `ended("prefix*")` wildcard.
    #[serde(default = "WILDCARD_DEPENDENCIES_DEFAULT")]
    pub wildcard_dependencies: bool,
}

/// The queues used when none are configured.
fn default_queues() -> Vec<QueueLimit> {
    vec![QueueLimit::default()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            queues: default_queues(),
            overflow: OverflowKind::default(),
            spacing_increment: None,
            initial_delay: None,
            checkpoint: None,
            project: PROJECT_DEFAULT(),
            die_on_fail: false,
            wildcard_dependencies: WILDCARD_DEPENDENCIES_DEFAULT(),
        }
    }
}

impl Config {
    /// Load a `Config` struct instance from a TOML file at the provided path.
    pub fn from_file<F: FileOperations>(path: &Path, fs: &F) -> Result<Config> {
        toml::from_str(&fs.read_utf8(path)?).with_context(ctx!(
          "Could not parse {path:?}", ;
          "More help can be found with {PRIMARY_STYLE}farmhand --help{PRIMARY_STYLE:#}",
        ))
    }

    /// Load the config at `path`, falling back to the defaults when the file
    /// does not exist and was not asked for explicitly.
    pub fn load<F: FileOperations>(path: &Path, explicit: bool, fs: &F) -> Result<Config> {
        if !explicit && !fs.exists(path) {
            debug!("No config at {path:?}, using the defaults");
            return Ok(Config::default());
        }

        Config::from_file(path, fs)
    }
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
