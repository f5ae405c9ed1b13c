use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Local;
use regex_lite::Regex;

use crate::bailc;
use crate::constants::ACKNOWLEDGEMENT_PATTERN;
use crate::constants::OUTPUT_PLACEHOLDER;
use crate::constants::OUTPUT_SUFFIX;
use crate::constants::SUBMIT_COMMAND;
use crate::ctx;
use crate::job::Dependency;
use crate::job::Job;
use crate::job::JobBatch;
use crate::job::JobId;

/// Renders jobs into `bsub` invocations.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionBuilder {
    /// The moment delays are counted from.
    pub now: DateTime<Local>,

    /// Collapse named dependency groups sharing a prefix into one wildcard.
    pub wildcard_dependencies: bool,
}

impl SubmissionBuilder {
    /// The full submission command for `job` on `queue`.
    ///
    /// Flags always come in the same order: queue, name, project, output,
    /// begin time, dependencies, memory; followed by the command itself.
    pub fn render(&self, job: &Job, queue: &str, batch: &JobBatch) -> Result<String> {
        let mut submit = format!("{SUBMIT_COMMAND} -q {queue}");

        if let Some(name) = &job.name {
            submit.push_str(&format!(" -J {name}"));
        }

        if let Some(group) = &job.group {
            submit.push_str(&format!(" -P {group}"));
        }

        submit.push_str(&format!(" -o {}", output_destination(job)));

        if let Some(delay) = job.delay() {
            submit.push_str(&format!(" -b {}", delay.to_absolute(self.now)?));
        }

        if let Some(expression) = self.dependency_expression(job, batch)? {
            submit.push_str(&format!(" -w '{expression}'"));
        }

        if let Some(memory) = job.memory_mb {
            submit.push_str(&format!(" -R \"rusage[mem={memory}]\""));
        }

        submit.push(' ');
        submit.push_str(&job.command);

        Ok(submit)
    }

    /// The `-w` expression of a job, if it has dependencies.
    pub fn dependency_expression(&self, job: &Job, batch: &JobBatch) -> Result<Option<String>> {
        if job.dependencies().is_empty() {
            return Ok(None);
        }

        let mut targets = vec![];
        let mut all_named = true;

        for dep in job.dependencies() {
            match dep {
                Dependency::ByName(name) => {
                    all_named &= !dep.is_wildcard();
                    targets.push(name.clone());
                }
                Dependency::ByJob(target) => {
                    let target_job = batch.get(*target);

                    match (&target_job.name, target_job.state().assigned_id) {
                        (Some(name), _) => targets.push(name.clone()),
                        (None, Some(id)) => {
                            all_named = false;
                            targets.push(id.to_string());
                        }
                        (None, None) => {
                            let target = target_job.to_string();
                            bailc!(
                                "Cannot refer to an unnamed job that was not submitted yet",;
                                "{target} has neither a name nor a job id",;
                                "Name the job, or make sure it is dispatched first",
                            );
                        }
                    }
                }
            }
        }

        if self.wildcard_dependencies && all_named && targets.len() > 1 {
            let prefix = longest_common_prefix(&targets);

            if !prefix.is_empty() && !matches_outsiders(prefix, &targets, batch) {
                return Ok(Some(format!("ended(\"{prefix}*\")")));
            }
        }

        Ok(Some(
            targets
                .iter()
                .map(|t| format!("ended(\"{t}\")"))
                .collect::<Vec<String>>()
                .join(" && "),
        ))
    }
}

/// Where the farm should write a job's output.
///
/// The explicit output path, else `<name>.stdout`, else a per-job file named
/// by the farm.
pub fn output_destination(job: &Job) -> String {
    match (&job.output_path, &job.name) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(name)) => format!("{name}{OUTPUT_SUFFIX}"),
        (None, None) => OUTPUT_PLACEHOLDER.to_string(),
    }
}

/// The longest prefix shared by all `names`.
pub fn longest_common_prefix(names: &[String]) -> &str {
    let Some(first) = names.first() else {
        return "";
    };

    let mut end = first.len();
    for name in &names[1..] {
        end = first
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(end);
    }

    &first[..end]
}

/// Whether a batch job outside `targets` would also match `prefix*`.
fn matches_outsiders(prefix: &str, targets: &[String], batch: &JobBatch) -> bool {
    batch.iter().any(|(_, job)| {
        job.name
            .as_ref()
            .is_some_and(|name| name.starts_with(prefix) && !targets.contains(name))
    })
}

/// Extract the job id from the farm's answer to a submission.
pub fn parse_acknowledgement(stdout: &str) -> Result<JobId> {
    let pattern = Regex::new(ACKNOWLEDGEMENT_PATTERN)?;

    let id = pattern
        .captures(stdout)
        .and_then(|c| c.get(1))
        .ok_or(anyhow!("Unexpected answer from the farm: {}", stdout.trim()))
        .with_context(ctx!(
          "Expected the answer to contain `Job <N> is submitted to queue`", ;
          "Ensure that `bsub` is the LSF submission command on this machine",
        ))?;

    id.as_str()
        .parse::<JobId>()
        .with_context(|| format!("The job id {} is out of range", id.as_str()))
}

#[cfg(test)]
#[path = "tests/submission.rs"]
mod tests;
