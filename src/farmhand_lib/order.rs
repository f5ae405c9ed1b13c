use std::collections::BTreeSet;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::trace;

use crate::bailc;
use crate::job::Dependency;
use crate::job::JobBatch;
use crate::job::JobRef;

/// Order the jobs of a batch so that every job comes after all the jobs it
/// (transitively) depends on.
///
/// Among the jobs that are ready at some point, the one fewer jobs depend on
/// goes first. Remaining ties keep the order the jobs were added in.
pub fn order(batch: &JobBatch) -> Result<Vec<JobRef>> {
    let prerequisites = resolve(batch)?;

    let mut dependents = vec![vec![]; batch.len()];
    let mut waiting_on = vec![0usize; batch.len()];

    for (job, before) in prerequisites.iter().enumerate() {
        waiting_on[job] = before.len();

        for p in before {
            dependents[*p].push(job);
        }
    }

    let mut ready = (0..batch.len())
        .filter(|job| waiting_on[*job] == 0)
        .map(|job| (dependents[job].len(), job))
        .collect::<BTreeSet<(usize, usize)>>();

    let mut ordered = Vec::with_capacity(batch.len());

    while let Some((_, job)) = ready.pop_first() {
        ordered.push(job);

        for dependent in &dependents[job] {
            waiting_on[*dependent] -= 1;

            if waiting_on[*dependent] == 0 {
                ready.insert((dependents[*dependent].len(), *dependent));
            }
        }
    }

    if ordered.len() != batch.len() {
        let stuck = batch
            .iter()
            .filter(|(r, _)| waiting_on[r.index()] > 0)
            .map(|(_, job)| job.id_string())
            .collect::<Vec<String>>()
            .join(", ");

        bailc!(
            "The jobs depend on each other in a cycle",;
            "None of these jobs can ever start: {stuck}",;
            "Remove the circular dependency from the job list",
        );
    }

    let refs = batch.iter().map(|(r, _)| r).collect::<Vec<JobRef>>();
    let ordered = ordered.into_iter().map(|i| refs[i]).collect::<Vec<JobRef>>();

    debug!("Ordered {} jobs", ordered.len());

    Ok(ordered)
}

/// For every job, the positions of the jobs it has to wait for.
fn resolve(batch: &JobBatch) -> Result<Vec<BTreeSet<usize>>> {
    let mut prerequisites = vec![BTreeSet::new(); batch.len()];

    for (this, job) in batch.iter() {
        for dep in job.dependencies() {
            match dep {
                Dependency::ByJob(target) => {
                    prerequisites[this.index()].insert(target.index());
                }

                Dependency::ByName(pattern) if dep.is_wildcard() => {
                    let prefix = pattern.trim_end_matches('*');

                    let matched = batch
                        .iter()
                        .filter(|(other, _)| *other != this)
                        .filter(|(_, other)| {
                            other.name.as_ref().is_some_and(|n| n.starts_with(prefix))
                        })
                        .map(|(other, _)| other.index())
                        .collect::<Vec<usize>>();

                    if matched.is_empty() {
                        trace!("{pattern} matches no job of this batch, assuming it is external");
                    }

                    prerequisites[this.index()].extend(matched);
                }

                Dependency::ByName(name) => {
                    let Some(target) = batch.find_by_name(name) else {
                        let job = job.id_string();
                        bailc!(
                            "Unknown dependency `{name}`",;
                            "{job} depends on a job that is not part of this batch",;
                            "Check the spelling, or end the name with `*` to wait for jobs outside the batch",
                        );
                    };

                    prerequisites[this.index()].insert(target.index());
                }
            }
        }
    }

    Ok(prerequisites)
}

#[cfg(test)]
#[path = "tests/order.rs"]
mod tests;
