use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::info;
use log::warn;

use crate::bailc;
use crate::constants::PARTITION_DIR;
use crate::file_system::FileOperations;
use crate::interval::Interval;
use crate::interval::IntervalList;
use crate::job::Job;

/// How an analysis names its output, which differs between tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// Writes variant calls through `-varout`.
    VariantCaller,

    /// Writes a family of coverage files sharing a base name.
    Coverage,

    /// Writes a new BAM file.
    BamRewriter,

    /// Anything else, writing a single text file.
    Other,
}

impl AnalysisKind {
    /// Look up the analysis by name.
    pub fn from_name(analysis: &str) -> Self {
        match analysis {
            "UnifiedGenotyper" => AnalysisKind::VariantCaller,
            "CoverageStatistics" | "DepthOfCoverage" => AnalysisKind::Coverage,
            "CombineDuplicates" | "TableRecalibration" | "ClipReads" => AnalysisKind::BamRewriter,
            _ => AnalysisKind::Other,
        }
    }

    /// The flag and path where chunk `number` writes its results.
    pub fn output_flag(&self, chunk_dir: &Path, number: usize) -> String {
        let dir = chunk_dir.display();

        match self {
            AnalysisKind::VariantCaller => format!("-varout {dir}/job{number}_calls.vcf"),
            AnalysisKind::Coverage => format!("-o {dir}/job{number}"),
            AnalysisKind::BamRewriter => format!("-o {dir}/job{number}_output.bam"),
            AnalysisKind::Other => format!("-o {dir}/job{number}.txt"),
        }
    }
}

/// The parts of the command line shared by every chunk of an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisCommand {
    /// The analysis jar.
    pub jar: PathBuf,

    /// The JVM heap size, for example `4g`.
    pub memory: String,

    /// The analysis to run (`-T`).
    pub analysis: String,

    /// Extra arguments, passed through verbatim.
    pub extra_args: String,

    /// The reference genome.
    pub reference: PathBuf,

    /// A BAM file or a list of them.
    pub bams: Option<PathBuf>,

    /// Read filters, each added as `-rf`.
    pub read_filters: Vec<String>,
}

impl AnalysisCommand {
    /// Make sure every input file exists.
    pub fn check(&self, fs: &impl FileOperations) -> Result<()> {
        let jar = &self.jar;
        if !fs.exists(jar) {
            bailc!(
                "The analysis jar {jar:?} does not exist",;
                "",;
                "Point --jar at the jar file of the analysis toolkit",
            );
        }

        let reference = &self.reference;
        if !fs.exists(reference) {
            bailc!(
                "The reference {reference:?} does not exist",;
                "",;
                "Point --reference at a reference genome",
            );
        }

        if let Some(bams) = &self.bams {
            if !fs.exists(bams) {
                bailc!(
                    "The BAM file or list {bams:?} does not exist",;
                    "",;
                    "Point --bams at a BAM file, or a file listing BAM files",
                );
            }
        }

        if self
            .read_filters
            .iter()
            .any(|f| f.split_whitespace().count() != 1)
        {
            bailc!(
                "Read filters with arguments are not supported",;
                "A read filter is passed as a single `-rf <name>`",;
                "Give only the name of each read filter",
            );
        }

        Ok(())
    }

    /// The command line up to, but excluding, the output and interval flags.
    pub fn render(&self) -> String {
        let mut command = format!(
            "java -Xmx{} -jar {} -T {}",
            self.memory,
            self.jar.display(),
            self.analysis
        );

        if !self.extra_args.trim().is_empty() {
            command.push(' ');
            command.push_str(self.extra_args.trim());
        }

        for filter in &self.read_filters {
            command.push_str(&format!(" -rf {filter}"));
        }

        command.push_str(&format!(" -R {}", self.reference.display()));

        if let Some(bams) = &self.bams {
            command.push_str(&format!(" -I {}", bams.display()));
        }

        command
    }
}

/// Split intervals into chunks of roughly `budget` bases.
///
/// A chunk closes right after the interval that takes its total over the
/// budget, so no chunk exceeds it by more than its last interval. The rest is
/// the final chunk. With a budget of 0 every non-empty interval closes its
/// chunk.
pub fn chunk_intervals(intervals: &[Interval], budget: u64) -> Vec<&[Interval]> {
    let mut chunks = vec![];
    let mut start = 0;
    let mut bases = 0;

    for (i, interval) in intervals.iter().enumerate() {
        bases += interval.size();

        if bases > budget {
            chunks.push(&intervals[start..=i]);
            start = i + 1;
            bases = 0;
        }
    }

    if start < intervals.len() {
        chunks.push(&intervals[start..]);
    }

    chunks
}

/// Turns an interval list into one farm job per chunk of the genome.
#[derive(Debug, Clone)]
pub struct IntervalPartitioner {
    /// The analysis every chunk runs.
    pub command: AnalysisCommand,

    /// Chunks are written to `<output_dir>/dispatch/dispatch<N>/`.
    pub output_dir: PathBuf,

    /// Names and groups the jobs.
    pub project: String,
}

impl IntervalPartitioner {
    /// The directory of chunk `number`.
    pub fn chunk_dir(&self, number: usize) -> PathBuf {
        self.output_dir
            .join(PARTITION_DIR)
            .join(format!("dispatch{number}"))
    }

    /// Partition `list` into chunks of about `budget` bases, write every
    /// chunk's interval file and build its job.
    pub fn partition(
        &self,
        list: &IntervalList,
        budget: u64,
        fs: &impl FileOperations,
    ) -> Result<Vec<Job>> {
        if budget == 0 {
            debug!("A budget of 0 gives every interval a job of its own");
        }

        self.command.check(fs)?;
        list.check_sorted()?;

        if list.intervals.is_empty() {
            warn!("The interval list is empty, there is nothing to dispatch");
        }

        let base = self.command.render();
        let kind = AnalysisKind::from_name(&self.command.analysis);

        let mut jobs = vec![];

        for (number, chunk) in chunk_intervals(&list.intervals, budget)
            .into_iter()
            .enumerate()
        {
            let dir = fs.create_folder(&self.chunk_dir(number))?;
            let interval_file = dir.join(format!("job{number}_intervals.interval_list"));

            fs.write_utf8_truncate(
                &interval_file,
                &IntervalList::render_chunk(&list.header, chunk),
            )?;

            debug!(
                "Chunk {number} covers {} intervals in {dir:?}",
                chunk.len()
            );

            let command = format!(
                "{base} {} -L {}",
                kind.output_flag(&dir, number),
                interval_file.display()
            );

            let job = Job::builder(command)
                .name(format!("{}_job{number}", self.project))
                .group(&self.project)
                .memory(&self.command.memory)
                .output(dir.join("bsub_out.txt"))
                .intervals(chunk.to_vec())
                .uses_file(interval_file)
                .build()
                .with_context(|| format!("Could not build the job of chunk {number}"))?;

            jobs.push(job);
        }

        info!(
            "Partitioned {} intervals into {} jobs",
            list.intervals.len(),
            jobs.len()
        );

        Ok(jobs)
    }
}

#[cfg(test)]
#[path = "tests/partition.rs"]
mod tests;
