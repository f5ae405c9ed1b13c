use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use log::debug;
use serde::Deserialize;
use serde::Serialize;

use crate::bailc;
use crate::constants::INTERVAL_HEADER_MARKER;
use crate::ctx;
use crate::file_system::FileOperations;
use crate::hashing::stable_hash;

/// A contiguous range of genome coordinates on one contig.
///
/// Intervals are only used as units of work when splitting an analysis
/// across many farm jobs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    /// The contig (chromosome) name.
    contig: String,

    /// First coordinate.
    start: u64,

    /// Last coordinate, never smaller than `start`.
    stop: u64,
}

impl Interval {
    /// Create a new interval, failing if `start > stop`.
    pub fn new(contig: impl Into<String>, start: u64, stop: u64) -> Result<Self> {
        let contig = contig.into();

        if start > stop {
            bailc!(
                "Invalid interval {contig}:{start}-{stop}",;
                "The start of an interval lies after its stop",;
                "Check the interval list for swapped columns",
            );
        }

        Ok(Self {
            contig,
            start,
            stop,
        })
    }

    /// The contig this interval lies on.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// The first coordinate.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The last coordinate.
    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// The number of bases covered.
    pub fn size(&self) -> u64 {
        self.stop - self.start
    }

    /// The hash of `contig:start-stop`, stable across runs.
    pub fn identity_hash(&self) -> u64 {
        stable_hash(&self.to_string())
    }

    /// The line written for this interval into a chunk's interval file.
    pub fn bed_format(&self) -> String {
        format!(
            "{}\t{}\t{}\t+\ttarget_whatever",
            self.contig, self.start, self.stop
        )
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.stop)
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    /// Parse `contig start stop [...]`, extra columns are ignored.
    fn from_str(line: &str) -> Result<Self> {
        let mut columns = line.split_whitespace();

        let contig = columns.next().ok_or(anyhow!("Missing contig column"))?;
        let start = columns
            .next()
            .ok_or(anyhow!("Missing start column"))?
            .parse::<u64>()
            .context("The start column is not a non-negative integer")?;
        let stop = columns
            .next()
            .ok_or(anyhow!("Missing stop column"))?
            .parse::<u64>()
            .context("The stop column is not a non-negative integer")?;

        Interval::new(contig, start, stop)
    }
}

/// The contents of an interval-list file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalList {
    /// Header lines, verbatim and without their line terminator.
    pub header: Vec<String>,

    /// The intervals in file order.
    pub intervals: Vec<Interval>,
}

impl IntervalList {
    /// Parse the text of an interval list.
    pub fn parse(text: &str) -> Result<Self> {
        let mut list = IntervalList::default();

        for (number, line) in text.lines().enumerate() {
            if line.starts_with(INTERVAL_HEADER_MARKER) {
                list.header.push(line.to_string());
            } else if !line.trim().is_empty() {
                let interval = line.parse::<Interval>().with_context(ctx!(
                  "Could not parse line {}", number + 1;
                  "Interval lines look like `contig start stop`, headers start with `{}`",
                  INTERVAL_HEADER_MARKER
                ))?;

                list.intervals.push(interval);
            }
        }

        Ok(list)
    }

    /// Read and parse an interval-list file.
    pub fn from_file(path: &Path, fs: &impl FileOperations) -> Result<Self> {
        let list = Self::parse(&fs.read_utf8(path)?).with_context(ctx!(
          "Could not read the interval list {path:?}", ;
          "",
        ))?;

        debug!(
            "Read {} intervals and {} header lines from {path:?}",
            list.intervals.len(),
            list.header.len()
        );

        Ok(list)
    }

    /// Make sure the intervals come in genome order: a contig is never
    /// revisited once another one started, and within a contig intervals
    /// never go backwards.
    pub fn check_sorted(&self) -> Result<()> {
        let mut finished: Vec<&str> = vec![];

        for pair in self.intervals.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            if previous.contig != current.contig {
                finished.push(&previous.contig);

                if finished.contains(&current.contig.as_str()) {
                    let contig = &current.contig;
                    bailc!(
                        "The interval list is not sorted",;
                        "Contig {contig} appears again after {previous}",;
                        "Sort the interval list by genome coordinate before partitioning",
                    );
                }
            } else if current.start < previous.start {
                bailc!(
                    "The interval list is not sorted",;
                    "{current} comes after {previous}",;
                    "Sort the interval list by genome coordinate before partitioning",
                );
            }
        }

        Ok(())
    }

    /// Render the header followed by the given intervals, in chunk-file form.
    pub fn render_chunk(header: &[String], intervals: &[Interval]) -> String {
        let mut out = String::new();

        for line in header {
            out.push_str(line);
            out.push('\n');
        }

        for interval in intervals {
            out.push_str(&interval.bed_format());
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
#[path = "tests/interval.rs"]
mod tests;
