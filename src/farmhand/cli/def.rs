use std::path::PathBuf;

use clap::builder::PossibleValue;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Structure of the main command (farmhand).
#[allow(unused)]
#[derive(Parser, Debug)]
#[command(
    about = "Farmhand, a dispatcher of job batches for LSF farms",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// The main command issued.
    #[command(subcommand)]
    pub command: FarmhandCommand,

    /// Disable interactive mode, for use in scripts.
    #[arg(short, long, global = true)]
    pub script: bool,

    /// The path to the config file [default: ./farmhand.toml].
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose mode, displays debug info. For even more try: -vv.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Dry run, print the submissions but don't submit anything.
    #[arg(short, long, global = true)]
    pub dry: bool,
}

/// How a batch is spread over the farm, overriding the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct DispatchOptions {
    /// A queue to submit to, as `name:limit`. Can be given more than once.
    #[arg(short, long = "queue", value_name = "NAME:LIMIT")]
    pub queues: Vec<String>,

    /// What to do with more jobs than the queues hold.
    #[arg(long, value_parser = [
        PossibleValue::new("fail"),
        PossibleValue::new("space"),
        PossibleValue::new("resume"),
    ])]
    pub overflow: Option<String>,

    /// The begin time increment between waves, `days:hours:minutes`.
    #[arg(long, value_name = "D:H:M")]
    pub increment: Option<String>,

    /// The begin time offset of the first wave, `days:hours:minutes`.
    #[arg(long, value_name = "D:H:M")]
    pub initial_delay: Option<String>,

    /// The checkpoint file used to resume dispatching.
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// The project label of the jobs.
    #[arg(short, long)]
    pub project: Option<String>,

    /// List every dependency instead of using `name*` wildcards.
    #[arg(long)]
    pub no_wildcards: bool,
}

/// Arguments supplied with the `partition` command.
#[derive(Args, Debug, Clone)]
pub struct PartitionStruct {
    /// The analysis to run, for example `UnifiedGenotyper`.
    #[arg(short, long)]
    pub analysis: String,

    /// The jar of the analysis toolkit.
    #[arg(short, long)]
    pub jar: PathBuf,

    /// The memory of every job, for example `4g`.
    #[arg(short, long, default_value = "4g")]
    pub memory: String,

    /// The reference genome.
    #[arg(short, long)]
    pub reference: PathBuf,

    /// A BAM file, or a file listing BAM files.
    #[arg(short, long)]
    pub bams: Option<PathBuf>,

    /// The interval list to split up.
    #[arg(short, long)]
    pub intervals: PathBuf,

    /// Where the chunks and their outputs go.
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// The number of bases per job.
    #[arg(long)]
    pub budget: u64,

    /// Extra arguments for the analysis.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub args: String,

    /// A read filter to apply. Can be given more than once.
    #[arg(long = "read-filter", value_name = "FILTER")]
    pub read_filters: Vec<String>,

    /// The dispatch options.
    #[command(flatten)]
    pub dispatch: DispatchOptions,
}

/// Arguments supplied with the `batch` command.
#[derive(Args, Debug, Clone)]
pub struct BatchStruct {
    /// A TOML file with the `[[jobs]]` to dispatch.
    #[arg()]
    pub jobs: PathBuf,

    /// Run the jobs one after another on this machine instead.
    #[arg(long)]
    pub local: bool,

    /// Stop at the first job that fails when running locally.
    #[arg(long)]
    pub die_on_fail: bool,

    /// The dispatch options.
    #[command(flatten)]
    pub dispatch: DispatchOptions,
}

/// Enum for root-level `farmhand` commands.
#[derive(Subcommand, Debug)]
pub enum FarmhandCommand {
    /// Split an analysis over an interval list and dispatch one job per chunk.
    #[command()]
    Partition(PartitionStruct),

    /// Dispatch the jobs of a job list.
    #[command()]
    Batch(BatchStruct),

    /// Print information about the version.
    #[command()]
    Version,
}
