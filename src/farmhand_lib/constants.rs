use anstyle::AnsiColor;
use anstyle::Color;
use anstyle::Style;

/// The default path of the configuration file.
pub const CONFIG_DEFAULT: &str = "./farmhand.toml";

/// The queue used when none is configured.
pub const QUEUE_DEFAULT: fn() -> String = || "long".to_string();

/// The concurrent job cap of a queue when none is given.
pub const QUEUE_LIMIT_DEFAULT: usize = 500;

/// The project (`-P`) label used when none is configured.
pub const PROJECT_DEFAULT: fn() -> String = || "farmhand".to_string();

/// By default dependency sets sharing a name prefix are expressed as one
/// wildcard.
pub const WILDCARD_DEPENDENCIES_DEFAULT: fn() -> bool = || true;

/// The submission command of the farm.
pub const SUBMIT_COMMAND: &str = "bsub";

/// Output destination when a job has neither an output path nor a name.
/// `%J` is replaced by the scheduler with the job id.
pub const OUTPUT_PLACEHOLDER: &str = "%J.lsf.output";

/// The suffix appended to a job name to get its output file.
pub const OUTPUT_SUFFIX: &str = ".stdout";

/// The pattern of a successful submission acknowledgement.
pub const ACKNOWLEDGEMENT_PATTERN: &str = r"Job <(\d+)> is submitted to queue";

/// Written to the checkpoint file once every job has been dispatched.
pub const CHECKPOINT_SENTINEL: &str = "ALL_JOBS_HAVE_BEEN_SPAWNED";

/// Lines of an interval list starting with this are headers.
pub const INTERVAL_HEADER_MARKER: &str = "@";

/// The directory (under the output directory) holding partitioned chunks.
pub const PARTITION_DIR: &str = "dispatch";

/// The file name of the checkpoint written by partitioned runs.
pub const PARTITION_CHECKPOINT: &str = "resume_jobs.txt";

/// Create a style with a defined foreground color.
pub const fn style_from_fg(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

/// The styling for the program name.
pub const PRIMARY_STYLE: Style = style_from_fg(AnsiColor::Green).bold();

/// The styling for the secondary text.
pub const SECONDARY_STYLE: Style = style_from_fg(AnsiColor::BrightGreen);

/// The styling for error messages.
pub const ERROR_STYLE: Style = style_from_fg(AnsiColor::Red).bold().blink();

/// The styling for help messages.
pub const HELP_STYLE: Style = style_from_fg(AnsiColor::Green).bold().underline();
