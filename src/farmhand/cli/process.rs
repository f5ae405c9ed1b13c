use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::process::exit;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::CommandFactory;
use clap::FromArgMatches;
use colog::default_builder;
use colog::formatter;
use farmhand_lib::checkpoint::default_checkpoint_path;
use farmhand_lib::config::Config;
use farmhand_lib::config::DelayOffset;
use farmhand_lib::config::OverflowKind;
use farmhand_lib::config::QueueLimit;
use farmhand_lib::constants::CONFIG_DEFAULT;
use farmhand_lib::constants::ERROR_STYLE;
use farmhand_lib::constants::PRIMARY_STYLE;
use farmhand_lib::ctx;
use farmhand_lib::error::CommandFailed;
use farmhand_lib::file_system::FileSystemInteractor;
use farmhand_lib::interval::IntervalList;
use farmhand_lib::job::JobBatch;
use farmhand_lib::job_list::JobList;
use farmhand_lib::partition::AnalysisCommand;
use farmhand_lib::partition::IntervalPartitioner;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::debug;
use log::info;
use log::trace;
use log::LevelFilter;

use super::log::LogTokens;
use super::printing::get_styles;
use crate::cli::def::Cli;
use crate::cli::def::DispatchOptions;
use crate::cli::def::FarmhandCommand;
use crate::cli::printing::format_report;
use crate::cli::printing::generate_progress_bar;
use crate::cli::printing::print_version;
use crate::dispatch::handler::Dispatcher;
use crate::dispatch::interactor::LsfCli;

/// This function parses command that farmhand was run with.
pub fn parse_command() {
    let styled = Cli::command().styles(get_styles()).get_matches();

    // Prints the usage and exits if the command is wrong.
    let command = Cli::from_arg_matches(&styled).unwrap_or_else(|e| e.exit());

    // https://github.com/rust-lang/rust/blob/master/library/std/src/backtrace.rs
    let backtrace_enabled = match env::var("RUST_LIB_BACKTRACE") {
        Ok(s) => s != "0",
        Err(_) => match env::var("RUST_BACKTRACE") {
            Ok(s) => s != "0",
            Err(_) => false,
        },
    };

    if let Err(e) = process_command(&command) {
        if backtrace_enabled {
            eprintln!("{e:?}");
        } else {
            eprintln!("{}error:{:#} {}", ERROR_STYLE, ERROR_STYLE, e.root_cause());

            if e.chain().count() > 1 {
                eprint!("{}", e);
            }
        }

        match e.downcast_ref::<CommandFailed>() {
            Some(failed) => exit(failed.code),
            None => exit(1),
        }
    }
}

/// CLAP has parsed the command, now we process it.
pub fn process_command(cmd: &Cli) -> Result<()> {
    let progress = setup_logging(cmd)?;

    let file_system = FileSystemInteractor { dry_run: cmd.dry };

    let config_path = cmd
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_DEFAULT));

    match &cmd.command {
        FarmhandCommand::Partition(args) => {
            let mut config = load_config(cmd, &config_path, &args.dispatch, &file_system)?;

            if config.checkpoint.is_none() {
                config.checkpoint = Some(default_checkpoint_path(&args.output_dir));
            }

            let list = IntervalList::from_file(&args.intervals, &file_system)?;

            let partitioner = IntervalPartitioner {
                command: AnalysisCommand {
                    jar: args.jar.clone(),
                    memory: args.memory.clone(),
                    analysis: args.analysis.clone(),
                    extra_args: args.args.clone(),
                    reference: args.reference.clone(),
                    bams: args.bams.clone(),
                    read_filters: args.read_filters.clone(),
                },
                output_dir: args.output_dir.clone(),
                project: config.project.clone(),
            };

            let jobs = partitioner.partition(&list, args.budget, &file_system)?;
            let mut batch = JobBatch::from_jobs(jobs)?;

            dispatch(cmd, &config, &mut batch, &progress, &file_system)?;
        }

        FarmhandCommand::Batch(args) => {
            let mut config = load_config(cmd, &config_path, &args.dispatch, &file_system)?;

            if args.local {
                debug!("Running the jobs locally");
                config.queues.clear();
            }

            config.die_on_fail |= args.die_on_fail;

            let mut batch = JobList::from_file(&args.jobs, &file_system)?.into_batch()?;
            debug!("Read {} jobs from {:?}", batch.len(), args.jobs);

            dispatch(cmd, &config, &mut batch, &progress, &file_system)?;
        }

        FarmhandCommand::Version => print_version(cmd.script),
    }

    Ok(())
}

/// Read the config file and apply the command line on top of it.
fn load_config(
    cmd: &Cli,
    path: &Path,
    options: &DispatchOptions,
    fs: &FileSystemInteractor,
) -> Result<Config> {
    debug!("Reading the config: {path:?}");

    let mut config = Config::load(path, cmd.config.is_some(), fs)?;
    apply_options(&mut config, options)?;

    trace!("The config is: {config:#?}");

    Ok(config)
}

/// Command line flags take precedence over the config file.
pub fn apply_options(config: &mut Config, options: &DispatchOptions) -> Result<()> {
    if !options.queues.is_empty() {
        config.queues = options
            .queues
            .iter()
            .map(|q| q.parse::<QueueLimit>())
            .collect::<Result<Vec<QueueLimit>>>()?;
    }

    if let Some(overflow) = &options.overflow {
        config.overflow = overflow.parse::<OverflowKind>()?;
    }

    if let Some(increment) = &options.increment {
        config.spacing_increment = Some(increment.parse::<DelayOffset>().with_context(ctx!(
          "Invalid --increment", ;
          "The increment is written as days:hours:minutes",
        ))?);
    }

    if let Some(delay) = &options.initial_delay {
        config.initial_delay = Some(delay.parse::<DelayOffset>().with_context(ctx!(
          "Invalid --initial-delay", ;
          "The initial delay is written as days:hours:minutes",
        ))?);
    }

    if let Some(checkpoint) = &options.checkpoint {
        config.checkpoint = Some(checkpoint.clone());
    }

    if let Some(project) = &options.project {
        config.project = project.clone();
    }

    if options.no_wildcards {
        config.wildcard_dependencies = false;
    }

    Ok(())
}

/// Dispatch the batch through LSF and summarise what happened.
fn dispatch(
    cmd: &Cli,
    config: &Config,
    batch: &mut JobBatch,
    progress: &MultiProgress,
    fs: &FileSystemInteractor,
) -> Result<()> {
    let mut dispatcher = Dispatcher::from_config(LsfCli, config, cmd.dry)?;

    let bar = progress.add(generate_progress_bar(batch.len() as u64)?);
    dispatcher.progress = bar.clone();

    let report = dispatcher.dispatch_all(batch, fs);

    bar.finish_and_clear();
    progress.remove(&bar);

    let report = report?;

    if cmd.script {
        println!("{}", format_report(&report, batch));
    } else {
        info!(
            "Dispatched {PRIMARY_STYLE}{}{PRIMARY_STYLE:#} of {} jobs",
            report.dispatched.len(),
            batch.len()
        );
    }

    Ok(())
}

/// Prepare the log levels for the application.
fn setup_logging(cmd: &Cli) -> Result<MultiProgress> {
    let mut log_build = default_builder();
    log_build.format(formatter(LogTokens { dry_run: cmd.dry }));

    let bar = MultiProgress::new();

    if cmd.verbose == 2 {
        log_build.filter(None, LevelFilter::Trace);
    } else if cmd.verbose == 1 {
        log_build.filter(None, LevelFilter::Debug);
    } else if cmd.verbose == 0 {
        log_build.filter(None, LevelFilter::Info);
    } else {
        return Err(anyhow!("Only two levels of verbosity supported (ie. -vv)")).context("");
    }

    LogWrapper::new(bar.clone(), log_build.build())
        .try_init()
        .with_context(ctx!(
            "Failed to initialize the command line interface", ;
            "Make sure you are using a supported terminal",
        ))?;

    Ok(bar)
}

#[cfg(test)]
#[path = "tests/process.rs"]
mod tests;
