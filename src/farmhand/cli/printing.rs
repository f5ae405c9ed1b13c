use anstyle::AnsiColor;
use anyhow::Context;
use anyhow::Result;
use clap::crate_authors;
use clap::crate_name;
use clap::crate_version;
use farmhand_lib::constants::style_from_fg;
use farmhand_lib::constants::ERROR_STYLE;
use farmhand_lib::constants::HELP_STYLE;
use farmhand_lib::constants::PRIMARY_STYLE;
use farmhand_lib::constants::SECONDARY_STYLE;
use farmhand_lib::ctx;
use farmhand_lib::job::JobBatch;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;

use crate::dispatch::DispatchReport;

/// Util function for getting the style for the CLI
pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(style_from_fg(AnsiColor::Yellow).bold())
        .header(style_from_fg(AnsiColor::Green).bold().underline())
        .literal(style_from_fg(AnsiColor::Cyan).bold())
        .invalid(style_from_fg(AnsiColor::Blue).bold())
        .error(ERROR_STYLE)
        .valid(HELP_STYLE)
        .placeholder(style_from_fg(AnsiColor::White))
}

/// Pretty print farmhand's version
pub fn print_version(script: bool) {
    if script {
        println!("{} {}", crate_name!(), crate_version!());

        return;
    }

    println!(
        "{PRIMARY_STYLE}{}{PRIMARY_STYLE:#} at version {SECONDARY_STYLE}{}{SECONDARY_STYLE:#}",
        crate_name!(),
        crate_version!()
    );

    for author in crate_authors!("\n").split('\n') {
        println!("  {author}");
    }
}

/// One line per dispatched job: the farm id, the queue and the job.
pub fn format_report(report: &DispatchReport, batch: &JobBatch) -> String {
    report
        .dispatched
        .iter()
        .map(|d| {
            let job = batch.get(d.job);

            let id = d
                .id
                .map(|id| id.to_string())
                .or(job.state().exit_status.map(|s| format!("exit {s}")))
                .unwrap_or("-".to_string());

            format!(
                "{id:>8} | {:<6} | {}",
                d.queue.as_deref().unwrap_or("local"),
                job.id_string()
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Generates the progress bar used by the cli.
pub fn generate_progress_bar(len: u64) -> Result<ProgressBar> {
    let prog_style = ProgressStyle::with_template(
        "{prefix}[{spinner:.green}] {bar:.green/blue} {msg} {pos}/{len}",
    )
    .with_context(ctx!("Failed to create the progress bar",;"",))?
    .progress_chars("##-");

    let bar = ProgressBar::new(len);
    bar.set_style(prog_style);
    bar.set_message("Dispatching jobs...");

    Ok(bar)
}

#[cfg(test)]
#[path = "tests/printing.rs"]
mod tests;
