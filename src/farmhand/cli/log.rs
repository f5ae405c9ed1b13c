use anstyle::AnsiColor;
use colog::format::CologStyle;
use farmhand_lib::constants::style_from_fg;
use farmhand_lib::constants::SECONDARY_STYLE;
use log::Level;

/// The `colog` tokens of farmhand's log lines.
///
/// Dry runs mark every line, so that a pasted log is never mistaken for
/// one of a real submission.
#[derive(Debug, Clone, Copy)]
pub struct LogTokens {
    /// Whether this is a dry run.
    pub dry_run: bool,
}

impl CologStyle for LogTokens {
    fn level_token(&self, level: &Level) -> &str {
        match *level {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    fn prefix_token(&self, level: &Level) -> String {
        let token = self.level_color(level, self.level_token(level));

        if self.dry_run {
            format!("{token} {SECONDARY_STYLE}(dry){SECONDARY_STYLE:#}:")
        } else {
            format!("{token}:")
        }
    }

    fn level_color(&self, level: &Level, msg: &str) -> String {
        let style = match level {
            Level::Error => style_from_fg(AnsiColor::Red).bold(),
            Level::Warn => style_from_fg(AnsiColor::Yellow),
            Level::Info => style_from_fg(AnsiColor::Green),
            Level::Debug => style_from_fg(AnsiColor::Blue),
            Level::Trace => style_from_fg(AnsiColor::Magenta),
        };

        format!("{style}{msg}{style:#}")
    }
}
