use std::fmt::Display;

use crate::constants::ERROR_STYLE;
use crate::constants::HELP_STYLE;

/// The error context structure, provides an explanation and help.
///
/// The first element of the structure is the error's "context".
/// The second element is the help message displayed to the user.
///
/// Both have to implement [Display], and will be displayed when the error is
/// printed.
///
/// # Example
///
/// ```no_run
/// # use farmhand_lib::error::Ctx;
/// # use anyhow::anyhow;
/// # use anyhow::Result;
/// # use anyhow::Context;
/// # fn main() -> Result<()> {
/// Err(anyhow!("Any struct implementing std::error::Error")).context(Ctx("context", "help"))
/// # }
/// ```
#[derive(Debug)]
pub struct Ctx<A, B>(pub A, pub B)
where
    A: Display,
    B: Display;

impl<A: Display, B: Display> Display for Ctx<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !format!("{}", self.0).is_empty() {
            writeln!(f, "{}caused by:{:#} {}", ERROR_STYLE, ERROR_STYLE, self.0)?;
        }

        if !format!("{}", self.1).is_empty() {
            writeln!(f, "\n{}help:{:#} {}", HELP_STYLE, HELP_STYLE, self.1)?;
        }

        Ok(())
    }
}

/// This is a shorthand for returning the context of a error.
///
/// A macro invocation like so:
/// ```ignore
/// ctx!([context], [context arg]; [help], [help args], ...)
/// ```
/// Will desugar to:
/// ```ignore
/// || Ctx(format!([context], [context arg]), format!([help], [help args]))
/// ```
///
/// Note the placement of the `;` and `,`. They are required and otherwise the
/// macro will not parse.
///
/// # Example
///
/// ```no_run
/// # use farmhand_lib::error::Ctx;
/// # use farmhand_lib::ctx;
/// # use std::path::PathBuf;
/// # use anyhow::Context;
/// # let path: PathBuf = "/".parse().unwrap();
/// std::fs::read(&path).with_context(ctx!(
///   "Could not read the file {path:?}", ;
///   "Ensure that the file exists and you have permissions to access it",
/// ));
/// ```
#[macro_export]
macro_rules! ctx {
    {$cause: expr,  $($arg_cause: expr)*; $help: expr, $($arg_help: tt)*} => {
      || $crate::error::Ctx(format!($cause, $($arg_cause)*), format!($help, $($arg_help)*))
    };
}

/// This is a shorthand for the [anyhow::bail] macro, now with context.
///
/// # Example
///
/// ```no_run
/// # use farmhand_lib::error::Ctx;
/// # use farmhand_lib::bailc;
/// # use anyhow::Context;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// bailc!("Something", ; "Something", ; "Help", );
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! bailc {
    {$text: expr,  $($arg_text: expr)*; $cause: expr,  $($arg_cause: expr)*; $help: expr, $($arg_help: tt)*} => {
        return Err(anyhow::anyhow!($text, $($arg_text)*)).with_context($crate::error::ctx!($cause, $($arg_cause)*; $help, $($arg_help)*));
    };
    {$text: expr $(,$arg_text: expr)*} => {
        return Err(anyhow::anyhow!($text, $($arg_text)*)).with_context($crate::error::ctx!("",;"",));
    };
}

pub use ctx;

/// A command that was executed directly (not through the farm) exited with a
/// non-zero status while `die_on_fail` was set.
///
/// The binary surfaces [CommandFailed::code] as its own exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailed {
    /// The command as it was handed to the shell.
    pub command: String,

    /// The exit code of the command.
    pub code: i32,
}

impl Display for CommandFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` exited with status {}", self.command, self.code)
    }
}

impl std::error::Error for CommandFailed {}
