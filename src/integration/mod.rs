//! # Integration tests for the command line of `farmhand`.
//! The tests in this module only use dry runs and local execution, anything
//! that needs an actual LSF farm is not meant for the CI pipeline.
//!
//! ## Test Plan
//!
//! + [x] Test the `farmhand version` command.
//! + [x] Test the `farmhand batch` command, locally and dry.
//! + [x] Test the `farmhand partition` command, dry.
//!
//! ## Test Strategy
//! Every test gets its own `TestEnv`, a temporary working directory holding
//! the inputs and configuration of that test.

mod batch;
mod partition;
mod version;

use std::path::PathBuf;

use tempdir::TempDir;

/// The testing environment passed to individual #[test](s)
struct TestEnv {
    farmhand_path: PathBuf,
    temp_dir: TempDir,
}

impl TestEnv {
    /// Write `contents` to `name` inside the environment.
    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

#[macro_export]
macro_rules! farmhand {
    ($env:expr; $($arg:expr),*) => {
        std::process::Command::new(&$env.farmhand_path)
            .current_dir($env.temp_dir.path())
            .env("RUST_BACKTRACE", "0")
            .args(&[$($arg),*])
            .output()
            .unwrap()
    };
    ($env:expr; $($arg:expr),*; $msg:expr) => {
        {
            let out = $crate::farmhand!($env; $($arg),*);
            if !out.status.success() {
                panic!("farmhand {} failed: {}", $msg, String::from_utf8(out.stderr).unwrap());
            } else {
                out
            }
        }
    };
}

fn init() -> TestEnv {
    let farmhand_path = PathBuf::from(env!("CARGO_BIN_EXE_farmhand"));
    assert!(
        &farmhand_path.exists(),
        "\nTest setup couldn't find the farmhand executable.
    [Expected to find it at: {:?}]\n",
        farmhand_path
    );

    let temp_dir = TempDir::new_in(env!("CARGO_TARGET_TMPDIR"), "farmhand").unwrap();

    TestEnv {
        farmhand_path,
        temp_dir,
    }
}
