use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::trace;
use serde::de::DeserializeOwned;

use crate::error::ctx;

/// Interactor with the actual physical file system.
#[derive(Clone, Copy, Debug)]
pub struct FileSystemInteractor {
    /// If true nothing is written: chunk files, checkpoints and folders are
    /// only logged.
    pub dry_run: bool,
}

/// Every way farmhand touches the file system.
pub trait FileOperations {
    /// Read a file into a utf8 string.
    fn read_utf8(&self, path: &Path) -> Result<String>;

    /// Try to deserialize a toml file into a struture `T`.
    fn try_read_toml<T: DeserializeOwned>(&self, path: &Path) -> Result<T>;

    /// Replace the contents of a file, creating it and its parent folders
    /// when needed.
    fn write_utf8_truncate(&self, path: &Path, data: &str) -> Result<()>;

    /// Creates the folder (and parents) and returns it as an absolute path.
    /// A dry run only returns the path.
    fn create_folder(&self, path: &Path) -> Result<PathBuf>;

    /// Check whether something exists at this path.
    fn exists(&self, path: &Path) -> bool;
}

impl FileOperations for FileSystemInteractor {
    fn read_utf8(&self, path: &Path) -> Result<String> {
        trace!("Reading {path:?}");

        fs::read_to_string(path).with_context(ctx!(
          "Could not read the file {path:?}", ;
          "Ensure that the file exists, is readable text and you have permissions to access it",
        ))
    }

    fn try_read_toml<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        toml::from_str::<T>(&self.read_utf8(path)?).with_context(ctx!(
          "Could not deserialize toml file {path:?}", ;
          "Ensure that the file is valid toml",
        ))
    }

    fn write_utf8_truncate(&self, path: &Path, data: &str) -> Result<()> {
        if self.dry_run {
            debug!("Would have written {} bytes to {path:?} (dry)", data.len());
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(ctx!(
              "Could not create parent directories for {parent:?}", ;
              "Ensure that you have sufficient permissions",
            ))?;
        }

        trace!("Writing {} bytes to {path:?}", data.len());

        fs::write(path, data).with_context(ctx!(
          "Could not write to the file {path:?}", ;
          "Ensure that you have permissions to write it",
        ))
    }

    fn create_folder(&self, path: &Path) -> Result<PathBuf> {
        if self.dry_run {
            debug!("Would have created {path:?} (dry)");
        } else {
            debug!("Creating directories for {:?}", path);
            fs::create_dir_all(path).with_context(ctx!(
               "Could not create {path:?}", ;
               "Ensure that you have sufficient permissions",
            ))?;
        }

        // Identical for dry and real runs.
        std::path::absolute(path).with_context(ctx!(
          "Could not make {path:?} absolute", ;
          "Ensure that your path is valid",
        ))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
#[path = "tests/file_system.rs"]
mod tests;
