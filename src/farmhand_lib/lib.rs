//! The data model and algorithms of `farmhand`, shared by the binary and its
//! tests.

/// A struct and related methods for the configuration of a dispatch.
pub mod config;

/// Constant values.
pub mod constants;

/// The error handling for `farmhand`.
pub mod error;

/// Common file operations
pub mod file_system;

/// Hashes that stay the same across runs.
pub mod hashing;

/// Genome intervals and interval-list files.
pub mod interval;

/// Jobs, their dependencies and batches of them.
pub mod job;

/// Job lists read from TOML files.
pub mod job_list;

/// Rendering jobs into farm submissions.
pub mod submission;

/// Dependency ordering of a batch.
pub mod order;

/// Resumable dispatch across many runs.
pub mod checkpoint;

/// Splitting an analysis over the genome into many jobs.
pub mod partition;
