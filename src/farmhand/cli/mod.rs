/// CLI Definition.
pub mod def;

/// Util & printing functions.
pub mod printing;

/// Main processing module.
pub mod process;

/// Logging definitions.
pub mod log;
