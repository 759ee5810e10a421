//! Configuration module for restoremod
//!
//! Provides CLI/environment argument handling, runtime settings, and the
//! exit-status contract toward the invoking download manager.

mod settings;

pub use settings::*;
