//! Configuration module for SortCopy
//!
//! Provides CLI arguments and the runtime settings of a sorting run.

mod settings;

pub use settings::*;
