//! File system operations module
//!
//! Provides recursive file enumeration, single-file copying, and sample
//! input generation.

mod operations;
mod samples;
mod scanner;

pub use operations::*;
pub use samples::*;
pub use scanner::*;
