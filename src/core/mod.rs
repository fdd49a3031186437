//! Core sorting module
//!
//! Provides extension categories, copy tasks, the concurrent dispatcher,
//! and the engine that ties scanning and dispatching together.

mod category;
mod dispatcher;
mod engine;
mod report;
mod task;

pub use category::*;
pub use dispatcher::*;
pub use engine::*;
pub use report::*;
pub use task::*;
