//! Shared utilities for the research workspace

pub mod env;
pub mod logging;

pub use env::{env_or, require_env};
pub use logging::init_tracing;
