pub mod commands;
pub mod output;
pub mod progress;
pub mod scan;
pub mod validate;

pub use commands::{Cli, Commands};
