pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::{describe_aggregates, render_figures, run};
