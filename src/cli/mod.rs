pub mod args;
pub mod commands;

pub use args::{Cli, Settings};
pub use commands::handle_command;
