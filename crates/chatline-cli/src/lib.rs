//! Terminal front end for the chatline client.
//!
//! Everything the engine leaves to its caller lives here: argument
//! parsing, the `/command` interpreter, console rendering, the stdin
//! reader and the mapping from outcomes to exit statuses.

pub mod args;
pub mod commands;
pub mod display;
pub mod exit;
pub mod input;

pub use args::Args;
pub use commands::{CommandError, parse_line};
pub use display::{Output, render};
pub use exit::exit_code;
