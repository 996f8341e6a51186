//! Command Handlers module
//!
//! Parses incoming commands, routes them to their aggregate and persists the
//! resulting events as one unit of work.

mod service;

pub use service::{parse_command, CommandOutcome, CommandService};
