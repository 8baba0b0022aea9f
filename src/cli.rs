//! CLI domain: parse, route, help and output only.
//! No workflow logic; the route table hands intents to the orchestrator.

mod help;
mod output;
mod parse;
mod route;

pub use help::command_name;
pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands, ContentCommands, MediaCommands, SchemaCommands, TokenCommands};
pub use route::RunContext;
