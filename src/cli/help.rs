//! CLI command-name contract for logging.

use crate::cli::parse::{Commands, ContentCommands, MediaCommands, SchemaCommands, TokenCommands};

/// Command name string for log fields (e.g. "content.create", "media.delete").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Token { command } => format!("token.{}", token_command_name(command)),
        Commands::Schema { command } => format!("schema.{}", schema_command_name(command)),
        Commands::Content { command } => format!("content.{}", content_command_name(command)),
        Commands::Media { command } => format!("media.{}", media_command_name(command)),
    }
}

pub fn token_command_name(command: &TokenCommands) -> &'static str {
    match command {
        TokenCommands::Issue { .. } => "issue",
    }
}

pub fn schema_command_name(command: &SchemaCommands) -> &'static str {
    match command {
        SchemaCommands::Show => "show",
        SchemaCommands::Save { .. } => "save",
    }
}

pub fn content_command_name(command: &ContentCommands) -> &'static str {
    match command {
        ContentCommands::Show { .. } => "show",
        ContentCommands::Create { .. } => "create",
        ContentCommands::Delete { .. } => "delete",
        ContentCommands::Save { .. } => "save",
    }
}

pub fn media_command_name(command: &MediaCommands) -> &'static str {
    match command {
        MediaCommands::Images => "images",
        MediaCommands::Galleries => "galleries",
        MediaCommands::Gallery { .. } => "gallery",
        MediaCommands::CreateGallery { .. } => "create_gallery",
        MediaCommands::Delete { .. } => "delete",
    }
}
