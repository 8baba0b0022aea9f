//! CLI parse: clap types for Folio. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folio CLI - edit a site's page schema, content and media
#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Page-schema and content editing backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces the global and workspace files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Session token (falls back to FOLIO_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Log at debug level
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue session tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Load or replace the page schema
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Create, load, save and delete content items
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// List and manage images and galleries
    Media {
        #[command(subcommand)]
        command: MediaCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Sign a token for an identity
    Issue {
        #[arg(long)]
        id: String,
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Print the stored schema
    Show,
    /// Replace the stored schema with a JSON file
    Save {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ContentCommands {
    /// Load one content item
    Show {
        id: String,
        #[arg(long)]
        template: String,
    },
    /// Create an item and link it at a schema path (e.g. 2.data)
    Create {
        #[arg(long)]
        template: String,
        #[arg(long)]
        path: String,
    },
    /// Delete an item and unlink it from a schema path
    Delete {
        id: String,
        #[arg(long)]
        path: String,
    },
    /// Overwrite an item with a JSON document
    Save {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum MediaCommands {
    /// List loose images
    Images,
    /// List galleries
    Galleries,
    /// List the images of one gallery
    Gallery { name: String },
    /// Create a gallery
    CreateGallery { name: String },
    /// Delete an image, a gallery image or a whole gallery
    Delete {
        /// images or gallery
        #[arg(long)]
        kind: String,
        #[arg(long)]
        name: String,
        /// Image inside the gallery
        #[arg(long)]
        deep: Option<String>,
    },
}
