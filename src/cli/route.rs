//! CLI route: single route table and run context. Turns commands into intents
//! and reports the workflow events they produced.

use crate::auth::{Identity, SignedTokenVerifier, Token, TokenVerifier};
use crate::config::{ConfigLoader, FolioConfig};
use crate::content::{decode_document, ContentId, TemplateId};
use crate::error::ApiError;
use crate::gateway::{LocalGateway, ResourceGateway};
use crate::media::{FsMediaLibrary, MediaKind, MediaTarget};
use crate::schema::{PageSchema, Path as SchemaPath};
use crate::store::ResourceStore;
use crate::sync::{Intent, Orchestrator, WorkflowEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::cli::command_name;
use crate::cli::output::CommandOutput;
use crate::cli::parse::{Commands, ContentCommands, MediaCommands, SchemaCommands, TokenCommands};

/// Runtime context for CLI execution: config, gateway and the async runtime.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: FolioConfig,
    workspace_root: PathBuf,
    verifier: Arc<SignedTokenVerifier>,
    gateway: Arc<dyn ResourceGateway>,
    runtime: Runtime,
}

impl RunContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        config.ensure_valid()?;

        let source_root = config.storage.resolve_root(&workspace_root);
        let verifier = Arc::new(SignedTokenVerifier::new(
            &config.auth.secret,
            config.auth.token_ttl_secs,
        ));
        let gateway = LocalGateway::new(
            ResourceStore::on_disk(&source_root),
            verifier.clone(),
            Arc::new(FsMediaLibrary::new(config.storage.media_root(&workspace_root))),
            config.storage.layout(),
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        debug!(source_root = %source_root.display(), "run context ready");
        Ok(Self {
            config,
            workspace_root,
            verifier,
            gateway: Arc::new(gateway),
            runtime,
        })
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands, token: Option<String>) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        let token = token
            .or_else(|| std::env::var("FOLIO_TOKEN").ok())
            .map(Token::new)
            .unwrap_or_default();

        let result = match command {
            Commands::Token { command } => self.handle_token_command(command),
            Commands::Schema { command } => self.handle_schema_command(command, token),
            Commands::Content { command } => self.handle_content_command(command, token),
            Commands::Media { command } => self.handle_media_command(command, token),
        };

        info!(
            command = %name,
            ok = result.as_ref().map(|o| o.success).unwrap_or(false),
            duration_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }

    fn handle_token_command(&self, command: &TokenCommands) -> Result<CommandOutput, ApiError> {
        match command {
            TokenCommands::Issue { id, user } => {
                let token = self.verifier.issue(&Identity::new(id.as_str(), user.as_str()));
                Ok(CommandOutput::plain(token.as_str()))
            }
        }
    }

    fn handle_schema_command(
        &self,
        command: &SchemaCommands,
        token: Token,
    ) -> Result<CommandOutput, ApiError> {
        let intent = match command {
            SchemaCommands::Show => Intent::LoadSchema,
            SchemaCommands::Save { file } => {
                let bytes = std::fs::read(file)?;
                Intent::SaveSchema {
                    schema: PageSchema::from_slice(&bytes)?,
                }
            }
        };
        self.run(token, vec![intent])
    }

    fn handle_content_command(
        &self,
        command: &ContentCommands,
        token: Token,
    ) -> Result<CommandOutput, ApiError> {
        match command {
            ContentCommands::Show { id, template } => self.run(
                token,
                vec![Intent::LoadContent {
                    data_id: parse_content_id(id)?,
                    template_id: parse_template_id(template)?,
                }],
            ),
            ContentCommands::Create { template, path } => {
                let template_id = parse_template_id(template)?;
                let path = parse_path(path)?;
                self.run_against_schema(token, move |schema| Intent::CreateContent {
                    template_id,
                    path,
                    schema,
                })
            }
            ContentCommands::Delete { id, path } => {
                let data_id = parse_content_id(id)?;
                let path = parse_path(path)?;
                self.run_against_schema(token, move |schema| Intent::DeleteContent {
                    data_id,
                    path,
                    schema,
                })
            }
            ContentCommands::Save { id, file } => {
                let bytes = std::fs::read(file)?;
                let content = decode_document(&bytes).map_err(|e| {
                    ApiError::InvalidArgument(format!("{}: {}", file.display(), e))
                })?;
                self.run(
                    token,
                    vec![Intent::SaveContent {
                        data_id: parse_content_id(id)?,
                        content,
                    }],
                )
            }
        }
    }

    fn handle_media_command(
        &self,
        command: &MediaCommands,
        token: Token,
    ) -> Result<CommandOutput, ApiError> {
        let intent = match command {
            MediaCommands::Images => Intent::LoadImages,
            MediaCommands::Galleries => Intent::LoadGalleries,
            MediaCommands::Gallery { name } => Intent::LoadGalleryImages {
                gallery: name.clone(),
            },
            MediaCommands::CreateGallery { name } => Intent::CreateGallery { name: name.clone() },
            MediaCommands::Delete { kind, name, deep } => Intent::DeleteMedia {
                target: MediaTarget {
                    kind: kind
                        .parse::<MediaKind>()
                        .map_err(ApiError::InvalidArgument)?,
                    name: name.clone(),
                    deep: deep.clone(),
                },
            },
        };
        self.run(token, vec![intent])
    }

    /// Run intents one after another on a fresh session and collect their events
    fn run(&self, token: Token, intents: Vec<Intent>) -> Result<CommandOutput, ApiError> {
        let (orchestrator, mut streams) = Orchestrator::new(self.gateway.clone(), token);
        let events = self.runtime.block_on(async {
            let mut events = Vec::new();
            for intent in intents {
                orchestrator.execute(intent).await;
                events.extend(streams.drain());
            }
            events
        });
        CommandOutput::from_events(&events)
    }

    /// Load the stored schema, then run the intent built from it
    ///
    /// Stops after the load when it fails.
    fn run_against_schema<F>(&self, token: Token, build: F) -> Result<CommandOutput, ApiError>
    where
        F: FnOnce(PageSchema) -> Intent,
    {
        let (orchestrator, mut streams) = Orchestrator::new(self.gateway.clone(), token);
        let events: Vec<WorkflowEvent> = self.runtime.block_on(async {
            orchestrator.execute(Intent::LoadSchema).await;
            let mut events = streams.drain();
            if let Some(schema) = orchestrator.schema() {
                orchestrator.execute(build(schema)).await;
                events.extend(streams.drain());
            }
            events
        });
        CommandOutput::from_events(&events)
    }
}

fn parse_content_id(raw: &str) -> Result<ContentId, ApiError> {
    ContentId::parse(raw).map_err(ApiError::InvalidArgument)
}

fn parse_template_id(raw: &str) -> Result<TemplateId, ApiError> {
    TemplateId::parse(raw).map_err(ApiError::InvalidArgument)
}

fn parse_path(raw: &str) -> Result<SchemaPath, ApiError> {
    raw.parse::<SchemaPath>().map_err(ApiError::from)
}
