//! Resource Access Gateway
//!
//! Typed operations over the three resource kinds (page schema, content item,
//! media listing). The [`ResourceGateway`] trait is the transport seam: the
//! orchestrator only ever talks to this trait, and [`LocalGateway`] is the
//! in-process implementation over the durable store.
//!
//! Every operation takes the caller's token explicitly, validates it before any
//! access, and on success returns the value together with a refreshed token.

pub mod local;

pub use local::{LocalGateway, StorageLayout};

use crate::auth::Token;
use crate::content::{ContentData, ContentId, ContentItem, TemplateId};
use crate::error::GatewayError;
use crate::media::{MediaEntry, MediaKind, MediaTarget};
use crate::schema::PageSchema;
use async_trait::async_trait;

/// A successful gateway response and the token to use for the next call
#[derive(Debug, Clone)]
pub struct Authorized<T> {
    pub value: T,
    pub token: Token,
}

pub type GatewayResult<T> = Result<Authorized<T>, GatewayError>;

#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn load_schema(&self, token: &Token) -> GatewayResult<PageSchema>;

    /// Persist the schema; returns the schema as stored
    async fn save_schema(&self, token: &Token, schema: &PageSchema) -> GatewayResult<PageSchema>;

    async fn load_content(
        &self,
        token: &Token,
        id: &ContentId,
        template: &TemplateId,
    ) -> GatewayResult<ContentItem>;

    /// Allocate a new id and persist an empty item under it
    async fn create_content(&self, token: &Token, template: &TemplateId)
        -> GatewayResult<ContentId>;

    /// Overwrite an existing item; returns the canonical stored document
    async fn save_content(
        &self,
        token: &Token,
        id: &ContentId,
        document: &ContentData,
    ) -> GatewayResult<ContentData>;

    async fn delete_content(&self, token: &Token, id: &ContentId) -> GatewayResult<()>;

    async fn list_media(
        &self,
        token: &Token,
        kind: MediaKind,
        name: Option<&str>,
    ) -> GatewayResult<Vec<MediaEntry>>;

    async fn create_gallery(&self, token: &Token, name: &str) -> GatewayResult<()>;

    async fn delete_media(&self, token: &Token, target: &MediaTarget) -> GatewayResult<()>;
}
