//! In-process gateway over the durable resource store

use super::{Authorized, GatewayResult, ResourceGateway};
use crate::auth::{Identity, Token, TokenVerifier};
use crate::content::{decode_document, encode_document, ContentData, ContentId, ContentItem, TemplateId};
use crate::error::GatewayError;
use crate::media::{self, MediaEntry, MediaKind, MediaLibrary, MediaTarget};
use crate::schema::PageSchema;
use crate::store::ResourceStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts at finding an unused content id before giving up
const ID_ALLOCATION_ATTEMPTS: usize = 8;

/// Where resources live inside the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub schema_resource: String,
    pub content_dir: String,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            schema_resource: "web-schema.json".to_string(),
            content_dir: "data".to_string(),
        }
    }
}

impl StorageLayout {
    pub fn content_resource(&self, id: &ContentId) -> String {
        format!("{}/{}.json", self.content_dir, id)
    }
}

pub struct LocalGateway {
    store: ResourceStore,
    verifier: Arc<dyn TokenVerifier>,
    media: Arc<dyn MediaLibrary>,
    layout: StorageLayout,
}

impl LocalGateway {
    pub fn new(
        store: ResourceStore,
        verifier: Arc<dyn TokenVerifier>,
        media: Arc<dyn MediaLibrary>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            store,
            verifier,
            media,
            layout,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    fn authorize(&self, token: &Token) -> Result<Identity, GatewayError> {
        self.verifier.verify(token).map_err(|e| {
            debug!(reason = %e.0, "rejected gateway call");
            GatewayError::from(e)
        })
    }

    fn respond<T>(&self, identity: &Identity, value: T) -> GatewayResult<T> {
        Ok(Authorized {
            value,
            token: self.verifier.issue(identity),
        })
    }

    async fn read_document(&self, id: &ContentId) -> Result<ContentData, GatewayError> {
        let resource = self.layout.content_resource(id);
        let bytes = self.store.read(&resource).await?;
        decode_document(&bytes).map_err(|reason| GatewayError::CorruptContent { resource, reason })
    }

    async fn allocate_id(&self) -> Result<ContentId, GatewayError> {
        for _ in 0..ID_ALLOCATION_ATTEMPTS {
            let id = ContentId::generate();
            if !self.store.exists(&self.layout.content_resource(&id)).await? {
                return Ok(id);
            }
            warn!(content_id = %id, "generated content id already in use");
        }
        Err(GatewayError::TransportFailure(
            "could not allocate an unused content id".to_string(),
        ))
    }
}

fn check_media_name(name: &str) -> Result<(), GatewayError> {
    media::validate_name(name).map_err(GatewayError::InvalidRequest)
}

fn media_io(err: std::io::Error) -> GatewayError {
    match err.kind() {
        std::io::ErrorKind::NotFound => GatewayError::NotFound(err.to_string()),
        _ => GatewayError::TransportFailure(format!("media i/o: {}", err)),
    }
}

#[async_trait]
impl ResourceGateway for LocalGateway {
    async fn load_schema(&self, token: &Token) -> GatewayResult<PageSchema> {
        let identity = self.authorize(token)?;
        let resource = &self.layout.schema_resource;
        let bytes = self.store.read(resource).await?;
        let schema = PageSchema::from_slice(&bytes).map_err(|e| GatewayError::CorruptContent {
            resource: resource.clone(),
            reason: e.to_string(),
        })?;
        self.respond(&identity, schema)
    }

    async fn save_schema(&self, token: &Token, schema: &PageSchema) -> GatewayResult<PageSchema> {
        let identity = self.authorize(token)?;
        self.store
            .write_json(&self.layout.schema_resource, schema)
            .await?;
        info!(user = %identity.user, "page schema saved");
        self.respond(&identity, schema.clone())
    }

    async fn load_content(
        &self,
        token: &Token,
        id: &ContentId,
        template: &TemplateId,
    ) -> GatewayResult<ContentItem> {
        let identity = self.authorize(token)?;
        let document = self.read_document(id).await?;
        self.respond(&identity, ContentItem::new(id.clone(), template.clone(), document))
    }

    async fn create_content(
        &self,
        token: &Token,
        template: &TemplateId,
    ) -> GatewayResult<ContentId> {
        let identity = self.authorize(token)?;
        let id = self.allocate_id().await?;
        let payload = encode_document(&ContentData::default())
            .map_err(GatewayError::TransportFailure)?;
        // No id leaves this function unless the initial write confirmed.
        self.store
            .write(&self.layout.content_resource(&id), &payload)
            .await?;
        info!(content_id = %id, template = %template, user = %identity.user, "content created");
        self.respond(&identity, id)
    }

    async fn save_content(
        &self,
        token: &Token,
        id: &ContentId,
        document: &ContentData,
    ) -> GatewayResult<ContentData> {
        let identity = self.authorize(token)?;
        let resource = self.layout.content_resource(id);
        if !self.store.exists(&resource).await? {
            return Err(GatewayError::NotFound(resource));
        }
        let payload = encode_document(document).map_err(GatewayError::TransportFailure)?;
        self.store.write(&resource, &payload).await?;
        debug!(content_id = %id, "content saved");
        self.respond(&identity, document.clone())
    }

    async fn delete_content(&self, token: &Token, id: &ContentId) -> GatewayResult<()> {
        let identity = self.authorize(token)?;
        self.store.remove(&self.layout.content_resource(id)).await?;
        info!(content_id = %id, user = %identity.user, "content deleted");
        self.respond(&identity, ())
    }

    async fn list_media(
        &self,
        token: &Token,
        kind: MediaKind,
        name: Option<&str>,
    ) -> GatewayResult<Vec<MediaEntry>> {
        let identity = self.authorize(token)?;
        if let Some(name) = name {
            check_media_name(name)?;
        }
        let entries = self.media.scan(kind, name).await.map_err(media_io)?;
        self.respond(&identity, entries)
    }

    async fn create_gallery(&self, token: &Token, name: &str) -> GatewayResult<()> {
        let identity = self.authorize(token)?;
        check_media_name(name)?;
        self.media.create_gallery(name).await.map_err(media_io)?;
        info!(gallery = %name, "gallery created");
        self.respond(&identity, ())
    }

    async fn delete_media(&self, token: &Token, target: &MediaTarget) -> GatewayResult<()> {
        let identity = self.authorize(token)?;
        check_media_name(&target.name)?;
        if let Some(deep) = &target.deep {
            check_media_name(deep)?;
        }
        self.media.remove(target).await.map_err(media_io)?;
        info!(kind = ?target.kind, name = %target.name, deep = ?target.deep, "media deleted");
        self.respond(&identity, ())
    }
}
