//! Synchronization Orchestrator
//!
//! Runs one workflow per intent against the gateway and the schema editor, and
//! queues the follow-up workflows a success implies:
//!
//! | workflow        | on success, then runs                         |
//! |-----------------|-----------------------------------------------|
//! | CreateContent   | SaveSchema(linked schema), LoadContent(new id) |
//! | DeleteContent   | SaveSchema(unlinked schema)                    |
//! | CreateGallery   | LoadGalleries                                  |
//! | DeleteMedia     | LoadImages / LoadGalleryImages / LoadGalleries |
//!
//! Follow-ups run strictly after the step that triggered them confirmed, in
//! the order listed. Nothing is retried; a failure ends that branch with a
//! failure event and leaves the session schema at its last good value.
//!
//! The schema link is written before the schema save confirms. If that save
//! fails, the session holds a link the persisted schema does not have yet; the
//! next successful SaveSchema repairs it.

use crate::auth::Token;
use crate::content::{ContentId, ContentItem, TemplateId};
use crate::gateway::ResourceGateway;
use crate::media::{MediaEntry, MediaKind, MediaTarget};
use crate::schema::{get_field, locate, set_field, PageSchema, Path, SchemaNode, LINK_FIELD};
use crate::sync::event::{
    EventBus, EventPayload, EventStreams, FailureKind, Outcome, WorkflowEvent, WorkflowFailure,
};
use crate::sync::intent::{reload_after_delete, Intent, IntentId, Workflow};
use crate::sync::state::{IntentLedger, Session, WorkflowState};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Result of one successful workflow step
struct Step {
    token: Token,
    payload: EventPayload,
    follow_ups: Vec<Intent>,
}

impl Step {
    fn new(token: Token, payload: EventPayload) -> Self {
        Self {
            token,
            payload,
            follow_ups: Vec::new(),
        }
    }

    fn then(mut self, intent: Intent) -> Self {
        self.follow_ups.push(intent);
        self
    }
}

/// A queued workflow run
struct Run {
    id: IntentId,
    parent: Option<IntentId>,
    epoch: u64,
    intent: Intent,
}

struct Inner {
    gateway: Arc<dyn ResourceGateway>,
    bus: EventBus,
    session: RwLock<Session>,
    ledger: IntentLedger,
    next_intent: AtomicU64,
}

/// Cloneable handle; clones share the session and event channels
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn ResourceGateway>, token: Token) -> (Self, EventStreams) {
        let (bus, streams) = EventBus::new_pair();
        let inner = Inner {
            gateway,
            bus,
            session: RwLock::new(Session::new(token)),
            ledger: IntentLedger::default(),
            next_intent: AtomicU64::new(1),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            streams,
        )
    }

    /// Run an intent and all of its follow-ups to completion
    ///
    /// Returns the id of the root run. Every run, follow-ups included, has
    /// emitted its event by the time this returns.
    pub async fn execute(&self, intent: Intent) -> IntentId {
        let root = self.next_intent_id();
        let epoch = self.inner.session.read().epoch;
        let mut pending = VecDeque::from([Run {
            id: root,
            parent: None,
            epoch,
            intent,
        }]);

        while let Some(run) = pending.pop_front() {
            let (id, epoch) = (run.id, run.epoch);
            for follow_up in self.run_one(run).await {
                pending.push_back(Run {
                    id: self.next_intent_id(),
                    parent: Some(id),
                    epoch,
                    intent: follow_up,
                });
            }
        }
        root
    }

    /// Run an intent on the tokio runtime without waiting for it
    pub fn dispatch(&self, intent: Intent) -> JoinHandle<IntentId> {
        let this = self.clone();
        tokio::spawn(async move { this.execute(intent).await })
    }

    /// Stop applying results of work already in flight
    ///
    /// Pending runs still complete and emit their events, but their results
    /// no longer change the session.
    pub fn abandon(&self) {
        let mut session = self.inner.session.write();
        session.epoch += 1;
        debug!(epoch = session.epoch, "pending workflows abandoned");
    }

    pub fn schema(&self) -> Option<PageSchema> {
        self.inner.session.read().schema.clone()
    }

    pub fn content(&self, id: &ContentId) -> Option<ContentItem> {
        self.inner.session.read().contents.get(id).cloned()
    }

    pub fn open_contents(&self) -> Vec<ContentId> {
        let mut ids: Vec<ContentId> = self.inner.session.read().contents.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn images(&self) -> Vec<MediaEntry> {
        self.inner.session.read().images.clone()
    }

    pub fn galleries(&self) -> Vec<MediaEntry> {
        self.inner.session.read().galleries.clone()
    }

    pub fn gallery_images(&self, gallery: &str) -> Option<Vec<MediaEntry>> {
        self.inner.session.read().gallery_images.get(gallery).cloned()
    }

    /// The token the next gateway call will present
    pub fn token(&self) -> Token {
        self.inner.session.read().token.clone()
    }

    pub fn replace_token(&self, token: Token) {
        self.inner.session.write().token = token;
    }

    pub fn state(&self, intent_id: IntentId) -> Option<WorkflowState> {
        self.inner.ledger.state(intent_id)
    }

    pub fn in_flight(&self) -> usize {
        self.inner.ledger.in_flight()
    }

    fn next_intent_id(&self) -> IntentId {
        IntentId::new(self.inner.next_intent.fetch_add(1, Ordering::Relaxed))
    }

    fn advance(&self, id: IntentId, next: WorkflowState) {
        if let Err(e) = self.inner.ledger.advance(id, next) {
            error!(intent_id = %id, error = %e, "workflow state machine violated");
        }
    }

    async fn run_one(&self, run: Run) -> Vec<Intent> {
        let Run {
            id,
            parent,
            epoch,
            intent,
        } = run;
        let workflow = intent.workflow();
        let subject = intent.subject();

        self.inner.ledger.register(id);
        self.advance(id, WorkflowState::InFlight);
        let token = self.token();
        debug!(intent_id = %id, workflow = %workflow, parent = ?parent, "workflow started");

        match self.perform(&token, intent).await {
            Ok(step) => {
                self.advance(id, WorkflowState::Succeeded);
                {
                    let mut session = self.inner.session.write();
                    session.token = step.token;
                    if session.epoch == epoch {
                        session.apply(&step.payload);
                    } else {
                        debug!(intent_id = %id, workflow = %workflow, "result not applied, session moved on");
                    }
                }
                debug!(intent_id = %id, workflow = %workflow, follow_ups = step.follow_ups.len(), "workflow succeeded");
                self.emit(workflow, id, parent, Outcome::Success, step.payload);
                step.follow_ups
            }
            Err(failure) => {
                self.advance(id, WorkflowState::Failed);
                let failure = failure.with_subject(subject);
                warn!(
                    intent_id = %id,
                    workflow = %workflow,
                    kind = ?failure.kind,
                    subject = ?failure.subject,
                    error = %failure.message,
                    "workflow failed"
                );
                self.emit(workflow, id, parent, Outcome::Failure, EventPayload::Failure(failure));
                Vec::new()
            }
        }
    }

    fn emit(
        &self,
        workflow: Workflow,
        intent_id: IntentId,
        parent: Option<IntentId>,
        outcome: Outcome,
        payload: EventPayload,
    ) {
        self.inner.bus.emit(WorkflowEvent {
            workflow,
            intent_id,
            parent,
            outcome,
            payload,
        });
    }

    async fn perform(&self, token: &Token, intent: Intent) -> Result<Step, WorkflowFailure> {
        let gateway = &self.inner.gateway;
        match intent {
            Intent::LoadSchema => {
                let loaded = gateway.load_schema(token).await?;
                Ok(Step::new(loaded.token, EventPayload::Schema { schema: loaded.value }))
            }
            Intent::SaveSchema { schema } => {
                let saved = gateway.save_schema(token, &schema).await?;
                Ok(Step::new(saved.token, EventPayload::Schema { schema: saved.value }))
            }
            Intent::LoadContent {
                data_id,
                template_id,
            } => {
                let loaded = gateway.load_content(token, &data_id, &template_id).await?;
                Ok(Step::new(loaded.token, EventPayload::Content { item: loaded.value }))
            }
            Intent::CreateContent {
                template_id,
                path,
                schema,
            } => self.create_content(token, template_id, path, schema).await,
            Intent::DeleteContent {
                data_id,
                path,
                schema,
            } => self.delete_content(token, data_id, path, schema).await,
            Intent::SaveContent { data_id, content } => {
                let saved = gateway.save_content(token, &data_id, &content).await?;
                info!(content_id = %data_id, "content saved");
                Ok(Step::new(
                    saved.token,
                    EventPayload::ContentSaved {
                        content_id: data_id,
                        content: saved.value,
                    },
                ))
            }
            Intent::LoadImages => {
                let listed = gateway.list_media(token, MediaKind::Images, None).await?;
                Ok(Step::new(listed.token, EventPayload::Images { entries: listed.value }))
            }
            Intent::LoadGalleryImages { gallery } => {
                let listed = gateway
                    .list_media(token, MediaKind::Gallery, Some(&gallery))
                    .await?;
                Ok(Step::new(
                    listed.token,
                    EventPayload::GalleryImages {
                        gallery,
                        entries: listed.value,
                    },
                ))
            }
            Intent::LoadGalleries => {
                let listed = gateway.list_media(token, MediaKind::Gallery, None).await?;
                Ok(Step::new(listed.token, EventPayload::Galleries { entries: listed.value }))
            }
            Intent::CreateGallery { name } => {
                let created = gateway.create_gallery(token, &name).await?;
                Ok(Step::new(created.token, EventPayload::GalleryCreated { name })
                    .then(Intent::LoadGalleries))
            }
            Intent::DeleteMedia { target } => self.delete_media(token, target).await,
        }
    }

    /// create → link → (save schema, load content)
    ///
    /// The link target is resolved before the item is created so that a bad
    /// path never leaves an unreferenced item behind.
    async fn create_content(
        &self,
        token: &Token,
        template_id: TemplateId,
        path: Path,
        schema: PageSchema,
    ) -> Result<Step, WorkflowFailure> {
        let node_path = path.link_target()?;
        let node = locate(&schema, &node_path)?;
        require_map(&node_path, node.node())?;
        if let Ok(existing) = get_field(&node, LINK_FIELD) {
            let previous = require_link(&path, existing)?;
            if !previous.is_empty() {
                warn!(path = %path, previous = %previous, "create replaces an existing content link");
            }
        }

        let created = self.inner.gateway.create_content(token, &template_id).await?;
        let content_id = created.value;

        let linked = set_field(&node, LINK_FIELD, SchemaNode::string(content_id.as_str())).map_err(|e| {
            error!(content_id = %content_id, error = %e, "created content could not be linked");
            WorkflowFailure::from(e)
        })?;
        info!(content_id = %content_id, path = %path, template = %template_id, "content created and linked");

        Ok(Step::new(
            created.token,
            EventPayload::ContentLinked {
                content_id: content_id.clone(),
                schema: linked.clone(),
            },
        )
        .then(Intent::SaveSchema { schema: linked })
        .then(Intent::LoadContent {
            data_id: content_id,
            template_id,
        }))
    }

    /// delete → unlink → save schema
    ///
    /// The item is unlinked only after its deletion confirmed. The path must
    /// currently link `data_id`.
    async fn delete_content(
        &self,
        token: &Token,
        data_id: ContentId,
        path: Path,
        schema: PageSchema,
    ) -> Result<Step, WorkflowFailure> {
        let node = locate(&schema, &path.link_target()?)?;
        let linked = require_link(&path, get_field(&node, LINK_FIELD)?)?;
        if linked != data_id.as_str() {
            return Err(WorkflowFailure::new(
                FailureKind::InvalidPath,
                format!("{} links '{}', not '{}'", path, linked, data_id),
            ));
        }

        let deleted = self.inner.gateway.delete_content(token, &data_id).await?;

        let unlinked = set_field(&node, LINK_FIELD, SchemaNode::string(""))?;
        info!(content_id = %data_id, path = %path, "content deleted and unlinked");

        Ok(Step::new(
            deleted.token,
            EventPayload::ContentUnlinked {
                content_id: data_id,
                schema: unlinked.clone(),
            },
        )
        .then(Intent::SaveSchema { schema: unlinked }))
    }

    async fn delete_media(&self, token: &Token, target: MediaTarget) -> Result<Step, WorkflowFailure> {
        let deleted = self.inner.gateway.delete_media(token, &target).await?;
        let reload = reload_after_delete(&target);
        Ok(Step::new(deleted.token, EventPayload::MediaDeleted { target }).then(reload))
    }
}

fn require_map(path: &Path, node: &SchemaNode) -> Result<(), WorkflowFailure> {
    if node.as_map().is_some() {
        Ok(())
    } else {
        Err(WorkflowFailure::new(
            FailureKind::InvalidPath,
            format!("{} is not a page node", path),
        ))
    }
}

fn require_link<'a>(path: &Path, field: &'a SchemaNode) -> Result<&'a str, WorkflowFailure> {
    field.as_str().ok_or_else(|| {
        WorkflowFailure::new(
            FailureKind::InvalidPath,
            format!("{} does not hold a content link", path),
        )
    })
}
