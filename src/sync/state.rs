//! Per-intent state machine and the live editing session

use crate::auth::Token;
use crate::content::{ContentId, ContentItem};
use crate::media::{MediaEntry, MediaKind};
use crate::schema::PageSchema;
use crate::sync::event::EventPayload;
use crate::sync::intent::IntentId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Finished intents kept in the ledger before the oldest are dropped
pub const DEFAULT_LEDGER_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Succeeded | WorkflowState::Failed)
    }

    /// Idle → InFlight → {Succeeded, Failed}
    pub fn can_advance_to(self, next: WorkflowState) -> bool {
        matches!(
            (self, next),
            (WorkflowState::Idle, WorkflowState::InFlight)
                | (WorkflowState::InFlight, WorkflowState::Succeeded)
                | (WorkflowState::InFlight, WorkflowState::Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Unknown intent {0}")]
    UnknownIntent(IntentId),

    #[error("Intent {intent_id} cannot go from {from:?} to {to:?}")]
    IllegalTransition {
        intent_id: IntentId,
        from: WorkflowState,
        to: WorkflowState,
    },
}

/// Current state of every recent intent
pub struct IntentLedger {
    states: Mutex<BTreeMap<IntentId, WorkflowState>>,
    capacity: usize,
}

impl Default for IntentLedger {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }
}

impl IntentLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Mutex::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn register(&self, intent_id: IntentId) {
        let mut states = self.states.lock();
        states.insert(intent_id, WorkflowState::Idle);

        let finished = states.values().filter(|s| s.is_terminal()).count();
        if finished > self.capacity {
            let excess = finished - self.capacity;
            let oldest: Vec<IntentId> = states
                .iter()
                .filter(|(_, s)| s.is_terminal())
                .map(|(id, _)| *id)
                .take(excess)
                .collect();
            for id in oldest {
                states.remove(&id);
            }
        }
    }

    pub fn advance(&self, intent_id: IntentId, next: WorkflowState) -> Result<(), LedgerError> {
        let mut states = self.states.lock();
        let current = states
            .get_mut(&intent_id)
            .ok_or(LedgerError::UnknownIntent(intent_id))?;
        if !current.can_advance_to(next) {
            return Err(LedgerError::IllegalTransition {
                intent_id,
                from: *current,
                to: next,
            });
        }
        *current = next;
        Ok(())
    }

    pub fn state(&self, intent_id: IntentId) -> Option<WorkflowState> {
        self.states.lock().get(&intent_id).copied()
    }

    pub fn in_flight(&self) -> usize {
        self.states
            .lock()
            .values()
            .filter(|s| **s == WorkflowState::InFlight)
            .count()
    }
}

/// What the editor currently sees
#[derive(Debug, Default)]
pub struct Session {
    pub token: Token,
    /// Bumped when the UI abandons its pending work
    pub epoch: u64,
    pub schema: Option<PageSchema>,
    pub contents: HashMap<ContentId, ContentItem>,
    pub images: Vec<MediaEntry>,
    pub galleries: Vec<MediaEntry>,
    pub gallery_images: HashMap<String, Vec<MediaEntry>>,
}

impl Session {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    /// Fold a successful workflow result into the session
    pub fn apply(&mut self, payload: &EventPayload) {
        match payload {
            EventPayload::Schema { schema }
            | EventPayload::ContentLinked { schema, .. } => {
                self.schema = Some(schema.clone());
            }
            EventPayload::ContentUnlinked { content_id, schema } => {
                self.schema = Some(schema.clone());
                self.contents.remove(content_id);
            }
            EventPayload::Content { item } => {
                self.contents.insert(item.id.clone(), item.clone());
            }
            EventPayload::ContentSaved {
                content_id,
                content,
            } => {
                if let Some(item) = self.contents.get_mut(content_id) {
                    item.metadata = content.metadata.clone();
                    item.data = content.data.clone();
                }
            }
            EventPayload::Images { entries } => self.images = entries.clone(),
            EventPayload::Galleries { entries } => self.galleries = entries.clone(),
            EventPayload::GalleryImages { gallery, entries } => {
                self.gallery_images.insert(gallery.clone(), entries.clone());
            }
            EventPayload::MediaDeleted { target } => {
                if target.kind == MediaKind::Gallery && target.deep.is_none() {
                    self.gallery_images.remove(&target.name);
                }
            }
            EventPayload::GalleryCreated { .. } | EventPayload::Failure(_) => {}
        }
    }
}
