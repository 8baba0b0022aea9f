//! Workflow events and the per-family event bus
//!
//! Each workflow run ends in exactly one event. Events for one workflow family
//! arrive on that family's channel in the order they were emitted; there is no
//! replay for late subscribers.

use crate::content::{ContentData, ContentId, ContentItem};
use crate::error::{GatewayError, RestoreOutcome, SchemaError};
use crate::media::{MediaEntry, MediaTarget};
use crate::schema::PageSchema;
use crate::sync::intent::{Family, IntentId, Workflow};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unauthorized,
    NotFound,
    CorruptContent,
    WriteFailure,
    InvalidPath,
    InvalidRequest,
    TransportFailure,
}

/// Why a workflow failed and what it was working on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Set for write failures: whether the previous resource was put back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<RestoreOutcome>,
}

impl WorkflowFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            subject: None,
            restore: None,
        }
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }
}

impl From<GatewayError> for WorkflowFailure {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::Unauthorized(_) => WorkflowFailure::new(FailureKind::Unauthorized, message),
            GatewayError::NotFound(_) => WorkflowFailure::new(FailureKind::NotFound, message),
            GatewayError::CorruptContent { .. } => {
                WorkflowFailure::new(FailureKind::CorruptContent, message)
            }
            GatewayError::WriteFailure(failure) => WorkflowFailure {
                restore: Some(failure.restore),
                ..WorkflowFailure::new(FailureKind::WriteFailure, message)
            },
            GatewayError::InvalidRequest(_) => {
                WorkflowFailure::new(FailureKind::InvalidRequest, message)
            }
            GatewayError::TransportFailure(_) => {
                WorkflowFailure::new(FailureKind::TransportFailure, message)
            }
        }
    }
}

impl From<SchemaError> for WorkflowFailure {
    fn from(err: SchemaError) -> Self {
        WorkflowFailure::new(FailureKind::InvalidPath, err.to_string())
    }
}

/// What a finished workflow reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Schema {
        schema: PageSchema,
    },
    ContentLinked {
        content_id: ContentId,
        schema: PageSchema,
    },
    ContentUnlinked {
        content_id: ContentId,
        schema: PageSchema,
    },
    Content {
        item: ContentItem,
    },
    ContentSaved {
        content_id: ContentId,
        content: ContentData,
    },
    Images {
        entries: Vec<MediaEntry>,
    },
    GalleryImages {
        gallery: String,
        entries: Vec<MediaEntry>,
    },
    Galleries {
        entries: Vec<MediaEntry>,
    },
    GalleryCreated {
        name: String,
    },
    MediaDeleted {
        target: MediaTarget,
    },
    Failure(WorkflowFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub workflow: Workflow,
    pub intent_id: IntentId,
    /// The run whose success triggered this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<IntentId>,
    pub outcome: Outcome,
    pub payload: EventPayload,
}

impl WorkflowEvent {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn failure(&self) -> Option<&WorkflowFailure> {
        match &self.payload {
            EventPayload::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Sending half: one unbounded channel per workflow family
#[derive(Clone)]
pub struct EventBus {
    media: UnboundedSender<WorkflowEvent>,
    pages: UnboundedSender<WorkflowEvent>,
}

/// Receiving half handed to the UI layer
pub struct EventStreams {
    pub media: UnboundedReceiver<WorkflowEvent>,
    pub pages: UnboundedReceiver<WorkflowEvent>,
}

impl EventBus {
    pub fn new_pair() -> (Self, EventStreams) {
        let (media_tx, media_rx) = unbounded_channel();
        let (pages_tx, pages_rx) = unbounded_channel();
        (
            Self {
                media: media_tx,
                pages: pages_tx,
            },
            EventStreams {
                media: media_rx,
                pages: pages_rx,
            },
        )
    }

    /// Send an event on its family's channel
    ///
    /// Returns `false` when nobody is listening any more.
    pub fn emit(&self, event: WorkflowEvent) -> bool {
        let sender = match event.workflow.family() {
            Family::Media => &self.media,
            Family::Pages => &self.pages,
        };
        match sender.send(event) {
            Ok(()) => true,
            Err(unsent) => {
                debug!(
                    workflow = %unsent.0.workflow,
                    intent_id = %unsent.0.intent_id,
                    "event dropped, no subscriber"
                );
                false
            }
        }
    }
}

impl EventStreams {
    /// Take every event already queued on both channels, pages first
    pub fn drain(&mut self) -> Vec<WorkflowEvent> {
        let mut out = self.drain_family(Family::Pages);
        out.extend(self.drain_family(Family::Media));
        out
    }

    /// Take every event already queued on one family's channel
    pub fn drain_family(&mut self, family: Family) -> Vec<WorkflowEvent> {
        let receiver = match family {
            Family::Media => &mut self.media,
            Family::Pages => &mut self.pages,
        };
        let mut out = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            out.push(event);
        }
        out
    }
}
