//! Workflow orchestration between the editor session and the gateway

pub mod event;
pub mod intent;
pub mod orchestrator;
pub mod state;

pub use event::{
    EventBus, EventPayload, EventStreams, FailureKind, Outcome, WorkflowEvent, WorkflowFailure,
};
pub use intent::{reload_after_delete, Family, Intent, IntentId, Workflow};
pub use orchestrator::Orchestrator;
pub use state::{IntentLedger, LedgerError, Session, WorkflowState, DEFAULT_LEDGER_CAPACITY};
