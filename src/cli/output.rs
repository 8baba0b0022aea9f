//! CLI output: workflow events as JSON lines, errors as text.

use crate::error::ApiError;
use crate::sync::WorkflowEvent;

/// What a command printed and whether every workflow it ran succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    /// One JSON object per event, in emission order
    pub fn from_events(events: &[WorkflowEvent]) -> Result<Self, ApiError> {
        let lines = events
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::InvalidArgument(format!("Failed to encode event: {}", e)))?;
        Ok(Self {
            text: lines.join("\n"),
            success: events.iter().all(WorkflowEvent::is_success),
        })
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    e.to_string()
}
