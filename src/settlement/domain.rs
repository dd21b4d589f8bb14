//! Outcomes of applying processor capture events.

use crate::ids::{TaskId, UnreconciledEventId};
use crate::payments::domain::{CaptureEvent, HoldPurpose, HoldSessionId};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// What happened to a capture event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// State changed.
    Applied(HoldPurpose),
    /// Already applied; nothing changed.
    Replayed(HoldPurpose),
    /// Could not be applied; kept for manual reconciliation.
    Dropped {
        /// Purpose the event claimed, when it parsed.
        purpose: Option<HoldPurpose>,
        /// Why it was set aside.
        reason: String,
    },
    /// Not an event this service handles.
    Ignored {
        /// Processor event type.
        event_type: String,
    },
}

/// A capture event that could not be applied, kept for manual replay.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreconciledEvent {
    /// Record identifier.
    pub id: UnreconciledEventId,
    /// Processor event identifier.
    pub event_id: String,
    /// Captured session.
    pub session_id: Option<HoldSessionId>,
    /// Task named by the event, when parseable.
    pub task_id: Option<TaskId>,
    /// Purpose the event claimed.
    pub purpose: Option<HoldPurpose>,
    /// Why the event was set aside.
    pub reason: String,
    /// Raw event payload.
    pub payload: serde_json::Value,
    /// When it was received.
    pub received_at: DateTime<Utc>,
}

impl UnreconciledEvent {
    /// Records a parsed capture that could not be applied.
    #[must_use]
    pub fn from_capture(event: &CaptureEvent, reason: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: UnreconciledEventId::new(),
            event_id: event.event_id.clone(),
            session_id: Some(event.session_id.clone()),
            task_id: Some(event.metadata.task_id),
            purpose: Some(event.metadata.purpose),
            reason: reason.into(),
            payload: event.payload.clone(),
            received_at: clock.utc(),
        }
    }

    /// Records a verified event whose body could not be interpreted.
    #[must_use]
    pub fn unparsed(
        event_id: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: UnreconciledEventId::new(),
            event_id: event_id.into(),
            session_id: None,
            task_id: None,
            purpose: None,
            reason: reason.into(),
            payload,
            received_at: clock.utc(),
        }
    }
}
