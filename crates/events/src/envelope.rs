use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Envelope for an event as it travels over a bus.
///
/// Notes:
/// - `event_id` identifies one publication; redeliveries keep the id.
/// - `event_type` is copied from the payload so subscribers can route without
///   decoding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    published_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E>
where
    E: Event,
{
    /// Wrap a payload under a fresh (time-ordered) event id.
    pub fn wrap(payload: E, published_at: DateTime<Utc>) -> Self {
        Self::new(Uuid::now_v7(), published_at, payload)
    }

    pub fn new(event_id: Uuid, published_at: DateTime<Utc>, payload: E) -> Self {
        Self {
            event_id,
            event_type: payload.event_type().to_string(),
            published_at,
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
