//! Event types for the itemhub event system

use chrono::{DateTime, Utc};
use itemhub_core::ItemId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    #[serde(rename = "item.created")]
    ItemCreated { item_id: ItemId, name: String },

    #[serde(rename = "item.updated")]
    ItemUpdated { item_id: ItemId },

    #[serde(rename = "item.deleted")]
    ItemDeleted { item_id: ItemId },

    /// A processing batch finished, fully or up to its deadline
    #[serde(rename = "batch.completed")]
    BatchCompleted {
        processed: usize,
        failed: usize,
        partial: bool,
        duration_ms: u64,
    },
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ItemCreated { .. } => "item.created",
            Self::ItemUpdated { .. } => "item.updated",
            Self::ItemDeleted { .. } => "item.deleted",
            Self::BatchCompleted { .. } => "batch.completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_uses_dotted_type() {
        let event = Event::ItemCreated {
            item_id: ItemId(5),
            name: "Widget".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "item.created");
        assert_eq!(json["item_id"], 5);
        assert_eq!(json["type"], event.event_type());
    }

    #[test]
    fn test_envelope_roundtrip() {
        let envelope = EventEnvelope::new(Event::BatchCompleted {
            processed: 3,
            failed: 1,
            partial: false,
            duration_ms: 12,
        });

        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: EventEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, envelope.id);
        assert!(matches!(
            parsed.event,
            Event::BatchCompleted { processed: 3, failed: 1, .. }
        ));
    }
}
