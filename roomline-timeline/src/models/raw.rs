//! Raw timeline records as delivered by the sync layer.
//!
//! Everything except the identifier and the `type` discriminant is optional
//! on the wire. Unknown discriminants and content kinds deserialize instead
//! of failing so that the materializer can map them best-effort.

use serde::{Deserialize, Serialize};

use super::{
    properties::{AggregatedReaction, DeliveryStatus, ItemProperties},
    timestamp::Timestamp,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    /// Stable identifier, unique within one timeline.
    pub id: String,
    #[serde(flatten)]
    pub kind: RawItemKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawItemKind {
    Event(RawEvent),
    DayDivider {
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    LoadingIndicator,
    ReadMarker,
    TimelineStart,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEvent {
    #[serde(default)]
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub content: RawContent,
    #[serde(flatten)]
    pub properties: ItemProperties,
}

/// Loosely typed event payload; `kind` selects the content variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawContent {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl RawItem {
    /// Plain text event from `sender`.
    #[must_use]
    pub fn text(id: impl Into<String>, sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RawItemKind::Event(RawEvent {
                sender: sender.into(),
                timestamp: None,
                content: RawContent {
                    kind: "text".to_string(),
                    body: Some(body.into()),
                    ..RawContent::default()
                },
                properties: ItemProperties::default(),
            }),
        }
    }

    #[must_use]
    pub fn day_divider(id: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: id.into(),
            kind: RawItemKind::DayDivider {
                timestamp: Some(timestamp),
            },
        }
    }

    #[must_use]
    pub fn read_marker(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RawItemKind::ReadMarker,
        }
    }

    /// Adds a single-sender reaction. No-op on non-event records.
    #[must_use]
    pub fn with_reaction(mut self, key: impl Into<String>) -> Self {
        if let RawItemKind::Event(event) = &mut self.kind {
            event.properties.reactions.push(AggregatedReaction {
                key: key.into(),
                count: 1,
                senders: Vec::new(),
            });
        }
        self
    }

    /// Sets the local delivery status. No-op on non-event records.
    #[must_use]
    pub fn with_delivery_status(mut self, status: DeliveryStatus) -> Self {
        if let RawItemKind::Event(event) = &mut self.kind {
            event.properties.delivery_status = Some(status);
        }
        self
    }

    /// Marks a local echo with the transaction id it was sent under.
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        if let RawItemKind::Event(event) = &mut self.kind {
            event.properties.transaction_id = Some(transaction_id.into());
        }
        self
    }

    /// Identifier used in reconciliation logs.
    #[must_use]
    pub fn debug_identifier(&self) -> String {
        match &self.kind {
            RawItemKind::Event(_) => self.id.clone(),
            RawItemKind::DayDivider {
                timestamp: Some(timestamp),
            } => format!("DayDivider({timestamp})"),
            RawItemKind::DayDivider { timestamp: None } => "DayDivider(?)".to_string(),
            RawItemKind::LoadingIndicator => "LoadingIndicator".to_string(),
            RawItemKind::ReadMarker => "ReadMarker".to_string(),
            RawItemKind::TimelineStart => "TimelineStart".to_string(),
            RawItemKind::Unknown => "UnknownTimelineItem".to_string(),
        }
    }
}
