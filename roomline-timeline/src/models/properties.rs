use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;

/// Local delivery state of an event the current user sent.
///
/// Remote events that were echoed back by the server carry no status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    SendingFailed,
}

impl DeliveryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::SendingFailed => "sending_failed",
        }
    }
}

/// A reaction key together with everyone who sent it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AggregatedReaction {
    pub key: String,
    pub count: u64,
    #[serde(default)]
    pub senders: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReadReceipt {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// Mutable properties shared by every event-based timeline item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct ItemProperties {
    /// Whether the item has been edited.
    pub is_edited: bool,
    /// Aggregated reactions, in the order the sync layer reported them.
    pub reactions: Vec<AggregatedReaction>,
    /// `None` once a sent message has been echoed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<DeliveryStatus>,
    /// Read receipts ordered from newest to oldest.
    pub read_receipts: Vec<ReadReceipt>,
    /// Transaction id generated by the client when the event was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl ItemProperties {
    #[must_use]
    pub fn has_reactions(&self) -> bool {
        !self.reactions.is_empty()
    }

    #[must_use]
    pub fn is_unsent(&self) -> bool {
        matches!(
            self.delivery_status,
            Some(DeliveryStatus::Pending | DeliveryStatus::SendingFailed)
        )
    }
}
