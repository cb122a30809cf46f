use serde::{Deserialize, Serialize};

use super::{properties::ItemProperties, timestamp::Timestamp};

/// Presentation hint describing how an event chains with its neighbours.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupStyle {
    /// Stands alone.
    #[default]
    Single,
    /// Opens a block of consecutive events from one sender.
    First,
    /// Continues a block.
    Middle,
    /// Closes a block.
    Last,
}

impl GroupStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::First => "first",
            Self::Middle => "middle",
            Self::Last => "last",
        }
    }
}

/// Media attachment carried by image, video, audio, file and sticker events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaContent {
    /// Caption or file name.
    pub body: String,
    /// Source location of the media, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

/// Payload of an event item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventContent {
    /// Plain message.
    Text { body: String },
    /// Action message, rendered as `* body`.
    Emote { body: String },
    /// Automated message, typically from a bot.
    Notice { body: String },
    Image(MediaContent),
    Video(MediaContent),
    Audio(MediaContent),
    File(MediaContent),
    Sticker(MediaContent),
    /// Content removed by a redaction.
    Redacted,
    /// Content that could not be decrypted.
    Encrypted,
    /// Membership, topic and other room state changes.
    State { description: String },
    /// Anything the materializer did not recognise.
    Unsupported { original_kind: String },
}

impl EventContent {
    /// Short human readable rendering used by logs and the replay CLI.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Text { body } | Self::Notice { body } => body.clone(),
            Self::Emote { body } => format!("* {body}"),
            Self::Image(media) => format!("[image] {}", media.body),
            Self::Video(media) => format!("[video] {}", media.body),
            Self::Audio(media) => format!("[audio] {}", media.body),
            Self::File(media) => format!("[file] {}", media.body),
            Self::Sticker(media) => format!("[sticker] {}", media.body),
            Self::Redacted => "[redacted]".to_string(),
            Self::Encrypted => "[encrypted]".to_string(),
            Self::State { description } => format!("[state] {description}"),
            Self::Unsupported { original_kind } => format!("[unsupported: {original_kind}]"),
        }
    }
}

/// A message or state event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventTimelineItem {
    /// Event id, or the transaction id of a local echo.
    pub id: String,
    /// User id of the author; empty when upstream did not provide one.
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    pub content: EventContent,
    pub properties: ItemProperties,
    /// Derived by the stylist after every batch; never set from upstream.
    pub group_style: GroupStyle,
}

/// Placeholder kinds produced by the sync layer rather than by users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VirtualKind {
    DayDivider { timestamp: Timestamp },
    LoadingIndicator,
    ReadMarker,
    TimelineStart,
}

/// Non-event entry; never groups with its neighbours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VirtualTimelineItem {
    pub id: String,
    #[serde(flatten)]
    pub kind: VirtualKind,
}

/// Local proxy for one entry of the materialized timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum TimelineItem {
    Event(EventTimelineItem),
    Virtual(VirtualTimelineItem),
}

impl TimelineItem {
    /// Identifier, unique within one timeline.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Event(event) => &event.id,
            Self::Virtual(item) => &item.id,
        }
    }

    /// The event payload, or `None` for virtual items.
    #[must_use]
    pub fn as_event(&self) -> Option<&EventTimelineItem> {
        match self {
            Self::Event(event) => Some(event),
            Self::Virtual(_) => None,
        }
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    /// Author of an event item.
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        self.as_event().map(|event| event.sender.as_str())
    }

    /// Style assigned by the last restyle; `None` for virtual items.
    #[must_use]
    pub fn group_style(&self) -> Option<GroupStyle> {
        self.as_event().map(|event| event.group_style)
    }

    #[must_use]
    pub fn has_reactions(&self) -> bool {
        self.as_event()
            .is_some_and(|event| event.properties.has_reactions())
    }

    /// Local echo that has not reached the server yet, or failed to.
    #[must_use]
    pub fn is_unsent(&self) -> bool {
        self.as_event()
            .is_some_and(|event| event.properties.is_unsent())
    }

    /// Whether a reaction can be sent to this item.
    #[must_use]
    pub fn is_reactable(&self) -> bool {
        match self {
            Self::Event(event) => match event.content {
                EventContent::Text { .. }
                | EventContent::Emote { .. }
                | EventContent::Notice { .. }
                | EventContent::Image(_)
                | EventContent::Video(_)
                | EventContent::Audio(_)
                | EventContent::File(_)
                | EventContent::Sticker(_) => true,
                EventContent::Redacted
                | EventContent::Encrypted
                | EventContent::State { .. }
                | EventContent::Unsupported { .. } => false,
            },
            Self::Virtual(_) => false,
        }
    }

    /// Identifier used in log lines: the id for events, the kind for
    /// virtual items.
    #[must_use]
    pub fn debug_identifier(&self) -> String {
        match self {
            Self::Event(event) => event.id.clone(),
            Self::Virtual(item) => match &item.kind {
                VirtualKind::DayDivider { timestamp } => format!("DayDivider({timestamp})"),
                VirtualKind::LoadingIndicator => "LoadingIndicator".to_string(),
                VirtualKind::ReadMarker => "ReadMarker".to_string(),
                VirtualKind::TimelineStart => "TimelineStart".to_string(),
            },
        }
    }
}
