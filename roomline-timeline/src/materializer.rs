//! Raw record to local item proxy mapping.
//!
//! The mapping is total: records the engine cannot represent become
//! `Unsupported` event items so a single odd payload never stalls
//! reconciliation.

use crate::models::{
    EventContent, EventTimelineItem, GroupStyle, ItemProperties, MediaContent, RawContent,
    RawEvent, RawItem, RawItemKind, TimelineItem, VirtualKind, VirtualTimelineItem,
};

/// Converts one raw record into a timeline item with a neutral group style.
#[must_use]
pub fn materialize(raw: RawItem) -> TimelineItem {
    let RawItem { id, kind } = raw;
    match kind {
        RawItemKind::Event(event) => TimelineItem::Event(materialize_event(id, event)),
        RawItemKind::DayDivider {
            timestamp: Some(timestamp),
        } => virtual_item(id, VirtualKind::DayDivider { timestamp }),
        RawItemKind::DayDivider { timestamp: None } => unsupported(id, "day_divider"),
        RawItemKind::LoadingIndicator => virtual_item(id, VirtualKind::LoadingIndicator),
        RawItemKind::ReadMarker => virtual_item(id, VirtualKind::ReadMarker),
        RawItemKind::TimelineStart => virtual_item(id, VirtualKind::TimelineStart),
        RawItemKind::Unknown => unsupported(id, "unknown"),
    }
}

/// Materializes a batch of records, preserving their order.
#[must_use]
pub fn materialize_all(raw: Vec<RawItem>) -> Vec<TimelineItem> {
    raw.into_iter().map(materialize).collect()
}

fn materialize_event(id: String, event: RawEvent) -> EventTimelineItem {
    EventTimelineItem {
        id,
        sender: event.sender,
        timestamp: event.timestamp,
        content: map_content(event.content),
        properties: event.properties,
        group_style: GroupStyle::Single,
    }
}

fn map_content(content: RawContent) -> EventContent {
    let RawContent {
        kind,
        body,
        url,
        mimetype,
    } = content;
    // Accept both bare kinds and Matrix style `m.` prefixed msgtypes.
    let normalized = kind.strip_prefix("m.").unwrap_or(&kind);
    let media = |body: Option<String>| MediaContent {
        body: body.unwrap_or_default(),
        url: url.clone(),
        mimetype: mimetype.clone(),
    };

    match normalized {
        "text" => EventContent::Text {
            body: body.unwrap_or_default(),
        },
        "emote" => EventContent::Emote {
            body: body.unwrap_or_default(),
        },
        "notice" => EventContent::Notice {
            body: body.unwrap_or_default(),
        },
        "image" => EventContent::Image(media(body)),
        "video" => EventContent::Video(media(body)),
        "audio" => EventContent::Audio(media(body)),
        "file" => EventContent::File(media(body)),
        "sticker" => EventContent::Sticker(media(body)),
        "redacted" => EventContent::Redacted,
        "encrypted" => EventContent::Encrypted,
        "state" => EventContent::State {
            description: body.unwrap_or_default(),
        },
        "" => EventContent::Unsupported {
            original_kind: "unknown".to_string(),
        },
        other => EventContent::Unsupported {
            original_kind: other.to_string(),
        },
    }
}

fn virtual_item(id: String, kind: VirtualKind) -> TimelineItem {
    TimelineItem::Virtual(VirtualTimelineItem { id, kind })
}

fn unsupported(id: String, original_kind: &str) -> TimelineItem {
    TimelineItem::Event(EventTimelineItem {
        id,
        sender: String::new(),
        timestamp: None,
        content: EventContent::Unsupported {
            original_kind: original_kind.to_string(),
        },
        properties: ItemProperties::default(),
        group_style: GroupStyle::Single,
    })
}
