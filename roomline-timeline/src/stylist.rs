//! Group style derivation.
//!
//! Consecutive events from one sender chain into a visual block. Virtual
//! items always split blocks, and an event carrying reactions closes its
//! block because the reactions render beneath it. Events without a known
//! sender never chain.

use crate::models::{EventTimelineItem, GroupStyle, TimelineItem};

/// Recomputes the group style of every event item in `items`.
///
/// Virtual items are left untouched.
pub fn restyle(items: &mut [TimelineItem]) {
    let styles: Vec<Option<GroupStyle>> = (0..items.len())
        .map(|index| match &items[index] {
            TimelineItem::Event(event) => {
                let prev = index.checked_sub(1).and_then(|prev| items.get(prev));
                Some(group_style(prev, event, items.get(index + 1)))
            }
            TimelineItem::Virtual(_) => None,
        })
        .collect();

    for (item, style) in items.iter_mut().zip(styles) {
        if let (TimelineItem::Event(event), Some(style)) = (item, style) {
            event.group_style = style;
        }
    }
}

/// Style of `current` given its immediate neighbours.
#[must_use]
pub fn group_style(
    prev: Option<&TimelineItem>,
    current: &EventTimelineItem,
    next: Option<&TimelineItem>,
) -> GroupStyle {
    let starts = same_sender(prev, &current.sender)
        .is_none_or(|prev| prev.properties.has_reactions());
    let ends = same_sender(next, &current.sender).is_none() || current.properties.has_reactions();

    match (starts, ends) {
        (true, true) => GroupStyle::Single,
        (true, false) => GroupStyle::First,
        (false, true) => GroupStyle::Last,
        (false, false) => GroupStyle::Middle,
    }
}

fn same_sender<'a>(
    neighbour: Option<&'a TimelineItem>,
    sender: &str,
) -> Option<&'a EventTimelineItem> {
    if sender.is_empty() {
        return None;
    }
    neighbour
        .and_then(TimelineItem::as_event)
        .filter(|event| event.sender == sender)
}
