pub mod diff;
pub mod item;
pub mod properties;
pub mod raw;
pub mod state;
pub mod timestamp;

pub use diff::{DiffKind, DiffOperation};
pub use item::{
    EventContent, EventTimelineItem, GroupStyle, MediaContent, TimelineItem, VirtualKind,
    VirtualTimelineItem,
};
pub use properties::{AggregatedReaction, DeliveryStatus, ItemProperties, ReadReceipt};
pub use raw::{RawContent, RawEvent, RawItem, RawItemKind};
pub use state::ProviderState;
pub use timestamp::Timestamp;
