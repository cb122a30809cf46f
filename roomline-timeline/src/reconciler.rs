//! Applies diff operations to the materialized sequence.
//!
//! Every operation validates its index before touching the sequence, so a
//! rejected operation leaves the sequence exactly as it was.

use std::collections::HashSet;

use tracing::{error, trace};

use crate::{
    context::FlushContext,
    errors::{ReconcileError, ReconcileResult},
    materializer::{materialize, materialize_all},
    models::{DiffKind, DiffOperation, TimelineItem},
};

/// Outcome of folding one batch over the sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: usize,
    pub rejected: Vec<ReconcileError>,
}

impl BatchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied + self.rejected.len()
    }
}

/// Applies a single operation in place.
///
/// # Errors
/// Returns [`ReconcileError::IndexOutOfRange`] when an explicit index does not
/// fit the current length and [`ReconcileError::EmptyCollection`] when a pop
/// hits an empty sequence. `items` is untouched in both cases.
pub fn apply(items: &mut Vec<TimelineItem>, op: DiffOperation) -> ReconcileResult<()> {
    let len = items.len();
    match op {
        DiffOperation::PushFront { item } => {
            let item = materialize(item);
            trace!(item = %item.debug_identifier(), "Push front");
            items.insert(0, item);
        }
        DiffOperation::PushBack { item } => {
            let item = materialize(item);
            trace!(item = %item.debug_identifier(), "Push back");
            items.push(item);
        }
        DiffOperation::Insert { index, item } => {
            if index > len {
                return Err(ReconcileError::out_of_range(DiffKind::Insert, index, len));
            }
            let item = materialize(item);
            trace!(item = %item.debug_identifier(), index, "Insert");
            items.insert(index, item);
        }
        DiffOperation::Append { items: appended } => {
            let appended = materialize_all(appended);
            trace!(items = ?debug_identifiers(&appended), "Append");
            items.extend(appended);
        }
        DiffOperation::Set { index, item } => {
            let Some(slot) = items.get_mut(index) else {
                return Err(ReconcileError::out_of_range(DiffKind::Set, index, len));
            };
            let item = materialize(item);
            trace!(item = %item.debug_identifier(), index, "Set");
            *slot = item;
        }
        DiffOperation::PopFront => {
            if items.is_empty() {
                return Err(ReconcileError::EmptyCollection {
                    op: DiffKind::PopFront,
                });
            }
            let removed = items.remove(0);
            trace!(item = %removed.debug_identifier(), "Pop front");
        }
        DiffOperation::PopBack => {
            let removed = items.pop().ok_or(ReconcileError::EmptyCollection {
                op: DiffKind::PopBack,
            })?;
            trace!(item = %removed.debug_identifier(), "Pop back");
        }
        DiffOperation::Remove { index } => {
            if index >= len {
                return Err(ReconcileError::out_of_range(DiffKind::Remove, index, len));
            }
            let removed = items.remove(index);
            trace!(item = %removed.debug_identifier(), index, "Remove");
        }
        DiffOperation::Clear => {
            trace!(len, "Clear all items");
            items.clear();
        }
        DiffOperation::Reset { items: replacement } => {
            let replacement = materialize_all(replacement);
            trace!(items = ?debug_identifiers(&replacement), "Replace all items");
            *items = replacement;
        }
    }
    Ok(())
}

/// Folds `ops` over `items` in arrival order.
///
/// Rejected operations are logged inside the flush span and skipped; the
/// remaining operations continue against the last good state.
pub fn apply_batch(
    items: &mut Vec<TimelineItem>,
    ops: Vec<DiffOperation>,
    ctx: &FlushContext,
) -> BatchReport {
    let _entered = ctx.enter();
    let mut report = BatchReport::default();

    for op in ops {
        let kind = op.kind();
        let index = op.index();
        let len = items.len();
        match apply(items, op) {
            Ok(()) => report.applied += 1,
            Err(err) => {
                error!(
                    op = %kind,
                    index = ?index,
                    len,
                    error = %err,
                    "Failed applying timeline diff"
                );
                report.rejected.push(err);
            }
        }
    }

    ctx.record_rejected(report.rejected.len());
    report
}

/// Identifiers that occur more than once, in order of first repetition.
#[must_use]
pub fn duplicate_ids(items: &[TimelineItem]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut duplicates = Vec::new();
    for item in items {
        let id = item.id();
        if !seen.insert(id) && !duplicates.iter().any(|dup: &String| dup == id) {
            duplicates.push(id.to_string());
        }
    }
    duplicates
}

pub(crate) fn debug_identifiers(items: &[TimelineItem]) -> Vec<String> {
    items.iter().map(TimelineItem::debug_identifier).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawItem;

    fn text(id: &str) -> RawItem {
        RawItem::text(id, "bob", id)
    }

    fn seeded(ids: &[&str]) -> Vec<TimelineItem> {
        materialize_all(ids.iter().map(|id| text(id)).collect())
    }

    fn ids(items: &[TimelineItem]) -> Vec<&str> {
        items.iter().map(TimelineItem::id).collect()
    }

    #[test]
    fn push_and_insert_positions() {
        let mut items = seeded(&["b"]);
        apply(&mut items, DiffOperation::PushFront { item: text("a") }).unwrap();
        apply(&mut items, DiffOperation::PushBack { item: text("d") }).unwrap();
        apply(
            &mut items,
            DiffOperation::Insert {
                index: 2,
                item: text("c"),
            },
        )
        .unwrap();
        apply(
            &mut items,
            DiffOperation::Insert {
                index: 4,
                item: text("e"),
            },
        )
        .unwrap();
        assert_eq!(ids(&items), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn append_keeps_given_order() {
        let mut items = seeded(&["a"]);
        apply(
            &mut items,
            DiffOperation::Append {
                items: vec![text("b"), RawItem::read_marker("rm"), text("c")],
            },
        )
        .unwrap();
        assert_eq!(ids(&items), ["a", "b", "rm", "c"]);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut items = seeded(&["a", "b"]);
        apply(
            &mut items,
            DiffOperation::Set {
                index: 1,
                item: text("b2"),
            },
        )
        .unwrap();
        assert_eq!(ids(&items), ["a", "b2"]);
    }

    #[test]
    fn pops_and_remove() {
        let mut items = seeded(&["a", "b", "c", "d"]);
        apply(&mut items, DiffOperation::PopFront).unwrap();
        apply(&mut items, DiffOperation::PopBack).unwrap();
        assert_eq!(ids(&items), ["b", "c"]);
        apply(&mut items, DiffOperation::Remove { index: 1 }).unwrap();
        assert_eq!(ids(&items), ["b"]);
    }

    #[test]
    fn clear_and_reset_replace_wholesale() {
        let mut items = seeded(&["a", "b"]);
        apply(&mut items, DiffOperation::Clear).unwrap();
        assert!(items.is_empty());
        apply(&mut items, DiffOperation::Clear).unwrap();
        assert!(items.is_empty());

        apply(
            &mut items,
            DiffOperation::Reset {
                items: vec![text("x"), text("y")],
            },
        )
        .unwrap();
        assert_eq!(ids(&items), ["x", "y"]);
    }

    #[test]
    fn reset_is_idempotent() {
        let reset = DiffOperation::Reset {
            items: vec![text("x"), RawItem::read_marker("rm"), text("y")],
        };

        let mut once = seeded(&["a", "b", "c"]);
        apply(&mut once, reset.clone()).unwrap();
        let mut twice = once.clone();
        apply(&mut twice, reset.clone()).unwrap();

        assert_eq!(once, twice);
        let expected = materialize_all(vec![text("x"), RawItem::read_marker("rm"), text("y")]);
        assert_eq!(once, expected);
    }

    #[test]
    fn out_of_range_indices_leave_sequence_unchanged() {
        let original = seeded(&["a", "b"]);
        let cases = [
            (
                DiffOperation::Insert {
                    index: 3,
                    item: text("z"),
                },
                ReconcileError::out_of_range(DiffKind::Insert, 3, 2),
            ),
            (
                DiffOperation::Set {
                    index: 2,
                    item: text("z"),
                },
                ReconcileError::out_of_range(DiffKind::Set, 2, 2),
            ),
            (
                DiffOperation::Remove { index: 2 },
                ReconcileError::out_of_range(DiffKind::Remove, 2, 2),
            ),
        ];

        for (op, expected) in cases {
            let mut items = original.clone();
            let report = apply_batch(&mut items, vec![op], &FlushContext::detached());
            assert_eq!(items, original);
            assert_eq!(report.applied, 0);
            assert_eq!(report.rejected, vec![expected]);
        }
    }

    #[test]
    fn pops_on_empty_sequence_fail() {
        for (op, kind) in [
            (DiffOperation::PopFront, DiffKind::PopFront),
            (DiffOperation::PopBack, DiffKind::PopBack),
        ] {
            let mut items = Vec::new();
            let err = apply(&mut items, op).unwrap_err();
            assert_eq!(err, ReconcileError::EmptyCollection { op: kind });
            assert!(items.is_empty());
        }
    }

    #[test]
    fn batch_continues_after_rejected_operation() {
        let mut items = seeded(&["a"]);
        let report = apply_batch(
            &mut items,
            vec![
                DiffOperation::Remove { index: 5 },
                DiffOperation::PushBack { item: text("b") },
                DiffOperation::PopFront,
                DiffOperation::PopFront,
                DiffOperation::PopFront,
                DiffOperation::PushBack { item: text("c") },
            ],
            &FlushContext::detached(),
        );

        assert_eq!(ids(&items), ["c"]);
        assert_eq!(report.applied, 4);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.total(), 6);
    }

    #[test]
    fn operation_order_is_significant() {
        let mut pop_then_push = seeded(&["a", "b"]);
        apply_batch(
            &mut pop_then_push,
            vec![
                DiffOperation::PopFront,
                DiffOperation::PushFront { item: text("x") },
            ],
            &FlushContext::detached(),
        );

        let mut push_then_pop = seeded(&["a", "b"]);
        apply_batch(
            &mut push_then_pop,
            vec![
                DiffOperation::PushFront { item: text("x") },
                DiffOperation::PopFront,
            ],
            &FlushContext::detached(),
        );

        assert_eq!(ids(&pop_then_push), ["x", "b"]);
        assert_eq!(ids(&push_then_pop), ["a", "b"]);
    }

    #[test]
    fn result_is_independent_of_batch_boundaries() {
        let ops = vec![
            DiffOperation::Append {
                items: vec![text("a"), text("b"), text("c")],
            },
            DiffOperation::Insert {
                index: 1,
                item: RawItem::read_marker("rm"),
            },
            DiffOperation::Remove { index: 9 },
            DiffOperation::Set {
                index: 0,
                item: text("a2"),
            },
            DiffOperation::PopBack,
            DiffOperation::PushFront { item: text("z") },
            DiffOperation::Remove { index: 2 },
        ];

        let mut whole = Vec::new();
        apply_batch(&mut whole, ops.clone(), &FlushContext::detached());

        for split in 0..=ops.len() {
            let (head, tail) = ops.split_at(split);
            let mut chunked = Vec::new();
            apply_batch(&mut chunked, head.to_vec(), &FlushContext::detached());
            apply_batch(&mut chunked, tail.to_vec(), &FlushContext::detached());
            assert_eq!(chunked, whole, "split at {split}");
        }
        assert_eq!(ids(&whole), ["z", "a2", "b"]);
    }

    #[test]
    fn duplicate_ids_are_reported_once() {
        let items = seeded(&["a", "b", "a", "c", "a", "b"]);
        assert_eq!(duplicate_ids(&items), ["a", "b"]);
        assert!(duplicate_ids(&seeded(&["a", "b"])).is_empty());
    }
}
