// src/scheduler/closure.rs
//! Transitive closure over the "revises" relation.
//!
//! Amendments that already sit in the queue behind their target are shown
//! together with it, in one uninterrupted on-screen sequence, instead of
//! being separated by unrelated notifications or by the inter-message wait.

use crate::message::{ItemId, QueueItem};
use crate::queue::Queue;
use crate::scheduler::WorkItem;

/// Collects every queued item that (transitively) revises `target`, in
/// depth-first discovery order, removing each from the queue as it is
/// consumed. The recursion terminates because every visit removes: an item
/// can be discovered at most once, and the queue only shrinks.
///
/// The seed itself is not part of the result; callers have already taken it
/// off the queue.
pub fn collect_revisions(queue: &Queue<WorkItem>, target: ItemId) -> Vec<QueueItem> {
    let direct = queue.remove_where(|work| match work {
        WorkItem::Notify(item) => item.revises(target),
        WorkItem::Stop => false,
    });

    let mut grouped = Vec::new();
    for work in direct {
        let WorkItem::Notify(item) = work else {
            continue;
        };
        let id = item.item_id();
        grouped.push(item);
        grouped.extend(collect_revisions(queue, id));
    }
    grouped
}
