// dedup.rs
// Notification deduplication. Repeated, non-serialized passes can leave
// more than one notification per (invoice, kind); every pass starts by
// collapsing those groups so the reconciler can assume at most one
// notification per key.

use std::collections::HashMap;

use bson::oid::ObjectId;

use crate::models::{Notification, NotificationKind};

/// Identity of a notification from the reconciler's point of view.
pub type NotificationKey = (ObjectId, NotificationKind);

/// Result of a dedup pass: the survivor per key, plus everything to delete.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub keep: HashMap<NotificationKey, Notification>,
    pub stale: Vec<Notification>,
}

/// Collapse duplicates per (invoice, kind), keeping the most recently
/// created notification in each group.
pub fn dedupe(notifications: Vec<Notification>) -> DedupOutcome {
    let mut groups: HashMap<NotificationKey, Vec<Notification>> = HashMap::new();
    for notification in notifications {
        groups
            .entry((notification.invoice_id, notification.kind))
            .or_default()
            .push(notification);
    }

    let mut outcome = DedupOutcome::default();
    for (key, mut group) in groups {
        group.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut rest = group.into_iter();
        if let Some(newest) = rest.next() {
            outcome.keep.insert(key, newest);
        }
        outcome.stale.extend(rest);
    }
    outcome
}
