// reconcile.rs
// The reconciliation pass: classify every eligible invoice, diff the
// desired notification set against what exists, and emit the minimal
// batch of operations. Planning is pure; only loading and applying touch
// the store. Re-running a pass with no intervening changes produces an
// empty batch.

use std::collections::{HashMap, HashSet};

use bson::oid::ObjectId;
use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::models::{Invoice, InvoiceStatus, Notification, NotificationKind};
use crate::store::{BatchApplier, InvoiceReader, NotificationStore};

use super::classify::{classify_invoice, InvoiceClass};
use super::dedup::{dedupe, DedupOutcome, NotificationKey};

/// A notification about to be created. The store assigns id, creation
/// timestamp and the unread flag on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: ObjectId,
    pub invoice_id: ObjectId,
    pub kind: NotificationKind,
    pub amount: f64,
    pub invoice_number: String,
    pub client_name: String,
}

impl NewNotification {
    fn for_invoice(invoice_id: ObjectId, invoice: &Invoice, kind: NotificationKind) -> Self {
        NewNotification {
            user_id: invoice.user_id,
            invoice_id,
            kind,
            amount: invoice.amount,
            invoice_number: invoice.number.clone(),
            client_name: invoice.client_name.clone(),
        }
    }
}

/// One store mutation. Operations for a single invoice must be applied in
/// the order produced: its notification create always precedes its status
/// transition, so a crash mid-batch never leaves a chased invoice without
/// the notification that explains it.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    CreateNotification(NewNotification),
    DeleteNotification(ObjectId),
    SetInvoiceStatus {
        invoice_id: ObjectId,
        status: InvoiceStatus,
    },
}

/// Compute the operations that bring the notification set and invoice
/// statuses in line with the classification of `invoices` at `today`.
///
/// `existing` must already be deduplicated: at most one notification per
/// (invoice, kind). Invoices referenced by a notification but absent from
/// `invoices` (deleted, or no longer eligible) get all their notifications
/// removed.
pub fn plan(
    invoices: &[Invoice],
    existing: &HashMap<NotificationKey, Notification>,
    today: NaiveDate,
) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut live: HashSet<ObjectId> = HashSet::new();

    for invoice in invoices {
        let Some(invoice_id) = invoice.id else {
            continue;
        };
        live.insert(invoice_id);

        let Some(class) = classify_invoice(invoice, today) else {
            continue;
        };
        let overdue = existing.get(&(invoice_id, NotificationKind::Overdue));
        let due_soon = existing.get(&(invoice_id, NotificationKind::DueSoon));

        match class {
            InvoiceClass::Overdue => {
                if overdue.is_none() {
                    ops.push(Op::CreateNotification(NewNotification::for_invoice(
                        invoice_id,
                        invoice,
                        NotificationKind::Overdue,
                    )));
                }
                if invoice.status != InvoiceStatus::ToChase {
                    ops.push(Op::SetInvoiceStatus {
                        invoice_id,
                        status: InvoiceStatus::ToChase,
                    });
                }
                if let Some(op) = due_soon.and_then(delete_op) {
                    ops.push(op);
                }
            }
            InvoiceClass::DueSoon => {
                if due_soon.is_none() {
                    ops.push(Op::CreateNotification(NewNotification::for_invoice(
                        invoice_id,
                        invoice,
                        NotificationKind::DueSoon,
                    )));
                }
                // Overdue and due-soon are mutually exclusive; dropping back
                // (a term edit moved the due date out) removes the stale one.
                if let Some(op) = overdue.and_then(delete_op) {
                    ops.push(op);
                }
            }
            InvoiceClass::Current => {
                for kind in [NotificationKind::Overdue, NotificationKind::DueSoon] {
                    if let Some(op) = existing.get(&(invoice_id, kind)).and_then(delete_op) {
                        ops.push(op);
                    }
                }
            }
        }
    }

    for ((invoice_id, _), notification) in existing {
        if !live.contains(invoice_id) {
            if let Some(op) = delete_op(notification) {
                ops.push(op);
            }
        }
    }

    ops
}

fn delete_op(notification: &Notification) -> Option<Op> {
    notification.id.map(Op::DeleteNotification)
}

/// What one reconciliation pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub duplicates_removed: usize,
    pub created: usize,
    pub deleted: usize,
    pub status_transitions: usize,
    pub applied: usize,
}

impl PassSummary {
    pub fn operations(&self) -> usize {
        self.duplicates_removed + self.created + self.deleted + self.status_transitions
    }
}

/// One reconciliation pass for one user: dedup, load, diff, apply.
///
/// Safe to run repeatedly and to abort before the apply step. Partial
/// application surfaces as `PartialBatch`; the next pass picks up the
/// remainder.
pub async fn run_pass<S>(store: &S, user_id: &ObjectId, today: NaiveDate) -> EngineResult<PassSummary>
where
    S: InvoiceReader + NotificationStore + BatchApplier + Sync,
{
    let notifications = store.notifications_for_user(user_id).await?;
    let DedupOutcome { keep, stale } = dedupe(notifications);

    let invoices = store.eligible_invoices(user_id).await?;

    let mut ops: Vec<Op> = stale.iter().filter_map(delete_op).collect();
    let duplicates_removed = ops.len();
    ops.extend(plan(&invoices, &keep, today));

    let mut summary = PassSummary {
        duplicates_removed,
        ..PassSummary::default()
    };
    for op in ops.iter().skip(duplicates_removed) {
        match op {
            Op::CreateNotification(_) => summary.created += 1,
            Op::DeleteNotification(_) => summary.deleted += 1,
            Op::SetInvoiceStatus { .. } => summary.status_transitions += 1,
        }
    }

    if !ops.is_empty() {
        summary.applied = store.apply(user_id, ops).await?;
    }
    Ok(summary)
}
