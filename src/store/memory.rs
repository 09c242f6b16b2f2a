// memory.rs
// In-memory store double. Backs the engine tests and gives embedders a
// zero-infrastructure implementation of the collaborator traits. A batch
// failure can be injected to exercise partial-apply recovery.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};

use crate::error::{EngineError, EngineResult};
use crate::lifecycle::Op;
use crate::models::{Invoice, Notification, RecurringInvoice};

use super::{BatchApplier, InvoiceReader, NotificationStore, RecurringInvoiceStore};

#[derive(Default)]
struct Inner {
    invoices: Vec<Invoice>,
    notifications: Vec<Notification>,
    recurring_invoices: Vec<RecurringInvoice>,
    // consumed by the next apply call
    fail_after: Option<usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_invoice(&self, mut invoice: Invoice) -> ObjectId {
        let id = invoice.id.unwrap_or_else(ObjectId::new);
        invoice.id = Some(id);
        self.lock().invoices.push(invoice);
        id
    }

    pub fn insert_notification(&self, mut notification: Notification) -> ObjectId {
        let id = notification.id.unwrap_or_else(ObjectId::new);
        notification.id = Some(id);
        self.lock().notifications.push(notification);
        id
    }

    pub fn insert_recurring(&self, mut definition: RecurringInvoice) -> ObjectId {
        let id = definition.id.unwrap_or_else(ObjectId::new);
        definition.id = Some(id);
        self.lock().recurring_invoices.push(definition);
        id
    }

    pub fn remove_invoice(&self, id: &ObjectId) {
        self.lock().invoices.retain(|i| i.id.as_ref() != Some(id));
    }

    pub fn update_invoice(&self, id: &ObjectId, update: impl FnOnce(&mut Invoice)) {
        let mut inner = self.lock();
        if let Some(invoice) = inner.invoices.iter_mut().find(|i| i.id.as_ref() == Some(id)) {
            update(invoice);
        }
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.lock().invoices.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn recurring_invoices(&self) -> Vec<RecurringInvoice> {
        self.lock().recurring_invoices.clone()
    }

    /// Make the next apply call fail after `n` operations have gone
    /// through.
    pub fn fail_after(&self, n: usize) {
        self.lock().fail_after = Some(n);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl InvoiceReader for MemoryStore {
    async fn eligible_invoices(&self, user_id: &ObjectId) -> EngineResult<Vec<Invoice>> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|i| &i.user_id == user_id && !i.status.is_paid())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn notifications_for_user(
        &self,
        user_id: &ObjectId,
    ) -> EngineResult<Vec<Notification>> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BatchApplier for MemoryStore {
    async fn apply(&self, _user_id: &ObjectId, operations: Vec<Op>) -> EngineResult<usize> {
        let total = operations.len();
        let mut inner = self.lock();
        let fail_after = inner.fail_after.take();

        let mut applied = 0;
        for op in operations {
            if fail_after == Some(applied) {
                let source = anyhow!("injected batch failure");
                return Err(if applied == 0 {
                    EngineError::Store(source)
                } else {
                    EngineError::PartialBatch {
                        applied,
                        total,
                        source,
                    }
                });
            }
            match op {
                Op::CreateNotification(new) => {
                    inner.notifications.push(Notification {
                        id: Some(ObjectId::new()),
                        user_id: new.user_id,
                        invoice_id: new.invoice_id,
                        kind: new.kind,
                        created_at: DateTime::now(),
                        read: false,
                        amount: new.amount,
                        invoice_number: new.invoice_number,
                        client_name: new.client_name,
                    });
                }
                Op::DeleteNotification(id) => {
                    inner.notifications.retain(|n| n.id != Some(id));
                }
                Op::SetInvoiceStatus { invoice_id, status } => {
                    if let Some(invoice) = inner
                        .invoices
                        .iter_mut()
                        .find(|i| i.id == Some(invoice_id))
                    {
                        invoice.status = status;
                    }
                }
            }
            applied += 1;
        }
        Ok(applied)
    }
}

#[async_trait]
impl RecurringInvoiceStore for MemoryStore {
    async fn save(&self, definition: &RecurringInvoice) -> EngineResult<()> {
        let mut inner = self.lock();
        match inner
            .recurring_invoices
            .iter_mut()
            .find(|d| d.id.is_some() && d.id == definition.id)
        {
            Some(existing) => *existing = definition.clone(),
            None => inner.recurring_invoices.push(definition.clone()),
        }
        Ok(())
    }
}
