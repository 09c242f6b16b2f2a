// mongo.rs
// MongoDB adapter: one collection per document type, wired from the
// environment. The engine only ever touches the three collections below;
// clients, sessions and the rest of the app's collections stay out of its
// reach.

use std::{env, time::SystemTime};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use futures::stream::TryStreamExt;
use mongodb::{Client, Collection};

use crate::error::{EngineError, EngineResult};
use crate::lifecycle::Op;
use crate::models::{Invoice, Notification, RecurringInvoice};

use super::{BatchApplier, InvoiceReader, NotificationStore, RecurringInvoiceStore};

#[derive(Clone)]
pub struct AppState {
    pub invoices: Collection<Invoice>,
    pub recurring_invoices: Collection<RecurringInvoice>,
    pub notifications: Collection<Notification>,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "facturapp".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    Ok(AppState {
        invoices: db.collection::<Invoice>("invoices"),
        recurring_invoices: db.collection::<RecurringInvoice>("recurring_invoices"),
        notifications: db.collection::<Notification>("notifications"),
    })
}

/// Every user with at least one invoice; the sweep in the job binary runs
/// one pass per entry.
pub async fn user_ids(state: &AppState) -> Result<Vec<ObjectId>> {
    let raw = state
        .invoices
        .distinct("user_id", doc! {})
        .await
        .context("listing invoice owners")?;
    Ok(raw.into_iter().filter_map(|v| v.as_object_id()).collect())
}

#[async_trait]
impl InvoiceReader for AppState {
    async fn eligible_invoices(&self, user_id: &ObjectId) -> EngineResult<Vec<Invoice>> {
        let mut cursor = self
            .invoices
            .find(doc! {
                "user_id": user_id,
                "status": { "$in": ["pending", "sent", "to-chase"] },
            })
            .await
            .context("listing eligible invoices")?;
        let mut items = Vec::new();
        while let Some(invoice) = cursor.try_next().await.context("reading invoice cursor")? {
            items.push(invoice);
        }
        Ok(items)
    }
}

#[async_trait]
impl NotificationStore for AppState {
    async fn notifications_for_user(
        &self,
        user_id: &ObjectId,
    ) -> EngineResult<Vec<Notification>> {
        let mut cursor = self
            .notifications
            .find(doc! { "user_id": user_id })
            .await
            .context("listing notifications")?;
        let mut items = Vec::new();
        while let Some(notification) =
            cursor.try_next().await.context("reading notification cursor")?
        {
            items.push(notification);
        }
        Ok(items)
    }
}

#[async_trait]
impl BatchApplier for AppState {
    async fn apply(&self, user_id: &ObjectId, operations: Vec<Op>) -> EngineResult<usize> {
        let total = operations.len();
        let mut applied = 0;
        for op in operations {
            if let Err(source) = self.apply_one(user_id, op).await {
                // Nothing applied yet reads as a plain store failure; a
                // broken tail is a partial batch the next pass finishes.
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
            applied += 1;
        }
        Ok(applied)
    }
}

impl AppState {
    async fn apply_one(&self, user_id: &ObjectId, op: Op) -> Result<()> {
        match op {
            Op::CreateNotification(new) => {
                self.notifications
                    .insert_one(Notification {
                        id: None,
                        user_id: new.user_id,
                        invoice_id: new.invoice_id,
                        kind: new.kind,
                        created_at: DateTime::from_system_time(SystemTime::now()),
                        read: false,
                        amount: new.amount,
                        invoice_number: new.invoice_number,
                        client_name: new.client_name,
                    })
                    .await
                    .context("creating notification")?;
            }
            Op::DeleteNotification(id) => {
                self.notifications
                    .delete_one(doc! { "_id": id, "user_id": user_id })
                    .await
                    .context("deleting notification")?;
            }
            Op::SetInvoiceStatus { invoice_id, status } => {
                self.invoices
                    .update_one(
                        doc! { "_id": invoice_id, "user_id": user_id },
                        doc! { "$set": { "status": status.as_str() } },
                    )
                    .await
                    .context("updating invoice status")?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecurringInvoiceStore for AppState {
    async fn save(&self, definition: &RecurringInvoice) -> EngineResult<()> {
        match definition.id {
            Some(id) => {
                let months: Vec<i32> =
                    definition.emission_months.iter().map(|m| *m as i32).collect();
                self.recurring_invoices
                    .update_one(
                        doc! { "_id": id },
                        doc! { "$set": {
                            "frequency": definition.frequency.as_str(),
                            "emission_day": definition.emission_day as i32,
                            "emission_months": months,
                            "next_emission": definition.next_emission,
                            "repetitions_planned": definition
                                .repetitions_planned
                                .map(|n| n as i32),
                            "repetitions_done": definition.repetitions_done as i32,
                        } },
                    )
                    .await
                    .context("saving recurring invoice")?;
            }
            None => {
                self.recurring_invoices
                    .insert_one(definition.clone())
                    .await
                    .context("inserting recurring invoice")?;
            }
        }
        Ok(())
    }
}
