// store module: collaborator interfaces the engine drives, plus the two
// implementations: MongoDB for production, in-memory for tests and
// embedding.

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::error::EngineResult;
use crate::lifecycle::Op;
use crate::models::{Invoice, Notification, RecurringInvoice};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::{init_state, user_ids, AppState};

#[async_trait]
pub trait InvoiceReader: Send + Sync {
    /// Invoices eligible for reconciliation: status pending, sent or
    /// to-chase. Paid invoices never appear here.
    async fn eligible_invoices(&self, user_id: &ObjectId) -> EngineResult<Vec<Invoice>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn notifications_for_user(&self, user_id: &ObjectId)
        -> EngineResult<Vec<Notification>>;
}

#[async_trait]
pub trait BatchApplier: Send + Sync {
    /// Apply operations strictly in the order given and report how many
    /// went through. Atomicity across the batch is not required; a
    /// mid-batch failure surfaces as `PartialBatch`.
    async fn apply(&self, user_id: &ObjectId, operations: Vec<Op>) -> EngineResult<usize>;
}

#[async_trait]
pub trait RecurringInvoiceStore: Send + Sync {
    /// Persist a definition after its `next_emission` was refreshed.
    async fn save(&self, definition: &RecurringInvoice) -> EngineResult<()>;
}
