// runner.rs
// Per-user serialization of reconciliation passes. Two concurrent passes
// for the same user race read-diff-write and can double-create a
// notification; the runner hands out one lock per user so same-user passes
// take turns while different users still run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::EngineResult;
use crate::lifecycle::{run_pass, PassSummary};
use crate::store::{BatchApplier, InvoiceReader, NotificationStore};

#[derive(Default)]
pub struct PassRunner {
    locks: Mutex<HashMap<ObjectId, Arc<Mutex<()>>>>,
}

impl PassRunner {
    pub fn new() -> Self {
        Self::default()
    }

    async fn user_lock(&self, user_id: &ObjectId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(*user_id).or_default().clone()
    }

    /// Run one reconciliation pass for one user, serialized against other
    /// passes for the same user on this runner.
    pub async fn run_for_user<S>(
        &self,
        store: &S,
        user_id: &ObjectId,
        today: NaiveDate,
    ) -> EngineResult<PassSummary>
    where
        S: InvoiceReader + NotificationStore + BatchApplier + Sync,
    {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        run_pass(store, user_id, today).await
    }

    /// Run a pass for every user, logging each outcome and carrying on
    /// past failures. A failed pass leaves valid intermediate state that
    /// the next sweep converges.
    pub async fn sweep<S>(
        &self,
        store: &S,
        user_ids: &[ObjectId],
        today: NaiveDate,
    ) -> Vec<(ObjectId, EngineResult<PassSummary>)>
    where
        S: InvoiceReader + NotificationStore + BatchApplier + Sync,
    {
        let mut results = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let result = self.run_for_user(store, user_id, today).await;
            match &result {
                Ok(summary) => info!(
                    user = %user_id,
                    duplicates_removed = summary.duplicates_removed,
                    created = summary.created,
                    deleted = summary.deleted,
                    status_transitions = summary.status_transitions,
                    "reconciliation pass finished"
                ),
                Err(err) => warn!(user = %user_id, error = %err, "reconciliation pass failed"),
            }
            results.push((*user_id, result));
        }
        results
    }
}
