// error.rs
// Error taxonomy the engine surfaces to its caller. Pure calculators only
// fail with InvalidConfiguration; everything else comes from the store edge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Recurring definition rejected before anything is persisted.
    #[error("invalid recurrence configuration: {0}")]
    InvalidConfiguration(String),

    /// Read or write against a collaborator failed. Not retried here; the
    /// pass is idempotent, so the caller may simply run it again.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),

    /// A batch stopped mid-way. Nothing is rolled back; the next pass
    /// converges on the remaining operations.
    #[error("batch partially applied ({applied} of {total} operations): {source}")]
    PartialBatch {
        applied: usize,
        total: usize,
        source: anyhow::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
