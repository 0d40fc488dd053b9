//! # Error Taxonomy
//!
//! Domain errors for the catalog store and prompt flows. Subscription
//! failures are recovered locally (seed-only fallback); write and flow
//! failures always propagate to the caller.

use thiserror::Error;

/// The remote collection's live feed failed to establish or was interrupted.
///
/// Never surfaced as a blocking error: the store logs it and degrades to
/// the seed-only view.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The feed could not be established at all.
    #[error("subscription could not be established: {0}")]
    Unavailable(String),
    /// An established feed died; no further events follow.
    #[error("subscription interrupted: {0}")]
    Interrupted(String),
}

/// A catalog write failed. Propagated to the caller, never retried here.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("entry failed validation: {0}")]
    Invalid(String),
    /// Built-in seed entries are immutable; writes against their keys are
    /// rejected before reaching the remote collection.
    #[error("'{0}' is a built-in entry and cannot be modified")]
    SeedEntry(String),
    #[error("failed to encode document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("remote write failed: {0}")]
    Remote(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A prompt-flow invocation failed or produced an unusable response.
///
/// Terminal for that invocation: no retries, no partial results.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid flow request: {0}")]
    InvalidRequest(String),
    #[error("model provider error: {0}")]
    Provider(String),
    #[error("response failed schema validation: {0}")]
    Schema(String),
}
