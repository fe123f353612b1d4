//! The two remote data sources the resolver consults.

use async_trait::async_trait;

use crate::error::LookupError;
use crate::model::{Evaluation, Filters, StatsRow};

/// Cloud evaluation of a position.
#[async_trait]
pub trait EvalLookup: Send + Sync {
    /// `LookupError::NotFound` when the service has no entry for `fen`.
    async fn evaluate(&self, fen: &str) -> Result<Evaluation, LookupError>;
}

/// Opening-explorer statistics for the moves played from a position.
#[async_trait]
pub trait StatsLookup: Send + Sync {
    async fn move_stats(&self, fen: &str, filters: &Filters) -> Result<Vec<StatsRow>, LookupError>;
}
