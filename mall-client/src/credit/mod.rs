//! Dealer credit reconciliation

mod aggregate;

pub use aggregate::{CreditSummary, aggregate};

use crate::api::CreditBackend;
use crate::error::ClientResult;
use shared::models::{CreditAccount, DateRange};
use std::sync::Arc;

/// 信用账户对账
pub struct CreditAggregator {
    backend: Arc<dyn CreditBackend>,
}

impl CreditAggregator {
    pub fn new(backend: Arc<dyn CreditBackend>) -> Self {
        Self { backend }
    }

    /// Summarize a date range.
    ///
    /// Statements and transactions are fetched concurrently; if either fails
    /// the whole call fails and no partial summary is produced.
    pub async fn summarize(&self, range: &DateRange) -> ClientResult<CreditSummary> {
        if range.is_empty() {
            tracing::debug!(?range, "Empty date range");
            return Ok(CreditSummary::default());
        }

        let (statements, transactions) = tokio::try_join!(
            self.backend.list_statements(range),
            self.backend.list_transactions(range)
        )?;

        let summary = aggregate(&statements, &transactions);
        tracing::debug!(
            statements = summary.statement_count,
            unbilled = summary.unbilled_count,
            "Credit summary computed"
        );
        Ok(summary)
    }

    pub async fn my_account(&self) -> ClientResult<CreditAccount> {
        self.backend.my_account().await
    }
}
