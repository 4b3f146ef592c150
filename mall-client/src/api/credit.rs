use super::{CreditBackend, ListResponse};
use crate::error::ClientResult;
use crate::http::RestClient;
use async_trait::async_trait;
use shared::models::{AccountStatement, AccountTransaction, CreditAccount, DateRange};

#[async_trait]
impl CreditBackend for RestClient {
    async fn my_account(&self) -> ClientResult<CreditAccount> {
        self.get("credit-accounts/my_account/").await
    }

    async fn list_statements(&self, range: &DateRange) -> ClientResult<Vec<AccountStatement>> {
        let list: ListResponse<AccountStatement> =
            self.get_query("account-statements/", range).await?;
        Ok(list.into_vec())
    }

    async fn list_transactions(
        &self,
        range: &DateRange,
    ) -> ClientResult<Vec<AccountTransaction>> {
        let list: ListResponse<AccountTransaction> =
            self.get_query("account-transactions/", range).await?;
        Ok(list.into_vec())
    }
}
