use super::{ListResponse, PaymentBackend};
use crate::error::ClientResult;
use crate::http::RestClient;
use async_trait::async_trait;
use shared::models::{CreatePaymentRequest, Payment, StartPaymentRequest, StartPaymentResponse};

#[async_trait]
impl PaymentBackend for RestClient {
    async fn create_payment(&self, order_id: u64, method: &str) -> ClientResult<Payment> {
        let body = CreatePaymentRequest {
            order_id,
            method: method.to_string(),
        };
        self.post("payments/", &body).await
    }

    async fn start_payment(
        &self,
        payment_id: u64,
        provider: &str,
    ) -> ClientResult<StartPaymentResponse> {
        let body = StartPaymentRequest {
            provider: provider.to_string(),
        };
        self.post(&format!("payments/{}/start/", payment_id), &body)
            .await
    }

    async fn get_payment(&self, payment_id: u64) -> ClientResult<Payment> {
        self.get(&format!("payments/{}/", payment_id)).await
    }

    async fn list_payments(&self, order_id: u64) -> ClientResult<Vec<Payment>> {
        let list: ListResponse<Payment> = self
            .get_query("payments/", &[("order_id", order_id)])
            .await?;
        Ok(list.into_vec())
    }
}
