use super::OrderBackend;
use crate::error::ClientResult;
use crate::http::RestClient;
use async_trait::async_trait;
use shared::models::{CancelOrderRequest, CancelOrderResponse, Order};

#[async_trait]
impl OrderBackend for RestClient {
    async fn get_order(&self, order_id: u64) -> ClientResult<Order> {
        self.get(&format!("orders/{}/", order_id)).await
    }

    async fn cancel_order(
        &self,
        order_id: u64,
        reason: Option<&str>,
    ) -> ClientResult<CancelOrderResponse> {
        let body = CancelOrderRequest {
            reason: reason.map(str::to_string),
        };
        self.post(&format!("orders/{}/cancel/", order_id), &body)
            .await
    }

    async fn confirm_receipt(&self, order_id: u64) -> ClientResult<Order> {
        self.post_empty(&format!("orders/{}/confirm_receipt/", order_id))
            .await
    }
}
