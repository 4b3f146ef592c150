//! Order cache with optimistic status hints
//!
//! The backend owns order status. After an action the store may hold a
//! hinted status for display; the next refresh replaces it with whatever
//! the server says, and a failed action rolls it back.

use crate::api::OrderBackend;
use crate::error::ClientResult;
use shared::models::{Order, OrderStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Order change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    /// Fresh server state stored
    Updated { order_id: u64 },
    PaymentSucceeded { order_id: u64, payment_id: u64 },
    Cancelled { order_id: u64 },
    ReceiptConfirmed { order_id: u64 },
}

#[derive(Debug, Clone)]
struct Entry {
    order: Order,
    hint: Option<OrderStatus>,
}

/// 订单缓存
pub struct OrderStore {
    backend: Arc<dyn OrderBackend>,
    entries: Mutex<HashMap<u64, Entry>>,
    events: broadcast::Sender<OrderEvent>,
}

impl OrderStore {
    pub fn new(backend: Arc<dyn OrderBackend>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            backend,
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn backend(&self) -> &Arc<dyn OrderBackend> {
        &self.backend
    }

    /// Subscribe to order events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, event: OrderEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Fetch the authoritative order and replace the cached one
    pub async fn refresh(&self, order_id: u64) -> ClientResult<Order> {
        let order = self.backend.get_order(order_id).await?;
        self.upsert(order.clone());
        Ok(order)
    }

    /// Store server-provided state; clears any hint
    pub fn upsert(&self, order: Order) {
        let order_id = order.id;
        self.lock().insert(order_id, Entry { order, hint: None });
        self.notify(OrderEvent::Updated { order_id });
    }

    /// Cached server state
    pub fn get(&self, order_id: u64) -> Option<Order> {
        self.lock().get(&order_id).map(|e| e.order.clone())
    }

    /// Status to display: the hint if one is pending, else the server's
    pub fn effective_status(&self, order_id: u64) -> Option<OrderStatus> {
        self.lock()
            .get(&order_id)
            .map(|e| e.hint.unwrap_or(e.order.status))
    }

    /// Record an optimistic status. Ignored for uncached orders or when the
    /// state machine does not allow the move.
    pub fn hint_status(&self, order_id: u64, status: OrderStatus) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&order_id) else {
            return false;
        };
        if entry.order.status != status && !entry.order.status.can_transition_to(status) {
            tracing::debug!(order_id, from = ?entry.order.status, to = ?status, "Hint rejected");
            return false;
        }
        entry.hint = Some(status);
        true
    }

    pub fn rollback_hint(&self, order_id: u64) {
        if let Some(entry) = self.lock().get_mut(&order_id) {
            entry.hint = None;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
