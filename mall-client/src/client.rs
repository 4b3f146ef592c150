//! Client facade
//!
//! Wires storage, session, transport and the order cache once, and hands
//! out the three components sharing them.

use crate::chat::{ChatPoller, ChatSyncEngine};
use crate::config::ClientConfig;
use crate::credit::CreditAggregator;
use crate::error::ClientResult;
use crate::http::RestClient;
use crate::order_store::OrderStore;
use crate::payment::{PaymentOrchestrator, PendingConfirmStore, Wallet};
use crate::session::SessionContext;
use crate::storage::{FileStorage, Storage};
use shared::client::TokenPair;
use std::sync::Arc;

/// 商城客户端
#[derive(Clone)]
pub struct MallClient {
    config: ClientConfig,
    session: Arc<SessionContext>,
    rest: Arc<RestClient>,
    orders: Arc<OrderStore>,
}

impl MallClient {
    /// Build over file storage in `config.data_dir`
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let storage = FileStorage::new(&config.data_dir);
        storage.ensure_dir()?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Build over any storage backend
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> ClientResult<Self> {
        let session = Arc::new(SessionContext::init(storage));
        let rest = Arc::new(RestClient::new(&config, session.clone())?);
        let orders = Arc::new(OrderStore::new(rest.clone()));
        tracing::info!(base_url = %rest.base_url(), "Mall client ready");
        Ok(Self {
            config,
            session,
            rest,
            orders,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn rest(&self) -> &Arc<RestClient> {
        &self.rest
    }

    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    /// Store tokens obtained by the host's login flow
    pub fn login(&self, tokens: TokenPair) -> ClientResult<()> {
        self.session.set_tokens(tokens)
    }

    /// Clear tokens and every per-user cache
    pub fn logout(&self) -> ClientResult<()> {
        self.session.teardown()
    }

    pub fn payments(&self, wallet: Arc<dyn Wallet>) -> PaymentOrchestrator {
        PaymentOrchestrator::new(
            self.rest.clone(),
            self.orders.clone(),
            wallet,
            PendingConfirmStore::new(self.session.storage()),
        )
        .with_provider(&self.config.payment_provider, &self.config.payment_method)
    }

    pub fn credit(&self) -> CreditAggregator {
        CreditAggregator::new(self.rest.clone())
    }

    /// Chat engine loaded from the durable cache and bound to the session
    pub fn chat(&self) -> ChatSyncEngine {
        ChatSyncEngine::open(self.rest.clone(), self.session.storage()).with_session(&self.session)
    }

    /// Start polling `engine` at the configured interval
    pub fn chat_poller(&self, engine: ChatSyncEngine) -> ChatPoller {
        ChatPoller::start(engine, self.config.chat_poll_interval())
    }
}
