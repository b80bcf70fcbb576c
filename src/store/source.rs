use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::order::{fixtures, NewOrder, Order, OrderError, OrderId, OrderStatus};
use crate::health::{ComponentHealth, HealthStatus};
use crate::utils::IsTransient;

// ============================================================================
// Order Sources
// ============================================================================
//
// Where the store gets its collection from and where status changes are
// pushed back to. The in-memory source plays the role of the backend when
// no remote order API is configured.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("order API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid order API url: {0}")]
    InvalidUrl(String),

    #[error("order API returned {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("order API unavailable (circuit open)")]
    CircuitOpen,

    #[error("order not found at source: {0}")]
    NotFound(OrderId),

    #[error("order source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Rejected(#[from] OrderError),
}

impl IsTransient for SourceError {
    fn is_transient(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect(),
            SourceError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            SourceError::Unavailable(_) => true,
            SourceError::InvalidUrl(_)
            | SourceError::CircuitOpen
            | SourceError::NotFound(_)
            | SourceError::Rejected(_) => false,
        }
    }
}

#[async_trait]
pub trait OrderSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// The full current collection
    async fn fetch_orders(&self) -> Result<Vec<Order>, SourceError>;

    /// Persist a status change made in the store
    async fn push_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SourceError>;

    fn health(&self) -> ComponentHealth {
        ComponentHealth::new(self.name(), HealthStatus::Healthy)
    }
}

/// Process-local order backend
pub struct InMemorySource {
    orders: Mutex<Vec<Order>>,
    sequence: AtomicU64,
}

impl InMemorySource {
    pub fn new(orders: Vec<Order>) -> Self {
        let sequence = orders.len() as u64;
        Self {
            orders: Mutex::new(orders),
            sequence: AtomicU64::new(sequence),
        }
    }

    /// Backed by the sample collection
    pub fn seeded() -> Self {
        Self::new(fixtures::seed_orders())
    }

    /// Accept a new order from marketplace ingestion; it enters as pending
    pub fn ingest(&self, new_order: NewOrder) -> Result<Order, OrderError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let order = Order::from_new(new_order, sequence)?;

        if !order.total_matches_items() {
            tracing::warn!(
                order_id = %order.id,
                total = order.total,
                items_total = order.items_total(),
                "Ingested order total differs from its line items"
            );
        }

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            marketplace = %order.marketplace,
            item_count = order.items.len(),
            "Ingested new order"
        );

        self.lock().push(order.clone());
        Ok(order)
    }

    pub fn order_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Order>> {
        self.orders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl OrderSource for InMemorySource {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, SourceError> {
        Ok(self.lock().clone())
    }

    async fn push_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SourceError> {
        let mut orders = self.lock();
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| SourceError::NotFound(id.clone()))?;
        order.apply_status(status, chrono::Utc::now());
        Ok(())
    }
}
