use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::order::{Order, OrderCommand, OrderError, OrderId, OrderStatus, TransitionPolicy};
use crate::health::{ComponentHealth, HealthStatus};
use crate::metrics::Metrics;

use super::source::OrderSource;

// ============================================================================
// Order Store
// ============================================================================
//
// Single owner of the current order collection. Readers either take a
// snapshot or subscribe to the watch channel; every change that matters to
// them (orders, loading, error) is published through it.
//
// Stale refresh results are fenced by an epoch:
//
//   refresh issued            -> epoch += 1, remember ticket
//   mutation changed a status -> epoch += 1
//   refresh resolved          -> apply only if epoch == ticket
//
// So the newest refresh wins no matter the resolution order, and a refresh
// issued before a manual status change never rolls that change back.
//
// A refresh issued after the change but before its push settles may still
// read the old status from the source. While a push for an order is
// outstanding, the local status is laid over whatever the fetch returned.
//
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    orders: Vec<Order>,
    in_flight: usize,
    error: Option<String>,
    revision: u64,
    epoch: u64,
    pushes: HashMap<OrderId, PendingPush>,
}

/// Local status a fetch must not overwrite until its push settles
#[derive(Debug, Clone)]
struct PendingPush {
    status: OrderStatus,
    delivered_at: Option<DateTime<Utc>>,
    outstanding: usize,
}

impl StoreState {
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// True while at least one refresh is outstanding
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Bumped each time the collection itself changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True while a status push for `id` has not resolved
    pub fn push_outstanding(&self, id: &OrderId) -> bool {
        self.pushes.contains_key(id)
    }

    pub fn find(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        self.orders.iter().filter(|o| o.status == status).count()
    }

    pub fn filtered(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Mount,
    Interval,
    Visibility,
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Mount => "mount",
            RefreshTrigger::Interval => "interval",
            RefreshTrigger::Visibility => "visibility",
            RefreshTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer refresh or a mutation happened while this one was in flight
    Discarded,
    Failed(String),
}

impl RefreshOutcome {
    fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Applied { .. } => "applied",
            RefreshOutcome::Discarded => "discarded",
            RefreshOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied { from: OrderStatus, to: OrderStatus },
    /// Order already had the target status
    Unchanged { status: OrderStatus },
    /// No order with that id; nothing happened
    NotFound,
}

/// Releases the in-flight count if a refresh future is dropped mid-fetch
struct InFlightGuard<'a> {
    state: &'a watch::Sender<StoreState>,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
        }
    }
}

/// Drops one outstanding push for an order, on completion or cancellation
struct PushGuard<'a> {
    state: &'a watch::Sender<StoreState>,
    id: &'a OrderId,
}

impl Drop for PushGuard<'_> {
    fn drop(&mut self) {
        // bookkeeping only, subscribers are not notified
        self.state.send_if_modified(|s| {
            if let Some(push) = s.pushes.get_mut(self.id) {
                push.outstanding = push.outstanding.saturating_sub(1);
                if push.outstanding == 0 {
                    s.pushes.remove(self.id);
                }
            }
            false
        });
    }
}

#[derive(Clone)]
pub struct OrderStore {
    state: Arc<watch::Sender<StoreState>>,
    source: Arc<dyn OrderSource>,
    policy: TransitionPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl OrderStore {
    pub fn new(source: Arc<dyn OrderSource>, policy: TransitionPolicy) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            state: Arc::new(state),
            source,
            policy,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start from a known collection instead of an empty one
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.state.send_modify(|s| {
            s.orders = orders;
            s.revision += 1;
        });
        self.publish_counts();
        self
    }

    pub fn source(&self) -> &Arc<dyn OrderSource> {
        &self.source
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn health(&self) -> ComponentHealth {
        let state = self.state.borrow();
        let status = match &state.error {
            Some(error) => HealthStatus::Degraded(error.clone()),
            None => HealthStatus::Healthy,
        };
        ComponentHealth::new("store", status)
            .with_details(format!("{} orders, revision {}", state.orders.len(), state.revision))
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_with(RefreshTrigger::Manual).await
    }

    /// Fetch the full collection and replace the local one.
    ///
    /// Never fails: a fetch error lands in `error` and the previous
    /// collection stays in place.
    pub async fn refresh_with(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let mut ticket = 0;
        self.state.send_modify(|s| {
            s.epoch += 1;
            ticket = s.epoch;
            s.in_flight += 1;
            s.error = None;
        });

        let mut guard = InFlightGuard {
            state: &self.state,
            armed: true,
        };

        let result = self.source.fetch_orders().await;
        guard.armed = false;

        let mut outcome = RefreshOutcome::Discarded;
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);

            if s.epoch != ticket {
                return;
            }

            match result {
                Ok(mut orders) => {
                    for order in orders.iter_mut() {
                        if let Some(push) = s.pushes.get(&order.id) {
                            order.status = push.status;
                            order.delivered_at = push.delivered_at;
                        }
                    }
                    outcome = RefreshOutcome::Applied { count: orders.len() };
                    s.orders = orders;
                    s.revision += 1;
                }
                Err(e) => {
                    let message = format!("Failed to fetch orders: {}", e);
                    s.error = Some(message.clone());
                    outcome = RefreshOutcome::Failed(message);
                }
            }
        });

        match &outcome {
            RefreshOutcome::Applied { count } => {
                let held = self.state.borrow().pushes.len();
                tracing::debug!(trigger = trigger.as_str(), count, held, "Orders refreshed");
                self.publish_counts();
            }
            RefreshOutcome::Discarded => {
                tracing::debug!(trigger = trigger.as_str(), ticket, "Discarded stale refresh result");
            }
            RefreshOutcome::Failed(message) => {
                tracing::warn!(trigger = trigger.as_str(), source = self.source.name(), error = %message, "Order refresh failed");
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_refresh(trigger.as_str(), outcome.label());
        }

        outcome
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn accept_order(&self, id: &OrderId) -> Result<MutationOutcome, OrderError> {
        self.apply_command(id, OrderCommand::Accept).await
    }

    /// Overwrite an order's status, subject to the store's transition policy
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<MutationOutcome, OrderError> {
        self.apply_command(id, OrderCommand::SetStatus(status)).await
    }

    pub async fn cancel_order(&self, id: &OrderId) -> Result<MutationOutcome, OrderError> {
        self.apply_command(id, OrderCommand::Cancel).await
    }

    /// Apply a command locally, then push the resulting status to the source.
    ///
    /// Unknown ids are a silent no-op: subscribers are not notified. A failed
    /// push keeps the local change and surfaces through `error`; the next
    /// refresh after that reconciles with the source.
    pub async fn apply_command(
        &self,
        id: &OrderId,
        command: OrderCommand,
    ) -> Result<MutationOutcome, OrderError> {
        let policy = self.policy;
        let now = Utc::now();
        let mut outcome = Ok(MutationOutcome::NotFound);

        self.state.send_if_modified(|s| {
            let Some(order) = s.orders.iter_mut().find(|o| &o.id == id) else {
                return false;
            };
            let from = order.status;

            match order.handle_command(&command, policy) {
                Ok(Some(to)) => {
                    order.apply_status(to, now);
                    let delivered_at = order.delivered_at;
                    let push = s.pushes.entry(id.clone()).or_insert(PendingPush {
                        status: to,
                        delivered_at,
                        outstanding: 0,
                    });
                    push.status = to;
                    push.delivered_at = delivered_at;
                    push.outstanding += 1;
                    s.epoch += 1;
                    s.revision += 1;
                    outcome = Ok(MutationOutcome::Applied { from, to });
                    true
                }
                Ok(None) => {
                    outcome = Ok(MutationOutcome::Unchanged { status: from });
                    false
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        let (from, to) = match outcome {
            Ok(MutationOutcome::Applied { from, to }) => (from, to),
            Ok(other) => {
                tracing::debug!(order_id = %id, command = command.name(), outcome = ?other, "Command left collection unchanged");
                return Ok(other);
            }
            Err(e) => {
                if let (Some(metrics), OrderError::IllegalTransition { from, to }) = (&self.metrics, &e) {
                    metrics.record_rejected_transition(*from, *to);
                }
                tracing::warn!(order_id = %id, command = command.name(), error = %e, "Command rejected");
                return Err(e);
            }
        };

        tracing::info!(order_id = %id, command = command.name(), from = %from, to = %to, "Order status changed");
        if let Some(metrics) = &self.metrics {
            metrics.record_transition(from, to);
        }
        self.publish_counts();

        let guard = PushGuard { state: &self.state, id };
        if let Err(e) = self.source.push_status(id, to).await {
            let message = format!("Failed to update order {}: {}", id, e);
            tracing::error!(order_id = %id, source = self.source.name(), error = %e, "Status push failed");
            self.state.send_modify(|s| s.error = Some(message));
        }
        drop(guard);

        Ok(MutationOutcome::Applied { from, to })
    }

    fn publish_counts(&self) {
        if let Some(metrics) = &self.metrics {
            let state = self.state.borrow();
            metrics.set_order_counts(OrderStatus::ALL.iter().map(|s| (*s, state.count(*s))));
        }
    }
}
