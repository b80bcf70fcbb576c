use prometheus::{IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

use crate::domain::order::OrderStatus;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order refreshes (trigger, outcome, stale results discarded)
// - Status transitions applied and rejected
// - Orders currently held, by status
// - Pending-order alert playback
// - Order API circuit breaker state
//
// Exposed through GET /metrics on the API server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Refresh Metrics
    pub refreshes_total: IntCounterVec,
    pub refreshes_discarded: IntCounter,

    // Lifecycle Metrics
    pub status_transitions: IntCounterVec,
    pub rejected_transitions: IntCounterVec,
    pub orders_by_status: IntGaugeVec,

    // Alert Metrics
    pub alert_playing: IntGauge,
    pub alert_blocked_total: IntCounter,

    // Circuit Breaker Metrics
    pub circuit_breaker_state: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let refreshes_total = IntCounterVec::new(
            Opts::new("order_refreshes_total", "Order refreshes by trigger and outcome"),
            &["trigger", "outcome"],
        )?;
        registry.register(Box::new(refreshes_total.clone()))?;

        let refreshes_discarded = IntCounter::new(
            "order_refreshes_discarded_total",
            "Refresh results dropped because a newer refresh or mutation superseded them",
        )?;
        registry.register(Box::new(refreshes_discarded.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions applied"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let rejected_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_rejected_total", "Status writes rejected by the transition policy"),
            &["from", "to"],
        )?;
        registry.register(Box::new(rejected_transitions.clone()))?;

        let orders_by_status = IntGaugeVec::new(
            Opts::new("orders_current", "Orders currently held, by status"),
            &["status"],
        )?;
        registry.register(Box::new(orders_by_status.clone()))?;

        let alert_playing = IntGauge::new(
            "pending_alert_playing",
            "Whether the pending-order alert is looping (0/1)",
        )?;
        registry.register(Box::new(alert_playing.clone()))?;

        let alert_blocked_total = IntCounter::new(
            "pending_alert_blocked_total",
            "Alert playback attempts refused by the host",
        )?;
        registry.register(Box::new(alert_blocked_total.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Order API circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("circuit_breaker_transitions_total", "Circuit breaker state transitions"),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        Ok(Self {
            registry,
            refreshes_total,
            refreshes_discarded,
            status_transitions,
            rejected_transitions,
            orders_by_status,
            alert_playing,
            alert_blocked_total,
            circuit_breaker_state,
            circuit_breaker_transitions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_refresh(&self, trigger: &str, outcome: &str) {
        self.refreshes_total.with_label_values(&[trigger, outcome]).inc();
        if outcome == "discarded" {
            self.refreshes_discarded.inc();
        }
    }

    pub fn record_transition(&self, from: OrderStatus, to: OrderStatus) {
        self.status_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    pub fn record_rejected_transition(&self, from: OrderStatus, to: OrderStatus) {
        self.rejected_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    /// Overwrite the per-status gauges from a fresh count
    pub fn set_order_counts(&self, counts: impl IntoIterator<Item = (OrderStatus, usize)>) {
        for (status, count) in counts {
            self.orders_by_status
                .with_label_values(&[status.as_str()])
                .set(count as i64);
        }
    }

    pub fn set_alert_playing(&self, playing: bool) {
        self.alert_playing.set(i64::from(playing));
    }

    pub fn record_circuit_breaker_transition(&self, from_state: &str, to_state: &str, gauge: i64) {
        self.circuit_breaker_transitions
            .with_label_values(&[from_state, to_state])
            .inc();
        self.circuit_breaker_state.set(gauge);
    }

    /// Prometheus text exposition of every registered metric
    pub fn encode(&self) -> anyhow::Result<String> {
        use prometheus::{Encoder, TextEncoder};

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
