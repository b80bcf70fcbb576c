use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::CircuitState;

// ============================================================================
// Health Reporting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn from_circuit(state: CircuitState) -> Self {
        match state {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded("circuit breaker half-open".to_string()),
            CircuitState::Open => HealthStatus::Unhealthy("circuit breaker open".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: Vec<ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

impl SystemHealth {
    /// Worst component wins; unhealthy reasons are joined
    pub fn assess(components: Vec<ComponentHealth>) -> Self {
        let mut degraded = false;
        let mut unhealthy = Vec::new();

        for component in &components {
            match &component.status {
                HealthStatus::Unhealthy(reason) => unhealthy.push(format!("{}: {}", component.name, reason)),
                HealthStatus::Degraded(_) => degraded = true,
                HealthStatus::Healthy => {}
            }
        }

        let overall_status = if !unhealthy.is_empty() {
            HealthStatus::Unhealthy(unhealthy.join(", "))
        } else if degraded {
            HealthStatus::Degraded("some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        };

        Self {
            overall_status,
            components,
            check_time: Utc::now(),
        }
    }
}
