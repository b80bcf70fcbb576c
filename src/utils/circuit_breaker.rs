use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards calls to the remote order API. After `failure_threshold`
// consecutive failures the breaker opens and calls fail fast until
// `open_timeout` has elapsed; the next call then probes in HalfOpen and
// `success_threshold` successes close it again.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Gauge encoding (0=Closed, 1=Open, 2=HalfOpen)
    pub fn as_gauge(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

type TransitionHook = Arc<dyn Fn(&str, CircuitState, CircuitState) + Send + Sync>;

#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<BreakerInner>>,
    on_transition: Option<TransitionHook>,
}

struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open")]
    CircuitOpen,
    #[error("{0}")]
    OperationFailed(E),
}

impl CircuitBreaker {
    pub fn new(name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            name: Arc::from(name),
            config,
            inner: Arc::new(Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
            })),
            on_transition: None,
        }
    }

    /// Register a callback invoked on every state change
    pub fn with_transition_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.on_transition = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Run `operation` unless the breaker is open
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        self.admit()?;

        match operation.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    fn admit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let cooled_down = inner
            .opened_at
            .map(|at| at.elapsed() >= self.config.open_timeout)
            .unwrap_or(true);
        if !cooled_down {
            return Err(CircuitBreakerError::CircuitOpen);
        }

        inner.state = CircuitState::HalfOpen;
        inner.half_open_successes = 0;
        drop(inner);

        tracing::info!(breaker = %self.name, "Circuit breaker probing (half-open)");
        self.notify(CircuitState::Open, CircuitState::HalfOpen);
        Ok(())
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = 0;

        if inner.state != CircuitState::HalfOpen {
            return;
        }

        inner.half_open_successes += 1;
        if inner.half_open_successes < self.config.success_threshold {
            return;
        }

        inner.state = CircuitState::Closed;
        inner.half_open_successes = 0;
        inner.opened_at = None;
        drop(inner);

        tracing::info!(breaker = %self.name, "Circuit breaker closed after successful probes");
        self.notify(CircuitState::HalfOpen, CircuitState::Closed);
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;

        let from = inner.state;
        let should_open = match from {
            CircuitState::Closed => inner.consecutive_failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if !should_open {
            return;
        }

        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.half_open_successes = 0;
        let failures = inner.consecutive_failures;
        drop(inner);

        tracing::warn!(breaker = %self.name, failures, "Circuit breaker opened");
        self.notify(from, CircuitState::Open);
    }

    fn notify(&self, from: CircuitState, to: CircuitState) {
        if from == to {
            return;
        }
        if let Some(hook) = &self.on_transition {
            hook(&self.name, from, to);
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        // A poisoned breaker still holds consistent counters.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_millis(50),
            success_threshold: 1,
        }
    }

    #[tokio::test]
    async fn test_opens_after_consecutive_failures() {
        let cb = CircuitBreaker::new("orders-api", quick_config());

        for _ in 0..2 {
            let result = cb.call(async { Err::<(), _>("boom") }).await;
            assert!(matches!(result, Err(CircuitBreakerError::OperationFailed("boom"))));
        }
        assert_eq!(cb.state(), CircuitState::Open);

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let cb = CircuitBreaker::new("orders-api", quick_config());

        let _ = cb.call(async { Err::<(), _>("boom") }).await;
        let _ = cb.call(async { Ok::<_, &str>(()) }).await;
        let _ = cb.call(async { Err::<(), _>("boom") }).await;

        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_probe_closes_breaker() {
        let transitions = Arc::new(AtomicU32::new(0));
        let counter = transitions.clone();
        let cb = CircuitBreaker::new("orders-api", quick_config())
            .with_transition_hook(move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        for _ in 0..2 {
            let _ = cb.call(async { Err::<(), _>("boom") }).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        let result = cb.call(async { Ok::<_, &str>(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(cb.state(), CircuitState::Closed);
        // closed -> open -> half_open -> closed
        assert_eq!(transitions.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_probe_reopens() {
        let cb = CircuitBreaker::new("orders-api", quick_config());
        for _ in 0..2 {
            let _ = cb.call(async { Err::<(), _>("boom") }).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        let _ = cb.call(async { Err::<(), _>("still down") }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }
}
