use actix::prelude::*;
use std::time::Duration;

use crate::store::{OrderStore, RefreshTrigger};

// ============================================================================
// Actor Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct RefreshNow(pub RefreshTrigger);

#[derive(Message)]
#[rtype(result = "()")]
pub struct StopPolling;

// ============================================================================
// Refresh Poller - refreshes the store on a fixed interval
// ============================================================================
//
// Lives exactly as long as at least one consumer is mounted. Each refresh
// runs as a detached task, so stopping the poller does not cancel a fetch
// that is already in flight; the store fences stale results itself.
//
// ============================================================================

pub struct RefreshPoller {
    store: OrderStore,
    interval: Option<Duration>,
}

impl RefreshPoller {
    /// `interval_ms <= 0` disables periodic polling
    pub fn new(store: OrderStore, interval_ms: i64) -> Self {
        let interval = u64::try_from(interval_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Self { store, interval }
    }

    fn spawn_refresh(&self, trigger: RefreshTrigger) {
        let store = self.store.clone();
        actix::spawn(async move {
            store.refresh_with(trigger).await;
        });
    }
}

impl Actor for RefreshPoller {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        match self.interval {
            Some(interval) => {
                tracing::info!(interval_ms = interval.as_millis() as u64, "RefreshPoller started");
                ctx.run_interval(interval, |act, _ctx| {
                    act.spawn_refresh(RefreshTrigger::Interval);
                });
            }
            None => {
                tracing::info!("RefreshPoller started with periodic polling disabled");
            }
        }
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("RefreshPoller stopped");
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<RefreshNow> for RefreshPoller {
    type Result = ();

    fn handle(&mut self, msg: RefreshNow, _ctx: &mut Self::Context) -> Self::Result {
        tracing::debug!(trigger = msg.0.as_str(), "Refresh requested");
        self.spawn_refresh(msg.0);
    }
}

impl Handler<StopPolling> for RefreshPoller {
    type Result = ();

    fn handle(&mut self, _msg: StopPolling, ctx: &mut Self::Context) -> Self::Result {
        ctx.stop();
    }
}
