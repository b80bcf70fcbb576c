use actix::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::store::{OrderStore, RefreshTrigger};

use super::poller::{RefreshNow, RefreshPoller, StopPolling};

// ============================================================================
// Live Orders - consumer leases over the refresh poller
// ============================================================================
//
//   mount()              -> refresh now; first lease starts the poller
//   drop(lease)          -> last lease stops the poller
//   visibility_changed() -> refresh when regained, only while mounted
//
// ============================================================================

struct Mounts {
    consumers: usize,
    poller: Option<Addr<RefreshPoller>>,
}

#[derive(Clone)]
pub struct LiveOrders {
    store: OrderStore,
    interval_ms: i64,
    mounts: Arc<Mutex<Mounts>>,
}

/// Keeps the order collection live while held
pub struct ConsumerLease {
    mounts: Arc<Mutex<Mounts>>,
}

fn lock(mounts: &Mutex<Mounts>) -> MutexGuard<'_, Mounts> {
    mounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LiveOrders {
    pub fn new(store: OrderStore, interval_ms: i64) -> Self {
        Self {
            store,
            interval_ms,
            mounts: Arc::new(Mutex::new(Mounts {
                consumers: 0,
                poller: None,
            })),
        }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn consumers(&self) -> usize {
        lock(&self.mounts).consumers
    }

    /// Register a consumer. Must be called from inside an actix system.
    pub fn mount(&self) -> ConsumerLease {
        let mut mounts = lock(&self.mounts);
        mounts.consumers += 1;

        let poller = match &mounts.poller {
            Some(addr) if addr.connected() => addr.clone(),
            _ => {
                let addr = RefreshPoller::new(self.store.clone(), self.interval_ms).start();
                mounts.poller = Some(addr.clone());
                addr
            }
        };
        poller.do_send(RefreshNow(RefreshTrigger::Mount));

        tracing::debug!(consumers = mounts.consumers, "Consumer mounted");

        ConsumerLease {
            mounts: self.mounts.clone(),
        }
    }

    /// Returns whether a refresh was issued
    pub fn visibility_changed(&self, visible: bool) -> bool {
        if !visible {
            return false;
        }

        let mounts = lock(&self.mounts);
        match (&mounts.poller, mounts.consumers) {
            (Some(poller), n) if n > 0 => {
                poller.do_send(RefreshNow(RefreshTrigger::Visibility));
                true
            }
            _ => {
                tracing::debug!("Visibility regained with no mounted consumer, ignoring");
                false
            }
        }
    }
}

impl Drop for ConsumerLease {
    fn drop(&mut self) {
        let mut mounts = lock(&self.mounts);
        mounts.consumers = mounts.consumers.saturating_sub(1);

        if mounts.consumers == 0 {
            if let Some(poller) = mounts.poller.take() {
                poller.do_send(StopPolling);
            }
        }

        tracing::debug!(consumers = mounts.consumers, "Consumer unmounted");
    }
}
