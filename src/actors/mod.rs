// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure that keeps the order store fresh.
//
// Structure:
// - poller.rs       - RefreshPoller actor (interval ticks, on-demand refresh)
// - live_orders.rs  - Consumer leases that start and stop the poller
//
// Note: Order lifecycle rules live in the domain and the store, NOT in
//       actors. Actors are reserved for scheduling concerns only.
//
// ============================================================================

mod live_orders;
mod poller;

pub use live_orders::{ConsumerLease, LiveOrders};
pub use poller::{RefreshNow, RefreshPoller, StopPolling};
