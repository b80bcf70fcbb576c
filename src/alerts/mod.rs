// ============================================================================
// Alerts - looping cue while new pending orders wait
// ============================================================================

pub mod monitor;
pub mod player;
pub mod watcher;

pub use monitor::AlertMonitor;
pub use player::{AlertPlayer, ConsoleBell, PlaybackError};
pub use watcher::{decide, AlertIntent, PendingAlertWatcher};
