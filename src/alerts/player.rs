use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::metrics::Metrics;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The host refused to play without user interaction
    #[error("playback blocked by host policy")]
    Blocked,
}

/// A single looping alert cue
pub trait AlertPlayer: Send + Sync {
    fn start_loop(&self) -> Result<(), PlaybackError>;

    /// Must be safe to call when nothing is playing
    fn stop_and_rewind(&self);

    fn is_playing(&self) -> bool;
}

/// Headless alert: logs instead of producing sound
pub struct ConsoleBell {
    playing: AtomicBool,
    metrics: Option<Arc<Metrics>>,
}

impl ConsoleBell {
    pub fn new(metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            playing: AtomicBool::new(false),
            metrics,
        }
    }

    fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
        if let Some(metrics) = &self.metrics {
            metrics.set_alert_playing(playing);
        }
    }
}

impl AlertPlayer for ConsoleBell {
    fn start_loop(&self) -> Result<(), PlaybackError> {
        if !self.playing.swap(true, Ordering::SeqCst) {
            tracing::warn!("🔔 New pending orders waiting");
        }
        self.set_playing(true);
        Ok(())
    }

    fn stop_and_rewind(&self) {
        if self.playing.swap(false, Ordering::SeqCst) {
            tracing::info!("🔕 Pending alert stopped");
        }
        self.set_playing(false);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_idempotent() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let bell = ConsoleBell::new(Some(metrics.clone()));

        bell.stop_and_rewind();
        bell.stop_and_rewind();

        assert!(!bell.is_playing());
        assert_eq!(metrics.alert_playing.get(), 0);
    }

    #[test]
    fn test_start_then_stop() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let bell = ConsoleBell::new(Some(metrics.clone()));

        bell.start_loop().unwrap();
        bell.start_loop().unwrap();
        assert!(bell.is_playing());
        assert_eq!(metrics.alert_playing.get(), 1);

        bell.stop_and_rewind();
        assert!(!bell.is_playing());
        assert_eq!(metrics.alert_playing.get(), 0);
    }
}
