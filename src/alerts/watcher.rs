// ============================================================================
// Pending Alert Watcher
// ============================================================================
//
// Pure decision logic: fed successive pending-order counts, says whether the
// looping alert should start, stop or be left alone. Knows nothing about
// how sound is produced.
//
//   count > previous and not playing   -> Start
//   count == 0 and (playing or was >0) -> Stop
//   otherwise                          -> Hold
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertIntent {
    Start,
    Stop,
    Hold,
}

/// Decide on one `(previous, current)` pair
pub fn decide(previous: usize, current: usize, playing: bool) -> AlertIntent {
    if current > previous && !playing {
        AlertIntent::Start
    } else if current == 0 && (playing || previous > 0) {
        AlertIntent::Stop
    } else {
        AlertIntent::Hold
    }
}

#[derive(Debug, Default)]
pub struct PendingAlertWatcher {
    previous: usize,
    playing: bool,
}

impl PendingAlertWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts already pending when watching begins do not trigger the alert
    pub fn with_baseline(count: usize) -> Self {
        Self {
            previous: count,
            playing: false,
        }
    }

    pub fn observe(&mut self, current: usize) -> AlertIntent {
        let intent = decide(self.previous, current, self.playing);
        match intent {
            AlertIntent::Start => self.playing = true,
            AlertIntent::Stop => self.playing = false,
            AlertIntent::Hold => {}
        }
        self.previous = current;
        intent
    }

    /// The last Start could not play; the next increase tries again
    pub fn playback_blocked(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AlertIntent::*;

    fn run(counts: &[usize]) -> Vec<AlertIntent> {
        let mut watcher = PendingAlertWatcher::new();
        counts.iter().map(|c| watcher.observe(*c)).collect()
    }

    #[test]
    fn test_starts_on_increase_and_stops_at_zero() {
        assert_eq!(
            run(&[0, 1, 1, 2, 0, 3]),
            vec![Hold, Start, Hold, Hold, Stop, Start]
        );
    }

    #[test]
    fn test_decrease_above_zero_keeps_playing() {
        assert_eq!(run(&[2, 1, 3]), vec![Start, Hold, Hold]);
    }

    #[test]
    fn test_zero_to_zero_is_hold() {
        assert_eq!(run(&[0, 0, 0]), vec![Hold, Hold, Hold]);
    }

    #[test]
    fn test_baseline_suppresses_existing_pending() {
        let mut watcher = PendingAlertWatcher::with_baseline(2);
        assert_eq!(watcher.observe(2), Hold);
        assert_eq!(watcher.observe(3), Start);
    }

    #[test]
    fn test_blocked_playback_retries_on_next_increase() {
        let mut watcher = PendingAlertWatcher::new();
        assert_eq!(watcher.observe(1), Start);
        watcher.playback_blocked();
        assert!(!watcher.is_playing());

        assert_eq!(watcher.observe(1), Hold);
        assert_eq!(watcher.observe(2), Start);
    }

    #[test]
    fn test_drop_to_zero_after_blocked_start_still_stops() {
        let mut watcher = PendingAlertWatcher::new();
        watcher.observe(1);
        watcher.playback_blocked();

        assert_eq!(watcher.observe(0), Stop);
        assert_eq!(watcher.observe(0), Hold);
    }
}
