//! Slideshow timer

use std::time::{Duration, Instant};

/// A single repeating deadline
///
/// Starting the slideshow replaces any pending deadline, so at most one
/// advance is ever outstanding.
#[derive(Debug, Clone)]
pub struct Slideshow {
    interval: Duration,
    due: Option<Instant>,
}

impl Slideshow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            due: None,
        }
    }

    /// (Re)arm the timer one interval from `now`
    pub fn start(&mut self, now: Instant) {
        self.due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.due = None;
    }

    pub fn is_running(&self) -> bool {
        self.due.is_some()
    }

    /// Time left until the next advance
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }

    /// True once per elapsed interval; re-arms itself when it fires
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_interval() {
        let start = Instant::now();
        let mut slideshow = Slideshow::new(Duration::from_secs(5));
        assert!(!slideshow.poll(start + Duration::from_secs(10)));

        slideshow.start(start);
        assert!(!slideshow.poll(start + Duration::from_secs(4)));
        assert!(slideshow.poll(start + Duration::from_secs(5)));
        assert!(!slideshow.poll(start + Duration::from_secs(6)));
        assert!(slideshow.poll(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_restart_replaces_pending_deadline() {
        let start = Instant::now();
        let mut slideshow = Slideshow::new(Duration::from_secs(5));
        slideshow.start(start);
        slideshow.start(start + Duration::from_secs(3));

        assert!(!slideshow.poll(start + Duration::from_secs(5)));
        assert!(slideshow.poll(start + Duration::from_secs(8)));
    }

    #[test]
    fn test_stop_cancels() {
        let start = Instant::now();
        let mut slideshow = Slideshow::new(Duration::from_secs(5));
        slideshow.start(start);
        slideshow.stop();

        assert!(!slideshow.is_running());
        assert!(!slideshow.poll(start + Duration::from_secs(60)));
        assert_eq!(slideshow.due_in(start), None);
    }
}
