use std::time::Duration;

use tokio::time::Instant;

/// The state of the debounced flush.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlushState {
    Idle,
    /// A flush is scheduled. Further requests before the deadline are absorbed by it.
    Pending { deadline: Instant },
}

/// Coalesces flush requests into at most one write per debounce window.
#[derive(Debug)]
pub struct Flusher {
    debounce: Duration,
    state: FlushState,
}

impl Flusher {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce, state: FlushState::Idle }
    }

    /// Requests a flush. Returns the deadline if this request opened a new window, or None if
    /// a pending flush already covers it.
    pub fn schedule(&mut self, now: Instant) -> Option<Instant> {
        match self.state {
            FlushState::Pending { .. } => None,
            FlushState::Idle => {
                let deadline = now + self.debounce;
                self.state = FlushState::Pending { deadline };
                Some(deadline)
            },
        }
    }

    /// Returns to Idle when the pending flush runs. Returns false if nothing was pending.
    pub fn fire(&mut self) -> bool {
        let pending = self.is_pending();
        self.state = FlushState::Idle;
        pending
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, FlushState::Pending { .. })
    }

    pub fn state(&self) -> FlushState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flusher_coalesces() {
        let mut flusher = Flusher::new(Duration::from_millis(200));
        let now = Instant::now();
        assert_eq!(flusher.state(), FlushState::Idle);

        let deadline = flusher.schedule(now);
        assert_eq!(deadline, Some(now + Duration::from_millis(200)));
        assert_eq!(flusher.schedule(now + Duration::from_millis(50)), None);
        assert_eq!(flusher.schedule(now + Duration::from_millis(150)), None);
        assert_eq!(flusher.state(), FlushState::Pending { deadline: now + Duration::from_millis(200) });

        assert!(flusher.fire());
        assert!(!flusher.fire());
        assert_eq!(
            flusher.schedule(now + Duration::from_millis(300)),
            Some(now + Duration::from_millis(500))
        );
    }
}
