#![forbid(unsafe_code)]

//! Trailing-edge debounce driven by the host clock.
//!
//! Every input handler and the resize listener share this one primitive:
//! pushes inside the window replace the pending value ("latest wins") and
//! restart the window; the value is released once the clock passes the
//! deadline without another push.
//!
//! ```
//! use core::time::Duration;
//! use colview_core::debounce::Debounce;
//!
//! let mut d = Debounce::new(Duration::from_millis(100));
//! d.push(Duration::from_millis(0), "h");
//! d.push(Duration::from_millis(40), "he");
//! assert_eq!(d.poll(Duration::from_millis(120)), None);
//! assert_eq!(d.poll(Duration::from_millis(140)), Some("he"));
//! ```

use core::time::Duration;

#[derive(Debug, Clone)]
pub struct Debounce<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    deadline: Duration,
    value: T,
    coalesced: u32,
}

impl<T> Debounce<T> {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Queue `value`, replacing any pending one and restarting the window.
    ///
    /// Returns how many earlier pushes this one superseded.
    pub fn push(&mut self, now: Duration, value: T) -> u32 {
        let coalesced = self.pending.as_ref().map_or(0, |p| p.coalesced + 1);
        self.pending = Some(Pending {
            deadline: now.saturating_add(self.window),
            value,
            coalesced,
        });
        coalesced
    }

    /// Release the pending value if its window has elapsed.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Drop the pending value without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Value waiting to fire, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
