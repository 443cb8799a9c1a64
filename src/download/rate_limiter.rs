//! Per-conversation cooldown for the download operation.
//!
//! This module provides the [`CooldownLimiter`], which decides whether a
//! conversation may start another download "now". The decision and the
//! timestamp update are one step: a conversation that is allowed through has
//! its `last_download_at` moved to `now` by the same call, so two rapid
//! requests cannot both pass before either records itself.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use tunefetch_core::download::{CooldownLimiter, Reservation};
//! use tunefetch_core::session::ConversationSession;
//!
//! let limiter = CooldownLimiter::new(Duration::from_secs(30));
//! let mut session = ConversationSession::default();
//! let now = Instant::now();
//!
//! assert_eq!(limiter.check_and_reserve(&mut session, now), Reservation::Allowed);
//! assert!(matches!(
//!     limiter.check_and_reserve(&mut session, now + Duration::from_secs(10)),
//!     Reservation::Denied { remaining_secs: 20 }
//! ));
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument};

use super::constants::DOWNLOAD_COOLDOWN;
use crate::session::ConversationSession;

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The download may proceed; the reservation is already recorded.
    Allowed,
    /// Still cooling down. `remaining_secs` is rounded up and always > 0.
    Denied { remaining_secs: u64 },
}

/// Fixed-window cooldown anchored on a session's last reserved download.
#[derive(Debug, Clone, Copy)]
pub struct CooldownLimiter {
    cooldown: Duration,
}

impl CooldownLimiter {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Checks the cooldown and, if it has elapsed, reserves `now`.
    ///
    /// A denied check leaves `last_download_at` untouched.
    #[instrument(skip_all)]
    pub fn check_and_reserve(&self, session: &mut ConversationSession, now: Instant) -> Reservation {
        if let Some(last) = session.last_download_at {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                let remaining_secs =
                    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                debug!(remaining_secs, "download denied, cooling down");
                return Reservation::Denied { remaining_secs };
            }
        }

        session.last_download_at = Some(now);
        debug!("download slot reserved");
        Reservation::Allowed
    }
}

impl Default for CooldownLimiter {
    fn default() -> Self {
        Self::new(DOWNLOAD_COOLDOWN)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reservation_is_allowed() {
        let limiter = CooldownLimiter::default();
        let mut session = ConversationSession::default();
        let now = Instant::now();

        assert_eq!(limiter.check_and_reserve(&mut session, now), Reservation::Allowed);
        assert_eq!(session.last_download_at, Some(now));
    }

    #[test]
    fn test_second_reservation_within_window_is_denied() {
        let limiter = CooldownLimiter::new(Duration::from_secs(30));
        let mut session = ConversationSession::default();
        let start = Instant::now();

        assert_eq!(limiter.check_and_reserve(&mut session, start), Reservation::Allowed);
        let denied = limiter.check_and_reserve(&mut session, start + Duration::from_secs(10));
        assert_eq!(denied, Reservation::Denied { remaining_secs: 20 });
    }

    #[test]
    fn test_denied_reservation_does_not_move_anchor() {
        let limiter = CooldownLimiter::new(Duration::from_secs(30));
        let mut session = ConversationSession::default();
        let start = Instant::now();

        limiter.check_and_reserve(&mut session, start);
        limiter.check_and_reserve(&mut session, start + Duration::from_secs(29));
        assert_eq!(session.last_download_at, Some(start));
        assert_eq!(
            limiter.check_and_reserve(&mut session, start + Duration::from_secs(30)),
            Reservation::Allowed
        );
    }

    #[test]
    fn test_remaining_seconds_round_up() {
        let limiter = CooldownLimiter::new(Duration::from_secs(30));
        let mut session = ConversationSession::default();
        let start = Instant::now();

        limiter.check_and_reserve(&mut session, start);
        let denied = limiter.check_and_reserve(&mut session, start + Duration::from_millis(29_001));
        assert_eq!(denied, Reservation::Denied { remaining_secs: 1 });
    }

    #[test]
    fn test_exactly_one_of_two_immediate_reservations_succeeds() {
        let limiter = CooldownLimiter::default();
        let mut session = ConversationSession::default();
        let now = Instant::now();

        let outcomes = [
            limiter.check_and_reserve(&mut session, now),
            limiter.check_and_reserve(&mut session, now),
        ];
        let allowed = outcomes
            .iter()
            .filter(|o| **o == Reservation::Allowed)
            .count();
        assert_eq!(allowed, 1);
        assert!(matches!(outcomes[1], Reservation::Denied { remaining_secs } if remaining_secs > 0));
    }
}
