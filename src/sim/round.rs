//! Round lifecycle
//!
//! The first death in a round arms a one-shot countdown. When it runs out
//! the world resets. Arming again while armed is a no-op; there is no
//! cancellation short of a manual reset.

use serde::{Deserialize, Serialize};

use crate::FighterId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundLifecycle {
    /// 1-based round counter
    pub number: u32,
    /// Seconds until the pending reset fires; `None` when not armed
    pub reset_countdown: Option<f32>,
    /// Winner of the round that armed the reset
    pub winner: Option<FighterId>,
}

impl RoundLifecycle {
    /// True while a reset is scheduled
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.reset_countdown.is_some()
    }

    /// Schedule a reset. Returns false if one was already pending.
    pub fn arm(&mut self, winner: FighterId, delay: f32) -> bool {
        if self.is_armed() {
            return false;
        }
        self.reset_countdown = Some(delay.max(0.0));
        self.winner = Some(winner);
        true
    }

    /// Advance the countdown. Returns true on the tick the reset fires.
    pub fn tick(&mut self, dt: f32) -> bool {
        match self.reset_countdown.as_mut() {
            Some(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            None => false,
        }
    }

    /// Clear the guard and start the next round
    pub fn release(&mut self) {
        self.reset_countdown = None;
        self.winner = None;
        self.number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_is_idempotent() {
        let mut round = RoundLifecycle::default();
        assert!(round.arm(FighterId::One, 1.1));
        assert!(!round.arm(FighterId::Two, 1.1));
        assert_eq!(round.winner, Some(FighterId::One));
    }

    #[test]
    fn test_fires_after_delay() {
        let mut round = RoundLifecycle::default();
        assert!(!round.tick(1.0));
        round.arm(FighterId::Two, 0.1);
        assert!(!round.tick(0.05));
        assert!(round.tick(0.06));
        round.release();
        assert!(!round.is_armed());
        assert_eq!(round.number, 1);
    }
}
