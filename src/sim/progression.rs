//! Experience, levels and level-up choices

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{Fighter, GameEvent};
use crate::tuning::ProgressionTuning;

/// Stat picked when spending a pending level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelChoice {
    /// More max health, plus a small heal
    Hp,
    /// More damage per hit
    Dmg,
}

impl LevelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelChoice::Hp => "hp",
            LevelChoice::Dmg => "dmg",
        }
    }
}

impl fmt::Display for LevelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown level-up choice `{0}` (expected `hp` or `dmg`)")]
pub struct ParseLevelChoiceError(pub String);

impl FromStr for LevelChoice {
    type Err = ParseLevelChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hp" => Ok(LevelChoice::Hp),
            "dmg" | "damage" => Ok(LevelChoice::Dmg),
            other => Err(ParseLevelChoiceError(other.to_string())),
        }
    }
}

/// XP required to advance from `level`
#[inline]
pub fn xp_threshold(level: u32, tuning: &ProgressionTuning) -> u32 {
    level.saturating_mul(tuning.level_threshold_multiplier)
}

/// Add XP and roll over as many levels as it pays for
///
/// Each level gained queues one pending choice and pushes a `LevelUp` event.
pub fn award_xp(fighter: &mut Fighter, amount: u32, tuning: &ProgressionTuning, events: &mut Vec<GameEvent>) {
    fighter.xp = fighter.xp.saturating_add(amount);
    loop {
        let threshold = xp_threshold(fighter.level, tuning);
        if threshold == 0 || fighter.xp < threshold {
            break;
        }
        fighter.xp -= threshold;
        fighter.level += 1;
        fighter.pending_level_ups += 1;
        log::info!("Player {} reached level {}", fighter.id.number(), fighter.level);
        events.push(GameEvent::LevelUp { fighter: fighter.id, level: fighter.level });
    }
}

/// Spend one pending level-up. Returns false (and changes nothing) when
/// none is pending.
pub fn apply_level_choice(fighter: &mut Fighter, choice: LevelChoice, tuning: &ProgressionTuning) -> bool {
    if fighter.pending_level_ups == 0 {
        log::debug!("Player {} has no pending level-up for `{}`", fighter.id.number(), choice);
        return false;
    }
    match choice {
        LevelChoice::Hp => {
            fighter.bonus_hp += tuning.level_hp_bonus;
            fighter.heal(tuning.level_hp_heal);
        }
        LevelChoice::Dmg => {
            fighter.bonus_damage += tuning.level_damage_bonus;
        }
    }
    fighter.pending_level_ups -= 1;
    true
}

/// Bots spend their level-ups straight away: health when hurt, damage otherwise
pub fn auto_resolve(fighter: &mut Fighter, tuning: &ProgressionTuning) {
    while fighter.pending_level_ups > 0 {
        let hurt = (fighter.health as f32) < fighter.max_health() as f32 * 0.5;
        let choice = if hurt { LevelChoice::Hp } else { LevelChoice::Dmg };
        apply_level_choice(fighter, choice, tuning);
    }
}
