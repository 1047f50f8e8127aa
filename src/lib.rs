//! Stick Brawl - a two-fighter platform arena brawler
//!
//! Core modules:
//! - `sim`: Simulation (physics, collisions, combat, AI, round lifecycle)
//! - `tuning`: Data-driven game balance
//!
//! Drawing, DOM/menu wiring and raw input capture live outside this crate.
//! They feed [`sim::TickInput`] in and read [`sim::WorldSnapshot`] out.

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use serde::{Deserialize, Serialize};

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Nominal step at a 60 Hz display rate (seconds)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Upper bound on a single timestep (seconds)
    pub const MAX_DT: f32 = 0.05;

    /// Gravity (px/s², positive is down)
    pub const GRAVITY: f32 = 700.0;
    /// Jump takeoff speed (px/s, applied upward)
    pub const JUMP_VELOCITY: f32 = 520.0;
    /// Distance from a fighter's hip reference down to its feet
    pub const FEET_OFFSET: f32 = 46.0;
    /// Distance from a fighter's hip reference up to the top of its head
    pub const HEAD_OFFSET: f32 = 40.0;
    /// Half the body width used for side blocking
    pub const BODY_HALF_WIDTH: f32 = 18.0;
    /// Horizontal slack when testing whether a fighter is over a platform
    pub const PLATFORM_EDGE_TOLERANCE: f32 = 18.0;
    /// Vertical slack for side blocking against a platform slab
    pub const SIDE_BLOCK_MARGIN: f32 = 8.0;
    /// Horizontal margin kept from the arena walls
    pub const WORLD_MARGIN: f32 = 20.0;

    /// Dash
    pub const DASH_SPEED: f32 = 900.0;
    pub const DASH_DURATION: f32 = 0.18;
    pub const DASH_COOLDOWN: f32 = 0.6;

    /// Fighter base stats
    pub const BASE_HP: i32 = 100;
    pub const BASE_DAMAGE: i32 = 10;
    pub const BASE_SPEED: f32 = 240.0;

    /// Hit zones are measured against a point this far above the hip
    pub const TARGET_VERTICAL_OFFSET: f32 = 20.0;

    /// Punch (melee hitbox)
    pub const PUNCH_LIFETIME: f32 = 0.13;
    pub const PUNCH_COOLDOWN: f32 = 0.5;
    pub const PUNCH_REACH: f32 = 34.0;
    pub const PUNCH_HEIGHT: f32 = 28.0;
    pub const PUNCH_HIT_RADIUS: f32 = 36.0;

    /// Bullets
    pub const BULLET_SPEED: f32 = 720.0;
    pub const BULLET_LIFETIME: f32 = 2.0;
    pub const BULLET_DAMAGE: i32 = 10;
    pub const BULLET_HIT_RADIUS: f32 = 22.0;
    pub const BULLET_MUZZLE_X: f32 = 28.0;
    pub const BULLET_MUZZLE_Y: f32 = 30.0;

    /// Homing missiles
    pub const MISSILE_SPEED: f32 = 420.0;
    pub const MISSILE_LIFETIME: f32 = 6.0;
    pub const MISSILE_DAMAGE: i32 = 20;
    pub const MISSILE_HIT_RADIUS: f32 = 26.0;
    pub const MISSILE_STEER_RATE: f32 = 3.0;
    pub const MISSILE_LAUNCH_HEIGHT: f32 = 30.0;

    /// Spike traps
    pub const SPIKE_DAMAGE: i32 = 10;
    pub const SPIKE_CHANCE: f32 = 0.75;
    pub const SPIKE_MAX_PER_PLATFORM: usize = 4;
    pub const SPIKE_SPACING: f32 = 100.0;
    pub const SPIKE_PERIOD_MIN: f32 = 3.0;
    pub const SPIKE_PERIOD_MAX: f32 = 7.0;
    pub const SPIKE_EXTENDED_MIN: f32 = 0.6;
    pub const SPIKE_EXTENDED_MAX: f32 = 1.4;
    pub const SPIKE_HEIGHT: f32 = 6.0;
    pub const SPIKE_ZONE_PAD_X: f32 = 6.0;
    pub const SPIKE_ZONE_PAD_Y: f32 = 8.0;

    /// Chests
    pub const CHEST_INTERVAL_MIN: f32 = 3.0;
    pub const CHEST_INTERVAL_MAX: f32 = 7.0;
    pub const CHEST_PLATFORM_CHANCE: f32 = 0.9;
    pub const CHEST_PICKUP_RADIUS: f32 = 110.0;
    pub const CHEST_HEAL: i32 = 20;
    pub const CHEST_AMMO: u32 = 3;
    pub const SPEED_BOOST_MULTIPLIER: f32 = 1.3;
    pub const SPEED_BOOST_DURATION: f32 = 6.0;

    /// Popups
    pub const POPUP_LIFETIME: f32 = 2.2;
    pub const POPUP_RISE_SPEED: f32 = 18.0;
    pub const POPUP_HEIGHT: f32 = 80.0;

    /// Progression
    pub const XP_PER_KILL: u32 = 10;
    pub const LEVEL_THRESHOLD_MULTIPLIER: u32 = 10;
    pub const LEVEL_HP_BONUS: i32 = 10;
    pub const LEVEL_HP_HEAL: i32 = 10;
    pub const LEVEL_DAMAGE_BONUS: i32 = 1;

    /// Round lifecycle
    pub const ROUND_RESET_DELAY: f32 = 1.1;

    /// Arena generation
    pub const PLATFORM_TARGET: usize = 13;
    pub const PLATFORM_HEIGHT: f32 = 18.0;
    pub const PLATFORM_ATTEMPTS: u32 = 800;
    pub const REPAIR_ATTEMPTS: u32 = 300;
    pub const MIN_VISIBLE_PLATFORMS: usize = 10;
    pub const VISIBLE_RANGE: f32 = 500.0;
    pub const TOP_LIMIT: f32 = 80.0;
    pub const MIN_PLATFORM_Y: f32 = 60.0;
    pub const PILLAR_WIDTH: f32 = 48.0;
    pub const PILLAR_HEIGHT: f32 = 100.0;

    /// Fighter spawn points
    pub const SPAWN_MARGIN: f32 = 120.0;
    pub const MIN_RIGHT_SPAWN_X: f32 = 220.0;
}

/// Identity of one of the two fighters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FighterId {
    One,
    Two,
}

impl FighterId {
    pub const ALL: [FighterId; 2] = [FighterId::One, FighterId::Two];

    /// Slot in the world's fighter array
    #[inline]
    pub fn index(self) -> usize {
        match self {
            FighterId::One => 0,
            FighterId::Two => 1,
        }
    }

    /// Player-facing number (1 or 2)
    #[inline]
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    #[inline]
    pub fn opponent(self) -> FighterId {
        match self {
            FighterId::One => FighterId::Two,
            FighterId::Two => FighterId::One,
        }
    }
}

/// Horizontal facing / travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, +1.0 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    #[inline]
    pub fn reversed(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Direction pointing from `from` toward `to` (ties go right)
    #[inline]
    pub fn toward(from: f32, to: f32) -> Facing {
        if to < from { Facing::Left } else { Facing::Right }
    }

    /// Direction of a signed value; `None` for zero
    #[inline]
    pub fn from_sign(value: f32) -> Option<Facing> {
        if value > 0.0 {
            Some(Facing::Right)
        } else if value < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}
