//! Simulation core
//!
//! All gameplay logic lives here and runs on one thread, in a fixed order
//! per tick. Randomness comes only from the world's seeded RNG, so a seed
//! plus the same inputs and timesteps replays the same match. Nothing here
//! draws, reads devices or touches the filesystem.

pub mod ai;
pub mod arena;
pub mod collision;
pub mod combat;
pub mod pathfinding;
pub mod progression;
pub mod round;
pub mod state;
pub mod tick;

pub use combat::Kill;
pub use pathfinding::{Node, ReachLimits, find_path};
pub use progression::{LevelChoice, ParseLevelChoiceError};
pub use round::RoundLifecycle;
pub use state::{
    AiProfile, Ammo, ArenaBounds, Bullet, Chest, ChestReward, Controller, DashState, Difficulty, Fighter, GameEvent,
    GunCount, HomingMissile, MeleeHitbox, Platform, Popup, SpikeTrap, World,
};
pub use tick::{Command, Intent, SimFault, TickInput, WorldSnapshot, tick};
