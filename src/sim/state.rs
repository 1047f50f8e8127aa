//! World state and core simulation types
//!
//! Every entity kind is an explicit record with all fields present. The
//! `World` owns all of them; cross references use ids or indices.

use std::collections::HashSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::round::RoundLifecycle;
use crate::tuning::{CombatTuning, Tuning};
use crate::{Facing, FighterId};

/// Bot skill tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// Per-tick chance of a hop while approaching on the ground
    pub fn jump_chance(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.015,
            Difficulty::Normal => 0.03,
            Difficulty::Hard => 0.06,
        }
    }

    /// Chance to throw a punch when in range
    pub fn attack_chance(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.65,
            Difficulty::Normal => 0.8,
            Difficulty::Hard => 0.98,
        }
    }

    /// Per-tick chance of an opportunistic dash toward the opponent
    pub fn dash_chance(&self) -> f64 {
        match self {
            Difficulty::Hard => 0.06,
            _ => 0.0,
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" | "med" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty `{other}`")),
        }
    }
}

/// Bot configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiProfile {
    pub difficulty: Difficulty,
    /// Runs away and parkours when hurt (the designated bot role)
    pub flees: bool,
}

/// Who produces a fighter's intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Human,
    Ai(AiProfile),
}

impl Controller {
    pub fn is_ai(&self) -> bool {
        matches!(self, Controller::Ai(_))
    }
}

/// Ranged ammunition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ammo {
    Finite(u32),
    Unlimited,
}

impl Default for Ammo {
    fn default() -> Self {
        Ammo::Finite(0)
    }
}

impl Ammo {
    /// True when at least one shot can be fired
    pub fn has_rounds(&self) -> bool {
        match self {
            Ammo::Finite(n) => *n > 0,
            Ammo::Unlimited => true,
        }
    }

    /// Spend one round; false if empty
    pub fn consume(&mut self) -> bool {
        match self {
            Ammo::Finite(0) => false,
            Ammo::Finite(n) => {
                *n -= 1;
                true
            }
            Ammo::Unlimited => true,
        }
    }

    pub fn add(&mut self, rounds: u32) {
        if let Ammo::Finite(n) = self {
            *n = n.saturating_add(rounds);
        }
    }

    /// Guns held, each worth three rounds
    pub fn gun_count(&self) -> GunCount {
        match self {
            Ammo::Finite(n) => GunCount::Count(n.div_ceil(3)),
            Ammo::Unlimited => GunCount::Unlimited,
        }
    }
}

/// Number of guns in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GunCount {
    Count(u32),
    Unlimited,
}

impl Default for GunCount {
    fn default() -> Self {
        GunCount::Count(0)
    }
}

impl GunCount {
    pub fn increment(&mut self) {
        if let GunCount::Count(n) = self {
            *n = n.saturating_add(1);
        }
    }
}

/// Dash sub-state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DashState {
    #[default]
    Inactive,
    Active { direction: Facing, remaining: f32 },
}

/// A fighter (created once, reset every round)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub id: FighterId,
    /// Hip reference point; feet are `feet_offset` below
    pub pos: Vec2,
    pub vel: Vec2,
    pub grounded: bool,
    pub facing: Facing,
    pub health: i32,
    pub base_hp: i32,
    pub base_damage: i32,
    pub bonus_hp: i32,
    pub bonus_damage: i32,
    pub level: u32,
    pub xp: u32,
    pub pending_level_ups: u32,
    pub dash: DashState,
    pub dash_cooldown: f32,
    pub punch_cooldown: f32,
    /// Remaining display time of the punch animation (0 when idle)
    pub punch_active: f32,
    pub ammo: Ammo,
    pub guns: GunCount,
    pub alive: bool,
    pub controller: Controller,
    /// Un-boosted walking speed
    pub base_speed: f32,
    pub speed_multiplier: f32,
    pub speed_boost_remaining: f32,
    pub inventory_open: bool,
    /// Fire input held on the previous tick (edge detection)
    pub shoot_held: bool,
}

impl Fighter {
    pub fn new(id: FighterId, controller: Controller, combat: &CombatTuning) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            grounded: true,
            facing: match id {
                FighterId::One => Facing::Right,
                FighterId::Two => Facing::Left,
            },
            health: combat.base_hp,
            base_hp: combat.base_hp,
            base_damage: combat.base_damage,
            bonus_hp: 0,
            bonus_damage: 0,
            level: 1,
            xp: 0,
            pending_level_ups: 0,
            dash: DashState::Inactive,
            dash_cooldown: 0.0,
            punch_cooldown: 0.0,
            punch_active: 0.0,
            ammo: Ammo::default(),
            guns: GunCount::default(),
            alive: true,
            controller,
            base_speed: combat.base_speed,
            speed_multiplier: 1.0,
            speed_boost_remaining: 0.0,
            inventory_open: false,
            shoot_held: false,
        }
    }

    #[inline]
    pub fn max_health(&self) -> i32 {
        self.base_hp + self.bonus_hp
    }

    #[inline]
    pub fn damage(&self) -> i32 {
        self.base_damage + self.bonus_damage
    }

    /// Walking speed including any active boost
    #[inline]
    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    #[inline]
    pub fn is_dashing(&self) -> bool {
        matches!(self.dash, DashState::Active { .. })
    }

    /// A new dash may start
    #[inline]
    pub fn can_dash(&self) -> bool {
        self.alive && !self.is_dashing() && self.dash_cooldown <= 0.0
    }

    /// Feet y for a given feet offset
    #[inline]
    pub fn feet_y(&self, feet_offset: f32) -> f32 {
        self.pos.y + feet_offset
    }

    /// Point that melee/projectile hit checks aim at
    #[inline]
    pub fn hit_center(&self, vertical_offset: f32) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - vertical_offset)
    }

    /// Heal, capped at max health
    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount.max(0)).min(self.max_health());
    }

    /// Subtract damage, floored at 0. Returns true only on the hit that kills.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Start a dash if allowed
    pub fn start_dash(&mut self, direction: Facing, duration: f32, cooldown: f32, speed: f32) -> bool {
        if !self.can_dash() {
            return false;
        }
        self.dash = DashState::Active { direction, remaining: duration };
        self.dash_cooldown = cooldown;
        self.vel.x = direction.sign() * speed;
        true
    }

    /// Apply (or refresh) a speed boost relative to the base speed
    pub fn apply_speed_boost(&mut self, multiplier: f32, duration: f32) {
        self.speed_multiplier = multiplier;
        self.speed_boost_remaining = duration;
    }

    /// Count down timed effects that tick even without movement
    pub fn tick_effects(&mut self, dt: f32) {
        if self.speed_boost_remaining > 0.0 {
            self.speed_boost_remaining = (self.speed_boost_remaining - dt).max(0.0);
            if self.speed_boost_remaining == 0.0 {
                self.speed_multiplier = 1.0;
            }
        }
    }

    /// Put the fighter back at a spawn point for a new round
    pub fn respawn(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.grounded = true;
        self.facing = match self.id {
            FighterId::One => Facing::Right,
            FighterId::Two => Facing::Left,
        };
        self.health = self.max_health();
        self.alive = true;
        self.dash = DashState::Inactive;
        self.dash_cooldown = 0.0;
        self.punch_active = 0.0;
    }
}

/// Axis-aligned one-way platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    /// Top surface
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Platform {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width * 0.5
    }

    /// True when `x` lies over the platform, widened by `tolerance` on both sides
    #[inline]
    pub fn spans_x(&self, x: f32, tolerance: f32) -> bool {
        x >= self.left() - tolerance && x <= self.right() + tolerance
    }

    /// Horizontal gap test used by arena generation: true when the two
    /// spans come within `buffer` of each other
    pub fn overlaps_x(&self, x: f32, width: f32, buffer: f32) -> bool {
        let apart = x + width + buffer < self.left() || self.right() + buffer < x;
        !apart
    }
}

/// A periodic spike trap on a platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeTrap {
    /// Index of the owning platform (valid for the current round only)
    pub platform: usize,
    pub pos: Vec2,
    pub extended: bool,
    /// Time since the last state change while retracted
    pub timer: f32,
    /// Retracted time before the next extension
    pub period: f32,
    pub extended_duration: f32,
    pub extended_remaining: f32,
    /// Fighters already hit during the current extension
    pub hit: HashSet<FighterId>,
}

/// A straight-line shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pub owner: FighterId,
    pub damage: i32,
}

/// A missile that steers toward a fighter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomingMissile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pub owner: FighterId,
    pub target: FighterId,
    pub speed: f32,
    pub damage: i32,
}

/// A short-lived melee hit zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeleeHitbox {
    pub id: u32,
    pub pos: Vec2,
    pub direction: Facing,
    pub lifetime: f32,
    pub owner: FighterId,
}

/// Chest rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChestReward {
    Heal,
    Missile,
    Gun,
    SpeedBoost,
}

impl ChestReward {
    pub const ALL: [ChestReward; 4] = [
        ChestReward::Heal,
        ChestReward::Missile,
        ChestReward::Gun,
        ChestReward::SpeedBoost,
    ];
}

/// A pickup chest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chest {
    pub id: u32,
    pub pos: Vec2,
    pub pickup_radius: f32,
    /// Seconds since spawn (drives bobbing in the renderer)
    pub age: f32,
}

/// Floating world-space text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub pos: Vec2,
    pub text: String,
    pub remaining: f32,
}

/// Discrete things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    FighterDied { victim: FighterId, victor: FighterId },
    LevelUp { fighter: FighterId, level: u32 },
    ChestOpened { fighter: FighterId, reward: ChestReward, description: String },
    ShotFired { fighter: FighterId },
    MissileLaunched { owner: FighterId, target: FighterId },
    RoundReset { round: u32 },
}

/// Arena extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub width: f32,
    pub ground_y: f32,
}

impl ArenaBounds {
    pub fn new(width: f32, ground_y: f32) -> Self {
        Self { width, ground_y }
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        (self.width * 0.5).round()
    }
}

/// The whole simulation
#[derive(Debug, Clone)]
pub struct World {
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub bounds: ArenaBounds,
    pub fighters: [Fighter; 2],
    pub platforms: Vec<Platform>,
    pub spikes: Vec<SpikeTrap>,
    pub bullets: Vec<Bullet>,
    pub missiles: Vec<HomingMissile>,
    pub hitboxes: Vec<MeleeHitbox>,
    pub chests: Vec<Chest>,
    pub popups: Vec<Popup>,
    pub chest_timer: f32,
    pub chest_interval: f32,
    pub round: RoundLifecycle,
    /// Simulated seconds since creation
    pub time: f64,
    /// Events raised by the most recent tick
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl World {
    /// Human fighter 1 against a normal fleeing bot, default tuning
    pub fn new(seed: u64, bounds: ArenaBounds) -> Self {
        let bot = Controller::Ai(AiProfile { difficulty: Difficulty::Normal, flees: true });
        Self::with_controllers(seed, bounds, Tuning::default(), [Controller::Human, bot])
    }

    pub fn with_controllers(
        seed: u64,
        bounds: ArenaBounds,
        tuning: Tuning,
        controllers: [Controller; 2],
    ) -> Self {
        let fighters = [
            Fighter::new(FighterId::One, controllers[0], &tuning.combat),
            Fighter::new(FighterId::Two, controllers[1], &tuning.combat),
        ];
        let mut world = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            bounds,
            fighters,
            platforms: Vec::new(),
            spikes: Vec::new(),
            bullets: Vec::new(),
            missiles: Vec::new(),
            hitboxes: Vec::new(),
            chests: Vec::new(),
            popups: Vec::new(),
            chest_timer: 0.0,
            chest_interval: 0.0,
            round: RoundLifecycle::default(),
            time: 0.0,
            events: Vec::new(),
            next_id: 1,
        };
        world.reset_round();
        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    #[inline]
    pub fn fighter(&self, id: FighterId) -> &Fighter {
        &self.fighters[id.index()]
    }

    #[inline]
    pub fn fighter_mut(&mut self, id: FighterId) -> &mut Fighter {
        &mut self.fighters[id.index()]
    }

    /// Spawn point for a fighter (hip position standing on the ground)
    pub fn spawn_point(&self, id: FighterId) -> Vec2 {
        let arena = &self.tuning.arena;
        let y = self.bounds.ground_y - self.tuning.physics.feet_offset;
        let x = match id {
            FighterId::One => arena.spawn_margin,
            FighterId::Two => arena
                .min_right_spawn_x
                .max((self.bounds.width - arena.spawn_margin).round()),
        };
        Vec2::new(x, y)
    }

    /// Queue a popup above a fighter
    pub fn popup_above(&mut self, id: FighterId, text: impl Into<String>) {
        let combat = &self.tuning.combat;
        let pos = self.fighters[id.index()].pos - Vec2::new(0.0, combat.popup_height);
        self.popups.push(Popup { pos, text: text.into(), remaining: combat.popup_lifetime });
    }

    /// Roll the delay before the next chest
    pub fn roll_chest_interval(&mut self) -> f32 {
        use rand::Rng;
        let combat = &self.tuning.combat;
        let (min, max) = (combat.chest_interval_min, combat.chest_interval_max);
        min + self.rng.random::<f32>() * (max - min)
    }

    /// Rebuild the round: fighters back to spawn at full health, transient
    /// entities cleared, arena regenerated, round guard released.
    pub fn reset_round(&mut self) {
        for id in FighterId::ALL {
            let spawn = self.spawn_point(id);
            self.fighters[id.index()].respawn(spawn);
        }

        self.hitboxes.clear();
        self.bullets.clear();
        self.missiles.clear();
        self.chests.clear();
        self.popups.clear();

        self.chest_timer = 0.0;
        self.chest_interval = self.roll_chest_interval();

        let fighter_positions = [self.fighters[0].pos, self.fighters[1].pos];
        self.platforms = super::arena::generate_platforms(
            &mut self.rng,
            self.bounds,
            fighter_positions,
            &self.tuning.arena,
        );
        self.spikes = super::arena::place_spikes(&mut self.rng, &self.platforms, &self.tuning.arena);

        self.round.release();
        log::info!(
            "Round {} ready: {} platforms, {} spikes",
            self.round.number,
            self.platforms.len(),
            self.spikes.len()
        );
    }
}
