//! Per-tick orchestration
//!
//! One call advances the world by a clamped, wall-clock derived `dt`:
//! commands, AI intents, attack/dash actions, physics, combat, then kills,
//! progression and the round countdown. A fault check at the end rolls
//! fighters back to their pre-tick state if anything went non-finite.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ai;
use super::collision;
use super::combat::{self, Kill};
use super::progression::{self, LevelChoice};
use super::state::{
    ArenaBounds, Bullet, Chest, Fighter, GameEvent, HomingMissile, MeleeHitbox, Platform, Popup, SpikeTrap, World,
};
use crate::{Facing, FighterId};

/// Held controls for one fighter, whether from a keyboard or the bot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    /// Attack button; fires on the press, not while held
    pub shoot: bool,
    /// Dash request for this tick
    pub dash: Option<Facing>,
}

impl Intent {
    /// -1, 0 or +1
    #[inline]
    pub fn horizontal_axis(&self) -> f32 {
        (self.right as i32 - self.left as i32) as f32
    }

    /// Hold exactly one direction
    pub fn walk(&mut self, direction: Facing) {
        self.left = direction == Facing::Left;
        self.right = direction == Facing::Right;
    }

    pub fn stop(&mut self) {
        self.left = false;
        self.right = false;
    }
}

/// Discrete requests from outside the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Double-tap dash
    Dash { fighter: FighterId, direction: Facing },
    /// Spend a pending level-up
    LevelUp { fighter: FighterId, choice: LevelChoice },
    ToggleUnlimitedAmmo { fighter: FighterId },
    ToggleInventory { fighter: FighterId },
    /// Same effect as the automatic end-of-round reset
    ResetRound,
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Indexed by [`FighterId::index`]; ignored for bot-controlled fighters
    pub intents: [Intent; 2],
    pub commands: Vec<Command>,
}

/// Internal inconsistency detected after a tick
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimFault {
    #[error("player {fighter} has non-finite motion")]
    NonFiniteMotion { fighter: u8 },
    #[error("player {fighter} health {health} outside [0, {max}]")]
    HealthOutOfRange { fighter: u8, health: i32, max: i32 },
}

/// Check a fighter's persistent state
pub fn check_fighter(fighter: &Fighter) -> Result<(), SimFault> {
    if !(fighter.pos.is_finite() && fighter.vel.is_finite()) {
        return Err(SimFault::NonFiniteMotion { fighter: fighter.id.number() });
    }
    if fighter.health < 0 || fighter.health > fighter.max_health() {
        return Err(SimFault::HealthOutOfRange {
            fighter: fighter.id.number(),
            health: fighter.health,
            max: fighter.max_health(),
        });
    }
    Ok(())
}

/// Advance the world by `dt` seconds
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    let dt = if dt.is_finite() { dt.clamp(0.0, world.tuning.physics.max_dt) } else { 0.0 };
    world.events.clear();
    world.time += dt as f64;
    let checkpoint = world.fighters.clone();

    for command in &input.commands {
        apply_command(world, *command);
    }

    // Bots overwrite their slot; an open inventory blocks everything
    let mut intents = input.intents;
    for id in FighterId::ALL {
        if let Some(intent) = ai::decide(world, id) {
            intents[id.index()] = intent;
        }
        if world.fighter(id).inventory_open {
            intents[id.index()] = Intent::default();
        }
    }

    for id in FighterId::ALL {
        let intent = intents[id.index()];
        if let Some(direction) = intent.dash {
            start_dash(world, id, direction);
        }
        let pressed = intent.shoot && !world.fighter(id).shoot_held;
        world.fighter_mut(id).shoot_held = intent.shoot;
        if pressed {
            combat::try_attack(world, id);
        }
    }

    {
        let World { fighters, platforms, bounds, tuning, .. } = world;
        for fighter in fighters.iter_mut() {
            let intent = intents[fighter.id.index()];
            collision::step_fighter(fighter, &intent, platforms, *bounds, &tuning.physics, dt);
            fighter.tick_effects(dt);
        }
    }

    let mut kills = Vec::new();
    combat::update_spikes(world, dt, &mut kills);
    combat::update_hitboxes(world, dt, &mut kills);
    combat::update_bullets(world, dt, &mut kills);
    combat::update_missiles(world, dt, &mut kills);
    combat::update_chests(world, dt);
    combat::update_popups(world, dt);

    resolve_kills(world, &kills);

    if world.round.tick(dt) {
        world.reset_round();
        world.events.push(GameEvent::RoundReset { round: world.round.number });
    }

    let fault = world.fighters.iter().map(check_fighter).find_map(Result::err);
    if let Some(fault) = fault {
        log::warn!("Contained simulation fault: {}; fighters rolled back", fault);
        world.fighters = checkpoint;
        world.bullets.retain(|b| b.pos.is_finite() && b.vel.is_finite());
        world.missiles.retain(|m| m.pos.is_finite() && m.vel.is_finite());
    }
}

fn apply_command(world: &mut World, command: Command) {
    match command {
        Command::Dash { fighter, direction } => {
            start_dash(world, fighter, direction);
        }
        Command::LevelUp { fighter, choice } => {
            let World { fighters, tuning, .. } = world;
            progression::apply_level_choice(&mut fighters[fighter.index()], choice, &tuning.progression);
        }
        Command::ToggleUnlimitedAmmo { fighter } => combat::toggle_unlimited_ammo(world, fighter),
        Command::ToggleInventory { fighter } => {
            let f = world.fighter_mut(fighter);
            f.inventory_open = !f.inventory_open;
        }
        Command::ResetRound => {
            log::info!("Manual round reset");
            world.reset_round();
            world.events.push(GameEvent::RoundReset { round: world.round.number });
        }
    }
}

fn start_dash(world: &mut World, id: FighterId, direction: Facing) {
    let physics = &world.tuning.physics;
    let fighter = &mut world.fighters[id.index()];
    if !fighter.start_dash(direction, physics.dash_duration, physics.dash_cooldown, physics.dash_speed) {
        log::debug!("Player {} dash rejected (cooldown {:.2})", id.number(), fighter.dash_cooldown);
    }
}

/// Credit kills: XP for the victor, a death event, and the round countdown
fn resolve_kills(world: &mut World, kills: &[Kill]) {
    let World { fighters, tuning, events, round, .. } = world;
    for kill in kills {
        events.push(GameEvent::FighterDied { victim: kill.victim, victor: kill.victor });
        let victor = &mut fighters[kill.victor.index()];
        progression::award_xp(victor, tuning.progression.xp_per_kill, &tuning.progression, events);
        if round.arm(kill.victor, tuning.progression.round_reset_delay) {
            log::info!("Round {} won by player {}", round.number, kill.victor.number());
        }
    }
}

/// Read-only view handed to presentation
#[derive(Debug, Serialize)]
pub struct WorldSnapshot<'a> {
    pub round: u32,
    pub time: f64,
    pub bounds: ArenaBounds,
    pub reset_pending: bool,
    pub fighters: &'a [Fighter; 2],
    pub platforms: &'a [Platform],
    pub spikes: &'a [SpikeTrap],
    pub bullets: &'a [Bullet],
    pub missiles: &'a [HomingMissile],
    pub hitboxes: &'a [MeleeHitbox],
    pub chests: &'a [Chest],
    pub popups: &'a [Popup],
}

impl World {
    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            round: self.round.number,
            time: self.time,
            bounds: self.bounds,
            reset_pending: self.round.is_armed(),
            fighters: &self.fighters,
            platforms: &self.platforms,
            spikes: &self.spikes,
            bullets: &self.bullets,
            missiles: &self.missiles,
            hitboxes: &self.hitboxes,
            chests: &self.chests,
            popups: &self.popups,
        }
    }

    /// Drain the events raised by the last tick
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::{AiProfile, Controller, Difficulty};
    use crate::tuning::Tuning;
    use glam::Vec2;
    use proptest::prelude::*;

    const BOUNDS: ArenaBounds = ArenaBounds { width: 1600.0, ground_y: 800.0 };

    fn humans(seed: u64) -> World {
        World::with_controllers(seed, BOUNDS, Tuning::default(), [Controller::Human, Controller::Human])
    }

    fn bots(seed: u64, difficulty: Difficulty) -> World {
        let bot = Controller::Ai(AiProfile { difficulty, flees: true });
        World::with_controllers(seed, BOUNDS, Tuning::default(), [bot, bot])
    }

    /// Bare arena with the fighters `gap` apart on the ground
    fn face_off(gap: f32) -> World {
        let mut world = humans(12345);
        world.platforms.clear();
        world.spikes.clear();
        let y = BOUNDS.ground_y - world.tuning.physics.feet_offset;
        world.fighters[0].pos = Vec2::new(600.0, y);
        world.fighters[1].pos = Vec2::new(600.0 + gap, y);
        world
    }

    fn shoot(id: FighterId) -> TickInput {
        let mut input = TickInput::default();
        input.intents[id.index()].shoot = true;
        input
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut world = face_off(400.0);
        tick(&mut world, &TickInput::default(), 1.0);
        assert!((world.time - 0.05).abs() < 1e-9);
        tick(&mut world, &TickInput::default(), f32::NAN);
        tick(&mut world, &TickInput::default(), -1.0);
        assert!((world.time - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_punch_kill_scores_once_and_resets() {
        let mut world = face_off(40.0);
        world.fighters[1].health = 10;

        tick(&mut world, &shoot(FighterId::One), SIM_DT);
        assert!(!world.fighters[1].alive);
        assert_eq!(world.fighters[1].health, 0);
        assert_eq!(world.fighters[0].level, 2);
        assert_eq!(world.fighters[0].pending_level_ups, 1);
        assert!(world.round.is_armed());
        assert_eq!(
            world.events,
            vec![
                GameEvent::FighterDied { victim: FighterId::Two, victor: FighterId::One },
                GameEvent::LevelUp { fighter: FighterId::One, level: 2 },
            ]
        );

        // Keep swinging at the body; nothing more is credited
        for i in 0..40 {
            let input = if i % 2 == 0 { shoot(FighterId::One) } else { TickInput::default() };
            tick(&mut world, &input, SIM_DT);
            assert!(!world.events.iter().any(|e| matches!(e, GameEvent::FighterDied { .. })));
        }
        assert_eq!(world.fighters[0].level, 2);
        assert_eq!(world.round.winner, Some(FighterId::One));

        // 1.1s after the kill the round resets
        let mut reset = false;
        for _ in 0..60 {
            tick(&mut world, &TickInput::default(), SIM_DT);
            if world.events.contains(&GameEvent::RoundReset { round: 2 }) {
                reset = true;
                break;
            }
        }
        assert!(reset);
        assert!(world.fighters[1].alive);
        assert_eq!(world.fighters[1].health, 100);
        assert!(!world.round.is_armed());
        // Progression survives the reset
        assert_eq!(world.fighters[0].level, 2);
    }

    #[test]
    fn test_holding_shoot_attacks_once() {
        let mut world = face_off(400.0);
        world.fighters[0].ammo = crate::sim::state::Ammo::Finite(5);
        for _ in 0..10 {
            tick(&mut world, &shoot(FighterId::One), SIM_DT);
        }
        assert_eq!(world.bullets.len(), 1);
        assert_eq!(world.fighters[0].ammo, crate::sim::state::Ammo::Finite(4));
    }

    #[test]
    fn test_level_up_command() {
        let mut world = face_off(400.0);
        let input = TickInput {
            commands: vec![Command::LevelUp { fighter: FighterId::One, choice: LevelChoice::Hp }],
            ..Default::default()
        };
        // Nothing pending: no-op
        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.fighters[0].bonus_hp, 0);

        world.fighters[0].pending_level_ups = 1;
        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.fighters[0].bonus_hp, 10);
        assert_eq!(world.fighters[0].max_health(), 110);
        assert_eq!(world.fighters[0].pending_level_ups, 0);
    }

    #[test]
    fn test_inventory_blocks_input() {
        let mut world = face_off(400.0);
        let x = world.fighters[0].pos.x;
        let mut input = TickInput {
            commands: vec![Command::ToggleInventory { fighter: FighterId::One }],
            ..Default::default()
        };
        input.intents[0].right = true;
        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.fighters[0].pos.x, x);

        input.commands = vec![Command::ToggleInventory { fighter: FighterId::One }];
        tick(&mut world, &input, SIM_DT);
        assert!(world.fighters[0].pos.x > x);
    }

    #[test]
    fn test_dash_command() {
        let mut world = face_off(400.0);
        let input = TickInput {
            commands: vec![Command::Dash { fighter: FighterId::One, direction: Facing::Left }],
            ..Default::default()
        };
        tick(&mut world, &input, SIM_DT);
        assert!(world.fighters[0].is_dashing());
        assert_eq!(world.fighters[0].vel.x, -world.tuning.physics.dash_speed);
        // Second request during cooldown is dropped
        let cooldown = world.fighters[0].dash_cooldown;
        tick(&mut world, &input, SIM_DT);
        assert!(world.fighters[0].dash_cooldown < cooldown);
    }

    #[test]
    fn test_manual_reset() {
        let mut world = face_off(400.0);
        world.fighters[0].health = 40;
        world.round.arm(FighterId::Two, 5.0);
        let input = TickInput { commands: vec![Command::ResetRound], ..Default::default() };
        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.round.number, 2);
        assert!(!world.round.is_armed());
        assert_eq!(world.fighters[0].health, 100);
        assert!(world.events.contains(&GameEvent::RoundReset { round: 2 }));
    }

    #[test]
    fn test_fault_rolls_back_fighters() {
        let mut world = face_off(400.0);
        let before = world.fighters.clone();
        world.tuning.physics.gravity = f32::NAN;
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.fighters, before);

        // Next tick runs normally once the cause is gone
        world.tuning.physics.gravity = 700.0;
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert!(world.fighters.iter().all(|f| check_fighter(f).is_ok()));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut world = face_off(400.0);
        tick(&mut world, &TickInput::default(), SIM_DT);
        let json = serde_json::to_string(&world.snapshot()).unwrap();
        assert!(json.contains("\"fighters\""));
        assert!(json.contains("\"round\":1"));
        assert!(world.take_events().is_empty());
    }

    #[test]
    fn test_determinism() {
        // Two bot matches with the same seed play out identically
        let mut world1 = bots(99999, Difficulty::Hard);
        let mut world2 = bots(99999, Difficulty::Hard);
        for _ in 0..900 {
            tick(&mut world1, &TickInput::default(), SIM_DT);
            tick(&mut world2, &TickInput::default(), SIM_DT);
        }
        assert_eq!(world1.fighters, world2.fighters);
        assert_eq!(world1.platforms, world2.platforms);
        assert_eq!(world1.round.number, world2.round.number);
    }

    fn arb_intent() -> impl Strategy<Value = Intent> {
        (any::<[bool; 4]>(), 0u8..3).prop_map(|([left, right, up, shoot], dash)| Intent {
            left,
            right,
            up,
            shoot,
            dash: match dash {
                1 => Some(Facing::Left),
                2 => Some(Facing::Right),
                _ => None,
            },
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn health_stays_in_bounds(
            seed in 0u64..1000,
            steps in prop::collection::vec((arb_intent(), arb_intent(), 0.0f32..0.08), 1..300),
        ) {
            let mut world = humans(seed);
            world.fighters[0].ammo = crate::sim::state::Ammo::Finite(6);
            for (a, b, dt) in steps {
                let input = TickInput { intents: [a, b], commands: Vec::new() };
                tick(&mut world, &input, dt);
                for f in &world.fighters {
                    prop_assert!(f.health >= 0 && f.health <= f.max_health());
                    prop_assert!(f.dash_cooldown >= 0.0 && f.punch_cooldown >= 0.0);
                    prop_assert!(f.pos.x >= 20.0 && f.pos.x <= BOUNDS.width - 20.0);
                    prop_assert!(f.feet_y(world.tuning.physics.feet_offset) <= BOUNDS.ground_y + 1e-3);
                }
            }
        }

        #[test]
        fn bot_matches_stay_consistent(seed in 0u64..1000) {
            let mut world = bots(seed, Difficulty::Normal);
            for _ in 0..600 {
                tick(&mut world, &TickInput::default(), SIM_DT);
                for f in &world.fighters {
                    prop_assert!(check_fighter(f).is_ok());
                }
            }
        }
    }
}
