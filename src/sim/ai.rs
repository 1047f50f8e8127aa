//! Bot controller
//!
//! Bots write the same [`Intent`] a keyboard would. Each tick a living bot
//! first spends any pending level-ups, then either flees (hurt, and set up
//! to flee) or pursues. Both modes plan over the platform graph from
//! [`pathfinding`](super::pathfinding) and fall back to direct movement when
//! no route exists.

use std::cmp::Ordering;

use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::platform_under;
use super::pathfinding::{self, Node, ReachLimits};
use super::progression;
use super::state::{ArenaBounds, Controller, Difficulty, Fighter, Platform, World};
use super::tick::Intent;
use crate::tuning::Tuning;
use crate::{Facing, FighterId};

/// Intent for a bot-controlled fighter, or `None` for humans and the dead
pub fn decide(world: &mut World, id: FighterId) -> Option<Intent> {
    let Controller::Ai(profile) = world.fighter(id).controller else {
        return None;
    };
    if !world.fighter(id).alive {
        return None;
    }

    let World { fighters, platforms, rng, tuning, bounds, .. } = world;
    progression::auto_resolve(&mut fighters[id.index()], &tuning.progression);

    let me = &fighters[id.index()];
    let other = &fighters[id.opponent().index()];
    if !other.alive {
        return Some(Intent::default());
    }

    let mut brain = Brain {
        me,
        other,
        platforms: platforms.as_slice(),
        bounds: *bounds,
        tuning: &*tuning,
        rng,
        intent: Intent::default(),
        facing: None,
    };
    let fleeing =
        profile.flees && (me.health as f32) < me.max_health() as f32 * tuning.ai.flee_health_fraction;
    if fleeing {
        brain.flee();
    } else {
        brain.pursue(profile.difficulty);
    }

    let (intent, facing) = (brain.intent, brain.facing);
    if let Some(facing) = facing {
        fighters[id.index()].facing = facing;
    }
    Some(intent)
}

/// Per-decision view of the world
struct Brain<'a> {
    me: &'a Fighter,
    other: &'a Fighter,
    platforms: &'a [Platform],
    bounds: ArenaBounds,
    tuning: &'a Tuning,
    rng: &'a mut Pcg32,
    intent: Intent,
    /// Turn to face before the attack resolves
    facing: Option<Facing>,
}

impl Brain<'_> {
    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Request a dash unless one was already requested or it can't start
    fn dash(&mut self, direction: Facing) {
        if self.intent.dash.is_none() && self.me.can_dash() {
            self.intent.dash = Some(direction);
        }
    }

    /// Press the attack button (it has to be released between presses)
    fn attack(&mut self) {
        if !self.me.shoot_held {
            self.intent.shoot = true;
        }
    }

    fn should_jump(&self, target_y: f32) -> bool {
        self.me.grounded && self.me.pos.y - target_y > self.tuning.ai.jump_rise_threshold
    }

    fn standing_on(&self, fighter: &Fighter, tolerance_y: f32) -> Option<usize> {
        let physics = &self.tuning.physics;
        platform_under(
            self.platforms,
            fighter.pos.x,
            fighter.feet_y(physics.feet_offset),
            physics.platform_edge_tolerance,
            tolerance_y,
        )
    }

    /// Next platform on the way from `start` to `goal`
    fn route(&self, start: Option<usize>, goal: usize) -> Option<Platform> {
        let limits = ReachLimits { reach: self.tuning.ai.jump_reach, max_climb: self.tuning.ai.max_climb };
        let start = start.map_or(Node::Ground, Node::Platform);
        let path =
            pathfinding::find_path(self.platforms, start, goal, self.me.pos.x, self.bounds.ground_y, limits)?;
        match pathfinding::next_step(&path, start)? {
            Node::Platform(i) => self.platforms.get(i).copied(),
            Node::Ground => None,
        }
    }

    /// Head for a platform centre; hop on once lined up
    fn approach(&mut self, center_x: f32, top_y: f32, walk_distance: f32) {
        let (me, tuning) = (self.me, self.tuning);
        let ai = &tuning.ai;
        let gap = (center_x - me.pos.x).abs();
        let toward = Facing::toward(me.pos.x, center_x);
        if gap > walk_distance {
            self.intent.walk(toward);
        } else {
            self.intent.stop();
        }
        if me.grounded {
            if let Some(distance) = ai.pursue_dash_distance {
                if gap > distance {
                    self.dash(toward);
                }
            }
            if gap < ai.jump_alignment_distance && self.should_jump(top_y) {
                self.intent.up = true;
            }
        }
    }

    fn flee(&mut self) {
        let (me, other, tuning) = (self.me, self.other, self.tuning);
        let ai = &tuning.ai;

        let mut away = if me.pos.x < other.pos.x { Facing::Left } else { Facing::Right };
        self.intent.walk(away);
        if me.grounded {
            self.dash(away);
        }

        let at_edge = match self.standing_on(me, ai.standing_tolerance_y) {
            Some(i) => {
                let platform = &self.platforms[i];
                match away {
                    Facing::Left => me.pos.x - platform.left() < ai.edge_margin,
                    Facing::Right => platform.right() - me.pos.x < ai.edge_margin,
                }
            }
            None => {
                let wall = tuning.physics.world_margin + ai.edge_margin;
                match away {
                    Facing::Left => me.pos.x < wall,
                    Facing::Right => me.pos.x > self.bounds.width - wall,
                }
            }
        };
        let distance = me.pos.distance(other.pos);

        // Swing back at a close pursuer
        if distance < ai.counter_punch_range && me.punch_active <= 0.0 && me.punch_cooldown <= 0.0 {
            self.facing = Some(Facing::toward(me.pos.x, other.pos.x));
            self.attack();
        }

        if at_edge {
            if distance < ai.cornered_dash_range
                && me.grounded
                && me.dash_cooldown <= 0.0
                && self.chance(ai.cornered_dash_chance as f64)
            {
                self.dash(Facing::toward(me.pos.x, other.pos.x));
            } else if distance < ai.reverse_flee_range {
                away = away.reversed();
                self.intent.walk(away);
                if me.grounded {
                    self.dash(away);
                }
            }
        }

        if self.parkour(away, distance) {
            return;
        }

        // No route: keep running, hop toward anything higher ahead
        if distance < ai.min_safe_distance {
            if me.grounded {
                self.dash(away);
            }
            let ahead = self.platforms.iter().find(|p| {
                let advance = (p.center_x() - me.pos.x) * away.sign();
                advance > ai.fallback_min_advance
                    && advance < ai.jump_reach
                    && (p.y - me.pos.y).abs() < ai.max_flee_height_delta
                    && me.pos.y - p.y > ai.fallback_min_rise
            });
            if let Some(platform) = ahead.copied() {
                if me.grounded && self.chance(ai.fallback_jump_chance as f64) && self.should_jump(platform.y) {
                    self.intent.up = true;
                }
            }
        }
    }

    /// Pick the best escape platform that has a route and head for it.
    /// Returns false if no candidate is reachable.
    fn parkour(&mut self, away: Facing, distance: f32) -> bool {
        let (me, other, tuning) = (self.me, self.other, self.tuning);
        let ai = &tuning.ai;
        let current_gap = (me.pos.x - other.pos.x).abs();

        let mut candidates: Vec<(usize, f32)> = self
            .platforms
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let center_x = p.center_x();
                let offset = center_x - me.pos.x;
                if offset * away.sign() <= ai.min_flee_advance
                    || offset.abs() > ai.jump_reach
                    || (p.y - me.pos.y).abs() > ai.max_flee_height_delta
                {
                    return None;
                }
                let gain = (center_x - other.pos.x).abs() - current_gap;
                if distance < ai.min_safe_distance && gain < ai.min_distance_gain {
                    return None;
                }
                let score = away.sign() * (center_x - other.pos.x) + gain.max(0.0)
                    - (p.y - me.pos.y).max(0.0) * ai.height_penalty;
                Some((i, score))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let start = self.standing_on(me, ai.standing_tolerance_y);
        for (goal, _) in candidates {
            let Some(step) = self.route(start, goal) else {
                continue;
            };
            let center_x = step.center_x();
            let toward = Facing::toward(me.pos.x, center_x);
            if (center_x - me.pos.x).abs() > ai.waypoint_walk_distance {
                self.intent.walk(toward);
            } else {
                self.intent.stop();
                if self.should_jump(step.y) {
                    self.intent.up = true;
                }
            }
            if me.grounded && me.dash_cooldown <= 0.0 && (me.pos.x - center_x).abs() > ai.waypoint_dash_distance {
                self.dash(toward);
            }
            log::trace!("Player {} fleeing toward platform {}", me.id.number(), goal);
            return true;
        }
        false
    }

    fn pursue(&mut self, difficulty: Difficulty) {
        let (me, other, tuning) = (self.me, self.other, self.tuning);
        let ai = &tuning.ai;
        let distance = (other.pos.x - me.pos.x).abs();
        let toward = Facing::toward(me.pos.x, other.pos.x);

        let Some(target) = self.standing_on(other, ai.target_standing_tolerance_y) else {
            // Opponent on the ground
            self.brawl(difficulty, distance, toward);
            return;
        };

        let platform = self.platforms[target];
        let center_x = platform.center_x();
        if (center_x - me.pos.x).abs() <= ai.jump_reach {
            self.approach(center_x, platform.y, ai.approach_stop_distance);
            return;
        }

        let start = self.standing_on(me, ai.standing_tolerance_y);
        match self.route(start, target) {
            Some(step) => self.approach(step.center_x(), step.y, ai.waypoint_walk_distance),
            None => {
                self.brawl(difficulty, distance, toward);
                if me.grounded && me.dash_cooldown <= 0.0 && distance > ai.fallback_dash_distance {
                    self.dash(toward);
                }
            }
        }
    }

    /// Close in on foot and roll the difficulty dice for hops, punches and dashes
    fn brawl(&mut self, difficulty: Difficulty, distance: f32, toward: Facing) {
        let (me, other, tuning) = (self.me, self.other, self.tuning);
        let ai = &tuning.ai;
        if distance > ai.approach_stop_distance {
            self.intent.walk(toward);
        }
        if me.grounded && self.chance(difficulty.jump_chance()) && self.should_jump(other.pos.y) {
            self.intent.up = true;
        }
        if distance < ai.punch_range
            && me.punch_active <= 0.0
            && me.punch_cooldown <= 0.0
            && self.chance(difficulty.attack_chance())
        {
            self.attack();
        }
        let dash_chance = difficulty.dash_chance();
        if dash_chance > 0.0 && me.can_dash() && self.chance(dash_chance) {
            self.dash(toward);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::AiProfile;
    use glam::Vec2;

    const BOUNDS: ArenaBounds = ArenaBounds { width: 1600.0, ground_y: 800.0 };
    const HIP_ON_GROUND: f32 = 754.0;

    /// Human fighter 1 against a bot; no platforms unless a test adds them
    fn bot_world(difficulty: Difficulty) -> World {
        let bot = Controller::Ai(AiProfile { difficulty, flees: true });
        let mut world = World::with_controllers(3, BOUNDS, Tuning::default(), [Controller::Human, bot]);
        world.platforms.clear();
        world.spikes.clear();
        world
    }

    fn place(world: &mut World, human_x: f32, bot_x: f32) {
        world.fighters[0].pos = Vec2::new(human_x, HIP_ON_GROUND);
        world.fighters[1].pos = Vec2::new(bot_x, HIP_ON_GROUND);
    }

    #[test]
    fn test_humans_get_no_intent() {
        let mut world = bot_world(Difficulty::Normal);
        assert_eq!(decide(&mut world, FighterId::One), None);
    }

    #[test]
    fn test_idle_when_opponent_dead() {
        let mut world = bot_world(Difficulty::Normal);
        world.fighters[0].alive = false;
        assert_eq!(decide(&mut world, FighterId::Two), Some(Intent::default()));
    }

    #[test]
    fn test_resolves_level_ups_first() {
        let mut world = bot_world(Difficulty::Normal);
        world.fighters[1].pending_level_ups = 2;
        world.fighters[1].health = 80;
        decide(&mut world, FighterId::Two);
        assert_eq!(world.fighters[1].pending_level_ups, 0);
        assert_eq!(world.fighters[1].bonus_damage, 2);
    }

    #[test]
    fn test_pursues_on_ground() {
        let mut world = bot_world(Difficulty::Easy);
        place(&mut world, 300.0, 1200.0);
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.left && !intent.right);
        assert!(!intent.shoot);
        // Easy bots never dash opportunistically
        assert_eq!(intent.dash, None);
    }

    #[test]
    fn test_jumps_onto_reachable_platform() {
        let mut world = bot_world(Difficulty::Normal);
        world.platforms = vec![Platform::new(500.0, 650.0, 100.0, 18.0)];
        world.fighters[0].pos = Vec2::new(550.0, 650.0 - 46.0);
        world.fighters[1].pos = Vec2::new(580.0, HIP_ON_GROUND);
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.up);
        assert!(!intent.left && !intent.right);
    }

    #[test]
    fn test_follows_route_to_far_platform() {
        let mut world = bot_world(Difficulty::Normal);
        world.platforms = vec![
            Platform::new(400.0, 650.0, 100.0, 18.0),
            Platform::new(700.0, 500.0, 100.0, 18.0),
            Platform::new(1000.0, 350.0, 100.0, 18.0),
        ];
        world.fighters[0].pos = Vec2::new(1050.0, 350.0 - 46.0);
        // Under the first step: hop up rather than walk toward the target
        world.fighters[1].pos = Vec2::new(430.0, HIP_ON_GROUND);
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.up);
        assert!(!intent.left && !intent.right);
        assert_eq!(intent.dash, None);
    }

    #[test]
    fn test_no_route_walks_and_dashes() {
        let mut world = bot_world(Difficulty::Normal);
        // Out of reach and far too high
        world.platforms = vec![Platform::new(1000.0, 200.0, 100.0, 18.0)];
        world.fighters[0].pos = Vec2::new(1050.0, 200.0 - 46.0);
        world.fighters[1].pos = Vec2::new(200.0, HIP_ON_GROUND);
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.right);
        assert_eq!(intent.dash, Some(Facing::Right));
    }

    #[test]
    fn test_hard_bot_dashes_at_ground_opponent() {
        let mut world = bot_world(Difficulty::Hard);
        place(&mut world, 300.0, 1200.0);
        let dashed = (0..500).any(|_| decide(&mut world, FighterId::Two).unwrap().dash == Some(Facing::Left));
        assert!(dashed);

        // Same spot, lower tier: the dice are never rolled
        let mut world = bot_world(Difficulty::Normal);
        place(&mut world, 300.0, 1200.0);
        assert!((0..500).all(|_| decide(&mut world, FighterId::Two).unwrap().dash.is_none()));
    }

    #[test]
    fn test_pursue_dash_distance_gates_platform_dash() {
        let setup = |dash_distance: Option<f32>| {
            let mut world = bot_world(Difficulty::Hard);
            world.tuning.ai.pursue_dash_distance = dash_distance;
            world.platforms = vec![Platform::new(500.0, 650.0, 100.0, 18.0)];
            world.fighters[0].pos = Vec2::new(550.0, 650.0 - 46.0);
            // 300px from the platform centre, inside jump reach
            world.fighters[1].pos = Vec2::new(850.0, HIP_ON_GROUND);
            world
        };

        let intent = decide(&mut setup(Some(200.0)), FighterId::Two).unwrap();
        assert!(intent.left);
        assert_eq!(intent.dash, Some(Facing::Left));

        let intent = decide(&mut setup(Some(400.0)), FighterId::Two).unwrap();
        assert!(intent.left);
        assert_eq!(intent.dash, None);

        let intent = decide(&mut setup(None), FighterId::Two).unwrap();
        assert_eq!(intent.dash, None);
    }

    #[test]
    fn test_no_route_still_rolls_jump_dice() {
        let mut world = bot_world(Difficulty::Hard);
        world.platforms = vec![Platform::new(1000.0, 200.0, 100.0, 18.0)];
        world.fighters[0].pos = Vec2::new(1050.0, 200.0 - 46.0);
        world.fighters[1].pos = Vec2::new(200.0, HIP_ON_GROUND);
        let hopped = (0..500).any(|_| decide(&mut world, FighterId::Two).unwrap().up);
        assert!(hopped);
    }

    #[test]
    fn test_hurt_bot_runs_away() {
        let mut world = bot_world(Difficulty::Normal);
        place(&mut world, 1000.0, 800.0);
        world.fighters[1].health = 30;
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.left && !intent.right);
        assert_eq!(intent.dash, Some(Facing::Left));
    }

    #[test]
    fn test_non_fleeing_bot_keeps_fighting() {
        let mut world = bot_world(Difficulty::Normal);
        world.fighters[1].controller = Controller::Ai(AiProfile { difficulty: Difficulty::Normal, flees: false });
        place(&mut world, 1000.0, 800.0);
        world.fighters[1].health = 30;
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.right);
    }

    #[test]
    fn test_cornered_bot_turns_around() {
        let mut world = bot_world(Difficulty::Normal);
        place(&mut world, 300.0, 40.0);
        world.fighters[1].health = 30;
        world.fighters[1].dash_cooldown = 0.3;
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.right && !intent.left);
        assert_eq!(intent.dash, None);
    }

    #[test]
    fn test_fleeing_bot_counter_punches() {
        let mut world = bot_world(Difficulty::Normal);
        place(&mut world, 760.0, 800.0);
        world.fighters[1].health = 30;
        world.fighters[1].facing = Facing::Right;
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.shoot);
        assert_eq!(world.fighters[1].facing, Facing::Left);
    }

    #[test]
    fn test_fleeing_bot_hops_to_escape_platform() {
        let mut world = bot_world(Difficulty::Normal);
        world.platforms = vec![Platform::new(670.0, 650.0, 100.0, 18.0)];
        place(&mut world, 1000.0, 800.0);
        world.fighters[1].health = 30;
        world.fighters[1].dash_cooldown = 0.3;
        let intent = decide(&mut world, FighterId::Two).unwrap();
        assert!(intent.up);
        assert!(!intent.left && !intent.right);
    }
}
