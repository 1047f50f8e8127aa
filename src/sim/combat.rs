//! Combat resolution: melee, projectiles, spike traps, chests and popups
//!
//! Every damage source funnels through [`strike`], which clamps health and
//! records a [`Kill`] only on the hit that takes a fighter to zero. The tick
//! turns kills into XP and the round-end countdown afterwards.

use glam::Vec2;
use rand::Rng;

use super::arena::roll;
use super::collision::within_radius;
use super::state::{
    Ammo, Bullet, Chest, ChestReward, Fighter, GameEvent, GunCount, HomingMissile, MeleeHitbox, World,
};
use crate::FighterId;

/// A fighter brought to zero health this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    pub victim: FighterId,
    /// The opponent, credited whatever the damage source
    pub victor: FighterId,
}

/// Apply damage to a fighter; dead fighters are left untouched
fn strike(fighters: &mut [Fighter; 2], victim: FighterId, amount: i32, kills: &mut Vec<Kill>) {
    if fighters[victim.index()].take_damage(amount) {
        log::info!("Player {} was knocked out", victim.number());
        kills.push(Kill { victim, victor: victim.opponent() });
    }
}

/// Attack button pressed: fire if holding ammo, otherwise punch
pub fn try_attack(world: &mut World, id: FighterId) -> bool {
    let fighter = world.fighter(id);
    if !fighter.alive || fighter.punch_cooldown > 0.0 {
        log::debug!("Player {} attack ignored (cooldown {:.2})", id.number(), fighter.punch_cooldown);
        return false;
    }
    if fighter.ammo.has_rounds() {
        return fire_bullet(world, id);
    }

    let combat = &world.tuning.combat;
    let (lifetime, cooldown, reach, height) =
        (combat.punch_lifetime, combat.punch_cooldown, combat.punch_reach, combat.punch_height);
    let hitbox_id = world.next_entity_id();
    let fighter = world.fighter_mut(id);
    let direction = fighter.facing;
    let pos = Vec2::new(fighter.pos.x + direction.sign() * reach, fighter.pos.y - height);
    fighter.punch_active = lifetime;
    fighter.punch_cooldown = cooldown;
    world.hitboxes.push(MeleeHitbox { id: hitbox_id, pos, direction, lifetime, owner: id });
    true
}

/// Spend one round and spawn a bullet in the facing direction
pub fn fire_bullet(world: &mut World, id: FighterId) -> bool {
    let bullet_id = world.next_entity_id();
    let combat = &world.tuning.combat;
    let fighter = &mut world.fighters[id.index()];
    if !fighter.alive || !fighter.ammo.consume() {
        log::debug!("Player {} has no ammo", id.number());
        return false;
    }
    fighter.guns = fighter.ammo.gun_count();

    let sign = fighter.facing.sign();
    world.bullets.push(Bullet {
        id: bullet_id,
        pos: Vec2::new(fighter.pos.x + sign * combat.bullet_muzzle_x, fighter.pos.y - combat.bullet_muzzle_y),
        vel: Vec2::new(sign * combat.bullet_speed, 0.0),
        lifetime: combat.bullet_lifetime,
        owner: id,
        damage: combat.bullet_damage,
    });
    world.events.push(GameEvent::ShotFired { fighter: id });
    true
}

/// Launch a homing missile from `owner` at `target`; both must be alive
pub fn launch_missile(world: &mut World, owner: FighterId, target: FighterId) -> bool {
    if owner == target || !world.fighter(owner).alive || !world.fighter(target).alive {
        return false;
    }
    let missile_id = world.next_entity_id();
    let combat = &world.tuning.combat;
    let from = world.fighter(owner).pos;
    world.missiles.push(HomingMissile {
        id: missile_id,
        pos: Vec2::new(from.x, from.y - combat.missile_launch_height),
        vel: Vec2::ZERO,
        lifetime: combat.missile_lifetime,
        owner,
        target,
        speed: combat.missile_speed,
        damage: combat.missile_damage,
    });
    world.events.push(GameEvent::MissileLaunched { owner, target });
    true
}

/// Advance spike cycles and hit fighters standing on extended spikes
pub fn update_spikes(world: &mut World, dt: f32, kills: &mut Vec<Kill>) {
    let World { spikes, platforms, fighters, rng, tuning, .. } = world;
    let (arena, combat, feet_offset) = (&tuning.arena, &tuning.combat, tuning.physics.feet_offset);

    for spike in spikes.iter_mut() {
        spike.timer += dt;
        if !spike.extended && spike.timer >= spike.period {
            spike.extended = true;
            spike.extended_remaining = spike.extended_duration;
            spike.timer = 0.0;
            spike.hit.clear();
        }
        if !spike.extended {
            continue;
        }
        spike.extended_remaining -= dt;
        if spike.extended_remaining <= 0.0 {
            spike.extended = false;
            spike.extended_remaining = 0.0;
            spike.timer = 0.0;
            spike.period = roll(rng, arena.spike_period_min, arena.spike_period_max);
            spike.extended_duration = roll(rng, arena.spike_extended_min, arena.spike_extended_max);
            continue;
        }

        // Index from an earlier round
        let Some(platform) = platforms.get(spike.platform) else {
            continue;
        };
        for id in FighterId::ALL {
            let fighter = &fighters[id.index()];
            if !fighter.alive || spike.hit.contains(&id) {
                continue;
            }
            let feet = fighter.feet_y(feet_offset);
            let in_x = platform.spans_x(fighter.pos.x, combat.spike_zone_pad_x);
            let in_y = feet >= platform.y - combat.spike_zone_pad_y && feet <= platform.bottom();
            if in_x && in_y {
                spike.hit.insert(id);
                strike(fighters, id, combat.spike_damage, kills);
            }
        }
    }
}

/// Age melee hitboxes and resolve their single hit
pub fn update_hitboxes(world: &mut World, dt: f32, kills: &mut Vec<Kill>) {
    let World { hitboxes, fighters, tuning, .. } = world;
    let combat = &tuning.combat;

    hitboxes.retain_mut(|hitbox| {
        hitbox.lifetime -= dt;
        let target = hitbox.owner.opponent();
        let victim = &fighters[target.index()];
        let hit = victim.alive
            && within_radius(hitbox.pos, victim.hit_center(combat.target_vertical_offset), combat.punch_hit_radius);
        if hit {
            let damage = fighters[hitbox.owner.index()].damage();
            strike(fighters, target, damage, kills);
        }
        if hit || hitbox.lifetime <= 0.0 {
            fighters[hitbox.owner.index()].punch_active = 0.0;
            return false;
        }
        true
    });
}

/// Move bullets and resolve hits
pub fn update_bullets(world: &mut World, dt: f32, kills: &mut Vec<Kill>) {
    let World { bullets, fighters, tuning, .. } = world;
    let combat = &tuning.combat;

    bullets.retain_mut(|bullet| {
        bullet.lifetime -= dt;
        if bullet.lifetime <= 0.0 {
            return false;
        }
        bullet.pos += bullet.vel * dt;
        let target = bullet.owner.opponent();
        let victim = &fighters[target.index()];
        if victim.alive
            && within_radius(bullet.pos, victim.hit_center(combat.target_vertical_offset), combat.bullet_hit_radius)
        {
            strike(fighters, target, bullet.damage, kills);
            return false;
        }
        true
    });
}

/// Steer missiles toward their targets and resolve hits
pub fn update_missiles(world: &mut World, dt: f32, kills: &mut Vec<Kill>) {
    let World { missiles, fighters, tuning, .. } = world;
    let combat = &tuning.combat;
    let blend = (dt * combat.missile_steer_rate).min(1.0);

    missiles.retain_mut(|missile| {
        missile.lifetime -= dt;
        if missile.lifetime <= 0.0 {
            return false;
        }
        let target = &fighters[missile.target.index()];
        if !target.alive {
            return false;
        }
        let aim = target.hit_center(combat.target_vertical_offset);
        let to_target = aim - missile.pos;
        let direction = if to_target.length_squared() > 0.0 { to_target.normalize() } else { Vec2::ZERO };
        missile.vel += (direction * missile.speed - missile.vel) * blend;
        missile.pos += missile.vel * dt;

        if within_radius(missile.pos, aim, combat.missile_hit_radius) {
            strike(fighters, missile.target, missile.damage, kills);
            return false;
        }
        true
    });
}

/// Spawn chests on their timer, age them, and open any a fighter reaches
pub fn update_chests(world: &mut World, dt: f32) {
    world.chest_timer += dt;
    if world.chest_timer >= world.chest_interval {
        world.chest_timer = 0.0;
        spawn_chest(world);
        world.chest_interval = world.roll_chest_interval();
    }

    let offset = world.tuning.combat.target_vertical_offset;
    let mut opened = Vec::new();
    world.chests.retain_mut(|chest| {
        chest.age += dt;
        // Fighter 1 wins ties, matching fighter order everywhere else
        let claimant = world.fighters.iter().find(|f| {
            f.alive && within_radius(f.hit_center(offset), chest.pos, chest.pickup_radius)
        });
        match claimant {
            Some(fighter) => {
                opened.push(fighter.id);
                false
            }
            None => true,
        }
    });

    // Apply after the retain to avoid borrowing chests and fighters together
    for id in opened {
        let reward = ChestReward::ALL[world.rng.random_range(0..ChestReward::ALL.len())];
        open_chest(world, id, reward);
    }
}

/// Place a chest on a random platform, or on the ground at the left spawn
pub fn spawn_chest(world: &mut World) {
    let feet = world.tuning.physics.feet_offset;
    let chance = world.tuning.combat.chest_platform_chance;
    let mut pos = Vec2::new(world.tuning.arena.spawn_margin, world.bounds.ground_y - feet);
    if !world.platforms.is_empty() {
        let pick = world.rng.random_range(0..world.platforms.len());
        if world.rng.random::<f32>() < chance {
            let platform = world.platforms[pick];
            pos = Vec2::new(platform.center_x(), platform.y - feet);
        }
    }
    let id = world.next_entity_id();
    world.chests.push(Chest { id, pos, pickup_radius: world.tuning.combat.chest_pickup_radius, age: 0.0 });
    log::debug!("Chest {} spawned at ({:.0}, {:.0})", id, pos.x, pos.y);
}

/// Grant a chest reward to a fighter
pub fn open_chest(world: &mut World, id: FighterId, reward: ChestReward) {
    if !world.fighter(id).alive {
        return;
    }
    let combat = world.tuning.combat.clone();
    let description = match reward {
        ChestReward::Heal => {
            world.fighter_mut(id).heal(combat.chest_heal);
            format!("Healed +{} HP", combat.chest_heal)
        }
        ChestReward::Missile => {
            launch_missile(world, id, id.opponent());
            "Launched homing missile!".to_string()
        }
        ChestReward::Gun => {
            let fighter = world.fighter_mut(id);
            fighter.ammo.add(combat.chest_ammo);
            fighter.guns.increment();
            format!("Picked up Gun (+{} ammo)", combat.chest_ammo)
        }
        ChestReward::SpeedBoost => {
            world
                .fighter_mut(id)
                .apply_speed_boost(combat.speed_boost_multiplier, combat.speed_boost_duration);
            format!("Speed x{} ({}s)", combat.speed_boost_multiplier, combat.speed_boost_duration)
        }
    };
    log::debug!("Player {} opened a chest: {}", id.number(), description);
    world.popup_above(id, description.clone());
    world.events.push(GameEvent::ChestOpened { fighter: id, reward, description });
}

/// Float popups upward and drop expired ones
pub fn update_popups(world: &mut World, dt: f32) {
    let rise = world.tuning.combat.popup_rise_speed;
    world.popups.retain_mut(|popup| {
        popup.remaining -= dt;
        popup.pos.y -= rise * dt;
        popup.remaining > 0.0
    });
}

/// Flip between unlimited and empty ammo
pub fn toggle_unlimited_ammo(world: &mut World, id: FighterId) {
    let fighter = world.fighter_mut(id);
    let unlimited = fighter.ammo != Ammo::Unlimited;
    fighter.ammo = if unlimited { Ammo::Unlimited } else { Ammo::Finite(0) };
    fighter.guns = if unlimited { GunCount::Unlimited } else { GunCount::Count(0) };
    let text = if unlimited { "Infinite Ammo ON" } else { "Infinite Ammo OFF" };
    world.popup_above(id, text);
}
