//! Game balance parameters
//!
//! Every numeric constant the simulation uses lives here so it can be
//! overridden from a JSON file. Sections default individually, so a file
//! only needs the fields it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors from loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Movement and collision parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub max_dt: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub feet_offset: f32,
    pub head_offset: f32,
    pub body_half_width: f32,
    pub platform_edge_tolerance: f32,
    pub side_block_margin: f32,
    pub world_margin: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            max_dt: MAX_DT,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            feet_offset: FEET_OFFSET,
            head_offset: HEAD_OFFSET,
            body_half_width: BODY_HALF_WIDTH,
            platform_edge_tolerance: PLATFORM_EDGE_TOLERANCE,
            side_block_margin: SIDE_BLOCK_MARGIN,
            world_margin: WORLD_MARGIN,
            dash_speed: DASH_SPEED,
            dash_duration: DASH_DURATION,
            dash_cooldown: DASH_COOLDOWN,
        }
    }
}

/// Weapons, traps and pickups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub base_hp: i32,
    pub base_damage: i32,
    pub base_speed: f32,
    pub target_vertical_offset: f32,

    pub punch_lifetime: f32,
    pub punch_cooldown: f32,
    pub punch_reach: f32,
    pub punch_height: f32,
    pub punch_hit_radius: f32,

    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
    pub bullet_damage: i32,
    pub bullet_hit_radius: f32,
    pub bullet_muzzle_x: f32,
    pub bullet_muzzle_y: f32,

    pub missile_speed: f32,
    pub missile_lifetime: f32,
    pub missile_damage: i32,
    pub missile_hit_radius: f32,
    pub missile_steer_rate: f32,
    pub missile_launch_height: f32,

    pub spike_damage: i32,
    pub spike_zone_pad_x: f32,
    pub spike_zone_pad_y: f32,

    pub chest_interval_min: f32,
    pub chest_interval_max: f32,
    pub chest_platform_chance: f32,
    pub chest_pickup_radius: f32,
    pub chest_heal: i32,
    pub chest_ammo: u32,
    pub speed_boost_multiplier: f32,
    pub speed_boost_duration: f32,

    pub popup_lifetime: f32,
    pub popup_rise_speed: f32,
    pub popup_height: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            base_hp: BASE_HP,
            base_damage: BASE_DAMAGE,
            base_speed: BASE_SPEED,
            target_vertical_offset: TARGET_VERTICAL_OFFSET,

            punch_lifetime: PUNCH_LIFETIME,
            punch_cooldown: PUNCH_COOLDOWN,
            punch_reach: PUNCH_REACH,
            punch_height: PUNCH_HEIGHT,
            punch_hit_radius: PUNCH_HIT_RADIUS,

            bullet_speed: BULLET_SPEED,
            bullet_lifetime: BULLET_LIFETIME,
            bullet_damage: BULLET_DAMAGE,
            bullet_hit_radius: BULLET_HIT_RADIUS,
            bullet_muzzle_x: BULLET_MUZZLE_X,
            bullet_muzzle_y: BULLET_MUZZLE_Y,

            missile_speed: MISSILE_SPEED,
            missile_lifetime: MISSILE_LIFETIME,
            missile_damage: MISSILE_DAMAGE,
            missile_hit_radius: MISSILE_HIT_RADIUS,
            missile_steer_rate: MISSILE_STEER_RATE,
            missile_launch_height: MISSILE_LAUNCH_HEIGHT,

            spike_damage: SPIKE_DAMAGE,
            spike_zone_pad_x: SPIKE_ZONE_PAD_X,
            spike_zone_pad_y: SPIKE_ZONE_PAD_Y,

            chest_interval_min: CHEST_INTERVAL_MIN,
            chest_interval_max: CHEST_INTERVAL_MAX,
            chest_platform_chance: CHEST_PLATFORM_CHANCE,
            chest_pickup_radius: CHEST_PICKUP_RADIUS,
            chest_heal: CHEST_HEAL,
            chest_ammo: CHEST_AMMO,
            speed_boost_multiplier: SPEED_BOOST_MULTIPLIER,
            speed_boost_duration: SPEED_BOOST_DURATION,

            popup_lifetime: POPUP_LIFETIME,
            popup_rise_speed: POPUP_RISE_SPEED,
            popup_height: POPUP_HEIGHT,
        }
    }
}

/// Experience, levels and the round reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub xp_per_kill: u32,
    /// XP needed for the next level is `level * level_threshold_multiplier`
    pub level_threshold_multiplier: u32,
    pub level_hp_bonus: i32,
    pub level_hp_heal: i32,
    pub level_damage_bonus: i32,
    pub round_reset_delay: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            xp_per_kill: XP_PER_KILL,
            level_threshold_multiplier: LEVEL_THRESHOLD_MULTIPLIER,
            level_hp_bonus: LEVEL_HP_BONUS,
            level_hp_heal: LEVEL_HP_HEAL,
            level_damage_bonus: LEVEL_DAMAGE_BONUS,
            round_reset_delay: ROUND_RESET_DELAY,
        }
    }
}

/// Procedural platform layout and spike placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub platform_target: usize,
    pub platform_height: f32,
    pub platform_attempts: u32,
    pub platform_min_width: f32,
    pub platform_width_range: f32,
    pub edge_inset: f32,
    pub low_band_offset: f32,
    pub height_bias_exponent: f32,
    pub min_vertical_span: f32,
    pub vertical_span_inset: f32,
    pub min_platform_y: f32,
    pub buffer_x: f32,
    pub buffer_y: f32,
    pub fighter_safe_x: f32,
    pub fighter_safe_y: f32,

    pub repair_attempts: u32,
    pub min_visible_platforms: usize,
    pub visible_range: f32,
    pub repair_min_width: f32,
    pub repair_width_range: f32,
    pub repair_min_rise: f32,
    pub repair_rise_range: f32,
    pub repair_buffer_x: f32,
    pub repair_buffer_y: f32,

    pub top_limit: f32,
    pub pillar_width: f32,
    pub pillar_height: f32,

    pub spike_chance: f32,
    pub spike_spacing: f32,
    pub spike_max_per_platform: usize,
    pub spike_period_min: f32,
    pub spike_period_max: f32,
    pub spike_extended_min: f32,
    pub spike_extended_max: f32,
    pub spike_height: f32,

    pub spawn_margin: f32,
    pub min_right_spawn_x: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            platform_target: PLATFORM_TARGET,
            platform_height: PLATFORM_HEIGHT,
            platform_attempts: PLATFORM_ATTEMPTS,
            platform_min_width: 100.0,
            platform_width_range: 90.0,
            edge_inset: 40.0,
            low_band_offset: 60.0,
            height_bias_exponent: 1.2,
            min_vertical_span: 120.0,
            vertical_span_inset: 220.0,
            min_platform_y: MIN_PLATFORM_Y,
            buffer_x: 80.0,
            buffer_y: 120.0,
            fighter_safe_x: 180.0,
            fighter_safe_y: 160.0,

            repair_attempts: REPAIR_ATTEMPTS,
            min_visible_platforms: MIN_VISIBLE_PLATFORMS,
            visible_range: VISIBLE_RANGE,
            repair_min_width: 120.0,
            repair_width_range: 60.0,
            repair_min_rise: 40.0,
            repair_rise_range: 260.0,
            repair_buffer_x: 60.0,
            repair_buffer_y: 100.0,

            top_limit: TOP_LIMIT,
            pillar_width: PILLAR_WIDTH,
            pillar_height: PILLAR_HEIGHT,

            spike_chance: SPIKE_CHANCE,
            spike_spacing: SPIKE_SPACING,
            spike_max_per_platform: SPIKE_MAX_PER_PLATFORM,
            spike_period_min: SPIKE_PERIOD_MIN,
            spike_period_max: SPIKE_PERIOD_MAX,
            spike_extended_min: SPIKE_EXTENDED_MIN,
            spike_extended_max: SPIKE_EXTENDED_MAX,
            spike_height: SPIKE_HEIGHT,

            spawn_margin: SPAWN_MARGIN,
            min_right_spawn_x: MIN_RIGHT_SPAWN_X,
        }
    }
}

/// Bot decision thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Health fraction below which a fleeing bot runs
    pub flee_health_fraction: f32,
    /// Max horizontal centre distance covered by one jump/dash traversal
    pub jump_reach: f32,
    /// Max upward height gained by one traversal
    pub max_climb: f32,
    /// Tolerance used when locating the platform under a fighter
    pub standing_tolerance_y: f32,
    /// Tighter tolerance used for the opponent's platform in pursuit
    pub target_standing_tolerance_y: f32,
    pub edge_margin: f32,
    pub counter_punch_range: f32,
    pub cornered_dash_range: f32,
    pub cornered_dash_chance: f32,
    pub reverse_flee_range: f32,
    pub min_safe_distance: f32,
    pub min_flee_advance: f32,
    pub max_flee_height_delta: f32,
    pub min_distance_gain: f32,
    pub height_penalty: f32,
    pub fallback_min_advance: f32,
    pub fallback_min_rise: f32,
    pub fallback_jump_chance: f32,
    /// Beyond this distance the bot walks toward the next waypoint
    pub waypoint_walk_distance: f32,
    /// Beyond this distance the bot dashes toward a flee waypoint
    pub waypoint_dash_distance: f32,
    /// Within this distance a grounded bot considers jumping
    pub jump_alignment_distance: f32,
    /// Jump when the target is this much higher
    pub jump_rise_threshold: f32,
    pub approach_stop_distance: f32,
    pub fallback_dash_distance: f32,
    pub punch_range: f32,
    /// Dash toward a reachable target platform when farther than this.
    /// `None` keeps the behaviour switched off.
    pub pursue_dash_distance: Option<f32>,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            flee_health_fraction: 0.5,
            jump_reach: 380.0,
            max_climb: 220.0,
            standing_tolerance_y: 12.0,
            target_standing_tolerance_y: 8.0,
            edge_margin: 36.0,
            counter_punch_range: 90.0,
            cornered_dash_range: 120.0,
            cornered_dash_chance: 0.45,
            reverse_flee_range: 340.0,
            min_safe_distance: 300.0,
            min_flee_advance: 60.0,
            max_flee_height_delta: 360.0,
            min_distance_gain: 40.0,
            height_penalty: 0.001,
            fallback_min_advance: 40.0,
            fallback_min_rise: 10.0,
            fallback_jump_chance: 0.12,
            waypoint_walk_distance: 110.0,
            waypoint_dash_distance: 160.0,
            jump_alignment_distance: 90.0,
            jump_rise_threshold: 20.0,
            approach_stop_distance: 60.0,
            fallback_dash_distance: 140.0,
            punch_range: 70.0,
            pursue_dash_distance: None,
        }
    }
}

/// Complete balance set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub combat: CombatTuning,
    pub progression: ProgressionTuning,
    pub arena: ArenaTuning,
    pub ai: AiTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a JSON tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the integrator or the random ranges
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid { field, reason: "must be a positive finite number" })
            }
        }
        fn range(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
            if min.is_finite() && max.is_finite() && min <= max {
                Ok(())
            } else {
                Err(TuningError::Invalid { field, reason: "min must not exceed max" })
            }
        }
        fn fraction(field: &'static str, value: f32) -> Result<(), TuningError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(TuningError::Invalid { field, reason: "must be within [0, 1]" })
            }
        }

        let p = &self.physics;
        positive("physics.max_dt", p.max_dt)?;
        positive("physics.gravity", p.gravity)?;
        positive("physics.jump_velocity", p.jump_velocity)?;
        positive("physics.dash_speed", p.dash_speed)?;
        positive("physics.dash_duration", p.dash_duration)?;

        let c = &self.combat;
        if c.base_hp <= 0 {
            return Err(TuningError::Invalid { field: "combat.base_hp", reason: "must be positive" });
        }
        positive("combat.base_speed", c.base_speed)?;
        positive("combat.speed_boost_multiplier", c.speed_boost_multiplier)?;
        range("combat.chest_interval", c.chest_interval_min, c.chest_interval_max)?;
        positive("combat.chest_interval_min", c.chest_interval_min)?;
        fraction("combat.chest_platform_chance", c.chest_platform_chance)?;

        if self.progression.level_threshold_multiplier == 0 {
            return Err(TuningError::Invalid {
                field: "progression.level_threshold_multiplier",
                reason: "must be at least 1",
            });
        }

        let a = &self.arena;
        range("arena.spike_period", a.spike_period_min, a.spike_period_max)?;
        positive("arena.spike_period_min", a.spike_period_min)?;
        range("arena.spike_extended", a.spike_extended_min, a.spike_extended_max)?;
        positive("arena.spike_spacing", a.spike_spacing)?;
        fraction("arena.spike_chance", a.spike_chance)?;

        fraction("ai.flee_health_fraction", self.ai.flee_health_fraction)?;
        positive("ai.jump_reach", self.ai.jump_reach)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let tuning = Tuning::from_json(r#"{ "physics": { "gravity": 900.0 } }"#).unwrap();
        assert_eq!(tuning.physics.gravity, 900.0);
        assert_eq!(tuning.physics.jump_velocity, JUMP_VELOCITY);
        assert_eq!(tuning.combat, CombatTuning::default());
    }

    #[test]
    fn test_round_trip_json() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "physics": { "max_dt": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "physics.max_dt", .. }));

        let err = Tuning::from_json(
            r#"{ "arena": { "spike_period_min": 8.0, "spike_period_max": 2.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, TuningError::Invalid { .. }));

        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_pursue_dash_disabled_by_default() {
        assert_eq!(Tuning::default().ai.pursue_dash_distance, None);
    }
}
