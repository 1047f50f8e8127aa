//! Procedural arena layout
//!
//! Platforms are rejection-sampled around a fixed central pillar, biased
//! toward the ground. Generation is best-effort: when an attempt budget runs
//! out the partially filled layout is accepted as is.

use glam::Vec2;
use rand::Rng;
use std::collections::HashSet;

use super::state::{ArenaBounds, Platform, SpikeTrap};
use crate::tuning::ArenaTuning;

/// True if a candidate platform is too close to an existing one or to
/// either fighter's current position.
#[allow(clippy::too_many_arguments)]
fn is_blocked(
    platforms: &[Platform],
    fighters: &[Vec2; 2],
    x: f32,
    y: f32,
    width: f32,
    buffer_x: f32,
    buffer_y: f32,
    tuning: &ArenaTuning,
) -> bool {
    let center_x = x + width * 0.5;
    let near_fighter = fighters.iter().any(|f| {
        (center_x - f.x).abs() < tuning.fighter_safe_x && (y - f.y).abs() < tuning.fighter_safe_y
    });
    if near_fighter {
        return true;
    }
    platforms
        .iter()
        .any(|p| p.overlaps_x(x, width, buffer_x) && (y - p.y).abs() < buffer_y)
}

fn count_visible(platforms: &[Platform], ground_y: f32, range: f32) -> usize {
    platforms
        .iter()
        .filter(|p| p.y >= ground_y - range && p.y <= ground_y)
        .count()
}

/// Build a fresh platform set for a round
pub fn generate_platforms<R: Rng>(
    rng: &mut R,
    bounds: ArenaBounds,
    fighters: [Vec2; 2],
    tuning: &ArenaTuning,
) -> Vec<Platform> {
    let width = bounds.width;
    let ground_y = bounds.ground_y;
    let center_x = bounds.center_x();

    let mut platforms = Vec::with_capacity(tuning.platform_target + 4);

    // Central pillar standing on the ground
    platforms.push(Platform::new(
        center_x - tuning.pillar_width * 0.5,
        ground_y - tuning.pillar_height,
        tuning.pillar_width,
        tuning.pillar_height,
    ));

    // Primary pass
    let vertical_span = tuning.min_vertical_span.max(ground_y - tuning.vertical_span_inset);
    let mut attempts = 0;
    while platforms.len() < tuning.platform_target && attempts < tuning.platform_attempts {
        attempts += 1;
        let pw = tuning.platform_min_width + (rng.random::<f32>() * tuning.platform_width_range).floor();
        let px = (tuning.edge_inset + rng.random::<f32>() * (width - pw - tuning.edge_inset * 2.0)).floor();
        let t: f32 = rng.random();
        let py = (ground_y - tuning.low_band_offset - t.powf(tuning.height_bias_exponent) * vertical_span).floor();
        if py < tuning.min_platform_y {
            continue;
        }
        if !is_blocked(&platforms, &fighters, px, py, pw, tuning.buffer_x, tuning.buffer_y, tuning) {
            platforms.push(Platform::new(px, py, pw, tuning.platform_height));
        }
    }
    if platforms.len() < tuning.platform_target {
        log::warn!(
            "Arena generation placed {}/{} platforms after {} attempts",
            platforms.len(),
            tuning.platform_target,
            attempts
        );
    }

    // Repair pass: make sure enough platforms sit close to the ground
    let mut visible = count_visible(&platforms, ground_y, tuning.visible_range);
    let mut repair_attempts = 0;
    while visible < tuning.min_visible_platforms && repair_attempts < tuning.repair_attempts {
        repair_attempts += 1;
        let pw = tuning.repair_min_width + (rng.random::<f32>() * tuning.repair_width_range).floor();
        let px = (tuning.edge_inset + rng.random::<f32>() * (width - pw - tuning.edge_inset * 2.0)).floor();
        let py = ground_y - (tuning.repair_min_rise + rng.random::<f32>() * tuning.repair_rise_range).floor();
        if py < tuning.min_platform_y {
            continue;
        }
        if !is_blocked(
            &platforms,
            &fighters,
            px,
            py,
            pw,
            tuning.repair_buffer_x,
            tuning.repair_buffer_y,
            tuning,
        ) {
            platforms.push(Platform::new(px, py, pw, tuning.platform_height));
            visible = count_visible(&platforms, ground_y, tuning.visible_range);
        }
    }

    dedup_top(&mut platforms, center_x, tuning.top_limit);

    log::debug!(
        "Generated {} platforms ({} near ground)",
        platforms.len(),
        count_visible(&platforms, ground_y, tuning.visible_range)
    );
    platforms
}

/// Keep only the platform nearest the arena centre among those at or above
/// the top limit
fn dedup_top(platforms: &mut Vec<Platform>, center_x: f32, top_limit: f32) {
    let keep = platforms
        .iter()
        .enumerate()
        .filter(|(_, p)| p.y <= top_limit)
        .min_by(|(_, a), (_, b)| {
            (a.center_x() - center_x)
                .abs()
                .partial_cmp(&(b.center_x() - center_x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i);

    if let Some(keep) = keep {
        let mut index = 0;
        platforms.retain(|p| {
            let retain = p.y > top_limit || index == keep;
            index += 1;
            retain
        });
    }
}

/// Scatter spike traps over a platform set
pub fn place_spikes<R: Rng>(rng: &mut R, platforms: &[Platform], tuning: &ArenaTuning) -> Vec<SpikeTrap> {
    let mut spikes = Vec::new();
    for (index, platform) in platforms.iter().enumerate() {
        if rng.random::<f32>() >= tuning.spike_chance {
            continue;
        }
        let count = ((platform.width / tuning.spike_spacing).floor() as usize)
            .clamp(1, tuning.spike_max_per_platform.max(1));
        for j in 0..count {
            let x = platform.x + platform.width * ((j + 1) as f32 / (count + 1) as f32);
            let period = roll(rng, tuning.spike_period_min, tuning.spike_period_max);
            let extended_duration = roll(rng, tuning.spike_extended_min, tuning.spike_extended_max);
            spikes.push(SpikeTrap {
                platform: index,
                pos: Vec2::new(x, platform.y - tuning.spike_height),
                extended: false,
                timer: rng.random::<f32>() * period,
                period,
                extended_duration,
                extended_remaining: 0.0,
                hit: HashSet::new(),
            });
        }
    }
    spikes
}

/// Uniform value in [min, max)
pub(crate) fn roll<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOUNDS: ArenaBounds = ArenaBounds { width: 1830.0, ground_y: 820.0 };

    fn spawn_points() -> [Vec2; 2] {
        [Vec2::new(120.0, 774.0), Vec2::new(1710.0, 774.0)]
    }

    #[test]
    fn test_pillar_is_first_and_centered() {
        let mut rng = Pcg32::seed_from_u64(1);
        let tuning = ArenaTuning::default();
        let platforms = generate_platforms(&mut rng, BOUNDS, spawn_points(), &tuning);
        let pillar = platforms[0];
        assert_eq!(pillar.center_x(), BOUNDS.center_x());
        assert_eq!(pillar.bottom(), BOUNDS.ground_y);
    }

    #[test]
    fn test_generation_never_blocks_on_tiny_arena() {
        // Far too small to fit the target; must still return
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = ArenaTuning::default();
        let bounds = ArenaBounds::new(300.0, 200.0);
        let platforms = generate_platforms(&mut rng, bounds, [Vec2::new(120.0, 154.0); 2], &tuning);
        assert!(!platforms.is_empty());
        assert!(platforms.len() < tuning.platform_target);
    }

    #[test]
    fn test_repair_pass_fills_near_ground_band() {
        // Primary pass has nothing to place beyond the pillar
        let mut rng = Pcg32::seed_from_u64(5);
        let tuning = ArenaTuning { platform_target: 1, repair_attempts: 10_000, ..ArenaTuning::default() };
        let bounds = ArenaBounds::new(3000.0, BOUNDS.ground_y);
        let platforms = generate_platforms(&mut rng, bounds, spawn_points(), &tuning);
        let visible = count_visible(&platforms, bounds.ground_y, tuning.visible_range);
        assert_eq!(visible, tuning.min_visible_platforms);
        // Repair stops as soon as the band is full
        assert_eq!(platforms.len(), tuning.min_visible_platforms);
        for p in platforms.iter().skip(1) {
            assert!(p.y >= bounds.ground_y - tuning.repair_min_rise - tuning.repair_rise_range);
            assert!(p.y <= bounds.ground_y - tuning.repair_min_rise);
        }
    }

    #[test]
    fn test_repair_pass_respects_attempt_cap() {
        let mut rng = Pcg32::seed_from_u64(5);
        let tuning = ArenaTuning { platform_target: 1, repair_attempts: 0, ..ArenaTuning::default() };
        let platforms = generate_platforms(&mut rng, BOUNDS, spawn_points(), &tuning);
        // Only the pillar; a short band is accepted as is
        assert_eq!(platforms.len(), 1);
        assert!(count_visible(&platforms, BOUNDS.ground_y, tuning.visible_range) < tuning.min_visible_platforms);
    }

    #[test]
    fn test_dedup_top_keeps_most_central() {
        let mut platforms = vec![
            Platform::new(0.0, 70.0, 100.0, 18.0),
            Platform::new(450.0, 65.0, 100.0, 18.0),
            Platform::new(900.0, 75.0, 100.0, 18.0),
            Platform::new(200.0, 400.0, 100.0, 18.0),
        ];
        dedup_top(&mut platforms, 500.0, 80.0);
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[0].x, 450.0);
        assert_eq!(platforms[1].y, 400.0);
    }

    #[test]
    fn test_spikes_spread_across_platform() {
        let mut rng = Pcg32::seed_from_u64(11);
        let tuning = ArenaTuning { spike_chance: 1.0, ..ArenaTuning::default() };
        let platforms = vec![Platform::new(100.0, 500.0, 450.0, 18.0), Platform::new(700.0, 500.0, 60.0, 18.0)];
        let spikes = place_spikes(&mut rng, &platforms, &tuning);
        // 450px wide caps at 4, 60px wide still gets 1
        assert_eq!(spikes.iter().filter(|s| s.platform == 0).count(), 4);
        assert_eq!(spikes.iter().filter(|s| s.platform == 1).count(), 1);
        for s in &spikes {
            assert!(s.period >= 3.0 && s.period < 7.0);
            assert!(s.extended_duration >= 0.6 && s.extended_duration < 1.4);
            assert!(s.timer >= 0.0 && s.timer < s.period);
            assert!(!s.extended);
            assert_eq!(s.pos.y, 500.0 - tuning.spike_height);
        }
        assert_eq!(spikes[0].pos.x, 100.0 + 450.0 / 5.0);
    }

    proptest! {
        #[test]
        fn generated_platforms_keep_their_distance(seed in 0u64..500) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let tuning = ArenaTuning::default();
            let fighters = spawn_points();
            let platforms = generate_platforms(&mut rng, BOUNDS, fighters, &tuning);

            // Every pair is separated by at least the looser (repair) buffer
            for (i, a) in platforms.iter().enumerate() {
                for b in platforms.iter().skip(i + 1) {
                    let apart_x = !a.overlaps_x(b.x, b.width, tuning.repair_buffer_x);
                    let apart_y = (a.y - b.y).abs() >= tuning.repair_buffer_y;
                    prop_assert!(apart_x || apart_y, "{:?} vs {:?}", a, b);
                }
            }

            // Generated platforms (not the pillar) stay out of the fighter safe zones
            for p in platforms.iter().skip(1) {
                for f in &fighters {
                    prop_assert!(
                        (p.center_x() - f.x).abs() >= tuning.fighter_safe_x
                            || (p.y - f.y).abs() >= tuning.fighter_safe_y
                    );
                }
            }

            let top = platforms.iter().filter(|p| p.y <= tuning.top_limit).count();
            prop_assert!(top <= 1);
            prop_assert!(platforms.len() <= tuning.platform_target + tuning.min_visible_platforms);
        }
    }
}
