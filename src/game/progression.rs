//! Level and experience formulas.
//!
//! Canonical tuning: `base_xp = 100`, `xp_multiplier = 1.5`, so
//! `experience_threshold(1) = 100`, `experience_threshold(2) = 282`,
//! `experience_threshold(3) = 519`.

use log::info;

use crate::game::catalog::ProgressionTuning;
use crate::game::types::{LevelUp, PlayerState};

/// Experience needed to advance from `level` to `level + 1`. Catalog loading
/// rejects curves that overflow before the level cap, so the saturation here
/// is never reached for levels at or below it.
pub fn experience_threshold(level: u32, tuning: &ProgressionTuning) -> u32 {
    checked_threshold(level, tuning).unwrap_or(u32::MAX)
}

/// `None` once the curve no longer fits in a `u32`.
pub fn checked_threshold(level: u32, tuning: &ProgressionTuning) -> Option<u32> {
    let level = level.max(1) as f64;
    let raw = (tuning.base_xp as f64 * level.powf(tuning.xp_multiplier)).floor();
    (raw.is_finite() && raw <= u32::MAX as f64).then_some(raw as u32)
}

pub fn max_health(level: u32, tuning: &ProgressionTuning) -> u32 {
    tuning
        .base_health
        .saturating_add(level.saturating_sub(1).saturating_mul(tuning.health_per_level))
}

pub fn max_stamina(level: u32, tuning: &ProgressionTuning) -> u32 {
    tuning
        .base_stamina
        .saturating_add(level.saturating_sub(1).saturating_mul(tuning.stamina_per_level))
}

/// Add experience, cascading level-ups. Each level-up refills health and stamina
/// to the new maxima. At the level cap excess experience is discarded and the
/// counter holds at `threshold - 1`.
pub fn apply_experience(
    state: &mut PlayerState,
    gained: u32,
    tuning: &ProgressionTuning,
) -> Option<LevelUp> {
    let from_level = state.level;
    state.experience = state.experience.saturating_add(gained);

    while state.level < tuning.level_cap {
        let needed = experience_threshold(state.level, tuning);
        if state.experience < needed {
            break;
        }
        state.experience -= needed;
        state.level += 1;
        state.max_health = max_health(state.level, tuning);
        state.max_stamina = max_stamina(state.level, tuning);
        state.health = state.max_health;
        state.stamina = state.max_stamina;
    }

    if state.level >= tuning.level_cap {
        let ceiling = experience_threshold(state.level, tuning).saturating_sub(1);
        state.experience = state.experience.min(ceiling);
    }

    if state.level > from_level {
        info!(
            "player {} advanced from level {} to {}",
            state.id, from_level, state.level
        );
        Some(LevelUp {
            from_level,
            to_level: state.level,
        })
    } else {
        None
    }
}

/// `(level, experience needed to leave that level)` for levels `1..=levels`.
pub fn threshold_table(levels: u32, tuning: &ProgressionTuning) -> Vec<(u32, u32)> {
    (1..=levels.min(tuning.level_cap))
        .map(|level| (level, experience_threshold(level, tuning)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> ProgressionTuning {
        ProgressionTuning {
            base_xp: 100,
            xp_multiplier: 1.5,
            base_health: 100,
            health_per_level: 10,
            base_stamina: 50,
            stamina_per_level: 5,
            level_cap: 50,
        }
    }

    fn fresh() -> PlayerState {
        PlayerState::new("1", "Kai", "Beach", 100, 50)
    }

    #[test]
    fn thresholds_follow_the_curve() {
        let t = tuning();
        assert_eq!(experience_threshold(1, &t), 100);
        assert_eq!(experience_threshold(2, &t), 282);
        assert_eq!(experience_threshold(3, &t), 519);
    }

    #[test]
    fn thresholds_strictly_increase() {
        let t = tuning();
        for level in 1..t.level_cap {
            assert!(
                experience_threshold(level + 1, &t) > experience_threshold(level, &t),
                "threshold must grow past level {}",
                level
            );
        }
    }

    #[test]
    fn steep_curve_overflows() {
        let t = ProgressionTuning {
            xp_multiplier: 5.0,
            ..tuning()
        };
        assert!(checked_threshold(33, &t).is_some());
        assert_eq!(checked_threshold(34, &t), None);
        assert_eq!(experience_threshold(34, &t), u32::MAX);
    }

    #[test]
    fn pools_grow_linearly() {
        let t = tuning();
        assert_eq!(max_health(1, &t), 100);
        assert_eq!(max_health(5, &t), 140);
        assert_eq!(max_stamina(1, &t), 50);
        assert_eq!(max_stamina(5, &t), 70);
    }

    #[test]
    fn two_hundred_fifty_xp_from_level_one_lands_on_level_two() {
        // 100 is consumed at level 1; the remaining 150 is short of 282.
        let t = tuning();
        let mut player = fresh();
        let level_up = apply_experience(&mut player, 250, &t).expect("level up");
        assert_eq!(player.level, 2);
        assert_eq!(player.experience, 150);
        assert_eq!(level_up.levels_gained(), 1);
    }

    #[test]
    fn large_gain_cascades_and_refills_pools() {
        let t = tuning();
        let mut player = fresh();
        player.health = 3;
        player.stamina = 0;
        // 100 + 282 + 519 = 901 consumed, 50 left over at level 4.
        let level_up = apply_experience(&mut player, 951, &t).expect("level up");
        assert_eq!(
            level_up,
            LevelUp {
                from_level: 1,
                to_level: 4
            }
        );
        assert_eq!(player.experience, 50);
        assert_eq!(player.max_health, 130);
        assert_eq!(player.health, 130);
        assert_eq!(player.max_stamina, 65);
        assert_eq!(player.stamina, 65);
    }

    #[test]
    fn small_gain_does_not_level() {
        let t = tuning();
        let mut player = fresh();
        player.health = 40;
        assert!(apply_experience(&mut player, 99, &t).is_none());
        assert_eq!(player.experience, 99);
        assert_eq!(player.health, 40);
    }

    #[test]
    fn level_cap_discards_excess() {
        let t = ProgressionTuning {
            level_cap: 3,
            ..tuning()
        };
        let mut player = fresh();
        apply_experience(&mut player, 10_000, &t);
        assert_eq!(player.level, 3);
        assert_eq!(player.experience, 518);

        assert!(apply_experience(&mut player, 10_000, &t).is_none());
        assert_eq!(player.experience, 518);
    }

    #[test]
    fn experience_stays_below_threshold() {
        let t = tuning();
        let mut player = fresh();
        for gained in [7, 130, 45, 999, 3, 2048] {
            apply_experience(&mut player, gained, &t);
            assert!(player.experience < experience_threshold(player.level, &t));
        }
    }

    #[test]
    fn table_is_bounded_by_cap() {
        let t = ProgressionTuning {
            level_cap: 4,
            ..tuning()
        };
        let table = threshold_table(10, &t);
        assert_eq!(table.len(), 4);
        assert_eq!(table[0], (1, 100));
        assert_eq!(table[2], (3, 519));
    }
}
