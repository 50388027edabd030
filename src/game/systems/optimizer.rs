//! Multi-target move optimizer
//!
//! Brute-force search over a precomputed disk of displacement offsets. Each
//! candidate position is scored by how many creatures it brings within
//! attack radius and how close it stays to the aim point.

use smallvec::SmallVec;

use crate::game::constants::search::{
    CREATURE_VALUE, DIST_POW, PACKED_INLINE, PACK_BONUS, TARGET_DIST_POW,
};
use crate::game::state::Snapshot;
use crate::game::systems::TurnContext;
use crate::util::vec2::Vec2;

/// Every lattice offset reachable in one move
pub struct OffsetDisk {
    offsets: Vec<Vec2>,
}

impl OffsetDisk {
    /// Offsets on a `step` lattice within `radius` of the origin, row by row
    pub fn new(radius: f32, step: i32) -> Self {
        let step = step.max(1);
        let r = radius as i32;
        let mut offsets = Vec::new();
        let mut dy = -r;
        while dy <= r {
            let mut dx = -r;
            while dx <= r {
                let offset = Vec2::from_ints(dx, dy);
                if offset.length() <= radius {
                    offsets.push(offset);
                }
                dx += step;
            }
            dy += step;
        }
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.offsets.iter().copied()
    }
}

/// Best destination for `unit` that still reaches `aim` within `step` turns
///
/// Returns `None` when every offset is rejected, leaving the provisional
/// destination in place.
pub fn optimize_move(
    ctx: &TurnContext,
    snap: &Snapshot,
    unit: usize,
    target: Option<usize>,
    aim: Vec2,
    step: u32,
) -> Option<Vec2> {
    let config = ctx.config;
    let hero = &snap.entities[unit];
    let avoid = hero.role.avoids_incidental_kills(
        config.policy.attackers_avoid_kills,
        config.policy.rushers_avoid_kills,
    );

    let mut best = None;
    let mut best_eval = f32::NEG_INFINITY;

    'offsets: for offset in ctx.disk.iter() {
        let next = hero.pos + offset;
        let aim_dist = next.distance_to(aim);
        if (aim_dist / config.unit_speed) as u32 > step {
            continue;
        }

        // (distance, is explicit target)
        let mut packed: SmallVec<[(f32, bool); PACKED_INLINE]> = SmallVec::new();
        if target.is_some() {
            packed.push((aim_dist, true));
        }
        for &c in &ctx.data.creatures {
            if Some(c) == target {
                continue;
            }
            let d = next.distance_to(snap.entities[c].pos);
            if d > config.attack_radius {
                continue;
            }
            if avoid {
                continue 'offsets;
            }
            packed.push((d, false));
        }

        let mut eval = 0.0;
        if avoid {
            eval += CREATURE_VALUE / (aim_dist + 1.0).powf(DIST_POW);
        } else {
            for &(d, is_target) in &packed {
                if is_target {
                    eval += CREATURE_VALUE / (d + 1.0).powf(TARGET_DIST_POW);
                }
                eval += CREATURE_VALUE / (d + 1.0).powf(DIST_POW);
            }
        }
        eval += (packed.len() as f32 - 1.0) * PACK_BONUS;

        if eval > best_eval {
            best_eval = eval;
            best = Some(next);
        }
    }

    if let Some(dest) = best {
        tracing::trace!(
            unit = hero.id,
            x = dest.x,
            y = dest.y,
            eval = best_eval,
            "Optimized move"
        );
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Entity, Role, Strategy};
    use crate::game::systems::testing::Fixture;

    #[test]
    fn test_offset_disk_size() {
        let disk = OffsetDisk::new(800.0, 20);
        assert!(disk.len() > 5000 && disk.len() <= 5030);
        assert!(disk.iter().all(|o| o.length() <= 800.0));
        assert!(disk.iter().any(|o| o == Vec2::ZERO));
        assert_eq!(disk.iter().next(), Some(Vec2::new(0.0, -800.0)));
    }

    #[test]
    fn test_packs_second_creature() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(5000.0, 5000.0)));
        let target = fx.push(Entity::creature(10, Vec2::new(5600.0, 5000.0), Vec2::ZERO, 10));
        fx.push(Entity::creature(12, Vec2::new(6500.0, 5000.0), Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        let aim = Vec2::new(5600.0, 5000.0);
        let dest = optimize_move(&ctx, &fx.snap, unit, Some(target), aim, 0);
        assert_eq!(dest, Some(Vec2::new(5700.0, 5000.0)));
    }

    #[test]
    fn test_single_target_stays_on_aim() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(5000.0, 5000.0)));
        let target = fx.push(Entity::creature(10, Vec2::new(5600.0, 5000.0), Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        let aim = Vec2::new(5600.0, 5000.0);
        let dest = optimize_move(&ctx, &fx.snap, unit, Some(target), aim, 0);
        assert_eq!(dest, Some(aim));
    }

    #[test]
    fn test_avoiding_role_keeps_distance() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let mut rusher = Entity::unit(0, Vec2::new(5000.0, 5000.0));
        rusher.role = Role::Rusher;
        let unit = fx.push(rusher);
        let bystander = Vec2::new(5900.0, 5000.0);
        fx.push(Entity::creature(10, bystander, Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Rush);

        let post = Vec2::new(9000.0, 5000.0);
        let dest = optimize_move(&ctx, &fx.snap, unit, None, post, 20).unwrap();
        assert!(dest.distance_to(bystander) > 800.0);
        assert!(dest.distance_to(Vec2::new(5000.0, 5000.0)) <= 800.0);
    }

    #[test]
    fn test_unreachable_aim_rejects_everything() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(5000.0, 5000.0)));
        let target = fx.push(Entity::creature(10, Vec2::new(9000.0, 5000.0), Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        let dest = optimize_move(&ctx, &fx.snap, unit, Some(target), Vec2::new(9000.0, 5000.0), 0);
        assert_eq!(dest, None);
    }
}
