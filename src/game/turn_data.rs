//! Per-turn scratch data
//!
//! Rebuilt from the snapshot at the start of every turn and dropped at the end.
//! Entities are addressed by their index in `Snapshot::entities`; distance
//! caches are dense rows over those indices.

use smallvec::SmallVec;

use crate::config::EngineConfig;
use crate::game::constants::targeting::EXIT_LOOKAHEAD;
use crate::game::state::{EntityKind, Snapshot, ME, OP, UNITS_PER_PLAYER};
use crate::util::geometry::Bounds;

pub struct TurnData {
    /// Snapshot indices of our units, in input order
    pub units: SmallVec<[usize; UNITS_PER_PLAYER]>,
    /// Snapshot indices of hostile units
    pub enemies: SmallVec<[usize; UNITS_PER_PLAYER]>,
    /// Snapshot indices of creatures
    pub creatures: Vec<usize>,
    entity_count: usize,
    unit_dist: Vec<f32>,
    enemy_dist: Vec<f32>,
    base_dist: [Vec<f32>; 2],
    steps_before_out: Vec<u32>,
    /// Creatures strictly inside each base's zone radius
    pub in_base: [u32; 2],
    /// Hostile unit close to our base
    pub enemy_in_base: Option<usize>,
    /// Hostile unit close to the hostile base
    pub enemy_near_op_base: Option<usize>,
}

impl TurnData {
    pub fn build(snap: &Snapshot, config: &EngineConfig) -> Self {
        let mut count = snap.entities.len();
        if count > config.max_entities {
            tracing::warn!(
                entities = count,
                capacity = config.max_entities,
                "Entity index over capacity, ignoring the excess"
            );
            count = config.max_entities;
        }

        let mut units = SmallVec::new();
        let mut enemies = SmallVec::new();
        let mut creatures = Vec::with_capacity(count);

        for (idx, e) in snap.entities.iter().take(count).enumerate() {
            match e.kind {
                EntityKind::Unit => units.push(idx),
                EntityKind::Enemy => enemies.push(idx),
                EntityKind::Creature => creatures.push(idx),
            }
        }

        let entities = &snap.entities[..count];
        let row = |from: usize| -> Vec<f32> {
            let origin = snap.entities[from].pos;
            entities.iter().map(|e| origin.distance_to(e.pos)).collect()
        };

        let unit_dist: Vec<f32> = units.iter().flat_map(|&u| row(u)).collect();
        let enemy_dist: Vec<f32> = enemies.iter().flat_map(|&u| row(u)).collect();
        let base_dist = [ME, OP].map(|p| {
            let base = snap.players[p].base;
            entities.iter().map(|e| base.distance_to(e.pos)).collect::<Vec<f32>>()
        });

        let bounds = Bounds::new(config.board_width, config.board_height);
        let mut steps_before_out = vec![0; count];
        let mut in_base = [0u32; 2];
        for &idx in &creatures {
            let e = &entities[idx];
            for p in [ME, OP] {
                if base_dist[p][idx] < config.base_zone_radius {
                    in_base[p] += 1;
                }
            }

            let mut next = e.pos;
            let mut steps = 0;
            for _ in 0..EXIT_LOOKAHEAD {
                next += e.vel;
                if !bounds.contains(next) {
                    break;
                }
                steps += 1;
            }
            steps_before_out[idx] = steps;
        }

        let invader_radius = config.threat_radius_factor * config.base_detect_radius;
        let enemy_near =
            |p: usize| enemies.iter().copied().find(|&e| base_dist[p][e] <= invader_radius);
        let enemy_in_base = enemy_near(ME);
        let enemy_near_op_base = enemy_near(OP);

        Self {
            units,
            enemies,
            creatures,
            entity_count: count,
            unit_dist,
            enemy_dist,
            base_dist,
            steps_before_out,
            in_base,
            enemy_in_base,
            enemy_near_op_base,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Position of a unit (by snapshot index) in `units`
    #[inline]
    fn unit_ordinal(&self, unit: usize) -> Option<usize> {
        self.units.iter().position(|&u| u == unit)
    }

    /// Distance from our unit `unit` to entity `idx` (both snapshot indices)
    pub fn unit_dist(&self, unit: usize, idx: usize) -> f32 {
        match self.unit_ordinal(unit) {
            Some(ord) => self.unit_dist[ord * self.entity_count + idx],
            None => f32::INFINITY,
        }
    }

    /// Distance from hostile unit `enemy` to entity `idx`
    pub fn enemy_dist(&self, enemy: usize, idx: usize) -> f32 {
        match self.enemies.iter().position(|&e| e == enemy) {
            Some(ord) => self.enemy_dist[ord * self.entity_count + idx],
            None => f32::INFINITY,
        }
    }

    /// Distance from player `player`'s base to entity `idx`
    #[inline]
    pub fn base_dist(&self, player: usize, idx: usize) -> f32 {
        self.base_dist[player][idx]
    }

    /// Turns a creature stays on the battlefield, capped at a fixed lookahead
    #[inline]
    pub fn steps_before_out(&self, idx: usize) -> u32 {
        self.steps_before_out[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Entity;
    use crate::util::vec2::Vec2;

    fn scene() -> Snapshot {
        let mut snap = Snapshot::new(3, Vec2::ZERO, Vec2::new(17630.0, 9000.0));
        snap.entities.push(Entity::creature(10, Vec2::new(3000.0, 4000.0), Vec2::new(-400.0, 0.0), 10));
        snap.entities.push(Entity::unit(0, Vec2::new(0.0, 4000.0)));
        snap.entities.push(Entity::enemy(3, Vec2::new(4000.0, 3000.0)));
        snap.entities.push(Entity::creature(11, Vec2::new(14630.0, 6000.0), Vec2::new(400.0, 0.0), 10));
        snap
    }

    #[test]
    fn test_partition() {
        let data = TurnData::build(&scene(), &EngineConfig::default());
        assert_eq!(data.units.as_slice(), &[1]);
        assert_eq!(data.enemies.as_slice(), &[2]);
        assert_eq!(data.creatures, vec![0, 3]);
    }

    #[test]
    fn test_distance_caches() {
        let data = TurnData::build(&scene(), &EngineConfig::default());
        assert!((data.unit_dist(1, 0) - 3000.0).abs() < 1e-3);
        assert!((data.base_dist(ME, 0) - 5000.0).abs() < 1e-3);
        assert!((data.enemy_dist(2, 0) - 1414.2136).abs() < 1e-2);
        // Unknown unit index
        assert!(data.unit_dist(0, 0).is_infinite());
    }

    #[test]
    fn test_in_base_counts_are_strict() {
        let data = TurnData::build(&scene(), &EngineConfig::default());
        // Creature 10 sits exactly on the zone radius
        assert_eq!(data.in_base[ME], 0);
        assert_eq!(data.in_base[OP], 1);
    }

    #[test]
    fn test_steps_before_out() {
        let data = TurnData::build(&scene(), &EngineConfig::default());
        // 3000 / 400 = 7.5: seven projections stay inside
        assert_eq!(data.steps_before_out(0), 7);
        // (17630 - 14630) / 400 = 7.5
        assert_eq!(data.steps_before_out(3), 7);
    }

    #[test]
    fn test_enemy_in_base() {
        let data = TurnData::build(&scene(), &EngineConfig::default());
        assert_eq!(data.enemy_in_base, Some(2));
        assert_eq!(data.enemy_near_op_base, None);
    }

    #[test]
    fn test_capacity_bound() {
        let mut config = EngineConfig::default();
        config.max_entities = 2;
        let data = TurnData::build(&scene(), &config);
        assert_eq!(data.entity_count(), 2);
        assert_eq!(data.creatures, vec![0]);
        assert_eq!(data.units.as_slice(), &[1]);
        assert!(data.enemies.is_empty());
    }
}
