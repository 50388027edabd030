//! State estimation across turns
//!
//! Creatures leave detection all the time. The estimator carries them forward
//! from the previous snapshot by their fixed displacement, retires the ones
//! that must have died or walked off the battlefield, and seeds the mirrored
//! partner of every known creature before it is ever seen.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::EngineConfig;
use crate::game::state::{
    BaseSide, Entity, EntityId, EntityKind, Lifecycle, LifecycleMap, Snapshot, TurnInput, ME,
};
use crate::util::geometry::{in_disk, Bounds};
use crate::util::vec2::Vec2;

/// Mirror partner of a creature identifier (even ids pair with id + 1)
#[inline]
pub fn mirror_id(id: EntityId) -> EntityId {
    id ^ 1
}

/// Build the turn's snapshot from raw input
///
/// Units get zero displacement and the fixed unit health; every reported entity
/// becomes `InView`. A creature flagged as heading into a base is attributed to
/// the hostile base when it is horizontally closer to it.
pub fn ingest(
    input: TurnInput,
    turn: u32,
    my_base: Vec2,
    op_base: Vec2,
    lifecycle: &mut LifecycleMap,
    config: &EngineConfig,
) -> Snapshot {
    let mut snap = Snapshot::new(turn, my_base, op_base);
    for (p, status) in input.players.iter().enumerate() {
        snap.players[p].health = status.health;
        snap.players[p].mana = status.mana.max(0);
    }

    let total = input.entities.len();
    if total > config.max_entities {
        tracing::warn!(
            entities = total,
            capacity = config.max_entities,
            "Too many entities reported, truncating"
        );
    }

    snap.entities.reserve(total.min(config.max_entities));
    for mut e in input.entities.into_iter().take(config.max_entities) {
        if e.kind != EntityKind::Creature {
            e.vel = Vec2::ZERO;
            e.health = config.unit_health;
        }
        e.health_max = e.health;
        e.visible = true;
        e.reset_turn_state();

        if e.near_base != BaseSide::Neither
            && (e.pos.x - op_base.x).abs() < (e.pos.x - my_base.x).abs()
        {
            e.near_base = BaseSide::Hostile;
        }

        lifecycle.set(e.id, Lifecycle::InView);
        snap.entities.push(e);
    }

    snap
}

/// True when `pos` is inside our base detection or any of our units' detection
pub fn in_view(snap: &Snapshot, pos: Vec2, config: &EngineConfig) -> bool {
    if in_disk(snap.players[ME].base, config.base_detect_radius, pos) {
        return true;
    }
    snap.units()
        .any(|u| in_disk(u.pos, config.unit_detect_radius, pos))
}

/// Carry unseen creatures over from the previous turn
///
/// A creature that walked out of detection is projected, not retired: only a
/// projection that lands inside detection proves it died.
pub fn reconcile(
    current: &mut Snapshot,
    memory: &Snapshot,
    lifecycle: &mut LifecycleMap,
    config: &EngineConfig,
) {
    let bounds = Bounds::new(config.board_width, config.board_height);
    let mut projected = 0usize;
    let mut retired = 0usize;

    // id -> slot of everything reported this turn
    let slots: FxHashMap<EntityId, usize> = current
        .entities
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.id, idx))
        .collect();

    for old in memory.creatures() {
        if lifecycle.is_retired(old.id) {
            continue;
        }

        if let Some(&idx) = slots.get(&old.id) {
            let seen = &mut current.entities[idx];
            seen.health_max = seen.health_max.max(old.health_max);
            continue;
        }

        if current.entities.len() >= config.max_entities {
            tracing::warn!(id = old.id, "No room to project creature");
            continue;
        }

        let mut next = old.clone();
        next.pos = old.pos + old.vel;
        next.shield = (old.shield - 1).max(0);
        next.charmed = false;
        next.visible = false;
        next.reset_turn_state();

        let was_inside = bounds.contains(old.pos);
        let now_inside = bounds.contains(next.pos);
        let leaves = if config.policy.tolerate_boundary_crossing {
            !was_inside && !now_inside
        } else {
            !now_inside
        };
        if leaves {
            lifecycle.set(old.id, Lifecycle::Deactivated);
            retired += 1;
            continue;
        }

        // Should have been reported if it were still alive there
        if in_view(current, next.pos, config) {
            lifecycle.set(old.id, Lifecycle::Dead);
            retired += 1;
            continue;
        }

        lifecycle.set(old.id, Lifecycle::Computed);
        current.entities.push(next);
        projected += 1;
    }

    tracing::trace!(projected, retired, "Memory reconciled");
}

/// Seed the mirrored partner of every known creature that is still missing
pub fn synthesize_mirrors(current: &mut Snapshot, lifecycle: &mut LifecycleMap, config: &EngineConfig) {
    let bounds = Bounds::new(config.board_width, config.board_height);
    let known: FxHashSet<EntityId> = current.entities.iter().map(|e| e.id).collect();

    let mirrors: Vec<Entity> = current
        .creatures()
        .filter_map(|src| {
            let sym = mirror_id(src.id);
            if known.contains(&sym) || lifecycle.is_retired(sym) {
                return None;
            }
            let mut twin = src.clone();
            twin.id = sym;
            twin.pos = bounds.mirror(src.pos);
            twin.vel = -src.vel;
            twin.threat = src.threat.inverted();
            twin.near_base = src.near_base;
            twin.health = src.health_max;
            twin.shield = 0;
            twin.charmed = false;
            twin.visible = false;
            twin.reset_turn_state();
            Some(twin)
        })
        .collect();

    let room = config.max_entities.saturating_sub(current.entities.len());
    if mirrors.len() > room {
        tracing::warn!(
            wanted = mirrors.len(),
            room,
            "Entity capacity reached, dropping mirrored creatures"
        );
    }

    for twin in mirrors.into_iter().take(room) {
        lifecycle.set(twin.id, Lifecycle::Computed);
        current.entities.push(twin);
    }
}
