//! Per-turn decision systems
//!
//! Every system reads the turn context and writes actions into the snapshot.
//! Casting goes through the helpers below so mana and per-unit limits are
//! enforced in one place.

pub mod abilities;
pub mod optimizer;
pub mod rush;
pub mod targeting;

use crate::config::EngineConfig;
use crate::game::constants::abilities::{CROWDED_BASE, PUSH_OUT_HEALTH_MIN};
use crate::game::performance::TurnClock;
use crate::game::state::{Action, Orientation, Snapshot, Strategy, ME};
use crate::game::strategy::Formation;
use crate::game::turn_data::TurnData;
use crate::util::geometry::Bounds;
use crate::util::vec2::Vec2;

use self::optimizer::OffsetDisk;
use self::targeting::intercept;

/// Read-only inputs shared by the decision systems for one turn
#[derive(Clone, Copy)]
pub struct TurnContext<'a> {
    pub config: &'a EngineConfig,
    pub data: &'a TurnData,
    pub disk: &'a OffsetDisk,
    pub clock: &'a TurnClock,
    pub formation: Formation,
    pub bounds: Bounds,
    pub orientation: Orientation,
    pub strategy: Strategy,
}

impl<'a> TurnContext<'a> {
    /// Fixed map position expressed for the top-left base, in our frame
    pub fn post(&self, (x, y): (f32, f32)) -> Vec2 {
        self.orientation.oriented(Vec2::new(x, y), self.bounds)
    }
}

// ============================================================================
// Unit lookups
// ============================================================================

/// Our unit closest to entity `idx`
pub fn closest_unit(ctx: &TurnContext, idx: usize) -> Option<usize> {
    closest_matching(ctx, idx, |_| true)
}

/// Closest unit that is not locked and not already chasing another target
pub fn closest_free_unit(ctx: &TurnContext, snap: &Snapshot, idx: usize) -> Option<usize> {
    let id = snap.entities[idx].id;
    closest_matching(ctx, idx, |u| {
        let unit = &snap.entities[u];
        !unit.locked && unit.target.map_or(true, |t| t == id)
    })
}

fn closest_matching(ctx: &TurnContext, idx: usize, keep: impl Fn(usize) -> bool) -> Option<usize> {
    let mut best = None;
    let mut best_dist = f32::INFINITY;
    for &u in &ctx.data.units {
        if !keep(u) {
            continue;
        }
        let d = ctx.data.unit_dist(u, idx);
        if d < best_dist {
            best_dist = d;
            best = Some(u);
        }
    }
    best
}

// ============================================================================
// Casting
// ============================================================================

/// Whether `caster` may cast on `target` this turn
///
/// Requires enough mana, an unprotected target within `radius`, and a caster
/// that is neither locked nor already casting.
pub fn can_cast(ctx: &TurnContext, snap: &Snapshot, caster: usize, target: usize, radius: f32) -> bool {
    if !snap.me().can_afford(ctx.config.spell_cost) {
        return false;
    }
    if !snap.entities[target].is_castable() {
        return false;
    }
    let unit = &snap.entities[caster];
    if unit.locked || snap.action_of(caster).is_spell() {
        return false;
    }
    ctx.data.unit_dist(caster, target) <= radius
}

fn spend(ctx: &TurnContext, snap: &mut Snapshot) {
    let me = snap.me_mut();
    me.mana = (me.mana - ctx.config.spell_cost).max(0);
}

/// Push `target` so it travels toward `dest`
pub fn cast_push(ctx: &TurnContext, snap: &mut Snapshot, caster: usize, target: usize, dest: Vec2) {
    let aim = dest - snap.entities[target].pos + snap.entities[caster].pos;
    snap.set_action(caster, Action::Push(aim));
    spend(ctx, snap);
    tracing::debug!(
        unit = snap.entities[caster].id,
        target = snap.entities[target].id,
        mana = snap.me().mana,
        "Push"
    );
}

/// Redirect `target` toward `dest`
pub fn cast_charm(ctx: &TurnContext, snap: &mut Snapshot, caster: usize, target: usize, dest: Vec2) {
    let id = snap.entities[target].id;
    snap.set_action(caster, Action::Charm(id, dest));
    snap.entities[target].charmed = true;
    spend(ctx, snap);
    tracing::debug!(unit = snap.entities[caster].id, target = id, mana = snap.me().mana, "Charm");
}

pub fn cast_shield(ctx: &TurnContext, snap: &mut Snapshot, caster: usize, target: usize) {
    let id = snap.entities[target].id;
    snap.set_action(caster, Action::Shield(id));
    spend(ctx, snap);
    tracing::debug!(unit = snap.entities[caster].id, target = id, mana = snap.me().mana, "Shield");
}

pub fn move_to(snap: &mut Snapshot, unit: usize, dest: Vec2) {
    snap.set_action(unit, Action::Move(dest));
}

// ============================================================================
// Shared predicates
// ============================================================================

/// `unit` finishes `creature` with its next attack
pub fn can_kill_this_turn(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> bool {
    ctx.data.unit_dist(unit, creature) <= ctx.config.attack_radius
        && snap.entities[creature].health <= ctx.config.attack_damage
}

/// Whether a creature heading for our base should be pushed rather than fought
pub fn should_cast_push(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> bool {
    let config = ctx.config;
    let c = &snap.entities[creature];

    if ctx.data.enemy_in_base.is_some()
        || c.health >= PUSH_OUT_HEALTH_MIN
        || ctx.data.in_base[ME] > CROWDED_BASE
    {
        return true;
    }

    let base_dist = ctx.data.base_dist(ME, creature);
    let turns_to_base = ((0.99 + base_dist - config.base_kill_radius) / config.creature_speed) as i32;
    let step = intercept(snap.entities[unit].pos, c, config).step as i32;
    step + c.health / config.attack_damage.max(1) > turns_to_base
}

#[cfg(test)]
pub(crate) mod testing {
    //! Builders shared by the system tests

    use super::*;
    use crate::game::performance::TurnClock;
    use crate::game::state::Entity;

    pub struct Fixture {
        pub config: EngineConfig,
        pub disk: OffsetDisk,
        pub clock: TurnClock,
        pub snap: Snapshot,
    }

    impl Fixture {
        pub fn new(my_base: Vec2) -> Self {
            let config = EngineConfig::default();
            let bounds = Bounds::new(config.board_width, config.board_height);
            Self {
                disk: OffsetDisk::new(config.unit_speed, config.lattice_step),
                clock: TurnClock::start(60_000),
                snap: Snapshot::new(1, my_base, bounds.mirror(my_base)),
                config,
            }
        }

        pub fn push(&mut self, entity: Entity) -> usize {
            self.snap.entities.push(entity);
            self.snap.entities.len() - 1
        }

        pub fn data(&self) -> TurnData {
            TurnData::build(&self.snap, &self.config)
        }

        pub fn context<'a>(&'a self, data: &'a TurnData, strategy: Strategy) -> TurnContext<'a> {
            let bounds = Bounds::new(self.config.board_width, self.config.board_height);
            TurnContext {
                config: &self.config,
                data,
                disk: &self.disk,
                clock: &self.clock,
                formation: Formation::default(),
                bounds,
                orientation: Orientation::from_base(self.snap.me().base, bounds),
                strategy,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use super::*;
    use crate::game::state::Entity;

    #[test]
    fn test_cast_requires_mana_and_range() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(1000.0, 1000.0)));
        let near = fx.push(Entity::creature(10, Vec2::new(1500.0, 1000.0), Vec2::ZERO, 10));
        let far = fx.push(Entity::creature(11, Vec2::new(5000.0, 1000.0), Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        assert!(!can_cast(&ctx, &fx.snap, unit, near, 1280.0));

        let mut snap = fx.snap.clone();
        snap.me_mut().mana = 10;
        assert!(can_cast(&ctx, &snap, unit, near, 1280.0));
        assert!(!can_cast(&ctx, &snap, unit, far, 1280.0));

        snap.entities[near].shield = 3;
        assert!(!can_cast(&ctx, &snap, unit, near, 1280.0));
    }

    #[test]
    fn test_one_cast_per_unit() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(1000.0, 1000.0)));
        let c = fx.push(Entity::creature(10, Vec2::new(1500.0, 1000.0), Vec2::ZERO, 10));
        fx.snap.me_mut().mana = 50;
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);
        let mut snap = fx.snap.clone();

        cast_shield(&ctx, &mut snap, unit, c);
        assert_eq!(snap.me().mana, 40);
        assert!(!can_cast(&ctx, &snap, unit, c, 2200.0));
    }

    #[test]
    fn test_push_aim_is_relative_to_caster() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(1000.0, 1000.0)));
        let c = fx.push(Entity::creature(10, Vec2::new(1500.0, 1000.0), Vec2::ZERO, 10));
        fx.snap.me_mut().mana = 10;
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);
        let mut snap = fx.snap.clone();

        cast_push(&ctx, &mut snap, unit, c, Vec2::new(17630.0, 9000.0));
        assert_eq!(snap.action_of(unit), Action::Push(Vec2::new(17130.0, 9000.0)));
        assert_eq!(snap.me().mana, 0);
    }

    #[test]
    fn test_closest_free_unit_skips_busy() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let a = fx.push(Entity::unit(0, Vec2::new(1000.0, 1000.0)));
        let b = fx.push(Entity::unit(1, Vec2::new(3000.0, 1000.0)));
        let c = fx.push(Entity::creature(10, Vec2::new(1500.0, 1000.0), Vec2::ZERO, 10));
        fx.snap.entities[a].target = Some(99);
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        assert_eq!(closest_unit(&ctx, c), Some(a));
        assert_eq!(closest_free_unit(&ctx, &fx.snap, c), Some(b));

        let mut snap = fx.snap.clone();
        snap.entities[a].target = Some(10);
        assert_eq!(closest_free_unit(&ctx, &snap, c), Some(a));
    }

    #[test]
    fn test_should_cast_push_on_healthy_creature() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(3000.0, 3000.0)));
        let strong = fx.push(Entity::creature(10, Vec2::new(2000.0, 2000.0), Vec2::new(-283.0, -283.0), 6));
        let weak = fx.push(Entity::creature(12, Vec2::new(4000.0, 4000.0), Vec2::new(-283.0, -283.0), 2));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        assert!(should_cast_push(&ctx, &fx.snap, unit, strong));
        // Reached in one step and killed in one hit, long before the base
        assert!(!should_cast_push(&ctx, &fx.snap, unit, weak));
    }
}
