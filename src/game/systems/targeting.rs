//! Target selection and interception
//!
//! Urgent base defense runs first and claims the creature closest to our
//! base. Every other free unit then scores the creatures through a fixed
//! sequence of rules and chases the best one.

use crate::config::EngineConfig;
use crate::game::constants::targeting::{
    ATTACK_INNER_FACTOR, ATTACK_OUTER_FACTOR, ATTACK_STANDOFF, DEFENSE_FACTOR, EPSILON,
    INVASION_FACTOR, MAX_ENGAGED, NEAR_BASE_WEIGHT, NEAR_ENEMY_DIST, THREAT_WEIGHT,
    UNENGAGED_BONUS, URGENT_FACTOR,
};
use crate::game::state::{BaseSide, Entity, Role, Snapshot, ME, OP};
use crate::game::systems::optimizer::optimize_move;
use crate::game::systems::{can_cast, cast_push, move_to, should_cast_push, TurnContext};
use crate::util::vec2::Vec2;

/// Where and when a unit meets a moving creature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interception {
    /// Turns until contact; equals the simulation bound when none was found
    pub step: u32,
    pub aim: Vec2,
}

/// Lead-intercept a creature from `from`
pub fn intercept(from: Vec2, target: &Entity, config: &EngineConfig) -> Interception {
    let mut next = target.pos;
    for s in 0..config.intercept_steps {
        next += target.vel;
        let step = (from.distance_to(next) / config.unit_speed) as u32;
        if step <= s {
            return Interception { step, aim: next };
        }
    }
    Interception {
        step: config.intercept_steps,
        aim: next,
    }
}

// ============================================================================
// Urgent defense
// ============================================================================

/// Send the closest unlocked unit at the most pressing creature near our base
pub fn urgent_defense(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    let data = ctx.data;
    let urgent_radius = URGENT_FACTOR * config.base_detect_radius;

    let mut creature = None;
    let mut best = f32::INFINITY;
    for &c in &data.creatures {
        let e = &snap.entities[c];
        let dist = data.base_dist(ME, c);
        let pressing = e.near_base == BaseSide::Friendly
            || (e.threat == BaseSide::Friendly && dist < urgent_radius);
        if pressing && dist < best {
            best = dist;
            creature = Some(c);
        }
    }
    let Some(creature) = creature else {
        return;
    };

    let mut unit = None;
    let mut best = f32::INFINITY;
    for &u in &data.units {
        if snap.entities[u].locked {
            continue;
        }
        let d = data.unit_dist(u, creature);
        if d < best {
            best = d;
            unit = Some(u);
        }
    }
    let Some(unit) = unit else {
        return;
    };

    snap.entities[unit].target = Some(snap.entities[creature].id);
    snap.entities[creature].engaged_by += 1;

    let base_dist = data.base_dist(ME, creature);
    let push_ok = if config.policy.urgent_push_predicate {
        should_cast_push(ctx, snap, unit, creature)
    } else {
        base_dist <= config.creature_speed + config.base_kill_radius
    };

    if push_ok
        && can_cast(ctx, snap, unit, creature, config.push_radius)
        && base_dist < config.base_zone_radius
    {
        let dest = snap.players[OP].base;
        cast_push(ctx, snap, unit, creature, dest);
        tracing::debug!(
            unit = snap.entities[unit].id,
            creature = snap.entities[creature].id,
            base_dist,
            "Urgent push"
        );
        return;
    }

    let hit = intercept(snap.entities[unit].pos, &snap.entities[creature], config);
    let mut dest = hit.aim;
    if config.policy.urgent_multi_target && hit.step <= config.multi_target_step_max {
        if let Some(better) = optimize_move(ctx, snap, unit, Some(creature), hit.aim, hit.step) {
            dest = better;
        }
    }
    move_to(snap, unit, dest);
    tracing::debug!(
        unit = snap.entities[unit].id,
        creature = snap.entities[creature].id,
        step = hit.step,
        "Urgent intercept"
    );
}

// ============================================================================
// Per-unit scoring
// ============================================================================

/// Another free unit is strictly closer to the creature
fn closer_unit_available(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> bool {
    let dist = ctx.data.unit_dist(unit, creature);
    ctx.data
        .units
        .iter()
        .filter(|&&u| u != unit && snap.entities[u].is_free())
        .any(|&u| ctx.data.unit_dist(u, creature) < dist)
}

/// The creature would reach our base before the unit could catch it
fn out_of_reach(ctx: &TurnContext, unit: usize, creature: usize) -> bool {
    let c = ctx.config;
    let reach = c.push_radius
        + (c.unit_speed - c.creature_speed) * ctx.data.base_dist(ME, creature)
            / c.creature_speed.max(EPSILON);
    ctx.data.unit_dist(unit, creature) > reach
}

/// Defenders stay close to an invader
fn strays_from_invader(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> bool {
    if !ctx.config.policy.stay_near_enemy || snap.entities[unit].role != Role::Defender {
        return false;
    }
    match ctx.data.enemy_in_base {
        Some(enemy) => ctx.data.enemy_dist(enemy, creature) > NEAR_ENEMY_DIST,
        None => false,
    }
}

/// Creatures deep in the hostile base are left alone
fn inside_hostile_base(ctx: &TurnContext, creature: usize) -> bool {
    ctx.data.base_dist(OP, creature) <= ATTACK_INNER_FACTOR * ctx.config.base_zone_radius
}

/// Defenders keep to a window around our base
fn outside_defense_window(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> bool {
    if !ctx.config.policy.restrict_defender || snap.entities[unit].role != Role::Defender {
        return false;
    }
    let zone = ctx.config.base_zone_radius;
    let dist_my = ctx.data.base_dist(ME, creature);
    match ctx.data.enemy_in_base {
        Some(enemy) => {
            dist_my > INVASION_FACTOR * zone
                || ctx.data.enemy_dist(enemy, creature) > ctx.config.charm_radius
        }
        None => dist_my > DEFENSE_FACTOR * zone,
    }
}

/// The creature leaves the battlefield before it can be reached
fn doomed(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> bool {
    if !ctx.config.policy.ignore_doomed {
        return false;
    }
    let c = &snap.entities[creature];
    let hit = intercept(snap.entities[unit].pos, c, ctx.config);
    !ctx.bounds.contains(hit.aim - c.vel)
}

/// Role-dependent value of a creature, or `None` when the role rejects it
fn role_value(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> Option<f32> {
    let c = &snap.entities[creature];
    let zone = ctx.config.base_zone_radius;
    let engaged_ok = c.engaged_by < MAX_ENGAGED;

    if snap.entities[unit].role == Role::Attacker {
        let dist_op = ctx.data.base_dist(OP, creature);
        if dist_op > ATTACK_OUTER_FACTOR * zone || dist_op < ATTACK_INNER_FACTOR * zone {
            return None;
        }
        if c.threat != BaseSide::Hostile && engaged_ok {
            return Some(THREAT_WEIGHT / dist_op.max(EPSILON));
        }
        return Some(0.0);
    }

    let dist_my = ctx.data.base_dist(ME, creature).max(EPSILON);
    let mut value = 0.0;
    if c.threat == BaseSide::Friendly && engaged_ok {
        value += THREAT_WEIGHT / dist_my;
    }
    if c.near_base == BaseSide::Friendly && engaged_ok {
        value += NEAR_BASE_WEIGHT / dist_my;
    }
    Some(value)
}

/// Score of `creature` for `unit`, `None` when a rule rejects it
pub fn score_creature(ctx: &TurnContext, snap: &Snapshot, unit: usize, creature: usize) -> Option<f32> {
    let mut eval = if snap.entities[creature].engaged_by == 0 {
        UNENGAGED_BONUS
    } else {
        0.0
    };

    if ctx.config.policy.leave_target_to_nearest && closer_unit_available(ctx, snap, unit, creature) {
        return None;
    }
    if out_of_reach(ctx, unit, creature)
        || strays_from_invader(ctx, snap, unit, creature)
        || inside_hostile_base(ctx, creature)
        || outside_defense_window(ctx, snap, unit, creature)
        || doomed(ctx, snap, unit, creature)
    {
        return None;
    }

    eval += role_value(ctx, snap, unit, creature)?;

    if eval > 0.0 {
        eval /= ctx.data.unit_dist(unit, creature) + 1.0;
    }
    Some(eval)
}

/// Pick and chase a target for every free unit
pub fn assign_targets(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;

    for &unit in &ctx.data.units {
        if ctx.clock.exceeded() {
            tracing::warn!(
                elapsed_ms = ctx.clock.elapsed().as_millis() as u64,
                "Turn budget spent during targeting"
            );
            return;
        }
        if !snap.entities[unit].is_free() {
            continue;
        }

        let mut best = None;
        let mut best_eval = f32::NEG_INFINITY;
        for &creature in &ctx.data.creatures {
            if let Some(eval) = score_creature(ctx, snap, unit, creature) {
                if eval > best_eval {
                    best_eval = eval;
                    best = Some(creature);
                }
            }
        }
        let Some(target) = best else {
            continue;
        };

        snap.entities[target].engaged_by += 1;
        snap.entities[unit].target = Some(snap.entities[target].id);

        let hit = intercept(snap.entities[unit].pos, &snap.entities[target], config);
        let mut dest = hit.aim;
        let role = snap.entities[unit].role;

        let op_base = snap.players[OP].base;
        if role == Role::Attacker && ctx.data.base_dist(OP, unit) < config.base_detect_radius {
            let target_pos = snap.entities[target].pos;
            dest = target_pos + target_pos.direction_to(op_base) * (config.push_radius - ATTACK_STANDOFF);
        }

        if config.policy.multi_target && hit.step <= config.multi_target_step_max && role != Role::Attacker {
            if let Some(better) = optimize_move(ctx, snap, unit, Some(target), hit.aim, hit.step) {
                dest = better;
            }
        }

        move_to(snap, unit, dest);
        tracing::debug!(
            unit = snap.entities[unit].id,
            target = snap.entities[target].id,
            eval = best_eval,
            step = hit.step,
            steps_left = ctx.data.steps_before_out(target),
            "Target assigned"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Action, Strategy};
    use crate::game::systems::testing::Fixture;

    #[test]
    fn test_intercept_stationary_within_reach() {
        let config = EngineConfig::default();
        let target = Entity::creature(10, Vec2::new(1500.0, 1000.0), Vec2::ZERO, 10);
        let hit = intercept(Vec2::new(1000.0, 1000.0), &target, &config);
        assert_eq!(hit, Interception { step: 0, aim: target.pos });
    }

    #[test]
    fn test_intercept_moving_target() {
        let config = EngineConfig::default();
        let target = Entity::creature(10, Vec2::new(4000.0, 0.0), Vec2::new(-400.0, 0.0), 10);
        let hit = intercept(Vec2::ZERO, &target, &config);
        // Fourth projection lands at x = 2400, three turns away
        assert_eq!(hit.step, 3);
        assert_eq!(hit.aim, Vec2::new(2400.0, 0.0));
    }

    #[test]
    fn test_intercept_out_of_reach() {
        let config = EngineConfig::default();
        let target = Entity::creature(10, Vec2::new(1000.0, 0.0), Vec2::new(900.0, 0.0), 10);
        let hit = intercept(Vec2::ZERO, &target, &config);
        assert_eq!(hit.step, 20);
        assert_eq!(hit.aim, Vec2::new(19000.0, 0.0));
    }

    #[test]
    fn test_urgent_push_toward_hostile_base() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(1000.0, 1000.0)));
        let mut creature = Entity::creature(10, Vec2::new(500.0, 500.0), Vec2::new(-283.0, -283.0), 4);
        creature.near_base = BaseSide::Friendly;
        creature.threat = BaseSide::Friendly;
        let c = fx.push(creature);
        fx.snap.me_mut().mana = 20;
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);
        let mut snap = fx.snap.clone();

        urgent_defense(&ctx, &mut snap);
        assert_eq!(snap.action_of(unit), Action::Push(Vec2::new(18130.0, 9500.0)));
        assert_eq!(snap.entities[unit].target, Some(10));
        assert_eq!(snap.entities[c].engaged_by, 1);
        assert_eq!(snap.me().mana, 10);
    }

    #[test]
    fn test_urgent_intercept_without_mana() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(1000.0, 1000.0)));
        let mut creature = Entity::creature(10, Vec2::new(3000.0, 3000.0), Vec2::new(-283.0, -283.0), 14);
        creature.near_base = BaseSide::Friendly;
        fx.push(creature);
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);
        let mut snap = fx.snap.clone();

        urgent_defense(&ctx, &mut snap);
        assert!(matches!(snap.action_of(unit), Action::Move(_)));
        assert_eq!(snap.entities[unit].target, Some(10));
    }

    #[test]
    fn test_nearest_unit_keeps_target() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let near = fx.push(Entity::unit(0, Vec2::new(4000.0, 4000.0)));
        let far = fx.push(Entity::unit(1, Vec2::new(7000.0, 4000.0)));
        let mut creature = Entity::creature(10, Vec2::new(4500.0, 4000.0), Vec2::ZERO, 10);
        creature.threat = BaseSide::Friendly;
        let c = fx.push(creature);
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        assert!(score_creature(&ctx, &fx.snap, near, c).is_some());
        assert_eq!(score_creature(&ctx, &fx.snap, far, c), None);

        let mut snap = fx.snap.clone();
        assign_targets(&ctx, &mut snap);
        assert_eq!(snap.entities[near].target, Some(10));
    }

    #[test]
    fn test_threatening_creature_preferred() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(5000.0, 5000.0)));
        fx.push(Entity::creature(10, Vec2::new(6500.0, 5000.0), Vec2::ZERO, 10));
        let mut threat = Entity::creature(12, Vec2::new(4000.0, 5000.0), Vec2::ZERO, 10);
        threat.threat = BaseSide::Friendly;
        fx.push(threat);
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);
        let mut snap = fx.snap.clone();

        assign_targets(&ctx, &mut snap);
        assert_eq!(snap.entities[unit].target, Some(12));
    }

    #[test]
    fn test_creatures_inside_hostile_base_ignored() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(15000.0, 8000.0)));
        fx.push(Entity::creature(10, Vec2::new(15500.0, 8000.0), Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);
        let mut snap = fx.snap.clone();

        assign_targets(&ctx, &mut snap);
        assert_eq!(snap.entities[unit].target, None);
        assert_eq!(snap.action_of(unit), Action::Hold);
    }

    #[test]
    fn test_doomed_creature_ignored() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let unit = fx.push(Entity::unit(0, Vec2::new(8000.0, 1500.0)));
        // Leaves through the top edge next turn
        fx.push(Entity::creature(10, Vec2::new(8000.0, 200.0), Vec2::new(0.0, -400.0), 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Farm);

        assert_eq!(score_creature(&ctx, &fx.snap, unit, 1), None);
    }

    #[test]
    fn test_attacker_lines_up_push() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let mut attacker = Entity::unit(0, Vec2::new(13000.0, 6000.0));
        attacker.role = Role::Attacker;
        let unit = fx.push(attacker);
        let target_pos = Vec2::new(13000.0, 5500.0);
        fx.push(Entity::creature(10, target_pos, Vec2::ZERO, 10));
        let data = fx.data();
        let ctx = fx.context(&data, Strategy::Attack);
        let mut snap = fx.snap.clone();

        assign_targets(&ctx, &mut snap);
        assert_eq!(snap.entities[unit].target, Some(10));
        let op_base = snap.op().base;
        let expected = target_pos + target_pos.direction_to(op_base) * 1180.0;
        match snap.action_of(unit) {
            Action::Move(dest) => assert!(dest.approx_eq(expected, 1e-2)),
            other => panic!("expected a move, got {:?}", other),
        }
    }
}
