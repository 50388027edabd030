//! Rush plan
//!
//! Played while the strategy is Rush. The front and mid units try to finish
//! the hostile base with chained pushes; otherwise the second rusher gathers
//! creatures toward a staging area while both rushers hold their posts.

use crate::game::constants::posts::{GATHER, RUSH};
use crate::game::constants::search::RUSH_STEP_BUDGET;
use crate::game::constants::strategy::RUSH_HORIZONTAL_SLACK;
use crate::game::state::{BaseSide, Role, Snapshot, Strategy, OP};
use crate::game::strategy::StrategyState;
use crate::game::systems::optimizer::optimize_move;
use crate::game::systems::{
    can_cast, can_kill_this_turn, cast_charm, cast_push, move_to, TurnContext,
};
use crate::util::vec2::Vec2;

/// Run the rush plan; returns true when the rush was aborted this turn
pub fn play(ctx: &TurnContext, snap: &mut Snapshot, state: &mut StrategyState) -> bool {
    let finish_cost = snap.op().health * ctx.config.thresholds.rush_mana_per_health;

    charm_defender_away(ctx, snap, finish_cost);
    sure_kill(ctx, snap);
    prepared_kill(ctx, snap);
    gather(ctx, snap, state);
    stage(ctx, snap);

    if ctx.config.policy.rush_abort && snap.me().mana < finish_cost {
        state.current = Strategy::Farm;
        for slot in [ctx.formation.front, ctx.formation.mid].into_iter().flatten() {
            snap.entities[slot].role = Role::Farmer;
        }
        tracing::info!(
            mana = snap.me().mana,
            needed = finish_cost,
            "Rush aborted"
        );
        return true;
    }
    false
}

/// Front unit charms a hostile unit guarding its base out of the way
fn charm_defender_away(ctx: &TurnContext, snap: &mut Snapshot, finish_cost: i32) {
    let (Some(enemy), Some(front)) = (ctx.data.enemy_near_op_base, ctx.formation.front) else {
        return;
    };
    if snap.me().mana < finish_cost || snap.entities[front].locked {
        return;
    }
    if ctx.data.base_dist(OP, front) > ctx.config.base_detect_radius {
        return;
    }

    if can_cast(ctx, snap, front, enemy, ctx.config.charm_radius) {
        let away = Vec2::new(
            (ctx.bounds.width / 2.0).floor(),
            ctx.bounds.height - snap.entities[enemy].pos.y,
        );
        cast_charm(ctx, snap, front, enemy, away);
    } else {
        let dest = snap.entities[enemy].pos;
        move_to(snap, front, dest);
    }
    snap.entities[front].locked = true;
}

/// Two pushes in the same turn that carry a creature onto the hostile base
fn sure_kill(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    let (Some(front), Some(mid)) = (ctx.formation.front, ctx.formation.mid) else {
        return;
    };
    if snap.me().mana < 2 * config.spell_cost {
        return;
    }
    let reach = config.base_kill_radius + 2.0 * config.push_distance + config.creature_speed;

    for &c in &ctx.data.creatures {
        if ctx.data.base_dist(OP, c) > reach {
            continue;
        }
        if !can_cast(ctx, snap, front, c, config.push_radius)
            || !can_cast(ctx, snap, mid, c, config.push_radius)
        {
            continue;
        }
        let dest = snap.players[OP].base;
        cast_push(ctx, snap, front, c, dest);
        cast_push(ctx, snap, mid, c, dest);
        snap.entities[front].locked = true;
        snap.entities[mid].locked = true;
        tracing::debug!(creature = snap.entities[c].id, "Rush sure kill");
        break;
    }
}

/// One unit pushes while the other moves next to where the creature lands
fn prepared_kill(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    let (Some(front), Some(mid)) = (ctx.formation.front, ctx.formation.mid) else {
        return;
    };
    if snap.me().mana < 3 * config.spell_cost
        || snap.entities[front].locked
        || snap.entities[mid].locked
    {
        return;
    }
    let reach = config.base_kill_radius + 3.0 * config.push_distance + config.creature_speed;
    let op_base = snap.players[OP].base;

    for &c in &ctx.data.creatures {
        if ctx.data.base_dist(OP, c) > reach {
            continue;
        }
        let pos = snap.entities[c].pos;
        let landing = pos + pos.direction_to(op_base) * config.push_distance;

        let pairs = [(front, mid), (mid, front)];
        let chosen = pairs.into_iter().find(|&(pusher, follower)| {
            ctx.data.unit_dist(pusher, c) < config.push_radius
                && landing.distance_to(snap.entities[pusher].pos) < config.push_radius
                && landing.distance_to(snap.entities[follower].pos)
                    < config.push_radius + config.unit_speed
                && can_cast(ctx, snap, pusher, c, config.push_radius)
        });
        let Some((pusher, follower)) = chosen else {
            continue;
        };

        if landing.distance_to(snap.entities[follower].pos) > config.push_radius {
            move_to(snap, follower, landing);
        }
        cast_push(ctx, snap, pusher, c, op_base);
        snap.entities[front].locked = true;
        snap.entities[mid].locked = true;
        tracing::debug!(creature = snap.entities[c].id, "Rush prepared kill");
        break;
    }
}

/// Best creature for `unit` to charm toward the gather point
fn gather_candidate(ctx: &TurnContext, snap: &Snapshot, unit: usize) -> Option<usize> {
    let center_y = ctx.bounds.center().y;
    let mut best = None;
    let mut best_dist = f32::INFINITY;

    for &c in &ctx.data.creatures {
        let e = &snap.entities[c];
        if e.near_base != BaseSide::Neither
            || e.threat == BaseSide::Hostile
            || e.charmed
            || !e.is_castable()
            || can_kill_this_turn(ctx, snap, unit, c)
            || !ctx.orientation.on_our_half(e.pos.y, center_y)
            || ctx.data.unit_dist(unit, c) > ctx.config.charm_radius
        {
            continue;
        }
        let dist = ctx.data.base_dist(OP, c);
        if dist < best_dist {
            best_dist = dist;
            best = Some(c);
        }
    }
    best
}

/// Trailing rushers charm creatures toward the gather point
fn gather(ctx: &TurnContext, snap: &mut Snapshot, state: &mut StrategyState) {
    let config = ctx.config;
    let gather_point = ctx.post(GATHER);

    for &unit in &ctx.data.units {
        let u = &snap.entities[unit];
        if u.role != Role::Rusher || u.role_rank == 0 || u.locked {
            continue;
        }
        if snap.me().mana < config.thresholds.rush_gather_keep_mana + config.spell_cost {
            return;
        }
        let Some(c) = gather_candidate(ctx, snap, unit) else {
            continue;
        };
        if can_cast(ctx, snap, unit, c, config.charm_radius) {
            cast_charm(ctx, snap, unit, c, gather_point);
            state.rush_counter += 1;
            snap.entities[unit].locked = true;
            tracing::debug!(
                unit = snap.entities[unit].id,
                gathered = state.rush_counter,
                "Creature gathered"
            );
        }
    }
}

/// Remaining rushers walk to their posts without killing anything on the way
fn stage(ctx: &TurnContext, snap: &mut Snapshot) {
    for &unit in &ctx.data.units {
        let u = &snap.entities[unit];
        if u.role != Role::Rusher || u.locked {
            continue;
        }
        let rank = (u.role_rank as usize).min(RUSH.len() - 1);
        let mut post = ctx.post(RUSH[rank]);
        if u.pos == post {
            continue;
        }
        if ctx.config.policy.rush_horizontal_collect
            && rank == 1
            && (u.pos.y - post.y).abs() > RUSH_HORIZONTAL_SLACK
        {
            post.x = u.pos.x;
        }

        let dest = optimize_move(ctx, snap, unit, None, post, RUSH_STEP_BUDGET).unwrap_or(post);
        move_to(snap, unit, dest);
        snap.entities[unit].locked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Action, Entity};
    use crate::game::strategy::Formation;
    use crate::game::systems::testing::Fixture;

    fn rusher(id: i32, pos: Vec2, rank: u8) -> Entity {
        let mut u = Entity::unit(id, pos);
        u.role = Role::Rusher;
        u.role_rank = rank;
        u
    }

    #[test]
    fn test_sure_kill_uses_both_rushers() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let front = fx.push(rusher(0, Vec2::new(13000.0, 7000.0), 0));
        let mid = fx.push(rusher(1, Vec2::new(13000.0, 8000.0), 1));
        fx.push(Entity::creature(10, Vec2::new(13500.0, 7500.0), Vec2::ZERO, 20));
        fx.snap.me_mut().mana = 100;
        fx.snap.players[OP].health = 1;
        let data = fx.data();
        let mut ctx = fx.context(&data, Strategy::Rush);
        ctx.formation = Formation { back: None, mid: Some(mid), front: Some(front) };
        let mut snap = fx.snap.clone();
        let mut state = StrategyState { current: Strategy::Rush, rush_counter: 0 };

        let aborted = play(&ctx, &mut snap, &mut state);
        assert!(!aborted);
        assert!(matches!(snap.action_of(front), Action::Push(_)));
        assert!(matches!(snap.action_of(mid), Action::Push(_)));
        assert_eq!(snap.me().mana, 80);
    }

    #[test]
    fn test_gather_counts_charmed_creatures() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let front = fx.push(rusher(0, Vec2::new(12930.0, 8600.0), 0));
        let mid = fx.push(rusher(1, Vec2::new(6000.0, 7000.0), 1));
        fx.push(Entity::creature(10, Vec2::new(6500.0, 7500.0), Vec2::new(0.0, 400.0), 14));
        fx.snap.me_mut().mana = 120;
        fx.snap.players[OP].health = 3;
        let data = fx.data();
        let mut ctx = fx.context(&data, Strategy::Rush);
        ctx.formation = Formation { back: None, mid: Some(mid), front: Some(front) };
        let mut snap = fx.snap.clone();
        let mut state = StrategyState { current: Strategy::Rush, rush_counter: 0 };

        play(&ctx, &mut snap, &mut state);
        assert_eq!(snap.action_of(mid), Action::Charm(10, Vec2::new(12500.0, 8550.0)));
        assert_eq!(state.rush_counter, 1);
        // Front already stands on its post
        assert_eq!(snap.action_of(front), Action::Hold);
    }

    #[test]
    fn test_staging_moves_toward_post() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let front = fx.push(rusher(0, Vec2::new(9000.0, 8000.0), 0));
        let data = fx.data();
        let mut ctx = fx.context(&data, Strategy::Rush);
        ctx.formation = Formation { back: None, mid: None, front: Some(front) };
        let mut snap = fx.snap.clone();
        snap.me_mut().mana = 200;
        let mut state = StrategyState { current: Strategy::Rush, rush_counter: 0 };

        play(&ctx, &mut snap, &mut state);
        let post = Vec2::new(12930.0, 8600.0);
        match snap.action_of(front) {
            Action::Move(dest) => {
                assert!(dest.distance_to(Vec2::new(9000.0, 8000.0)) <= 800.0);
                assert!(dest.distance_to(post) < Vec2::new(9000.0, 8000.0).distance_to(post));
            }
            other => panic!("expected a move, got {:?}", other),
        }
        assert!(snap.entities[front].locked);
    }

    #[test]
    fn test_abort_without_finishing_mana() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let front = fx.push(rusher(0, Vec2::new(9000.0, 8000.0), 0));
        let mid = fx.push(rusher(1, Vec2::new(8000.0, 8000.0), 1));
        fx.snap.me_mut().mana = 20;
        fx.snap.players[OP].health = 3;
        let data = fx.data();
        let mut ctx = fx.context(&data, Strategy::Rush);
        ctx.formation = Formation { back: None, mid: Some(mid), front: Some(front) };
        let mut snap = fx.snap.clone();
        let mut state = StrategyState { current: Strategy::Rush, rush_counter: 2 };

        assert!(play(&ctx, &mut snap, &mut state));
        assert_eq!(state.current, Strategy::Farm);
        assert_eq!(snap.entities[front].role, Role::Farmer);
        assert_eq!(snap.entities[mid].role, Role::Farmer);
    }

    #[test]
    fn test_charm_guard_away_from_hostile_base() {
        let mut fx = Fixture::new(Vec2::ZERO);
        let front = fx.push(rusher(0, Vec2::new(14000.0, 7000.0), 0));
        let guard = fx.push(Entity::enemy(3, Vec2::new(15000.0, 7500.0)));
        fx.snap.me_mut().mana = 100;
        fx.snap.players[OP].health = 3;
        let data = fx.data();
        let mut ctx = fx.context(&data, Strategy::Rush);
        ctx.formation = Formation { back: None, mid: None, front: Some(front) };
        let mut snap = fx.snap.clone();
        let mut state = StrategyState { current: Strategy::Rush, rush_counter: 0 };

        play(&ctx, &mut snap, &mut state);
        assert_eq!(snap.action_of(front), Action::Charm(3, Vec2::new(8815.0, 1500.0)));
        assert!(snap.entities[guard].charmed);
    }
}
