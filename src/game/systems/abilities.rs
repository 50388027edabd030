//! Ability policy
//!
//! Ordered rule passes run after targeting. Each pass walks the candidates in
//! scan order, casts through the shared helpers, and stops once mana no
//! longer covers another cast.

use crate::game::constants::abilities::{
    ATTACK_PUSH_HEALTH_MIN, CHARM_HEALTH_MIN, CHARM_LIGHT_HEALTH_MAX, PUSH_KEEP_MANA,
};
use crate::game::state::{BaseSide, Role, Snapshot, Strategy, ME, OP};
use crate::game::systems::{
    can_cast, can_kill_this_turn, cast_charm, cast_push, cast_shield, closest_free_unit,
    closest_unit, move_to, should_cast_push, TurnContext,
};

fn out_of_mana(ctx: &TurnContext, snap: &Snapshot) -> bool {
    !snap.me().can_afford(ctx.config.spell_cost)
}

/// Push creatures already inside our base back toward the hostile base
pub fn defensive_push(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    if !config.policy.defensive_push || snap.me().mana < PUSH_KEEP_MANA + config.spell_cost {
        return;
    }

    for &c in &ctx.data.creatures {
        let creature = &snap.entities[c];
        if creature.near_base != BaseSide::Friendly || !creature.is_castable() {
            continue;
        }
        let Some(unit) = closest_free_unit(ctx, snap, c) else {
            continue;
        };
        if can_kill_this_turn(ctx, snap, unit, c) {
            continue;
        }
        if ctx.data.base_dist(ME, c) > config.creature_speed + config.base_kill_radius {
            continue;
        }
        if !config.policy.always_push_out && !should_cast_push(ctx, snap, unit, c) {
            continue;
        }
        if can_cast(ctx, snap, unit, c, config.push_radius) {
            let dest = snap.players[OP].base;
            cast_push(ctx, snap, unit, c, dest);
            if out_of_mana(ctx, snap) {
                break;
            }
        }
    }
}

/// Redirect wandering creatures toward the hostile base
pub fn charm_creatures(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    if !config.policy.charm_creatures || out_of_mana(ctx, snap) {
        return;
    }

    for &c in &ctx.data.creatures {
        let creature = &snap.entities[c];
        if creature.near_base != BaseSide::Neither || !creature.is_castable() || creature.charmed {
            continue;
        }
        let Some(unit) = closest_unit(ctx, c) else {
            continue;
        };
        if can_kill_this_turn(ctx, snap, unit, c) {
            continue;
        }

        let creature = &snap.entities[c];
        let wanted = if snap.entities[unit].role == Role::Attacker {
            creature.threat != BaseSide::Hostile && creature.health < CHARM_LIGHT_HEALTH_MAX
        } else {
            creature.threat == BaseSide::Friendly && creature.health >= CHARM_HEALTH_MIN
        };
        if !wanted {
            continue;
        }

        if can_cast(ctx, snap, unit, c, config.charm_radius) {
            let dest = snap.players[OP].base;
            cast_charm(ctx, snap, unit, c, dest);
            if out_of_mana(ctx, snap) {
                break;
            }
        }
    }
}

/// Shield our units from an opponent known to charm them
///
/// The back defender also walks toward an invader it is not already busy with.
pub fn shield_self(ctx: &TurnContext, snap: &mut Snapshot, enemy_uses_charm: bool) {
    let config = ctx.config;
    if !config.policy.shield_self {
        return;
    }

    if enemy_uses_charm && !out_of_mana(ctx, snap) {
        let threat_radius = config.threat_radius_factor * config.base_detect_radius;
        let enemy_can_cast = snap.op().can_afford(config.spell_cost);

        'enemies: for &enemy in &ctx.data.enemies {
            if !config.policy.shield_from_all_enemies && ctx.data.enemy_in_base != Some(enemy) {
                continue;
            }
            if ctx.data.base_dist(ME, enemy) > threat_radius {
                continue;
            }
            for &unit in &ctx.data.units {
                if !snap.entities[unit].is_castable() || !enemy_can_cast {
                    continue;
                }
                if ctx.data.enemy_dist(enemy, unit) > config.charm_radius {
                    continue;
                }
                if can_cast(ctx, snap, unit, unit, config.shield_radius) {
                    cast_shield(ctx, snap, unit, unit);
                    if out_of_mana(ctx, snap) {
                        break 'enemies;
                    }
                }
            }
        }
    }

    if config.policy.chase_enemy_in_base {
        if let (Some(enemy), Some(back)) = (ctx.data.enemy_in_base, ctx.formation.back) {
            let unit = &snap.entities[back];
            if unit.role == Role::Defender && unit.target.is_none() && !unit.locked {
                let dest = snap.entities[enemy].pos;
                move_to(snap, back, dest);
                tracing::debug!(unit = snap.entities[back].id, "Chasing invader");
            }
        }
    }
}

/// Protect creatures that are already eating into the hostile base
pub fn shield_allies(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    if !config.policy.shield_allies || ctx.strategy != Strategy::Attack || out_of_mana(ctx, snap) {
        return;
    }

    for &c in &ctx.data.creatures {
        let creature = &snap.entities[c];
        if !creature.is_castable() || creature.near_base != BaseSide::Hostile {
            continue;
        }
        let Some(unit) = closest_unit(ctx, c) else {
            continue;
        };
        if can_kill_this_turn(ctx, snap, unit, c) {
            continue;
        }
        if can_cast(ctx, snap, unit, c, config.shield_radius) {
            cast_shield(ctx, snap, unit, c);
            if out_of_mana(ctx, snap) {
                break;
            }
        }
    }
}

/// Push creatures close to the hostile base into it
pub fn offensive_push(ctx: &TurnContext, snap: &mut Snapshot) {
    let config = ctx.config;
    if !config.policy.offensive_push || out_of_mana(ctx, snap) {
        return;
    }

    for &c in &ctx.data.creatures {
        let creature = &snap.entities[c];
        if !creature.is_castable() {
            continue;
        }
        let dist_op = ctx.data.base_dist(OP, c);

        // Light creatures only count if the push lands them on the base
        if creature.health < ATTACK_PUSH_HEALTH_MIN
            && dist_op > config.push_distance + config.base_kill_radius
        {
            continue;
        }
        if ctx.strategy != Strategy::Attack && dist_op > config.base_zone_radius {
            continue;
        }
        let in_range = config.policy.always_push_in_base
            && dist_op <= config.base_zone_radius + config.push_distance;
        if !in_range {
            continue;
        }

        let Some(unit) = closest_unit(ctx, c) else {
            continue;
        };
        if can_kill_this_turn(ctx, snap, unit, c) {
            continue;
        }
        if can_cast(ctx, snap, unit, c, config.push_radius) {
            let dest = snap.players[OP].base;
            cast_push(ctx, snap, unit, c, dest);
            if out_of_mana(ctx, snap) {
                break;
            }
        }
    }
}
