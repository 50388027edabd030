//! Strategy selection and role assignment
//!
//! The strategy is evaluated once per turn; its quota decides how many
//! units play each role. Units are ranked by their position relative to both
//! bases (back, mid, front) and roles are handed out along that ranking.

use crate::config::{EngineConfig, RoleQuota};
use crate::game::state::{EntityKind, Player, Role, Snapshot, Strategy, ME, OP};
use crate::game::turn_data::TurnData;

/// Persistent strategy state carried across turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyState {
    pub current: Strategy,
    /// Creatures charmed toward the gather point since the rush started
    pub rush_counter: u32,
}

impl StrategyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the state machine once for this turn
    pub fn update(&mut self, turn: u32, me: &Player, op: &Player, config: &EngineConfig) -> Strategy {
        let t = &config.thresholds;
        let policy = &config.policy;
        let previous = self.current;

        if self.current != Strategy::Rush
            && (turn >= t.attack_turn_min || me.mana >= t.attack_mana_min)
        {
            self.current = Strategy::Attack;
        }
        if self.current == Strategy::Attack && me.mana < t.attack_cancel_mana {
            self.current = Strategy::Farm;
        }

        if policy.rush_enabled {
            if turn >= t.rush_turn_min || me.mana >= t.rush_mana_min {
                if self.current != Strategy::Rush {
                    self.rush_counter = 0;
                }
                self.current = Strategy::Rush;
            }
            if self.current == Strategy::Rush && me.mana < t.rush_cancel_mana {
                self.current = Strategy::Farm;
            }
        }

        if policy.attack_if_losing && me.health < op.health && self.current != Strategy::Rush {
            self.current = Strategy::Attack;
        }
        if policy.defense_if_winning && me.health > op.health {
            self.current = Strategy::Defense;
        }

        if self.current != previous {
            tracing::info!(
                turn,
                from = ?previous,
                to = ?self.current,
                mana = me.mana,
                "Strategy changed"
            );
        }

        self.current
    }
}

/// Units ranked by position: back is closest to our base, front closest to theirs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formation {
    pub back: Option<usize>,
    pub mid: Option<usize>,
    pub front: Option<usize>,
}

/// Rank our units; the first unit in input order wins distance ties
pub fn rank_units(snap: &Snapshot, data: &TurnData) -> Formation {
    let closest = |player: usize, skip: &[Option<usize>]| -> Option<usize> {
        let mut best = None;
        let mut best_dist = f32::INFINITY;
        for &u in &data.units {
            if skip.contains(&Some(u)) {
                continue;
            }
            let d = snap.players[player].base.distance_to(snap.entities[u].pos);
            if d < best_dist {
                best_dist = d;
                best = Some(u);
            }
        }
        best
    };

    let back = closest(ME, &[]);
    let front = closest(OP, &[back]);
    let mid = data
        .units
        .iter()
        .copied()
        .filter(|&u| Some(u) != back && Some(u) != front)
        .last();

    Formation { back, mid, front }
}

/// Reset roles and hand them out following the quota
pub fn assign_roles(snap: &mut Snapshot, formation: &Formation, quota: RoleQuota) {
    for e in snap.entities.iter_mut() {
        if e.kind == EntityKind::Unit {
            e.role = Role::Farmer;
            e.role_rank = 0;
        }
    }

    let Formation { back, mid, front } = *formation;
    let mut set = |slot: Option<usize>, role: Role, rank: Option<u8>| {
        if let Some(idx) = slot {
            let e = &mut snap.entities[idx];
            e.role = role;
            if let Some(rank) = rank {
                e.role_rank = rank;
            }
        }
    };

    let orders: [(u8, Role, [Option<usize>; 3]); 3] = [
        (quota.farmers, Role::Farmer, [mid, front, back]),
        (quota.attackers, Role::Attacker, [front, mid, back]),
        (quota.defenders, Role::Defender, [back, mid, front]),
    ];
    for (count, role, order) in orders {
        for &slot in order.iter().take(count as usize) {
            set(slot, role, None);
        }
    }

    if quota.farmers == 2 {
        set(front, Role::Farmer, Some(0));
        set(mid, Role::Farmer, Some(1));
    }

    for (rank, &slot) in [front, mid, back].iter().take(quota.rushers as usize).enumerate() {
        set(slot, Role::Rusher, Some(rank as u8));
    }
}
