//! Turn engine
//!
//! Owns everything that survives between turns (configuration, memory
//! snapshot, exploration grid, strategy state, entity lifecycles) and runs
//! the decision pipeline once per turn.

use smallvec::SmallVec;

use crate::config::EngineConfig;
use crate::game::constants::posts::FARM;
use crate::game::constants::timing::STATS_WINDOW;
use crate::game::estimator;
use crate::game::exploration::{ExplorationGrid, Zone};
use crate::game::performance::{TurnClock, TurnStats};
use crate::game::state::{
    Action, EntityId, EntityKind, LifecycleMap, Orientation, Role, Snapshot, Strategy,
    TurnInput, UNITS_PER_PLAYER,
};
use crate::game::strategy::{assign_roles, rank_units, StrategyState};
use crate::game::systems::optimizer::OffsetDisk;
use crate::game::systems::{abilities, move_to, rush, targeting, TurnContext};
use crate::game::turn_data::TurnData;
use crate::util::geometry::Bounds;
use crate::util::vec2::Vec2;

/// Actions for our units, in input order
pub type TurnActions = SmallVec<[(EntityId, Action); UNITS_PER_PLAYER]>;

/// Skips the remaining phases once the turn budget is spent
struct PhaseGate<'a> {
    clock: &'a TurnClock,
    turn: u32,
    tripped: bool,
}

impl<'a> PhaseGate<'a> {
    fn new(clock: &'a TurnClock, turn: u32) -> Self {
        Self {
            clock,
            turn,
            tripped: false,
        }
    }

    fn open(&mut self, phase: &'static str) -> bool {
        if self.tripped {
            return false;
        }
        if self.clock.exceeded() {
            self.tripped = true;
            tracing::warn!(
                turn = self.turn,
                phase,
                elapsed_ms = self.clock.elapsed().as_millis() as u64,
                budget_ms = self.clock.budget().as_millis() as u64,
                "Turn budget spent, emitting partial decisions"
            );
            return false;
        }
        true
    }
}

pub struct Engine {
    config: EngineConfig,
    bounds: Bounds,
    orientation: Orientation,
    my_base: Vec2,
    op_base: Vec2,
    grid: ExplorationGrid,
    disk: OffsetDisk,
    strategy: StrategyState,
    lifecycle: LifecycleMap,
    memory: Option<Snapshot>,
    enemy_uses_charm: bool,
    stats: TurnStats,
    turn: u32,
}

impl Engine {
    /// Set up the engine for a match where our base sits at `my_base`
    pub fn new(config: EngineConfig, my_base: Vec2) -> Self {
        let bounds = Bounds::new(config.board_width, config.board_height);
        let op_base = bounds.mirror(my_base);
        let orientation = Orientation::from_base(my_base, bounds);
        let grid = ExplorationGrid::new(&config, my_base, op_base, orientation);
        let disk = OffsetDisk::new(config.unit_speed, config.lattice_step);

        tracing::info!(
            my_base_x = my_base.x,
            my_base_y = my_base.y,
            orientation = ?orientation,
            offsets = disk.len(),
            "Engine initialized"
        );

        Self {
            config,
            bounds,
            orientation,
            my_base,
            op_base,
            grid,
            disk,
            strategy: StrategyState::new(),
            lifecycle: LifecycleMap::new(),
            memory: None,
            enemy_uses_charm: false,
            stats: TurnStats::new(STATS_WINDOW),
            turn: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy.current
    }

    pub fn rush_counter(&self) -> u32 {
        self.strategy.rush_counter
    }

    pub fn grid(&self) -> &ExplorationGrid {
        &self.grid
    }

    pub fn memory(&self) -> Option<&Snapshot> {
        self.memory.as_ref()
    }

    pub fn lifecycle(&self) -> &LifecycleMap {
        &self.lifecycle
    }

    pub fn stats(&self) -> &TurnStats {
        &self.stats
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn enemy_uses_charm(&self) -> bool {
        self.enemy_uses_charm
    }

    /// Decide one action per unit for this turn
    pub fn play_turn(&mut self, input: TurnInput) -> TurnActions {
        let turn = self.turn;
        let clock = TurnClock::start(self.config.budget_ms(turn));

        let mut snap = estimator::ingest(
            input,
            turn,
            self.my_base,
            self.op_base,
            &mut self.lifecycle,
            &self.config,
        );

        for idx in 0..snap.entities.len() {
            let unit = &snap.entities[idx];
            if unit.kind == EntityKind::Unit {
                if unit.charmed && !self.enemy_uses_charm {
                    self.enemy_uses_charm = true;
                    tracing::info!(turn, unit = unit.id, "Opponent charms our units");
                }
                snap.set_action(idx, Action::Hold);
            }
        }

        if self.config.policy.reconcile_memory {
            if let Some(memory) = &self.memory {
                estimator::reconcile(&mut snap, memory, &mut self.lifecycle, &self.config);
            }
        }
        if self.config.policy.mirror_synthesis {
            estimator::synthesize_mirrors(&mut snap, &mut self.lifecycle, &self.config);
        }

        let data = TurnData::build(&snap, &self.config);

        self.grid.observe(self.my_base, self.config.base_detect_radius);
        for &u in &data.units {
            self.grid.observe(snap.entities[u].pos, self.config.unit_detect_radius);
        }

        let strategy = self.strategy.update(turn, snap.me(), snap.op(), &self.config);
        let formation = rank_units(&snap, &data);
        assign_roles(&mut snap, &formation, self.config.quotas.for_strategy(strategy));

        let mut ctx = TurnContext {
            config: &self.config,
            data: &data,
            disk: &self.disk,
            clock: &clock,
            formation,
            bounds: self.bounds,
            orientation: self.orientation,
            strategy,
        };
        let mut gate = PhaseGate::new(&clock, turn);

        if strategy == Strategy::Rush && gate.open("rush") {
            rush::play(&ctx, &mut snap, &mut self.strategy);
            ctx.strategy = self.strategy.current;
        }

        if gate.open("exploration") {
            for &u in &data.units {
                let unit = &snap.entities[u];
                if unit.locked || (unit.role == Role::Attacker && !self.config.policy.attackers_explore) {
                    continue;
                }
                let zone = Zone::for_role(unit.role);
                if let Some((i, j)) = self.grid.select(unit.pos, zone) {
                    let dest = self.grid.cell_center(i, j);
                    move_to(&mut snap, u, dest);
                    tracing::debug!(unit = snap.entities[u].id, i, j, zone = ?zone, "Exploring");
                }
            }
        }

        if self.config.policy.fixed_farm_posts && gate.open("farm posts") {
            for &u in &data.units {
                let unit = &snap.entities[u];
                if unit.role != Role::Farmer || unit.locked {
                    continue;
                }
                let rank = (unit.role_rank as usize).min(FARM.len() - 1);
                let post = ctx.post(FARM[rank]);
                move_to(&mut snap, u, post);
                snap.entities[u].locked = true;
            }
        }

        if self.config.policy.urgent_defense && gate.open("urgent defense") {
            targeting::urgent_defense(&ctx, &mut snap);
        }
        if gate.open("targeting") {
            targeting::assign_targets(&ctx, &mut snap);
        }

        if gate.open("defensive push") {
            abilities::defensive_push(&ctx, &mut snap);
        }
        if gate.open("charm") {
            abilities::charm_creatures(&ctx, &mut snap);
        }
        if gate.open("shield self") {
            abilities::shield_self(&ctx, &mut snap, self.enemy_uses_charm);
        }
        if gate.open("shield allies") {
            abilities::shield_allies(&ctx, &mut snap);
        }
        if gate.open("offensive push") {
            abilities::offensive_push(&ctx, &mut snap);
        }

        let actions = snap.unit_actions();

        self.grid.end_turn();
        self.stats.record(clock.elapsed(), clock.budget());
        tracing::debug!(
            turn,
            strategy = ?self.strategy.current,
            mana = snap.me().mana,
            entities = data.entity_count(),
            elapsed_us = self.stats.last().as_micros() as u64,
            avg_us = self.stats.average().as_micros() as u64,
            samples = self.stats.samples(),
            status = ?self.stats.status(),
            "Turn complete"
        );

        self.memory = Some(snap);
        self.turn += 1;
        actions
    }
}
