//! Engine configuration
//!
//! `EngineConfig` carries every geometry, speed, spell, threshold and budget
//! parameter. `PolicyConfig` carries the behavior switches that select between
//! alternative heuristics at runtime.
//!
//! Loading order in `EngineConfig::load_or_default()`:
//! 1. `Default` values
//! 2. JSON overrides from the file named by `SKIRMISH_CONFIG` (missing fields keep defaults)
//! 3. Individual environment variables:
//!    - `SKIRMISH_TURN_BUDGET_MS` / `SKIRMISH_FIRST_TURN_BUDGET_MS`
//!    - `SKIRMISH_MAX_ENTITIES`
//!    - `SKIRMISH_ATTACK_TURN_MIN` / `SKIRMISH_ATTACK_MANA_MIN`
//!    - `SKIRMISH_RUSH_TURN_MIN` / `SKIRMISH_RUSH_MANA_MIN`
//!    - `SKIRMISH_RUSH_ENABLED` / `SKIRMISH_SHIELD_SELF`

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::game::constants::{
    base, board, creature, exploration, search, spell, strategy, targeting, timing, unit,
};
use crate::game::state::Strategy;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("{0}")]
    Inconsistent(String),
}

// ============================================================================
// Role quotas
// ============================================================================

/// Number of units handed to each role under one strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleQuota {
    pub farmers: u8,
    pub attackers: u8,
    pub defenders: u8,
    pub rushers: u8,
}

impl RoleQuota {
    pub const fn new(farmers: u8, attackers: u8, defenders: u8, rushers: u8) -> Self {
        Self {
            farmers,
            attackers,
            defenders,
            rushers,
        }
    }

    pub fn total(&self) -> u32 {
        self.farmers as u32 + self.attackers as u32 + self.defenders as u32 + self.rushers as u32
    }
}

/// Quotas per strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaTable {
    pub farm: RoleQuota,
    pub attack: RoleQuota,
    pub defense: RoleQuota,
    pub rush: RoleQuota,
}

impl Default for QuotaTable {
    fn default() -> Self {
        Self {
            farm: RoleQuota::new(2, 0, 1, 0),
            attack: RoleQuota::new(1, 1, 1, 0),
            defense: RoleQuota::new(1, 0, 2, 0),
            rush: RoleQuota::new(0, 0, 1, 2),
        }
    }
}

impl QuotaTable {
    pub fn for_strategy(&self, strategy: Strategy) -> RoleQuota {
        match strategy {
            Strategy::Farm => self.farm,
            Strategy::Attack => self.attack,
            Strategy::Defense => self.defense,
            Strategy::Rush => self.rush,
        }
    }
}

// ============================================================================
// Strategy thresholds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyThresholds {
    pub attack_turn_min: u32,
    pub attack_mana_min: i32,
    pub attack_cancel_mana: i32,
    pub rush_turn_min: u32,
    pub rush_mana_min: i32,
    pub rush_cancel_mana: i32,
    /// Mana needed per point of hostile base health to keep rushing
    pub rush_mana_per_health: i32,
    /// Reserve kept while charming creatures toward the gather point
    pub rush_gather_keep_mana: i32,
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            attack_turn_min: strategy::ATTACK_TURN_MIN,
            attack_mana_min: strategy::ATTACK_MANA_MIN,
            attack_cancel_mana: strategy::ATTACK_CANCEL_MANA,
            rush_turn_min: strategy::RUSH_TURN_MIN,
            rush_mana_min: strategy::RUSH_MANA_MIN,
            rush_cancel_mana: strategy::RUSH_CANCEL_MANA,
            rush_mana_per_health: strategy::RUSH_MANA_PER_HEALTH,
            rush_gather_keep_mana: strategy::RUSH_GATHER_KEEP_MANA,
        }
    }
}

// ============================================================================
// Policy switches
// ============================================================================

/// How exploration treats cells that aged past the staleness cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForgottenCells {
    /// Forgotten cells score as very stale
    #[default]
    Prioritize,
    /// Forgotten cells are never selected
    Skip,
}

/// Runtime behavior switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    // Estimation
    pub reconcile_memory: bool,
    pub mirror_synthesis: bool,
    /// Keep a creature for one extra turn after its first projection outside the board
    pub tolerate_boundary_crossing: bool,

    // Exploration
    pub forgotten_cells: ForgottenCells,
    pub attackers_explore: bool,
    /// Restrict the rush zone to a ring around the hostile base
    pub rush_zone_band: bool,
    /// Farmers walk to fixed posts instead of exploring
    pub fixed_farm_posts: bool,

    // Strategy
    pub rush_enabled: bool,
    pub rush_abort: bool,
    pub rush_horizontal_collect: bool,
    pub attack_if_losing: bool,
    pub defense_if_winning: bool,

    // Targeting
    pub urgent_defense: bool,
    /// Urgent defense decides pushes with the push predicate instead of a distance check
    pub urgent_push_predicate: bool,
    /// Refine urgent defense moves with the multi-target optimizer
    pub urgent_multi_target: bool,
    pub leave_target_to_nearest: bool,
    pub stay_near_enemy: bool,
    pub restrict_defender: bool,
    pub ignore_doomed: bool,
    pub multi_target: bool,
    pub attackers_avoid_kills: bool,
    pub rushers_avoid_kills: bool,

    // Abilities
    pub defensive_push: bool,
    /// Skip the push predicate in the defensive push pass
    pub always_push_out: bool,
    pub charm_creatures: bool,
    pub shield_self: bool,
    pub shield_from_all_enemies: bool,
    pub chase_enemy_in_base: bool,
    pub shield_allies: bool,
    pub offensive_push: bool,
    pub always_push_in_base: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            reconcile_memory: true,
            mirror_synthesis: true,
            tolerate_boundary_crossing: true,

            forgotten_cells: ForgottenCells::Prioritize,
            attackers_explore: true,
            rush_zone_band: false,
            fixed_farm_posts: false,

            rush_enabled: true,
            rush_abort: true,
            rush_horizontal_collect: true,
            attack_if_losing: false,
            defense_if_winning: false,

            urgent_defense: true,
            urgent_push_predicate: true,
            urgent_multi_target: false,
            leave_target_to_nearest: true,
            stay_near_enemy: true,
            restrict_defender: true,
            ignore_doomed: true,
            multi_target: true,
            attackers_avoid_kills: true,
            rushers_avoid_kills: true,

            defensive_push: true,
            always_push_out: true,
            charm_creatures: true,
            shield_self: false,
            shield_from_all_enemies: false,
            chase_enemy_in_base: true,
            shield_allies: true,
            offensive_push: true,
            always_push_in_base: true,
        }
    }
}

// ============================================================================
// Engine configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Battlefield
    pub board_width: f32,
    pub board_height: f32,
    /// Capacity of the per-turn entity index
    pub max_entities: usize,

    // Bases
    /// Creatures inside this radius are "in base"
    pub base_zone_radius: f32,
    /// Detection radius around our base (also the exploration exclusion disk)
    pub base_detect_radius: f32,
    pub base_kill_radius: f32,
    /// Hostile units within this factor of `base_detect_radius` are invaders
    pub threat_radius_factor: f32,

    // Units and creatures
    pub unit_speed: f32,
    pub unit_detect_radius: f32,
    pub attack_radius: f32,
    pub attack_damage: i32,
    pub unit_health: i32,
    pub creature_speed: f32,

    // Spells
    pub spell_cost: i32,
    pub push_radius: f32,
    pub push_distance: f32,
    pub shield_radius: f32,
    pub charm_radius: f32,

    // Exploration
    pub grid_cols: usize,
    pub grid_rows: usize,
    pub max_age: u32,
    pub age_weight: f32,
    pub forgotten_age: u32,
    pub visit_penalty: f32,

    // Search
    pub lattice_step: i32,
    pub multi_target_step_max: u32,
    pub intercept_steps: u32,

    // Strategy
    pub thresholds: StrategyThresholds,
    pub quotas: QuotaTable,

    // Timing
    pub first_turn_budget_ms: u64,
    pub turn_budget_ms: u64,

    pub policy: PolicyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_width: board::WIDTH,
            board_height: board::HEIGHT,
            max_entities: board::MAX_ENTITIES,

            base_zone_radius: base::ZONE_RADIUS,
            base_detect_radius: base::DETECT_RADIUS,
            base_kill_radius: base::KILL_RADIUS,
            threat_radius_factor: base::THREAT_RADIUS_FACTOR,

            unit_speed: unit::SPEED,
            unit_detect_radius: unit::DETECT_RADIUS,
            attack_radius: unit::ATTACK_RADIUS,
            attack_damage: unit::ATTACK_DAMAGE,
            unit_health: unit::HEALTH,
            creature_speed: creature::SPEED,

            spell_cost: spell::COST,
            push_radius: spell::PUSH_RADIUS,
            push_distance: spell::PUSH_DISTANCE,
            shield_radius: spell::SHIELD_RADIUS,
            charm_radius: spell::CHARM_RADIUS,

            grid_cols: exploration::GRID_COLS,
            grid_rows: exploration::GRID_ROWS,
            max_age: exploration::MAX_AGE,
            age_weight: exploration::AGE_WEIGHT,
            forgotten_age: exploration::FORGOTTEN_AGE,
            visit_penalty: exploration::VISIT_PENALTY,

            lattice_step: search::LATTICE_STEP,
            multi_target_step_max: search::MULTI_TARGET_STEP_MAX,
            intercept_steps: targeting::INTERCEPT_STEPS,

            thresholds: StrategyThresholds::default(),
            quotas: QuotaTable::default(),

            first_turn_budget_ms: timing::FIRST_TURN_BUDGET_MS,
            turn_budget_ms: timing::TURN_BUDGET_MS,

            policy: PolicyConfig::default(),
        }
    }
}

/// Parse an env var into `slot`, warning and keeping the current value when invalid
fn override_from_env<T>(name: &str, slot: &mut T, valid: impl Fn(&T) -> bool)
where
    T: FromStr + std::fmt::Debug,
{
    let Ok(raw) = std::env::var(name) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) if valid(&parsed) => *slot = parsed,
        Ok(parsed) => {
            tracing::warn!("{} value {:?} out of range, using {:?}", name, parsed, slot);
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using {:?}", name, raw, slot);
        }
    }
}

impl EngineConfig {
    /// Load config from an optional JSON file and environment variables
    pub fn load_or_default() -> Self {
        let mut config = match std::env::var("SKIRMISH_CONFIG") {
            Ok(path) => match Self::from_json_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("{}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        config.apply_env();

        tracing::info!(
            turn_budget_ms = config.turn_budget_ms,
            first_turn_budget_ms = config.first_turn_budget_ms,
            max_entities = config.max_entities,
            rush_enabled = config.policy.rush_enabled,
            rush_mana_min = config.thresholds.rush_mana_min,
            attack_turn_min = config.thresholds.attack_turn_min,
            "Engine configuration loaded"
        );

        config
    }

    /// Read a JSON overrides file; fields it omits keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn apply_env(&mut self) {
        override_from_env("SKIRMISH_TURN_BUDGET_MS", &mut self.turn_budget_ms, |v| *v > 0);
        override_from_env(
            "SKIRMISH_FIRST_TURN_BUDGET_MS",
            &mut self.first_turn_budget_ms,
            |v| *v > 0,
        );
        override_from_env("SKIRMISH_MAX_ENTITIES", &mut self.max_entities, |v| {
            *v > 0 && *v <= 10_000
        });
        override_from_env(
            "SKIRMISH_ATTACK_TURN_MIN",
            &mut self.thresholds.attack_turn_min,
            |_| true,
        );
        override_from_env(
            "SKIRMISH_ATTACK_MANA_MIN",
            &mut self.thresholds.attack_mana_min,
            |v| *v >= 0,
        );
        override_from_env(
            "SKIRMISH_RUSH_TURN_MIN",
            &mut self.thresholds.rush_turn_min,
            |_| true,
        );
        override_from_env(
            "SKIRMISH_RUSH_MANA_MIN",
            &mut self.thresholds.rush_mana_min,
            |v| *v >= 0,
        );
        override_from_env("SKIRMISH_RUSH_ENABLED", &mut self.policy.rush_enabled, |_| true);
        override_from_env("SKIRMISH_SHIELD_SELF", &mut self.policy.shield_self, |_| true);
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("board_width", self.board_width),
            ("board_height", self.board_height),
            ("base_zone_radius", self.base_zone_radius),
            ("base_detect_radius", self.base_detect_radius),
            ("unit_speed", self.unit_speed),
            ("creature_speed", self.creature_speed),
            ("attack_radius", self.attack_radius),
            ("push_radius", self.push_radius),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field });
            }
        }
        if self.max_entities == 0 {
            return Err(ConfigError::NotPositive { field: "max_entities" });
        }
        if self.grid_cols == 0 || self.grid_rows == 0 {
            return Err(ConfigError::NotPositive { field: "grid size" });
        }
        if self.lattice_step <= 0 {
            return Err(ConfigError::NotPositive { field: "lattice_step" });
        }
        if self.intercept_steps == 0 {
            return Err(ConfigError::NotPositive { field: "intercept_steps" });
        }
        if self.spell_cost <= 0 {
            return Err(ConfigError::NotPositive { field: "spell_cost" });
        }
        if self.turn_budget_ms == 0 || self.first_turn_budget_ms == 0 {
            return Err(ConfigError::NotPositive { field: "turn budget" });
        }

        let t = &self.thresholds;
        if t.attack_mana_min < t.attack_cancel_mana {
            return Err(ConfigError::Inconsistent(format!(
                "attack_mana_min ({}) is below attack_cancel_mana ({})",
                t.attack_mana_min, t.attack_cancel_mana
            )));
        }
        if t.rush_mana_min < t.rush_cancel_mana {
            return Err(ConfigError::Inconsistent(format!(
                "rush_mana_min ({}) is below rush_cancel_mana ({})",
                t.rush_mana_min, t.rush_cancel_mana
            )));
        }

        for (name, quota) in [
            ("farm", self.quotas.farm),
            ("attack", self.quotas.attack),
            ("defense", self.quotas.defense),
            ("rush", self.quotas.rush),
        ] {
            if quota.total() > unit::COUNT as u32 {
                return Err(ConfigError::Inconsistent(format!(
                    "{} quota assigns {} roles to {} units",
                    name,
                    quota.total(),
                    unit::COUNT
                )));
            }
        }

        Ok(())
    }

    /// This config if it validates, the defaults otherwise
    pub fn validated_or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                tracing::warn!("Configuration rejected: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Turn budget in milliseconds for the given turn number
    pub fn budget_ms(&self, turn: u32) -> u64 {
        if turn == 0 {
            self.first_turn_budget_ms
        } else {
            self.turn_budget_ms
        }
    }
}
