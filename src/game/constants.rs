//! Default rule and policy constants.
//!
//! Tunable values seed `EngineConfig::default()`. Scoring weights and map
//! posts that are never tuned at runtime are read from here directly.

/// Battlefield constants
pub mod board {
    /// Battlefield width
    pub const WIDTH: f32 = 17630.0;
    /// Battlefield height
    pub const HEIGHT: f32 = 9000.0;
    /// Upper bound on tracked entities per turn
    pub const MAX_ENTITIES: usize = 300;
}

/// Base constants
pub mod base {
    /// Radius considered "inside" a base (creatures here target it)
    pub const ZONE_RADIUS: f32 = 5000.0;
    /// Detection radius around our own base
    pub const DETECT_RADIUS: f32 = 6000.0;
    /// A creature this close to a base damages it
    pub const KILL_RADIUS: f32 = 300.0;
    /// Hostile units within this factor of `DETECT_RADIUS` count as invaders
    pub const THREAT_RADIUS_FACTOR: f32 = 1.5;
}

/// Friendly and hostile unit constants
pub mod unit {
    /// Units per player
    pub const COUNT: usize = 3;
    /// Maximum travel per turn
    pub const SPEED: f32 = 800.0;
    /// Detection radius around each unit
    pub const DETECT_RADIUS: f32 = 2200.0;
    /// Attack hits every creature within this radius
    pub const ATTACK_RADIUS: f32 = 800.0;
    /// Damage per hit
    pub const ATTACK_DAMAGE: i32 = 2;
    /// Health reported for units (the wire leaves it undefined)
    pub const HEALTH: i32 = 30;
}

/// Neutral creature constants
pub mod creature {
    /// Creature speed (length of the displacement vector)
    pub const SPEED: f32 = 400.0;
}

/// Ability constants
pub mod spell {
    pub const COST: i32 = 10;
    /// Cast radius of push
    pub const PUSH_RADIUS: f32 = 1280.0;
    /// Displacement applied by push
    pub const PUSH_DISTANCE: f32 = 2200.0;
    pub const SHIELD_RADIUS: f32 = 2200.0;
    pub const CHARM_RADIUS: f32 = 2200.0;
}

/// Exploration grid constants
pub mod exploration {
    pub const GRID_COLS: usize = 27;
    pub const GRID_ROWS: usize = 15;
    /// Aging cells past this many turns become forgotten
    pub const MAX_AGE: u32 = 10;
    /// Age weight (K) in `age * K / (distance + 1)`
    pub const AGE_WEIGHT: f32 = 1000.0;
    /// Age used for forgotten cells when they are eligible
    pub const FORGOTTEN_AGE: u32 = 100;
    /// Score removed from a cell each time a unit is routed there
    pub const VISIT_PENALTY: f32 = 1000.0;

    pub const ATTACK_OUTER_FACTOR: f32 = 1.4;
    pub const ATTACK_INNER_FACTOR: f32 = 0.9;
    pub const DEFENSE_OUTER_FACTOR: f32 = 1.2;
    pub const RUSH_OUTER_FACTOR: f32 = 1.05;
    pub const RUSH_INNER_FACTOR: f32 = 0.95;
}

/// Targeting and interception constants
pub mod targeting {
    /// Forward-simulation bound (also the "no intercept" sentinel)
    pub const INTERCEPT_STEPS: u32 = 20;
    /// Bound on steps-before-leaving estimates
    pub const EXIT_LOOKAHEAD: u32 = 20;
    /// Score units stop adding once this many units engage a creature
    pub const MAX_ENGAGED: u8 = 2;
    /// Defenders stay within this distance of an invader
    pub const NEAR_ENEMY_DIST: f32 = 2200.0;
    /// Attackers consider creatures up to this factor of the base radius
    pub const ATTACK_OUTER_FACTOR: f32 = 1.2;
    /// Nobody targets creatures inside this factor of the hostile base radius
    pub const ATTACK_INNER_FACTOR: f32 = 1.0;
    /// Defender window around our base with no invader present
    pub const DEFENSE_FACTOR: f32 = 1.2;
    /// Defender window around our base while an invader is present
    pub const INVASION_FACTOR: f32 = 1.0;
    /// Urgent defense window (factor of base radius) for threatening creatures
    pub const URGENT_FACTOR: f32 = 1.0;
    /// Base weight for an unengaged creature
    pub const UNENGAGED_BONUS: f32 = 0.1;
    /// Weight of "threatens a base" scoring terms
    pub const THREAT_WEIGHT: f32 = 1000.0;
    /// Weight of "already near our base" scoring term
    pub const NEAR_BASE_WEIGHT: f32 = 10000.0;
    /// Attacker stand-off from the push radius when lining up a push
    pub const ATTACK_STANDOFF: f32 = 100.0;
    /// Guard for distance denominators
    pub const EPSILON: f32 = 1e-3;
}

/// Multi-target optimizer constants
pub mod search {
    /// Lattice spacing of the offset disk
    pub const LATTICE_STEP: i32 = 20;
    /// Optimizer runs when the interception step is at most this
    pub const MULTI_TARGET_STEP_MAX: u32 = 1;
    pub const CREATURE_VALUE: f32 = 100.0;
    pub const DIST_POW: f32 = 1.2;
    pub const TARGET_DIST_POW: f32 = 1.3;
    /// Bonus per additional packed entity
    pub const PACK_BONUS: f32 = 1000.0;
    /// Inline capacity for packed entities
    pub const PACKED_INLINE: usize = 20;
    /// Interception budget handed to the optimizer while staging a rush
    pub const RUSH_STEP_BUDGET: u32 = 20;
}

/// Ability policy constants
pub mod abilities {
    /// Creatures at or above this health are always worth pushing out
    pub const PUSH_OUT_HEALTH_MIN: i32 = 6;
    /// More creatures than this in our base always warrants a push
    pub const CROWDED_BASE: u32 = 2;
    /// Light creatures are pushed only if the push lands them in the kill radius
    pub const ATTACK_PUSH_HEALTH_MIN: i32 = 8;
    /// Attackers charm creatures lighter than this
    pub const CHARM_LIGHT_HEALTH_MAX: i32 = 12;
    /// Defenders charm creatures at least this healthy
    pub const CHARM_HEALTH_MIN: i32 = 20;
    /// Mana kept in reserve by the defensive push pass
    pub const PUSH_KEEP_MANA: i32 = 0;
}

/// Strategy state machine constants
pub mod strategy {
    pub const ATTACK_TURN_MIN: u32 = 150;
    pub const ATTACK_MANA_MIN: i32 = 999;
    pub const ATTACK_CANCEL_MANA: i32 = 10;
    pub const RUSH_TURN_MIN: u32 = 999;
    pub const RUSH_MANA_MIN: i32 = 150;
    pub const RUSH_CANCEL_MANA: i32 = 10;
    /// Mana per remaining hostile base health point needed to keep rushing
    pub const RUSH_MANA_PER_HEALTH: i32 = 10;
    /// Mana reserve kept while gathering creatures for a rush
    pub const RUSH_GATHER_KEEP_MANA: i32 = 80;
    /// Second rusher walks horizontally when this far off its post
    pub const RUSH_HORIZONTAL_SLACK: f32 = 1000.0;
}

/// Fixed map positions, expressed for the top-left base and mirrored otherwise
pub mod posts {
    pub const RUSH: [(f32, f32); 2] = [(12930.0, 8600.0), (12630.0, 8000.0)];
    pub const GATHER: (f32, f32) = (12500.0, 8550.0);
    pub const FARM: [(f32, f32); 2] = [(8000.0, 8500.0), (4200.0, 8500.0)];
}

/// Turn timing constants
pub mod timing {
    /// Budget for the first turn (includes grid initialization)
    pub const FIRST_TURN_BUDGET_MS: u64 = 999;
    /// Budget for every later turn
    pub const TURN_BUDGET_MS: u64 = 49;
    /// Turn durations kept for rolling statistics
    pub const STATS_WINDOW: usize = 64;
}
