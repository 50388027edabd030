//! Battlefield state definitions
//!
//! Contains entities (units, hostile units, creatures), players, the per-turn
//! snapshot and the cross-turn entity lifecycle map.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::util::geometry::Bounds;
use crate::util::vec2::Vec2;

/// Entity identifier, stable across the match
pub type EntityId = i32;

/// Index of our player in `Snapshot::players`
pub const ME: usize = 0;
/// Index of the opponent in `Snapshot::players`
pub const OP: usize = 1;

/// Units controlled per player
pub const UNITS_PER_PLAYER: usize = 3;

// ============================================================================
// Classifications
// ============================================================================

/// Entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Neutral creature walking across the battlefield
    Creature,
    /// One of our units
    Unit,
    /// One of the opponent's units
    Enemy,
}

impl EntityKind {
    /// Decode the wire category (0 creature, 1 ours, 2 theirs)
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Creature),
            1 => Some(Self::Unit),
            2 => Some(Self::Enemy),
            _ => None,
        }
    }
}

/// Which base a classification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum BaseSide {
    #[default]
    Neither,
    Friendly,
    Hostile,
}

impl BaseSide {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Neither),
            1 => Some(Self::Friendly),
            2 => Some(Self::Hostile),
            _ => None,
        }
    }

    /// Swap friendly and hostile (mirrored view)
    pub fn inverted(self) -> Self {
        match self {
            Self::Neither => Self::Neither,
            Self::Friendly => Self::Hostile,
            Self::Hostile => Self::Friendly,
        }
    }
}

/// Macro strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    Farm,
    Attack,
    Defense,
    Rush,
}

/// Per-unit role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Farmer,
    Attacker,
    Defender,
    Rusher,
}

impl Role {
    /// Roles that must not finish off creatures they are not targeting
    pub fn avoids_incidental_kills(self, attackers: bool, rushers: bool) -> bool {
        match self {
            Role::Attacker => attackers,
            Role::Rusher => rushers,
            _ => false,
        }
    }
}

/// Cross-turn knowledge about an entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Untouched,
    InView,
    /// Projected or synthesized, not observed this turn
    Computed,
    /// Walked off the battlefield
    Deactivated,
    Dead,
}

impl Lifecycle {
    /// Retired entities are never projected or synthesized again until re-observed
    pub fn is_retired(self) -> bool {
        matches!(self, Lifecycle::Deactivated | Lifecycle::Dead)
    }
}

/// Lifecycle state per identifier
#[derive(Debug, Clone, Default)]
pub struct LifecycleMap {
    states: HashMap<EntityId, Lifecycle>,
}

impl LifecycleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Lifecycle {
        self.states.get(&id).copied().unwrap_or_default()
    }

    pub fn set(&mut self, id: EntityId, state: Lifecycle) {
        self.states.insert(id, state);
    }

    pub fn is_retired(&self, id: EntityId) -> bool {
        self.get(id).is_retired()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

// ============================================================================
// Orientation
// ============================================================================

/// Which corner our base occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    TopLeft,
    BottomRight,
}

impl Orientation {
    pub fn from_base(base: Vec2, bounds: Bounds) -> Self {
        if base.x < bounds.width / 2.0 {
            Self::TopLeft
        } else {
            Self::BottomRight
        }
    }

    /// Map a position expressed for the top-left base into our frame
    pub fn oriented(self, p: Vec2, bounds: Bounds) -> Vec2 {
        match self {
            Self::TopLeft => p,
            Self::BottomRight => bounds.mirror(p),
        }
    }

    /// True when `y` lies on the half of the map farmed by this side
    pub fn on_our_half(self, y: f32, center_y: f32) -> bool {
        match self {
            Self::TopLeft => y >= center_y,
            Self::BottomRight => y <= center_y,
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Unit, hostile unit or creature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Fixed per-turn displacement (zero for units)
    pub vel: Vec2,
    pub health: i32,
    /// Highest health observed for this identifier
    pub health_max: i32,
    /// Turns of spell immunity left
    pub shield: i32,
    pub charmed: bool,
    /// Base endangered by the current trajectory
    pub threat: BaseSide,
    /// Base the creature is already heading into
    pub near_base: BaseSide,
    pub visible: bool,

    // Per-turn decision state
    pub target: Option<EntityId>,
    pub role: Role,
    pub role_rank: u8,
    pub engaged_by: u8,
    /// Action is final for this turn
    pub locked: bool,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            health: 0,
            health_max: 0,
            shield: 0,
            charmed: false,
            threat: BaseSide::Neither,
            near_base: BaseSide::Neither,
            visible: true,
            target: None,
            role: Role::Farmer,
            role_rank: 0,
            engaged_by: 0,
            locked: false,
        }
    }

    pub fn creature(id: EntityId, pos: Vec2, vel: Vec2, health: i32) -> Self {
        Self {
            vel,
            health,
            health_max: health,
            ..Self::new(id, EntityKind::Creature, pos)
        }
    }

    pub fn unit(id: EntityId, pos: Vec2) -> Self {
        Self::new(id, EntityKind::Unit, pos)
    }

    pub fn enemy(id: EntityId, pos: Vec2) -> Self {
        Self::new(id, EntityKind::Enemy, pos)
    }

    /// Slot in the per-player action table
    #[inline]
    pub fn slot_rank(&self) -> usize {
        self.id.rem_euclid(UNITS_PER_PLAYER as i32) as usize
    }

    /// Spells can target this entity
    #[inline]
    pub fn is_castable(&self) -> bool {
        self.shield <= 0
    }

    /// Unit has no target and is not locked
    #[inline]
    pub fn is_free(&self) -> bool {
        !self.locked && self.target.is_none()
    }

    /// Clear the per-turn decision state
    pub fn reset_turn_state(&mut self) {
        self.target = None;
        self.role = Role::Farmer;
        self.role_rank = 0;
        self.engaged_by = 0;
        self.locked = false;
    }
}

// ============================================================================
// Actions and players
// ============================================================================

/// One decision for one unit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Hold,
    Move(Vec2),
    /// Push every creature near the caster along the caster to `aim` direction
    Push(Vec2),
    Shield(EntityId),
    /// Redirect an entity toward a position
    Charm(EntityId, Vec2),
}

impl Action {
    pub fn is_spell(&self) -> bool {
        matches!(self, Action::Push(_) | Action::Shield(_) | Action::Charm(..))
    }
}

/// Per-player status as reported each turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub health: i32,
    pub mana: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub health: i32,
    pub mana: i32,
    pub base: Vec2,
    /// Chosen actions indexed by unit slot rank
    pub actions: [Action; UNITS_PER_PLAYER],
}

impl Player {
    pub fn new(base: Vec2) -> Self {
        Self {
            health: 0,
            mana: 0,
            base,
            actions: [Action::Hold; UNITS_PER_PLAYER],
        }
    }

    #[inline]
    pub fn can_afford(&self, cost: i32) -> bool {
        self.mana >= cost
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Raw per-turn input handed to the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnInput {
    pub players: [PlayerStatus; 2],
    pub entities: Vec<Entity>,
}

/// Battlefield state for one turn
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub turn: u32,
    pub players: [Player; 2],
    pub entities: Vec<Entity>,
}

impl Snapshot {
    pub fn new(turn: u32, my_base: Vec2, op_base: Vec2) -> Self {
        Self {
            turn,
            players: [Player::new(my_base), Player::new(op_base)],
            entities: Vec::new(),
        }
    }

    #[inline]
    pub fn me(&self) -> &Player {
        &self.players[ME]
    }

    #[inline]
    pub fn me_mut(&mut self) -> &mut Player {
        &mut self.players[ME]
    }

    #[inline]
    pub fn op(&self) -> &Player {
        &self.players[OP]
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.kind == EntityKind::Unit)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.kind == EntityKind::Creature)
    }

    /// Record an action for the unit at snapshot index `idx`
    pub fn set_action(&mut self, idx: usize, action: Action) {
        let rank = self.entities[idx].slot_rank();
        self.players[ME].actions[rank] = action;
    }

    /// Action currently queued for the unit at snapshot index `idx`
    pub fn action_of(&self, idx: usize) -> Action {
        self.players[ME].actions[self.entities[idx].slot_rank()]
    }

    /// Actions of our units in input order
    pub fn unit_actions(&self) -> SmallVec<[(EntityId, Action); UNITS_PER_PLAYER]> {
        self.units()
            .map(|u| (u.id, self.players[ME].actions[u.slot_rank()]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_rank_is_id_mod_three() {
        assert_eq!(Entity::unit(0, Vec2::ZERO).slot_rank(), 0);
        assert_eq!(Entity::unit(4, Vec2::ZERO).slot_rank(), 1);
        assert_eq!(Entity::unit(5, Vec2::ZERO).slot_rank(), 2);
    }

    #[test]
    fn test_base_side_inverted() {
        assert_eq!(BaseSide::Friendly.inverted(), BaseSide::Hostile);
        assert_eq!(BaseSide::Hostile.inverted(), BaseSide::Friendly);
        assert_eq!(BaseSide::Neither.inverted(), BaseSide::Neither);
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(EntityKind::from_code(0), Some(EntityKind::Creature));
        assert_eq!(EntityKind::from_code(2), Some(EntityKind::Enemy));
        assert_eq!(EntityKind::from_code(3), None);
    }

    #[test]
    fn test_orientation() {
        let bounds = Bounds::new(17630.0, 9000.0);
        let tl = Orientation::from_base(Vec2::new(0.0, 0.0), bounds);
        let br = Orientation::from_base(Vec2::new(17630.0, 9000.0), bounds);
        assert_eq!(tl, Orientation::TopLeft);
        assert_eq!(br, Orientation::BottomRight);

        let post = Vec2::new(12930.0, 8600.0);
        assert_eq!(tl.oriented(post, bounds), post);
        assert_eq!(br.oriented(post, bounds), Vec2::new(4700.0, 400.0));

        assert!(tl.on_our_half(6000.0, 4500.0));
        assert!(!tl.on_our_half(3000.0, 4500.0));
        assert!(br.on_our_half(3000.0, 4500.0));
    }

    #[test]
    fn test_lifecycle_map_defaults_untouched() {
        let mut map = LifecycleMap::new();
        assert_eq!(map.get(42), Lifecycle::Untouched);
        map.set(42, Lifecycle::Dead);
        assert!(map.is_retired(42));
        map.set(42, Lifecycle::InView);
        assert!(!map.is_retired(42));
    }

    #[test]
    fn test_set_action_by_slot() {
        let mut snap = Snapshot::new(0, Vec2::ZERO, Vec2::new(17630.0, 9000.0));
        snap.entities.push(Entity::unit(4, Vec2::new(100.0, 100.0)));
        snap.entities.push(Entity::unit(3, Vec2::new(200.0, 100.0)));
        snap.set_action(0, Action::Move(Vec2::new(1.0, 2.0)));
        assert_eq!(snap.me().actions[1], Action::Move(Vec2::new(1.0, 2.0)));
        assert_eq!(snap.action_of(1), Action::Hold);

        let actions = snap.unit_actions();
        assert_eq!(actions[0], (4, Action::Move(Vec2::new(1.0, 2.0))));
        assert_eq!(actions[1], (3, Action::Hold));
    }
}
