//! Referee input parsing

use std::io::BufRead;

use super::ProtocolError;
use crate::game::state::{BaseSide, Entity, EntityKind, PlayerStatus, TurnInput};
use crate::util::vec2::Vec2;

/// Fields of one entity line
const ENTITY_FIELDS: usize = 11;

/// Match setup read once before the first turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchInit {
    pub base: Vec2,
    pub units_per_player: usize,
}

/// Reads the initialization block and per-turn blocks from a line source
pub struct TurnReader<R> {
    source: R,
    line: String,
}

impl<R: BufRead> TurnReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            line: String::new(),
        }
    }

    /// Next non-empty line, `None` at end of input
    fn next_line(&mut self) -> Result<Option<&str>, ProtocolError> {
        loop {
            self.line.clear();
            if self.source.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            if !self.line.trim().is_empty() {
                break;
            }
        }
        Ok(Some(self.line.trim()))
    }

    fn expect_line(&mut self, context: &'static str) -> Result<&str, ProtocolError> {
        self.next_line()?.ok_or(ProtocolError::Truncated(context))
    }

    pub fn read_init(&mut self) -> Result<MatchInit, ProtocolError> {
        let base = parse_ints::<2>(self.expect_line("base position")?, "base position")?;
        let units = parse_ints::<1>(self.expect_line("unit count")?, "unit count")?;
        let init = MatchInit {
            base: Vec2::from_ints(base[0], base[1]),
            units_per_player: units[0].max(0) as usize,
        };
        tracing::debug!(x = base[0], y = base[1], units = init.units_per_player, "Match init read");
        Ok(init)
    }

    /// Read one turn; `Ok(None)` when input ends cleanly before the turn starts
    pub fn read_turn(&mut self) -> Result<Option<TurnInput>, ProtocolError> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        let mine = parse_ints::<2>(line, "player status")?;
        let theirs = parse_ints::<2>(self.expect_line("player status")?, "player status")?;
        let count = parse_ints::<1>(self.expect_line("entity count")?, "entity count")?[0].max(0) as usize;

        let mut entities = Vec::with_capacity(count);
        for _ in 0..count {
            entities.push(parse_entity(self.expect_line("entity")?)?);
        }

        Ok(Some(TurnInput {
            players: [
                PlayerStatus {
                    health: mine[0],
                    mana: mine[1],
                },
                PlayerStatus {
                    health: theirs[0],
                    mana: theirs[1],
                },
            ],
            entities,
        }))
    }
}

fn parse_ints<const N: usize>(line: &str, context: &'static str) -> Result<[i32; N], ProtocolError> {
    let mut out = [0; N];
    let mut got = 0;
    for token in line.split_whitespace() {
        if got == N {
            got += 1;
            break;
        }
        out[got] = token.parse().map_err(|_| ProtocolError::InvalidNumber {
            context,
            value: token.to_string(),
        })?;
        got += 1;
    }
    if got != N {
        return Err(ProtocolError::FieldCount {
            context,
            expected: N,
            got: line.split_whitespace().count(),
        });
    }
    Ok(out)
}

/// `id type x y shield charmed health vx vy near_base threat`
pub fn parse_entity(line: &str) -> Result<Entity, ProtocolError> {
    let [id, kind, x, y, shield, charmed, health, vx, vy, near_base, threat] =
        parse_ints::<ENTITY_FIELDS>(line, "entity")?;

    let kind = EntityKind::from_code(kind).ok_or(ProtocolError::UnknownCode {
        context: "entity type",
        code: kind,
    })?;
    let threat = BaseSide::from_code(threat).ok_or(ProtocolError::UnknownCode {
        context: "threat",
        code: threat,
    })?;
    let near_base = if near_base != 0 {
        BaseSide::Friendly
    } else {
        BaseSide::Neither
    };

    let mut entity = Entity::new(id, kind, Vec2::from_ints(x, y));
    entity.shield = shield;
    entity.charmed = charmed != 0;
    entity.health = health;
    entity.health_max = health;
    entity.vel = Vec2::from_ints(vx, vy);
    entity.near_base = near_base;
    entity.threat = threat;
    Ok(entity)
}
