//! Action formatting

use std::fmt;
use std::io::Write;

use crate::game::state::{Action, EntityId};

/// Wire form of one action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command(pub Action);

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Action::Hold => write!(f, "WAIT"),
            Action::Move(dest) => {
                let (x, y) = dest.rounded();
                write!(f, "MOVE {x} {y}")
            }
            Action::Push(aim) => {
                let (x, y) = aim.rounded();
                write!(f, "SPELL WIND {x} {y}")
            }
            Action::Shield(id) => write!(f, "SPELL SHIELD {id}"),
            Action::Charm(id, dest) => {
                let (x, y) = dest.rounded();
                write!(f, "SPELL CONTROL {id} {x} {y}")
            }
        }
    }
}

/// Write one command line per unit and flush
pub fn write_actions<W: Write>(
    out: &mut W,
    actions: &[(EntityId, Action)],
) -> std::io::Result<()> {
    for &(_, action) in actions {
        writeln!(out, "{}", Command(action))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::vec2::Vec2;

    #[test]
    fn test_command_format() {
        assert_eq!(Command(Action::Hold).to_string(), "WAIT");
        assert_eq!(
            Command(Action::Move(Vec2::new(5700.4, 4999.6))).to_string(),
            "MOVE 5700 5000"
        );
        assert_eq!(
            Command(Action::Push(Vec2::new(18130.0, 9500.0))).to_string(),
            "SPELL WIND 18130 9500"
        );
        assert_eq!(Command(Action::Shield(4)).to_string(), "SPELL SHIELD 4");
        assert_eq!(
            Command(Action::Charm(12, Vec2::new(17630.0, 9000.0))).to_string(),
            "SPELL CONTROL 12 17630 9000"
        );
    }

    #[test]
    fn test_write_actions_one_line_per_unit() {
        let mut out = Vec::new();
        let actions = [
            (0, Action::Hold),
            (1, Action::Move(Vec2::new(100.0, 200.0))),
            (2, Action::Shield(1)),
        ];
        write_actions(&mut out, &actions).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "WAIT\nMOVE 100 200\nSPELL SHIELD 1\n"
        );
    }
}
