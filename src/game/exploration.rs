//! Exploration grid
//!
//! Fixed-resolution grid over the battlefield. Zone masks are computed once
//! from the base positions; staleness and visit score change every turn.
//! Cells are stored row-major (`j * cols + i`), which is also the scan order
//! used to break ties during selection.

use bitvec::prelude::*;

use crate::config::{EngineConfig, ForgottenCells};
use crate::game::constants::exploration::{
    ATTACK_INNER_FACTOR, ATTACK_OUTER_FACTOR, DEFENSE_OUTER_FACTOR, RUSH_INNER_FACTOR,
    RUSH_OUTER_FACTOR,
};
use crate::game::state::{Orientation, Role};
use crate::util::geometry::rect_in_disk;
use crate::util::vec2::Vec2;

/// Turns since a cell was last fully inside a detection disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Inside detection this turn
    Fresh,
    Aging(u32),
    /// Aged past the cap
    Forgotten,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub staleness: Staleness,
    pub score: f32,
}

/// Strategic zones a cell can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Attack,
    Defense,
    Farm,
    Rush,
}

impl Zone {
    /// Zone explored by units of a given role
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Farmer => Zone::Farm,
            Role::Attacker => Zone::Attack,
            Role::Defender => Zone::Defense,
            Role::Rusher => Zone::Rush,
        }
    }
}

pub struct ExplorationGrid {
    cols: usize,
    rows: usize,
    cell_width: f32,
    cell_height: f32,
    center: Vec2,
    cells: Vec<Cell>,
    attack: BitVec,
    defense: BitVec,
    farm: BitVec,
    rush: BitVec,
    max_age: u32,
    age_weight: f32,
    forgotten_age: u32,
    visit_penalty: f32,
    forgotten: ForgottenCells,
}

impl ExplorationGrid {
    pub fn new(config: &EngineConfig, my_base: Vec2, op_base: Vec2, orientation: Orientation) -> Self {
        let cols = config.grid_cols.max(1);
        let rows = config.grid_rows.max(1);
        let len = cols * rows;

        let mut grid = Self {
            cols,
            rows,
            // Integer cell sizes, as the board is addressed in whole units
            cell_width: (config.board_width / cols as f32).floor(),
            cell_height: (config.board_height / rows as f32).floor(),
            center: Vec2::new(
                (config.board_width / 2.0).floor(),
                (config.board_height / 2.0).floor(),
            ),
            cells: vec![
                Cell {
                    staleness: Staleness::Forgotten,
                    score: 0.0,
                };
                len
            ],
            attack: bitvec![0; len],
            defense: bitvec![0; len],
            farm: bitvec![0; len],
            rush: bitvec![0; len],
            max_age: config.max_age,
            age_weight: config.age_weight,
            forgotten_age: config.forgotten_age,
            visit_penalty: config.visit_penalty,
            forgotten: config.policy.forgotten_cells,
        };

        let base_r = config.base_detect_radius;
        for j in 0..rows {
            for i in 0..cols {
                let idx = j * cols + i;
                let (min, max) = grid.cell_rect(i, j);
                let inside = |center: Vec2, radius: f32| rect_in_disk(center, radius, min, max);

                let in_my_base = inside(my_base, base_r);
                let in_op_base = inside(op_base, base_r);
                if in_my_base || in_op_base {
                    grid.cells[idx].staleness = Staleness::Fresh;
                }

                let attack = inside(op_base, ATTACK_OUTER_FACTOR * base_r)
                    && !inside(op_base, ATTACK_INNER_FACTOR * base_r);
                let defense = inside(my_base, DEFENSE_OUTER_FACTOR * base_r) && !in_my_base;
                let center_y = grid.cell_center(i, j).y;
                let farm = !in_my_base
                    && !in_op_base
                    && orientation.on_our_half(center_y, grid.center.y);
                let rush = if config.policy.rush_zone_band {
                    inside(op_base, RUSH_OUTER_FACTOR * base_r)
                        && !inside(op_base, RUSH_INNER_FACTOR * base_r)
                } else {
                    true
                };

                grid.attack.set(idx, attack);
                grid.defense.set(idx, defense);
                grid.farm.set(idx, farm);
                grid.rush.set(idx, rush);
            }
        }

        tracing::info!(
            cols,
            rows,
            attack = grid.attack.count_ones(),
            defense = grid.defense.count_ones(),
            farm = grid.farm.count_ones(),
            rush = grid.rush.count_ones(),
            "Exploration grid initialized"
        );

        grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Centre of cell `(i, j)` (column, row)
    pub fn cell_center(&self, i: usize, j: usize) -> Vec2 {
        let di = i as f32 - (self.cols / 2) as f32;
        let dj = j as f32 - (self.rows / 2) as f32;
        Vec2::new(
            self.center.x + di * self.cell_width,
            self.center.y + dj * self.cell_height,
        )
    }

    fn cell_rect(&self, i: usize, j: usize) -> (Vec2, Vec2) {
        let c = self.cell_center(i, j);
        let half = Vec2::new((self.cell_width / 2.0).floor(), (self.cell_height / 2.0).floor());
        (c - half, c + half)
    }

    /// Point-symmetric partner of `(i, j)`
    pub fn mirror_cell(&self, i: usize, j: usize) -> (usize, usize) {
        (self.cols - 1 - i, self.rows - 1 - j)
    }

    pub fn cell(&self, i: usize, j: usize) -> &Cell {
        &self.cells[j * self.cols + i]
    }

    pub fn in_zone(&self, zone: Zone, i: usize, j: usize) -> bool {
        let idx = j * self.cols + i;
        let mask = match zone {
            Zone::Attack => &self.attack,
            Zone::Defense => &self.defense,
            Zone::Farm => &self.farm,
            Zone::Rush => &self.rush,
        };
        mask[idx]
    }

    /// Cell whose centre is exactly `p`
    #[cfg(test)]
    pub(crate) fn cell_at_center(&self, p: Vec2) -> Option<(usize, usize)> {
        (0..self.rows)
            .flat_map(|j| (0..self.cols).map(move |i| (i, j)))
            .find(|&(i, j)| self.cell_center(i, j).approx_eq(p, 0.5))
    }

    /// Mark every cell fully covered by a detection disk fresh, with its mirror
    pub fn observe(&mut self, center: Vec2, radius: f32) {
        for j in 0..self.rows {
            for i in 0..self.cols {
                let (min, max) = self.cell_rect(i, j);
                if rect_in_disk(center, radius, min, max) {
                    let (mi, mj) = self.mirror_cell(i, j);
                    self.cells[j * self.cols + i].staleness = Staleness::Fresh;
                    self.cells[mj * self.cols + mi].staleness = Staleness::Fresh;
                }
            }
        }
    }

    fn age_of(&self, staleness: Staleness) -> Option<u32> {
        match staleness {
            Staleness::Fresh => None,
            Staleness::Aging(n) => Some(n),
            Staleness::Forgotten => match self.forgotten {
                ForgottenCells::Prioritize => Some(self.forgotten_age),
                ForgottenCells::Skip => None,
            },
        }
    }

    /// Pick the best stale cell of `zone` for a unit at `from`
    ///
    /// Evaluation is `age * K / (distance + 1) + score`; the first cell in
    /// row-major order wins ties. The chosen cell pays the visit penalty.
    pub fn select(&mut self, from: Vec2, zone: Zone) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        let mut best_eval = f32::NEG_INFINITY;

        for j in 0..self.rows {
            for i in 0..self.cols {
                if !self.in_zone(zone, i, j) {
                    continue;
                }
                let cell = self.cells[j * self.cols + i];
                let Some(age) = self.age_of(cell.staleness) else {
                    continue;
                };
                let dist = from.distance_to(self.cell_center(i, j)) + 1.0;
                let eval = age as f32 * self.age_weight / dist + cell.score;
                if eval > best_eval {
                    best_eval = eval;
                    best = Some((i, j));
                }
            }
        }

        if let Some((i, j)) = best {
            self.cells[j * self.cols + i].score -= self.visit_penalty;
        }
        best
    }

    /// Age every cell by one turn
    pub fn end_turn(&mut self) {
        let max_age = self.max_age;
        for cell in &mut self.cells {
            cell.staleness = match cell.staleness {
                Staleness::Fresh if max_age >= 1 => Staleness::Aging(1),
                Staleness::Aging(n) if n < max_age => Staleness::Aging(n + 1),
                Staleness::Forgotten => Staleness::Forgotten,
                _ => Staleness::Forgotten,
            };
        }
    }
}
