use std::collections::VecDeque;

use rand::Rng;

use crate::error::{GameError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellContent {
    Mine,
    Clue(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub state: CellState,
    pub content: CellContent,
}

impl Cell {
    const fn cleared() -> Self {
        Self {
            state: CellState::Hidden,
            content: CellContent::Clue(0),
        }
    }

    pub const fn is_mine(self) -> bool {
        matches!(self.content, CellContent::Mine)
    }

    /// Adjacent-mine count; only meaningful for non-mine cells after the clue pass.
    pub const fn clue(self) -> u8 {
        match self.content {
            CellContent::Mine => 0,
            CellContent::Clue(n) => n,
        }
    }
}

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Row-major board, zero-indexed, cells stored flat at `y * width + x`.
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::cleared(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn validate(&self, x: usize, y: usize) -> Result<(usize, usize)> {
        if x < self.width && y < self.height {
            Ok((x, y))
        } else {
            Err(GameError::OutOfBounds { x, y })
        }
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Result<Cell> {
        self.validate(x, y)?;
        Ok(self.at(x, y))
    }

    pub(crate) fn at(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }

    fn at_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        &mut self.cells[y * self.width + x]
    }

    pub fn set_mine(&mut self, x: usize, y: usize, value: bool) -> Result<()> {
        self.validate(x, y)?;
        self.at_mut(x, y).content = if value {
            CellContent::Mine
        } else {
            CellContent::Clue(0)
        };
        Ok(())
    }

    /// Flips the flag on a hidden cell. Returns the new flag state, or `None`
    /// when the cell is already revealed and nothing changed.
    pub fn toggle_flag(&mut self, x: usize, y: usize) -> Result<Option<bool>> {
        self.validate(x, y)?;
        let cell = self.at_mut(x, y);
        let toggled = match cell.state {
            CellState::Hidden => {
                cell.state = CellState::Flagged;
                Some(true)
            }
            CellState::Flagged => {
                cell.state = CellState::Hidden;
                Some(false)
            }
            CellState::Revealed => None,
        };
        Ok(toggled)
    }

    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            (nx < self.width && ny < self.height).then_some((nx, ny))
        })
    }

    /// Cells a mine may land on given the 3x3 exclusion zone around the safe cell.
    fn eligible_cells(&self, safe_x: usize, safe_y: usize) -> usize {
        let zone_w = (safe_x.saturating_sub(1)..=(safe_x + 1).min(self.width - 1)).count();
        let zone_h = (safe_y.saturating_sub(1)..=(safe_y + 1).min(self.height - 1)).count();
        self.width * self.height - zone_w * zone_h
    }

    /// Scatters `mine_count` mines uniformly, keeping the full 3x3 block around
    /// `(safe_x, safe_y)` clear so the first click always lands on a safe cell.
    pub fn place_mines(
        &mut self,
        rng: &mut impl Rng,
        (safe_x, safe_y): (usize, usize),
        mine_count: usize,
    ) -> Result<()> {
        self.validate(safe_x, safe_y)?;
        if mine_count > self.eligible_cells(safe_x, safe_y) {
            return Err(GameError::InvalidDifficulty {
                width: self.width,
                height: self.height,
                mines: mine_count,
            });
        }
        let mut placed = 0;
        while placed < mine_count {
            let x = rng.random_range(0..self.width);
            let y = rng.random_range(0..self.height);
            if x.abs_diff(safe_x) <= 1 && y.abs_diff(safe_y) <= 1 {
                continue;
            }
            if self.at(x, y).is_mine() {
                continue;
            }
            self.at_mut(x, y).content = CellContent::Mine;
            placed += 1;
        }
        Ok(())
    }

    /// Stores the adjacent-mine count on every non-mine cell. Runs once,
    /// right after placement.
    pub fn calculate_clues(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                if self.at(x, y).is_mine() {
                    continue;
                }
                let mines = self
                    .neighbors(x, y)
                    .filter(|&(nx, ny)| self.at(nx, ny).is_mine())
                    .count();
                self.at_mut(x, y).content = CellContent::Clue(mines as u8);
            }
        }
    }

    /// Flood-fill reveal starting at `(x, y)`, returning how many cells were
    /// newly revealed. Revealed and flagged cells are skipped; zero-clue cells
    /// cascade to all eight neighbors. Cells are marked before their neighbors
    /// are enqueued, so the result is independent of traversal order.
    pub fn reveal_from(&mut self, x: usize, y: usize) -> usize {
        let mut revealed = 0;
        let mut queue = VecDeque::from([(x, y)]);
        while let Some((cx, cy)) = queue.pop_front() {
            let cell = self.at_mut(cx, cy);
            if cell.state != CellState::Hidden {
                continue;
            }
            cell.state = CellState::Revealed;
            let cascade = cell.content == CellContent::Clue(0);
            revealed += 1;
            if cascade {
                queue.extend(self.neighbors(cx, cy));
            }
        }
        revealed
    }
}
