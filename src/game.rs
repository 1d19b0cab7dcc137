use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{GameError, Result};
use crate::grid::{CellState, Grid};

/// Fixed difficulty triple. The three shipped presets are selectable by index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

pub const PRESETS: [Preset; 3] = [
    Preset {
        width: 8,
        height: 8,
        mines: 10,
    },
    Preset {
        width: 12,
        height: 12,
        mines: 20,
    },
    Preset {
        width: 16,
        height: 16,
        mines: 40,
    },
];

impl Preset {
    pub fn from_index(index: usize) -> Option<Preset> {
        PRESETS.get(index).copied()
    }

    pub const fn safe_cells(self) -> usize {
        self.width * self.height - self.mines
    }

    /// Most mines any first click can accommodate: a corner click clips the
    /// exclusion zone down to 2x2. Larger zones are re-checked at placement
    /// time against the actual click.
    fn max_mines(self) -> usize {
        self.width * self.height - self.width.min(2) * self.height.min(2)
    }
}

enum Phase {
    Fresh,
    Active { started: Instant },
    Finished { took: Duration, victory: bool },
}

/// One game. Owns the grid; mines are placed lazily on the first reveal
/// click so that click can never lose.
pub struct Session {
    preset: Preset,
    grid: Grid,
    phase: Phase,
    flag_count: usize,
    revealed_count: usize,
    hit_mine: Option<(usize, usize)>,
    rng: StdRng,
}

impl Session {
    pub fn new(preset: Preset) -> Result<Self> {
        Self::with_rng(preset, StdRng::from_os_rng())
    }

    /// Deterministic variant: mine placement is reproducible for a given seed
    /// and first click.
    pub fn seeded(preset: Preset, seed: u64) -> Result<Self> {
        Self::with_rng(preset, StdRng::seed_from_u64(seed))
    }

    fn with_rng(preset: Preset, rng: StdRng) -> Result<Self> {
        if preset.mines > preset.max_mines() {
            return Err(GameError::InvalidDifficulty {
                width: preset.width,
                height: preset.height,
                mines: preset.mines,
            });
        }
        Ok(Self {
            preset,
            grid: Grid::new(preset.width, preset.height),
            phase: Phase::Fresh,
            flag_count: 0,
            revealed_count: 0,
            hit_mine: None,
            rng,
        })
    }

    /// Discards the board and starts over with the same preset.
    pub fn restart(&mut self) {
        self.grid = Grid::new(self.preset.width, self.preset.height);
        self.phase = Phase::Fresh;
        self.flag_count = 0;
        self.revealed_count = 0;
        self.hit_mine = None;
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn is_victory(&self) -> bool {
        matches!(self.phase, Phase::Finished { victory: true, .. })
    }

    pub fn flag_count(&self) -> usize {
        self.flag_count
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn mines_left(&self) -> isize {
        self.preset.mines as isize - self.flag_count as isize
    }

    pub fn elapsed(&self) -> Duration {
        match self.phase {
            Phase::Fresh => Duration::ZERO,
            Phase::Active { started } => started.elapsed(),
            Phase::Finished { took, .. } => took,
        }
    }

    /// Reveal click. The first one of a session places the mines (clear of the
    /// clicked 3x3 zone), computes the clues and starts the clock. A flagged
    /// target is left untouched; a mine target ends the game on the spot,
    /// bypassing the flood fill.
    pub fn reveal(&mut self, x: usize, y: usize) -> Result<()> {
        self.grid.validate(x, y)?;
        if self.is_over() {
            return Err(GameError::SessionOver);
        }
        if matches!(self.phase, Phase::Fresh) {
            self.grid
                .place_mines(&mut self.rng, (x, y), self.preset.mines)?;
            self.grid.calculate_clues();
            self.phase = Phase::Active {
                started: Instant::now(),
            };
        }
        let cell = self.grid.at(x, y);
        if cell.state == CellState::Flagged {
            return Ok(());
        }
        if cell.is_mine() {
            self.hit_mine = Some((x, y));
            self.finish(false);
            return Ok(());
        }
        self.revealed_count += self.grid.reveal_from(x, y);
        if self.revealed_count == self.preset.safe_cells() {
            self.finish(true);
        }
        Ok(())
    }

    /// Flag click. Revealed cells are skipped; allowed while the game has not
    /// started yet, without triggering mine placement.
    pub fn toggle_flag(&mut self, x: usize, y: usize) -> Result<()> {
        self.grid.validate(x, y)?;
        if self.is_over() {
            return Err(GameError::SessionOver);
        }
        match self.grid.toggle_flag(x, y)? {
            Some(true) => self.flag_count += 1,
            Some(false) => self.flag_count -= 1,
            None => {}
        }
        Ok(())
    }

    fn finish(&mut self, victory: bool) {
        let took = match self.phase {
            Phase::Fresh => Duration::ZERO,
            Phase::Active { started } => started.elapsed(),
            Phase::Finished { took, .. } => took,
        };
        self.phase = Phase::Finished { took, victory };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let is_over = self.is_over();
        let (width, height) = (self.grid.width(), self.grid.height());
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let cell = self.grid.at(x, y);
                let revealed = cell.state == CellState::Revealed;
                cells.push(CellView {
                    revealed,
                    flagged: cell.state == CellState::Flagged,
                    mine: cell.is_mine() && (revealed || is_over),
                    clue: cell.clue(),
                });
            }
        }
        SessionSnapshot {
            width,
            height,
            mine_count: self.preset.mines,
            flag_count: self.flag_count,
            revealed_count: self.revealed_count,
            is_over,
            is_victory: self.is_victory(),
            hit_mine: self.hit_mine,
            elapsed: self.elapsed(),
            cells,
        }
    }
}

/// Player-visible cell: the mine flag is only exposed once the cell is
/// revealed or the session is over.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CellView {
    pub revealed: bool,
    pub flagged: bool,
    pub mine: bool,
    pub clue: u8,
}

/// Everything the display adapter needs to repaint, read in one call.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub width: usize,
    pub height: usize,
    pub mine_count: usize,
    pub flag_count: usize,
    pub revealed_count: usize,
    pub is_over: bool,
    pub is_victory: bool,
    pub hit_mine: Option<(usize, usize)>,
    pub elapsed: Duration,
    cells: Vec<CellView>,
}

impl SessionSnapshot {
    pub fn cell(&self, x: usize, y: usize) -> &CellView {
        &self.cells[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Session with a hand-placed layout, already past the first-click gate.
    fn active_session(preset: Preset, mines: &[(usize, usize)]) -> Session {
        assert_eq!(preset.mines, mines.len());
        let mut session = Session::seeded(preset, 0).unwrap();
        for &(x, y) in mines {
            session.grid.set_mine(x, y, true).unwrap();
        }
        session.grid.calculate_clues();
        session.phase = Phase::Active {
            started: Instant::now(),
        };
        session
    }

    fn mine_positions(session: &Session) -> Vec<(usize, usize)> {
        let mut mines = Vec::new();
        for y in 0..session.grid.height() {
            for x in 0..session.grid.width() {
                if session.grid.at(x, y).is_mine() {
                    mines.push((x, y));
                }
            }
        }
        mines
    }

    #[test]
    fn first_reveal_click_places_mines_clear_of_the_clicked_zone() {
        for seed in 0..16 {
            let mut session = Session::seeded(PRESETS[0], seed).unwrap();
            session.reveal(0, 0).unwrap();
            let mines = mine_positions(&session);
            assert_eq!(mines.len(), 10);
            for (x, y) in mines {
                assert!(
                    x > 1 || y > 1,
                    "mine at ({x}, {y}) next to the first click (seed {seed})"
                );
            }
            assert!(session.revealed_count() >= 1);
            assert!(!session.is_over() || session.is_victory());
        }
    }

    #[test]
    fn flagging_while_fresh_does_not_place_mines() {
        let mut session = Session::seeded(PRESETS[0], 7).unwrap();
        session.toggle_flag(5, 5).unwrap();
        assert_eq!(session.flag_count(), 1);
        assert!(mine_positions(&session).is_empty());
        assert_eq!(session.elapsed(), Duration::ZERO);

        session.reveal(0, 0).unwrap();
        assert_eq!(mine_positions(&session).len(), 10);
        let view = session.snapshot();
        assert!(view.cell(5, 5).flagged);
    }

    #[test]
    fn corner_mine_scenario_cascades_to_victory() {
        let preset = Preset {
            width: 3,
            height: 3,
            mines: 1,
        };
        let mut session = active_session(preset, &[(2, 2)]);
        session.reveal(0, 0).unwrap();
        assert_eq!(session.revealed_count(), 8);
        assert!(session.is_over());
        assert!(session.is_victory());
        // the mine itself was never auto-revealed
        assert_eq!(session.grid.at(2, 2).state, CellState::Hidden);
    }

    #[test]
    fn revealing_a_mine_loses_and_latches_the_session() {
        let preset = Preset {
            width: 2,
            height: 2,
            mines: 1,
        };
        let mut session = active_session(preset, &[(0, 0)]);
        session.reveal(0, 0).unwrap();
        assert!(session.is_over());
        assert!(!session.is_victory());
        assert_eq!(session.hit_mine, Some((0, 0)));
        assert_eq!(session.revealed_count(), 0);

        assert_eq!(session.reveal(1, 1), Err(GameError::SessionOver));
        assert_eq!(session.toggle_flag(1, 1), Err(GameError::SessionOver));
        assert_eq!(session.flag_count(), 0);
        assert_eq!(session.revealed_count(), 0);
    }

    #[test]
    fn flagged_cells_are_protected_from_reveal_clicks() {
        let preset = Preset {
            width: 2,
            height: 2,
            mines: 1,
        };
        let mut session = active_session(preset, &[(0, 0)]);
        session.toggle_flag(0, 0).unwrap();
        session.reveal(0, 0).unwrap();
        assert!(!session.is_over(), "flagged mine must not trip");
        assert_eq!(session.revealed_count(), 0);
        assert_eq!(session.grid.at(0, 0).state, CellState::Flagged);

        session.toggle_flag(1, 1).unwrap();
        session.reveal(1, 1).unwrap();
        assert_eq!(session.revealed_count(), 0);
        assert_eq!(session.grid.at(1, 1).state, CellState::Flagged);
    }

    #[test]
    fn victory_lands_exactly_on_the_last_safe_cell() {
        let preset = Preset {
            width: 2,
            height: 2,
            mines: 1,
        };
        let mut session = active_session(preset, &[(0, 0)]);
        session.reveal(1, 0).unwrap();
        assert!(!session.is_over());
        session.reveal(0, 1).unwrap();
        assert!(!session.is_over());
        session.reveal(1, 1).unwrap();
        assert_eq!(session.revealed_count(), preset.safe_cells());
        assert!(session.is_victory());
    }

    #[test]
    fn flag_count_tracks_flagged_cells() {
        let preset = Preset {
            width: 3,
            height: 3,
            mines: 1,
        };
        let mut session = active_session(preset, &[(2, 2)]);
        session.toggle_flag(0, 0).unwrap();
        session.toggle_flag(1, 0).unwrap();
        assert_eq!(session.flag_count(), 2);
        assert_eq!(session.mines_left(), -1);
        session.toggle_flag(1, 0).unwrap();
        assert_eq!(session.flag_count(), 1);

        // flagging a revealed cell is a no-op
        session.reveal(2, 0).unwrap();
        session.toggle_flag(2, 0).unwrap();
        assert_eq!(session.flag_count(), 1);
    }

    #[test]
    fn out_of_bounds_coordinates_surface_a_typed_error() {
        let mut session = Session::seeded(PRESETS[0], 0).unwrap();
        assert_eq!(
            session.reveal(8, 0),
            Err(GameError::OutOfBounds { x: 8, y: 0 })
        );
        assert_eq!(
            session.toggle_flag(0, 99),
            Err(GameError::OutOfBounds { x: 0, y: 99 })
        );
    }

    #[test]
    fn elapsed_is_zero_until_the_first_reveal_click() {
        let session = Session::seeded(PRESETS[0], 0).unwrap();
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn snapshot_hides_mines_until_the_session_is_over() {
        let preset = Preset {
            width: 2,
            height: 2,
            mines: 1,
        };
        let mut session = active_session(preset, &[(0, 0)]);
        let view = session.snapshot();
        assert!(!view.cell(0, 0).mine);

        session.reveal(1, 1).unwrap();
        let view = session.snapshot();
        assert!(view.cell(1, 1).revealed);
        assert_eq!(view.cell(1, 1).clue, 1);
        assert!(!view.cell(0, 0).mine, "mine stays hidden mid-game");

        session.reveal(0, 0).unwrap();
        let view = session.snapshot();
        assert!(view.is_over);
        assert!(view.cell(0, 0).mine);
        assert_eq!(view.hit_mine, Some((0, 0)));
    }

    #[test]
    fn unsatisfiable_presets_are_rejected_before_any_state_exists() {
        let preset = Preset {
            width: 1,
            height: 1,
            mines: 1,
        };
        assert!(matches!(
            Session::new(preset),
            Err(GameError::InvalidDifficulty { .. })
        ));

        // a 3x3 board with one mine works from a corner, but a center first
        // click leaves no eligible cell
        let preset = Preset {
            width: 3,
            height: 3,
            mines: 1,
        };
        let mut session = Session::seeded(preset, 0).unwrap();
        assert!(matches!(
            session.reveal(1, 1),
            Err(GameError::InvalidDifficulty { .. })
        ));
        // the failed click mutated nothing
        assert!(mine_positions(&session).is_empty());
        assert_eq!(session.elapsed(), Duration::ZERO);
        session.reveal(0, 0).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                if !session.is_over() && !session.grid.at(x, y).is_mine() {
                    session.reveal(x, y).unwrap();
                }
            }
        }
        assert!(session.is_victory());
    }

    #[test]
    fn restart_discards_the_board_and_counters() {
        let mut session = Session::seeded(PRESETS[0], 3).unwrap();
        session.reveal(4, 4).unwrap();
        session.toggle_flag(0, 0).unwrap();
        session.restart();
        assert_eq!(session.flag_count(), 0);
        assert_eq!(session.revealed_count(), 0);
        assert!(!session.is_over());
        assert_eq!(session.elapsed(), Duration::ZERO);
        assert!(mine_positions(&session).is_empty());
    }
}
