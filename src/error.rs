use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("coordinates ({x}, {y}) are outside the grid")]
    OutOfBounds { x: usize, y: usize },
    #[error("{mines} mines cannot fit a {width}x{height} grid once the safe zone is excluded")]
    InvalidDifficulty {
        width: usize,
        height: usize,
        mines: usize,
    },
    #[error("game already ended, no new moves are accepted")]
    SessionOver,
}

pub type Result<T> = std::result::Result<T, GameError>;
