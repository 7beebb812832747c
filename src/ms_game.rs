// Game facade: difficulty modes, state machine and timer
// Wraps a Board and decides when a round is over

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::{Duration, Instant};
use tracing::info;

use crate::ms_board::{Board, BoardError, Coord};

/// Difficulty presets and custom settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Easy,   // 9x9, 10 mines
    Medium, // 16x16, 40 mines
    Hard,   // 16 rows x 30 cols, 99 mines
    Custom { rows: usize, cols: usize, mines: usize },
}

impl Serialize for Mode {
    /// Serialize the mode by name; custom dimensions are stored separately
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Mode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Easy" => Ok(Mode::Easy),
            "Medium" => Ok(Mode::Medium),
            "Hard" => Ok(Mode::Hard),
            // Rebuilt from custom_rows/cols/mines once the whole config is read
            "Custom" => Ok(Mode::Custom { rows: 0, cols: 0, mines: 0 }),
            _ => Err(serde::de::Error::custom("unknown mode")),
        }
    }
}

impl Mode {
    /// (rows, cols, mines)
    pub fn params(&self) -> (usize, usize, usize) {
        match *self {
            Mode::Easy => (9, 9, 10),
            Mode::Medium => (16, 16, 40),
            Mode::Hard => (16, 30, 99),
            Mode::Custom { rows, cols, mines } => (rows, cols, mines),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Easy => "Easy",
            Mode::Medium => "Medium",
            Mode::Hard => "Hard",
            Mode::Custom { .. } => "Custom",
        }
    }

    fn board(&self) -> Board {
        let (rows, cols, mines) = self.params();
        Board::new(rows, cols, mines)
    }
}

/// Round lifecycle: `Unstarted -> Playing -> Won | Lost`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Unstarted, // No mines placed yet
    Playing,
    Won,
    Lost,
}

pub struct Game {
    mode: Mode,
    board: Board,
    state: GameState,
    started_at: Option<Instant>,
    elapsed: Duration, // Frozen play time once the round is over
    pub cursor: Coord,
}

impl Game {
    pub fn new(mode: Mode) -> Self {
        Game {
            mode,
            board: mode.board(),
            state: GameState::Unstarted,
            started_at: None,
            elapsed: Duration::ZERO,
            cursor: (0, 0),
        }
    }

    #[cfg(test)]
    pub fn with_board(board: Board) -> Self {
        let mode = Mode::Custom {
            rows: board.rows(),
            cols: board.cols(),
            mines: board.num_mines(),
        };
        let state = if board.is_generated() {
            GameState::Playing
        } else {
            GameState::Unstarted
        };
        Game {
            mode,
            board,
            state,
            started_at: Some(Instant::now()),
            elapsed: Duration::ZERO,
            cursor: (0, 0),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, GameState::Won | GameState::Lost)
    }

    /// Throw the board away and start again, optionally with a new mode
    pub fn start_new(&mut self, mode: Option<Mode>) {
        if let Some(m) = mode {
            self.mode = m;
        }
        self.board = self.mode.board();
        self.state = GameState::Unstarted;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        self.cursor = (0, 0);
        let (rows, cols, mines) = self.mode.params();
        info!(mode = self.mode.name(), rows, cols, mines, "new game");
    }

    /// Open a cell, placing the mines first if this is the opening move
    pub fn open_at(&mut self, x: usize, y: usize) -> Result<(), BoardError> {
        if self.is_over() {
            return Ok(());
        }
        if !self.board.is_generated() {
            self.board.generate((x, y))?;
            self.started_at = Some(Instant::now());
            self.state = GameState::Playing;
        }
        self.board.open(x, y);
        Ok(())
    }

    pub fn flag_at(&mut self, x: usize, y: usize) {
        if self.is_over() {
            return;
        }
        self.board.toggle_flag(x, y);
    }

    /// Detect the end of a round. On the transition the timer is frozen
    /// and every mine is revealed; the new state is returned once.
    pub fn update(&mut self) -> Option<GameState> {
        if self.state != GameState::Playing || !self.board.is_finished() {
            return None;
        }
        if let Some(t0) = self.started_at {
            self.elapsed = t0.elapsed();
        }
        self.board.reveal();
        self.state = if self.board.is_lost() {
            GameState::Lost
        } else {
            GameState::Won
        };
        info!(
            mode = self.mode.name(),
            result = ?self.state,
            secs = self.elapsed.as_secs(),
            opened = self.board.num_opened(),
            unopened = self.board.left_unopened(),
            flags = self.board.num_flagged(),
            "game over"
        );
        Some(self.state)
    }

    pub fn elapsed_secs(&self) -> u64 {
        match (self.state, self.started_at) {
            (GameState::Playing, Some(t0)) => t0.elapsed().as_secs(),
            _ => self.elapsed.as_secs(),
        }
    }

    /// Mine counter: total mines minus placed flags
    pub fn left_unflagged(&self) -> usize {
        self.board.left_unflagged()
    }

    /// Cells drawn sunken while the left button is held over `hovered`
    pub fn pressed_cells(&self, hovered: Option<Coord>, left_down: bool) -> Vec<Coord> {
        let Some((x, y)) = hovered else {
            return Vec::new();
        };
        if !left_down || self.is_over() {
            return Vec::new();
        }
        let cell = self.board.at(x, y);
        if cell.is_flagged() {
            Vec::new()
        } else if cell.is_opened() {
            self.board.eligible_neighbors(x, y)
        } else {
            vec![(x, y)]
        }
    }

    pub fn step_cursor(&mut self, dx: isize, dy: isize) {
        let max_x = self.board.cols().saturating_sub(1) as isize;
        let max_y = self.board.rows().saturating_sub(1) as isize;
        let nx = (self.cursor.0 as isize + dx).clamp(0, max_x) as usize;
        let ny = (self.cursor.1 as isize + dy).clamp(0, max_y) as usize;
        self.cursor = (nx, ny);
    }
}
