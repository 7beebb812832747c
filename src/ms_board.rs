// Board model, mine generator and reveal engine
// Owns every cell and enforces the open / chord / flag rules

use rand::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Grid coordinates as `(x, y)`: `x` is the column, `y` the row
pub type Coord = (usize, usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cannot place {mines} mines on {cells} cells: the first opened cell must stay safe")]
    TooManyMines { mines: usize, cells: usize },
}

/// A single cell on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    x: usize,
    y: usize,
    value: u8, // Adjacent mine count (0-8)
    has_mine: bool,
    is_opened: bool,
    is_flagged: bool,
    has_exploded: bool,
}

impl Cell {
    fn new(x: usize, y: usize) -> Self {
        Cell {
            x,
            y,
            value: 0,
            has_mine: false,
            is_opened: false,
            is_flagged: false,
            has_exploded: false,
        }
    }

    pub fn pos(&self) -> Coord {
        (self.x, self.y)
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn has_mine(&self) -> bool {
        self.has_mine
    }

    pub fn is_opened(&self) -> bool {
        self.is_opened
    }

    pub fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    pub fn has_exploded(&self) -> bool {
        self.has_exploded
    }
}

/// Up to 8 neighbours of `(x, y)`, clipped at the edges of a `cols × rows` grid
fn neighbors(x: usize, y: usize, cols: usize, rows: usize) -> impl Iterator<Item = Coord> {
    let xs = x.saturating_sub(1)..=(x + 1).min(cols - 1);
    let ys = y.saturating_sub(1)..=(y + 1).min(rows - 1);
    ys.flat_map(move |ny| xs.clone().map(move |nx| (nx, ny)))
        .filter(move |&pos| pos != (x, y))
}

/// Rectangular minefield
///
/// Starts empty: mines are only placed by [`Board::generate`], which the
/// game calls on the first open so the clicked cell is always safe.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    num_mines: usize,
    cells: Vec<Cell>, // Row-major, index = y * cols + x
    generated: bool,
    revealed: bool,
    num_opened: usize, // Opened non-mine cells
    num_flagged: usize,
}

impl Board {
    pub fn new(rows: usize, cols: usize, num_mines: usize) -> Self {
        let cells = (0..rows)
            .flat_map(|y| (0..cols).map(move |x| Cell::new(x, y)))
            .collect();
        Board {
            rows,
            cols,
            num_mines,
            cells,
            generated: false,
            revealed: false,
            num_opened: 0,
            num_flagged: 0,
        }
    }

    /// Build an already generated board with mines at fixed positions
    #[cfg(test)]
    pub fn with_mines(rows: usize, cols: usize, mines: &[Coord]) -> Self {
        let mut board = Board::new(rows, cols, 0);
        for &(x, y) in mines {
            let idx = board.index(x, y);
            board.cells[idx].has_mine = true;
        }
        board.num_mines = board.cells.iter().filter(|c| c.has_mine).count();
        board.compute_values();
        board.generated = true;
        board
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn num_mines(&self) -> usize {
        self.num_mines
    }

    pub fn num_total(&self) -> usize {
        self.rows * self.cols
    }

    pub fn num_opened(&self) -> usize {
        self.num_opened
    }

    pub fn num_flagged(&self) -> usize {
        self.num_flagged
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Mine counter shown to the player, never below zero
    pub fn left_unflagged(&self) -> usize {
        self.num_mines.saturating_sub(self.num_flagged)
    }

    pub fn left_unopened(&self) -> usize {
        self.num_total() - self.num_opened
    }

    /// Flat index of `(x, y)`. Panics outside the grid.
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.cols && y < self.rows,
            "cell ({x}, {y}) is outside the {}x{} board",
            self.cols,
            self.rows
        );
        y * self.cols + x
    }

    pub fn at(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn unopened(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_opened)
    }

    pub fn neighbor_coordinates(&self, x: usize, y: usize) -> impl Iterator<Item = Coord> + use<> {
        self.index(x, y);
        neighbors(x, y, self.cols, self.rows)
    }

    pub fn flags_around(&self, x: usize, y: usize) -> usize {
        self.neighbor_coordinates(x, y)
            .filter(|&(nx, ny)| self.at(nx, ny).is_flagged)
            .count()
    }

    /// Neighbours a chord would open: unopened and unflagged
    pub fn eligible_neighbors(&self, x: usize, y: usize) -> Vec<Coord> {
        self.neighbor_coordinates(x, y)
            .filter(|&(nx, ny)| {
                let c = self.at(nx, ny);
                !c.is_opened && !c.is_flagged
            })
            .collect()
    }

    /// Place mines using the thread-local RNG
    pub fn generate(&mut self, first_click: Coord) -> Result<(), BoardError> {
        self.generate_with(first_click, &mut thread_rng())
    }

    /// Place `num_mines` mines uniformly at random, never on `first_click`,
    /// then compute every adjacency count. Runs once per board.
    pub fn generate_with<R: Rng + ?Sized>(
        &mut self,
        first_click: Coord,
        rng: &mut R,
    ) -> Result<(), BoardError> {
        if self.generated {
            debug!("board already generated, ignoring");
            return Ok(());
        }
        let total = self.num_total();
        if self.num_mines >= total {
            return Err(BoardError::TooManyMines {
                mines: self.num_mines,
                cells: total,
            });
        }
        let avoid = self.index(first_click.0, first_click.1);
        let candidates: Vec<usize> = (0..total).filter(|&i| i != avoid).collect();
        for &i in candidates.choose_multiple(rng, self.num_mines) {
            self.cells[i].has_mine = true;
        }
        self.compute_values();
        self.generated = true;
        debug!(
            rows = self.rows,
            cols = self.cols,
            mines = self.num_mines,
            first_x = first_click.0,
            first_y = first_click.1,
            "board generated"
        );
        Ok(())
    }

    fn compute_values(&mut self) {
        for i in 0..self.cells.len() {
            let (x, y) = self.cells[i].pos();
            let value = neighbors(x, y, self.cols, self.rows)
                .filter(|&(nx, ny)| self.cells[ny * self.cols + nx].has_mine)
                .count();
            self.cells[i].value = value as u8;
        }
    }

    /// Open the cell at `(x, y)`
    /// - Flagged cells are left alone
    /// - A mine explodes and nothing cascades from it
    /// - An opened cell chords: with enough flags around it, its unflagged
    ///   neighbours are opened
    /// - Zero-valued cells flood into all their unopened neighbours
    pub fn open(&mut self, x: usize, y: usize) {
        let start = (x, y);
        self.index(x, y);
        let mut stack = vec![start];
        let mut seen: HashSet<Coord> = HashSet::from([start]);
        let mut opened = 0usize;

        while let Some((cx, cy)) = stack.pop() {
            let idx = self.index(cx, cy);
            let (is_flagged, has_mine, is_opened, value) = {
                let c = &self.cells[idx];
                (c.is_flagged, c.has_mine, c.is_opened, c.value)
            };
            if is_flagged {
                continue;
            }
            if has_mine {
                self.cells[idx].has_exploded = true;
                debug!(x = cx, y = cy, "mine exploded");
                continue;
            }

            if is_opened {
                if (cx, cy) == start && self.flags_around(cx, cy) >= value as usize {
                    for pos in self.eligible_neighbors(cx, cy) {
                        if seen.insert(pos) {
                            stack.push(pos);
                        }
                    }
                }
            } else {
                self.cells[idx].is_opened = true;
                self.num_opened += 1;
                opened += 1;
            }

            if value == 0 {
                for pos in neighbors(cx, cy, self.cols, self.rows) {
                    if !self.cells[pos.1 * self.cols + pos.0].is_opened && seen.insert(pos) {
                        stack.push(pos);
                    }
                }
            }
        }

        if opened > 1 {
            debug!(x, y, opened, "flood fill");
        }
    }

    /// Flip the flag on an unopened cell; opened cells are ignored
    pub fn toggle_flag(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        if cell.is_opened {
            return;
        }
        cell.is_flagged = !cell.is_flagged;
        if cell.is_flagged {
            self.num_flagged += 1;
        } else {
            self.num_flagged -= 1;
        }
    }

    pub fn is_lost(&self) -> bool {
        self.cells().any(|c| c.has_exploded)
    }

    /// Every cell still closed holds a mine
    pub fn is_won(&self) -> bool {
        self.generated && self.unopened().all(|c| c.has_mine)
    }

    pub fn is_finished(&self) -> bool {
        self.is_lost() || self.is_won()
    }

    /// Open every remaining mine for the final picture. Flags stay in place.
    pub fn reveal(&mut self) {
        if self.revealed {
            return;
        }
        for cell in self.cells.iter_mut().filter(|c| c.has_mine && !c.is_opened) {
            cell.is_opened = true;
        }
        self.revealed = true;
    }
}
