// Rendering adapter: cell state -> sprite -> backend output
// Drawing is a pure function of cell state so any backend can plug in

use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use crate::ms_board::Cell;
use crate::ms_color::Palette;
use crate::ms_game::GameState;

/// Everything a cell can look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Unopened,
    Pressed, // Unopened, under a held left button
    Flag,
    FalseFlag, // Flag on a safe cell, shown after the round ends
    Mine,
    ExplodedMine,
    Empty,
    Number(u8),
}

pub fn sprite_of(cell: &Cell, pressed: bool, revealed: bool) -> Sprite {
    if cell.has_exploded() {
        Sprite::ExplodedMine
    } else if cell.is_flagged() {
        if revealed && !cell.has_mine() {
            Sprite::FalseFlag
        } else {
            Sprite::Flag
        }
    } else if !cell.is_opened() {
        if pressed { Sprite::Pressed } else { Sprite::Unopened }
    } else if cell.has_mine() {
        Sprite::Mine
    } else if cell.value() == 0 {
        Sprite::Empty
    } else {
        Sprite::Number(cell.value())
    }
}

/// A backend able to paint one sprite
pub trait CellArtist {
    type Output;

    fn draw_cell(&self, sprite: Sprite) -> Self::Output;
}

/// Terminal artist: each cell is two columns wide, a space and a glyph
pub struct TermArtist {
    ascii: bool,
    palette: Palette,
}

impl TermArtist {
    pub fn new(ascii: bool, palette: Palette) -> Self {
        TermArtist { ascii, palette }
    }

    pub fn set_ascii(&mut self, ascii: bool) {
        self.ascii = ascii;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn glyph(&self, sprite: Sprite) -> String {
        let g = match (sprite, self.ascii) {
            (Sprite::Unopened, false) => "■",
            (Sprite::Unopened, true) => "#",
            (Sprite::Flag, false) => "⚑",
            (Sprite::Flag, true) => "F",
            (Sprite::FalseFlag, false) => "✗",
            (Sprite::FalseFlag, true) => "X",
            (Sprite::Mine | Sprite::ExplodedMine, false) => "☼",
            (Sprite::Mine | Sprite::ExplodedMine, true) => "*",
            (Sprite::Number(n), _) => return format!(" {n}"),
            (Sprite::Pressed | Sprite::Empty, _) => " ",
        };
        format!(" {g}")
    }
}

impl CellArtist for TermArtist {
    type Output = Span<'static>;

    fn draw_cell(&self, sprite: Sprite) -> Span<'static> {
        let p = &self.palette;
        let base = Style::default().bg(p.board_bg);
        let style = match sprite {
            Sprite::Unopened => base.fg(p.unopened_fg),
            Sprite::Pressed => base.bg(p.pressed_bg),
            Sprite::Flag => base.fg(p.flag_fg).add_modifier(Modifier::BOLD),
            Sprite::FalseFlag => base.fg(p.flag_fg),
            Sprite::Mine => base.fg(p.mine_fg),
            Sprite::ExplodedMine => base.bg(p.exploded_bg).fg(p.mine_fg),
            Sprite::Empty => base,
            Sprite::Number(n) => base.fg(p.number(n)).add_modifier(Modifier::BOLD),
        };
        Span::styled(self.glyph(sprite), style)
    }
}

/// Three-digit counter display, clamped to 0..=999
pub fn counter_digits(value: u64) -> [u8; 3] {
    let v = value.min(999);
    [(v / 100) as u8, (v / 10 % 10) as u8, (v % 10) as u8]
}

pub fn counter_text(value: u64) -> String {
    counter_digits(value).iter().map(|d| char::from(b'0' + d)).collect()
}

/// Face on the new-game button
pub fn face(state: GameState, pressed: bool) -> &'static str {
    match (state, pressed) {
        (_, true) => "[:o]",
        (GameState::Won, _) => "[8)]",
        (GameState::Lost, _) => "[:(]",
        _ => "[:)]",
    }
}
