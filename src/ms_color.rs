use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Colour depth of the running terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Indexed, // 256 colours
    Basic,   // ANSI 16
}

impl Depth {
    pub fn detect() -> Depth {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Indexed
        } else {
            Depth::Basic
        }
    }
}

/// Extends Ratatui's Color so ANSI names look the same across terminals
pub trait TermMatch {
    /// Windows Terminal "Campbell" look at the given colour depth
    fn matched(self, depth: Depth) -> Color;
}

// (RGB, ANSI 256 index) for each standard ANSI colour
fn campbell(color: Color) -> Option<((u8, u8, u8), u8)> {
    match color {
        Color::Black => Some(((12, 12, 12), 232)),
        Color::Red => Some(((197, 15, 31), 160)),
        Color::Green => Some(((19, 161, 14), 28)),
        Color::Yellow => Some(((193, 156, 0), 178)),
        Color::Blue => Some(((0, 55, 218), 20)),
        Color::Magenta => Some(((136, 23, 152), 90)),
        Color::Cyan => Some(((58, 150, 221), 38)),
        Color::Gray => Some(((204, 204, 204), 250)),
        Color::DarkGray => Some(((118, 118, 118), 243)),
        Color::LightRed => Some(((231, 72, 86), 203)),
        Color::LightGreen => Some(((22, 198, 12), 46)),
        Color::LightYellow => Some(((249, 241, 165), 229)),
        Color::LightBlue => Some(((59, 120, 255), 63)),
        Color::LightMagenta => Some(((180, 0, 158), 163)),
        Color::LightCyan => Some(((97, 214, 214), 116)),
        Color::White => Some(((242, 242, 242), 255)),
        _ => None,
    }
}

impl TermMatch for Color {
    fn matched(self, depth: Depth) -> Color {
        match (campbell(self), depth) {
            (Some(((r, g, b), _)), Depth::TrueColor) => Color::Rgb(r, g, b),
            (Some((_, index)), Depth::Indexed) => Color::Indexed(index),
            _ => self,
        }
    }
}

/// Classic digit colours for values 1..=8
const NUMBER_COLORS: [Color; 8] = [
    Color::LightBlue,
    Color::Green,
    Color::LightRed,
    Color::Blue,
    Color::Red,
    Color::Cyan,
    Color::Black,
    Color::DarkGray,
];

/// Every colour the board needs, resolved once for the terminal
#[derive(Debug, Clone)]
pub struct Palette {
    pub board_bg: Color,
    pub unopened_fg: Color,
    pub pressed_bg: Color,
    pub cursor_bg: Color,
    pub flag_fg: Color,
    pub mine_fg: Color,
    pub exploded_bg: Color,
    pub text_fg: Color,
    pub accent_fg: Color,
    numbers: [Color; 8],
}

impl Palette {
    pub fn new(depth: Depth) -> Self {
        Palette {
            board_bg: Color::Gray.matched(depth),
            unopened_fg: Color::White.matched(depth),
            pressed_bg: Color::DarkGray.matched(depth),
            cursor_bg: Color::LightYellow.matched(depth),
            flag_fg: Color::Red.matched(depth),
            mine_fg: Color::Black.matched(depth),
            exploded_bg: Color::Red.matched(depth),
            text_fg: Color::White.matched(depth),
            accent_fg: Color::Yellow.matched(depth),
            numbers: NUMBER_COLORS.map(|c| c.matched(depth)),
        }
    }

    /// Colour of an adjacency digit; values outside 1..=8 use the mine colour
    pub fn number(&self, value: u8) -> Color {
        match value {
            1..=8 => self.numbers[value as usize - 1],
            _ => self.mine_fg,
        }
    }
}
