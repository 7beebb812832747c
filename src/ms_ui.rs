// Terminal UI: layout, drawing and mouse/keyboard dispatch
// Runs the fixed-rate input loop on top of crossterm and ratatui

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::Duration;
use tracing::{error, info, warn};
use unicode_width::UnicodeWidthStr;

use crate::ms_board::Coord;
use crate::ms_color::{Depth, Palette};
use crate::ms_config::{Config, save_config};
use crate::ms_draw::{CellArtist, TermArtist, counter_text, face, sprite_of};
use crate::ms_game::{Game, GameState, Mode};

// Each cell is drawn as a space followed by its glyph
const CELL_W: u16 = 2;
const FRAME: Duration = Duration::from_millis(50);
const HELP: &str = "F2 new  1-4 mode  arrows+space open  f flag  a icons  q quit";

/// Map a terminal position to the board cell under it.
/// `inner` is the board area without its border.
pub fn cell_under(inner: Rect, cols: usize, rows: usize, column: u16, row: u16) -> Option<Coord> {
    if column < inner.x || row < inner.y {
        return None;
    }
    let x = ((column - inner.x) / CELL_W) as usize;
    let y = (row - inner.y) as usize;
    (x < cols && y < rows).then_some((x, y))
}

fn contains(r: Rect, column: u16, row: u16) -> bool {
    column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
}

// Runtime state of the input loop
#[derive(Debug, Default)]
struct UiState {
    left_down: bool,
    hover: Option<Coord>,
    new_pressed: bool,
    keyboard: bool, // Show the keyboard cursor
    board_inner: Option<Rect>,
    new_rect: Option<Rect>,
    message: Option<String>,
    quit: bool,
}

impl UiState {
    fn reset_after_new_game(&mut self) {
        self.left_down = false;
        self.hover = None;
        self.new_pressed = false;
        self.message = None;
    }
}

pub fn run(cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, cfg);

    if let Err(e) = save_config(cfg) {
        warn!(error = %e, "could not save config");
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    let mut game = Game::new(cfg.mode);
    let mut ui = UiState::default();
    let mut artist = TermArtist::new(cfg.ascii_icons, Palette::new(Depth::detect()));
    info!(mode = cfg.mode.name(), "game ready");

    while !ui.quit {
        terminal.draw(|f| draw(f, &game, cfg, &mut ui, &artist))?;

        if event::poll(FRAME)? {
            match event::read()? {
                Event::Key(key) => on_key(key, &mut game, cfg, &mut ui, &mut artist),
                Event::Mouse(me) => on_mouse(me, &mut game, &mut ui),
                _ => {}
            }
            settle(&mut game, cfg, &mut ui);
        }
    }
    Ok(())
}

fn switch_mode(mode: Mode, game: &mut Game, cfg: &mut Config, ui: &mut UiState) {
    cfg.mode = mode;
    game.start_new(Some(mode));
    ui.reset_after_new_game();
    if let Err(e) = save_config(cfg) {
        warn!(error = %e, "could not save config");
    }
}

fn on_key(key: KeyEvent, game: &mut Game, cfg: &mut Config, ui: &mut UiState, artist: &mut TermArtist) {
    // Windows reports both press and release
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => ui.quit = true,
        KeyCode::F(2) => {
            game.start_new(None);
            ui.reset_after_new_game();
        }
        KeyCode::Char('1') => switch_mode(Mode::Easy, game, cfg, ui),
        KeyCode::Char('2') => switch_mode(Mode::Medium, game, cfg, ui),
        KeyCode::Char('3') => switch_mode(Mode::Hard, game, cfg, ui),
        KeyCode::Char('4') => {
            let mode = cfg.custom_mode();
            switch_mode(mode, game, cfg, ui);
        }
        KeyCode::Char('a') => {
            cfg.ascii_icons = !cfg.ascii_icons;
            artist.set_ascii(cfg.ascii_icons);
        }
        KeyCode::Left | KeyCode::Char('h') => move_cursor(game, ui, -1, 0),
        KeyCode::Right | KeyCode::Char('l') => move_cursor(game, ui, 1, 0),
        KeyCode::Up | KeyCode::Char('k') => move_cursor(game, ui, 0, -1),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(game, ui, 0, 1),
        KeyCode::Char(' ') | KeyCode::Enter => {
            ui.keyboard = true;
            let (x, y) = game.cursor;
            open_cell(game, ui, x, y);
        }
        KeyCode::Char('f') => {
            ui.keyboard = true;
            let (x, y) = game.cursor;
            game.flag_at(x, y);
        }
        _ => {}
    }
}

fn move_cursor(game: &mut Game, ui: &mut UiState, dx: isize, dy: isize) {
    ui.keyboard = true;
    game.step_cursor(dx, dy);
}

fn on_mouse(me: MouseEvent, game: &mut Game, ui: &mut UiState) {
    let over_cell = ui.board_inner.and_then(|inner| {
        cell_under(inner, game.board().cols(), game.board().rows(), me.column, me.row)
    });
    let over_new = ui.new_rect.is_some_and(|r| contains(r, me.column, me.row));

    match me.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            ui.hover = over_cell;
            ui.new_pressed = ui.new_pressed && over_new;
            if over_cell.is_some() {
                ui.keyboard = false;
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            ui.left_down = true;
            ui.hover = over_cell;
            ui.new_pressed = over_new;
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if ui.left_down {
                if ui.new_pressed && over_new {
                    game.start_new(None);
                    ui.reset_after_new_game();
                } else if let Some((x, y)) = over_cell {
                    open_cell(game, ui, x, y);
                }
            }
            ui.left_down = false;
            ui.new_pressed = false;
        }
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some((x, y)) = over_cell {
                game.flag_at(x, y);
            }
        }
        _ => {}
    }
}

fn open_cell(game: &mut Game, ui: &mut UiState, x: usize, y: usize) {
    if let Err(e) = game.open_at(x, y) {
        error!(error = %e, "board generation failed");
        ui.message = Some(e.to_string());
    }
}

/// Run end-of-round detection after every input event
fn settle(game: &mut Game, cfg: &mut Config, ui: &mut UiState) {
    let Some(state) = game.update() else {
        return;
    };
    ui.left_down = false;
    ui.message = Some(match state {
        GameState::Won => {
            let secs = game.elapsed_secs();
            if cfg.set_record(&game.mode(), secs) {
                info!(mode = game.mode().name(), secs, "new record");
                if let Err(e) = save_config(cfg) {
                    warn!(error = %e, "could not save record");
                }
                format!("Cleared in {secs}s. New record!")
            } else {
                format!("Cleared in {secs}s.")
            }
        }
        _ => "Boom. Press F2 or click the face to retry.".to_string(),
    });
}

fn draw<B: Backend>(f: &mut Frame<B>, game: &Game, cfg: &Config, ui: &mut UiState, artist: &TermArtist) {
    let size = f.size();
    let board = game.board();
    // Oversized boards saturate and fall into the too-small warning
    let board_w = u16::try_from(board.cols())
        .unwrap_or(u16::MAX)
        .saturating_mul(CELL_W)
        .saturating_add(2);
    let board_h = u16::try_from(board.rows()).unwrap_or(u16::MAX).saturating_add(2);
    let min_w = board_w.max(HELP.width() as u16 + 2);
    let min_h = board_h.saturating_add(6);

    if size.width < min_w || size.height < min_h {
        ui.board_inner = None;
        ui.new_rect = None;
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_w, min_h))),
        ];
        let warning = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let w = 40u16.min(size.width);
        let h = 4u16.min(size.height);
        f.render_widget(warning, center_rect(w, h, size));
        return;
    }

    let p = artist.palette();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(board_h), Constraint::Length(3)].as_ref())
        .split(size);

    // Header: mines left, face button, timer
    let header = center_rect(min_w, 3, chunks[0]);
    f.render_widget(Block::default().borders(Borders::ALL), header);
    let header_inner = Rect::new(header.x + 1, header.y + 1, header.width.saturating_sub(2), 1);
    let counter_style = Style::default().fg(p.flag_fg).add_modifier(Modifier::BOLD);
    let mines = Paragraph::new(Span::styled(counter_text(game.left_unflagged() as u64), counter_style))
        .alignment(Alignment::Left);
    f.render_widget(mines, header_inner);
    let timer = Paragraph::new(Span::styled(counter_text(game.elapsed_secs()), counter_style))
        .alignment(Alignment::Right);
    f.render_widget(timer, header_inner);
    let face_text = face(game.state(), ui.new_pressed);
    let new_rect = center_rect(face_text.width() as u16, 1, header_inner);
    let face_style = Style::default().fg(p.accent_fg).add_modifier(Modifier::BOLD);
    f.render_widget(Paragraph::new(Span::styled(face_text, face_style)), new_rect);
    ui.new_rect = Some(new_rect);

    // Board
    let board_area = center_rect(board_w, board_h, chunks[1]);
    let inner = Rect::new(board_area.x + 1, board_area.y + 1, board_w - 2, board_h - 2);
    ui.board_inner = Some(inner);
    let pressed = game.pressed_cells(ui.hover, ui.left_down);
    let mut lines = Vec::with_capacity(board.rows());
    for y in 0..board.rows() {
        let mut spans = Vec::with_capacity(board.cols());
        for x in 0..board.cols() {
            let cell = board.at(x, y);
            let sprite = sprite_of(cell, pressed.contains(&(x, y)), board.is_revealed());
            let mut span = artist.draw_cell(sprite);
            if ui.keyboard && game.cursor == (x, y) {
                span.style = span.style.bg(p.cursor_bg);
            }
            spans.push(span);
        }
        lines.push(Spans::from(spans));
    }
    let title = match game.mode() {
        Mode::Custom { rows, cols, mines } => format!("Custom {cols}x{rows}/{mines}"),
        m => m.name().to_string(),
    };
    let grid = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center),
    );
    f.render_widget(grid, board_area);

    // Status: last message, else best time and key help
    let status_text = match &ui.message {
        Some(m) => m.clone(),
        None => match cfg.get_record(&game.mode()) {
            Some(r) => format!("Best {}s ({})  {}", r.secs, r.date, HELP),
            None => HELP.to_string(),
        },
    };
    let status = Paragraph::new(Span::styled(status_text, Style::default().fg(p.text_fg)))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(status, chunks[2]);
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn pointer_maps_to_cell_by_division() {
        let inner = Rect::new(10, 5, 18, 9);
        assert_eq!(cell_under(inner, 9, 9, 10, 5), Some((0, 0)));
        assert_eq!(cell_under(inner, 9, 9, 11, 5), Some((0, 0)));
        assert_eq!(cell_under(inner, 9, 9, 12, 6), Some((1, 1)));
        assert_eq!(cell_under(inner, 9, 9, 27, 13), Some((8, 8)));
    }

    #[test]
    fn pointer_outside_board_maps_to_nothing() {
        let inner = Rect::new(10, 5, 18, 9);
        assert_eq!(cell_under(inner, 9, 9, 9, 5), None);
        assert_eq!(cell_under(inner, 9, 9, 10, 4), None);
        assert_eq!(cell_under(inner, 9, 9, 28, 5), None);
        assert_eq!(cell_under(inner, 9, 9, 10, 14), None);
    }

    #[test]
    fn center_rect_stays_inside() {
        let outer = Rect::new(0, 0, 10, 4);
        assert_eq!(center_rect(4, 2, outer), Rect::new(3, 1, 4, 2));
        assert_eq!(center_rect(20, 8, outer), Rect::new(0, 0, 10, 4));
    }

    fn render(game: &Game, width: u16, height: u16) -> UiState {
        let cfg = Config::default();
        let artist = TermArtist::new(true, Palette::new(Depth::Basic));
        let mut ui = UiState::default();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, game, &cfg, &mut ui, &artist)).unwrap();
        ui
    }

    #[test]
    fn huge_board_shows_size_warning() {
        let game = Game::new(Mode::Custom { rows: 2, cols: 40_000, mines: 1 });
        let ui = render(&game, 80, 30);
        assert!(ui.board_inner.is_none());
        assert!(ui.new_rect.is_none());

        let game = Game::new(Mode::Custom { rows: 70_000, cols: 3, mines: 1 });
        assert!(render(&game, 80, 30).board_inner.is_none());
    }

    #[test]
    fn fitting_board_is_laid_out() {
        let game = Game::new(Mode::Easy);
        let ui = render(&game, 80, 30);
        let inner = ui.board_inner.unwrap();
        assert_eq!((inner.width, inner.height), (18, 9));
        assert!(ui.new_rect.is_some());
    }

    #[test]
    fn left_click_opens_and_right_click_flags() {
        let mut game = Game::new(Mode::Easy);
        let mut ui = UiState {
            board_inner: Some(Rect::new(0, 0, 18, 9)),
            ..UiState::default()
        };
        let click = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: crossterm::event::KeyModifiers::NONE,
        };

        on_mouse(click(MouseEventKind::Down(MouseButton::Right), 16, 8), &mut game, &mut ui);
        assert!(game.board().at(8, 8).is_flagged());

        on_mouse(click(MouseEventKind::Down(MouseButton::Left), 0, 0), &mut game, &mut ui);
        assert!(ui.left_down);
        assert_eq!(game.pressed_cells(ui.hover, ui.left_down), vec![(0, 0)]);
        on_mouse(click(MouseEventKind::Up(MouseButton::Left), 0, 0), &mut game, &mut ui);
        assert!(!ui.left_down);
        assert!(game.board().is_generated());
        assert!(game.board().at(0, 0).is_opened());
    }

    #[test]
    fn releasing_off_board_does_not_open() {
        let mut game = Game::new(Mode::Easy);
        let mut ui = UiState {
            board_inner: Some(Rect::new(0, 0, 18, 9)),
            ..UiState::default()
        };
        let ev = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: crossterm::event::KeyModifiers::NONE,
        };
        on_mouse(ev(MouseEventKind::Down(MouseButton::Left), 0, 0), &mut game, &mut ui);
        on_mouse(ev(MouseEventKind::Up(MouseButton::Left), 40, 20), &mut game, &mut ui);
        assert!(!game.board().is_generated());
    }
}
