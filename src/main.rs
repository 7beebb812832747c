// Entry point for the Minesweeper TUI
// Loads the configuration, starts file logging and runs the UI loop

use std::error::Error;
use tracing::{info, warn};

// Module declarations
mod ms_board;  // Board model, mine generation, flood fill
mod ms_color;  // Terminal colour matching
mod ms_config; // Persistent settings and records
mod ms_draw;   // Cell sprites and the rendering adapter
mod ms_game;   // Modes, state machine, timer
mod ms_log;    // tracing subscriber setup
mod ms_ui;     // Terminal rendering and input handling

use ms_config::load_or_create_config;
use ms_ui::run as run_ui;

fn main() -> Result<(), Box<dyn Error>> {
    let (mut cfg, problem) = load_or_create_config();

    let log_path = ms_log::init_logging(&cfg.log_level);
    info!(log = ?log_path, mode = cfg.mode.name(), "mswpr starting");
    if let Some(e) = problem {
        warn!(error = %e, "using default configuration");
    }

    run_ui(&mut cfg)
}
