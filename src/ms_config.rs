// User configuration and best-time records
// Persisted as TOML under the platform config directory

use chrono::Local;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::ms_game::Mode;

// Bounds for custom boards
const CUSTOM_MIN_SIDE: usize = 9;
const CUSTOM_MAX_ROWS: usize = 24;
const CUSTOM_MAX_COLS: usize = 36;
const CUSTOM_MIN_MINES: usize = 10;
const CUSTOM_MAX_DENSITY: f64 = 0.926;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no usable config location")]
    NoPath,
    #[error("config i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Best completion time
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub secs: u64,
    pub date: String, // YYYY-MM-DD
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,

    // Dimensions used by Mode::Custom
    pub custom_rows: usize,
    pub custom_cols: usize,
    pub custom_mines: usize,

    pub best_easy: Option<Record>,
    pub best_medium: Option<Record>,
    pub best_hard: Option<Record>,

    pub ascii_icons: bool,  // Plain ASCII glyphs for limited terminals
    pub log_level: String,  // trace / debug / info / warn / error
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Easy,
            custom_rows: 20,
            custom_cols: 36,
            custom_mines: 150,
            best_easy: None,
            best_medium: None,
            best_hard: None,
            ascii_icons: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Custom mode built from the stored dimensions, clamped to
    /// 9-24 rows, 9-36 columns and 10 up to 92.6% of the cells as mines
    pub fn custom_mode(&self) -> Mode {
        let rows = self.custom_rows.clamp(CUSTOM_MIN_SIDE, CUSTOM_MAX_ROWS);
        let cols = self.custom_cols.clamp(CUSTOM_MIN_SIDE, CUSTOM_MAX_COLS);
        let max_mines = (rows * cols) as f64 * CUSTOM_MAX_DENSITY;
        Mode::Custom {
            rows,
            cols,
            mines: self.custom_mines.clamp(CUSTOM_MIN_MINES, max_mines as usize),
        }
    }

    pub fn get_record(&self, mode: &Mode) -> Option<&Record> {
        match mode {
            Mode::Easy => self.best_easy.as_ref(),
            Mode::Medium => self.best_medium.as_ref(),
            Mode::Hard => self.best_hard.as_ref(),
            Mode::Custom { .. } => None,
        }
    }

    /// Store `secs` if it beats the current best. Custom games are not
    /// recorded. Returns whether a new record was set.
    pub fn set_record(&mut self, mode: &Mode, secs: u64) -> bool {
        let slot = match mode {
            Mode::Easy => &mut self.best_easy,
            Mode::Medium => &mut self.best_medium,
            Mode::Hard => &mut self.best_hard,
            Mode::Custom { .. } => return false,
        };
        if slot.as_ref().is_some_and(|r| r.secs <= secs) {
            return false;
        }
        let date = Local::now().format("%Y-%m-%d").to_string();
        *slot = Some(Record { secs, date });
        true
    }
}

/// Parse a config file, restoring custom dimensions into the mode
pub fn parse_config(s: &str) -> Result<Config, ConfigError> {
    let mut cfg: Config = toml::from_str(s)?;
    if matches!(cfg.mode, Mode::Custom { .. }) {
        cfg.mode = cfg.custom_mode();
    }
    Ok(cfg)
}

/// Directory holding the config file and the log
/// (e.g. ~/.config/mswpr/ on Linux), falling back to the current directory
pub fn config_dir() -> Option<PathBuf> {
    match ProjectDirs::from("com", "mswpr", "mswpr") {
        Some(proj) => Some(proj.config_dir().to_path_buf()),
        None => env::current_dir().ok(),
    }
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("mswpr.toml"))
}

/// Load the config from disk, writing a default one on first run.
/// An unreadable file yields the defaults plus the error, and is left untouched.
pub fn load_or_create_config() -> (Config, Option<ConfigError>) {
    let Some(path) = config_path() else {
        return (Config::default(), Some(ConfigError::NoPath));
    };
    if path.exists() {
        return match fs::read_to_string(&path).map_err(ConfigError::from).and_then(|s| parse_config(&s)) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Config::default(), Some(e)),
        };
    }
    let cfg = Config::default();
    let err = save_config(&cfg).err();
    (cfg, err)
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoPath)?;
    let s = toml::to_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, s)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let s = toml::to_string(&Config::default()).unwrap();
        assert!(s.contains("mode = \"Easy\""));
        let cfg = parse_config(&s).unwrap();
        assert_eq!(cfg.mode, Mode::Easy);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn custom_mode_is_rebuilt_from_fields() {
        let cfg = parse_config(
            "mode = \"Custom\"\ncustom_rows = 12\ncustom_cols = 20\ncustom_mines = 30\n",
        )
        .unwrap();
        assert_eq!(cfg.mode, Mode::Custom { rows: 12, cols: 20, mines: 30 });
    }

    #[test]
    fn zero_sized_custom_mode_is_clamped() {
        let cfg = parse_config("mode = \"Custom\"\ncustom_rows = 0\ncustom_cols = 0\n").unwrap();
        assert_eq!(cfg.mode, Mode::Custom { rows: 9, cols: 9, mines: 75 });
    }

    #[test]
    fn oversized_custom_mode_is_clamped() {
        let cfg = parse_config(
            "mode = \"Custom\"\ncustom_rows = 500\ncustom_cols = 40000\ncustom_mines = 2\n",
        )
        .unwrap();
        assert_eq!(cfg.mode, Mode::Custom { rows: 24, cols: 36, mines: 10 });

        let crowded = Config { custom_rows: 10, custom_cols: 10, custom_mines: 100, ..Config::default() };
        assert_eq!(crowded.custom_mode(), Mode::Custom { rows: 10, cols: 10, mines: 92 });
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = parse_config("mode = \"Hard\"\n").unwrap();
        assert_eq!(cfg.mode, Mode::Hard);
        assert_eq!(cfg.custom_cols, 36);
        assert!(cfg.best_hard.is_none());
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        assert!(matches!(
            parse_config("mode = \"Nightmare\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn only_faster_times_become_records() {
        let mut cfg = Config::default();
        assert!(cfg.set_record(&Mode::Easy, 50));
        assert!(!cfg.set_record(&Mode::Easy, 60));
        assert!(!cfg.set_record(&Mode::Easy, 50));
        assert!(cfg.set_record(&Mode::Easy, 42));
        assert_eq!(cfg.get_record(&Mode::Easy).map(|r| r.secs), Some(42));
        assert!(cfg.get_record(&Mode::Medium).is_none());
    }

    #[test]
    fn custom_games_are_not_recorded() {
        let mut cfg = Config::default();
        let mode = cfg.custom_mode();
        assert!(!cfg.set_record(&mode, 5));
        assert!(cfg.get_record(&mode).is_none());
    }
}
