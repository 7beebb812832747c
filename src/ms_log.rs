// File logging. The terminal belongs to the UI, so tracing output goes to
// mswpr.log next to the config file.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

use crate::ms_config::config_dir;

/// Map a config string to a tracing level, defaulting to INFO
pub fn parse_level(s: &str) -> Level {
    s.trim().parse::<Level>().unwrap_or(Level::INFO)
}

/// Install the global subscriber. Returns the log path, or None when no
/// log file could be opened (the game then runs without logging).
pub fn init_logging(level: &str) -> Option<PathBuf> {
    let path = config_dir()?.join("mswpr.log");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(parse_level(level))
        .try_init()
        .ok()?;
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level(" trace "), Level::TRACE);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }
}
