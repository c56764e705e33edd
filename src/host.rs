//! Host notification: where the final score goes when a round ends.

use crate::game::GameOverReason;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILENAME: &str = "scores";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no config directory")]
    NoConfigDir,
}

/// Receives the final score exactly once per round.
pub trait HostNotifier {
    fn game_over(&mut self, score: u32, reason: GameOverReason) -> Result<(), HostError>;
}

/// Returns the default score file path (config dir / blockfall / scores).
pub fn default_path() -> Result<PathBuf, HostError> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .map_err(|_| HostError::NoConfigDir)?,
    };
    Ok(base.join("blockfall").join(FILENAME))
}

/// Appends `"<score> <reason>"` lines to a file and remembers the best score.
#[derive(Debug, Clone)]
pub struct ScoreFile {
    path: PathBuf,
    best: u32,
}

impl ScoreFile {
    /// Open (lazily) the score file at `path`. Missing or garbled files count as no scores.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let best = load_best(&path);
        Self { path, best }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn best(&self) -> u32 {
        self.best
    }
}

impl HostNotifier for ScoreFile {
    fn game_over(&mut self, score: u32, reason: GameOverReason) -> Result<(), HostError> {
        self.best = self.best.max(score);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{} {}", score, reason.as_str())?;
        Ok(())
    }
}

/// Highest score recorded in the file; 0 on missing/parse error.
fn load_best(path: &Path) -> u32 {
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(_) => return 0,
    };
    BufReader::new(&content[..])
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| line.split_whitespace().next()?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_records_scores_and_best() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);

        let mut sink = ScoreFile::new(&path);
        assert_eq!(sink.best(), 0);
        sink.game_over(40, GameOverReason::Collision).unwrap();
        sink.game_over(10, GameOverReason::Timeout).unwrap();
        assert_eq!(sink.best(), 40);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "40 gameover\n10 timeup\n");
        assert_eq!(ScoreFile::new(&path).best(), 40);
    }

    #[test]
    fn test_garbled_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        fs::write(&path, "abc\n70 timeup\n\n5 gameover\n").unwrap();
        assert_eq!(ScoreFile::new(&path).best(), 70);
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempdir().unwrap();
        // The target is a directory, so opening it for append fails.
        let mut sink = ScoreFile::new(dir.path());
        assert!(sink.game_over(10, GameOverReason::Collision).is_err());
        assert_eq!(sink.best(), 10);
    }
}
