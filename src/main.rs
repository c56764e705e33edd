//! blockfall: timed falling-block puzzle game in the terminal.

mod app;
mod board;
mod clock;
mod game;
mod host;
mod input;
mod render;
mod scoring;
mod shape;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options derived from CLI that shape a round (board height, round length, base speed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub round: Duration,
    pub base_speed: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: BoardSize::Standard.rows(),
            round: Duration::from_secs(90),
            base_speed: 1.0,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("theme not loaded, using defaults: {e}");
            theme::Theme::default()
        }
    };
    let scores = if args.no_save {
        None
    } else {
        match args.score_file.clone().map_or_else(host::default_path, Ok) {
            Ok(path) => {
                let scores = host::ScoreFile::new(path);
                log::info!("scores: {}", scores.path().display());
                Some(scores)
            }
            Err(e) => {
                log::warn!("scores will not be saved: {e}");
                None
            }
        }
    };
    let config = GameConfig {
        rows: args.board.rows(),
        round: Duration::from_secs(args.duration),
        base_speed: args.base_speed,
    };
    log::info!("starting: {config:?}, seed {:?}", args.seed);

    let mut app = App::new(config, theme, args.seed, scores);
    app.run()?;
    Ok(())
}

/// Log to `path` when given; the terminal itself belongs to the game.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Timed falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Timed falling-block puzzle in the terminal. Clear full rows before the clock runs out.",
    long_about = "blockfall is a terminal falling-block puzzle played against a round clock.\n\n\
        Pieces fall on a 10-column board. Fill a row edge-to-edge to clear it and score; \
        the fall speed rises with your score. The round ends when time runs out or a new \
        piece cannot enter the board.\n\n\
        CONTROLS:\n  Left/Right  Move    Up         Rotate CW   Down     Soft drop (hold)\n  Space       Step down one row    R          Restart after the round   Q / Esc  Quit\n\n\
        CONTROLS (vim):\n  h/l         Move    k          Rotate CW   j        Soft drop\n\n\
        The buttons beside the board can be clicked with the mouse. Use --theme to load a \
        btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board size: standard (10x20) or compact (10x15).
    #[arg(short, long, default_value = "standard")]
    pub board: BoardSize,

    /// Round length in seconds.
    #[arg(short, long, default_value = "90", value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: u64,

    /// Starting speed multiplier (up to 20); above 1.0 plays the high-speed variant.
    #[arg(long, default_value = "1.0", value_name = "X", value_parser = parse_speed)]
    pub base_speed: f64,

    /// Seed for the piece sequence (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the classic palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Do not record final scores.
    #[arg(long)]
    pub no_save: bool,

    /// Score file (default: $XDG_CONFIG_HOME/blockfall/scores).
    #[arg(long, value_name = "FILE", conflicts_with = "no_save")]
    pub score_file: Option<PathBuf>,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BoardSize {
    #[default]
    Standard,
    Compact,
}

impl BoardSize {
    pub fn rows(self) -> usize {
        match self {
            Self::Standard => 20,
            Self::Compact => 15,
        }
    }
}

fn parse_speed(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() && v > 0.0 && v <= scoring::MAX_BASE_SPEED {
        Ok(v)
    } else {
        Err(format!(
            "speed must be above 0 and at most {}",
            scoring::MAX_BASE_SPEED
        ))
    }
}
