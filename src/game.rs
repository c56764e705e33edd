//! Game session: active piece, gravity, merge and clear, scoring, round end.

use crate::GameConfig;
use crate::board::Board;
use crate::clock::{FallScheduler, RoundClock, SoftDrop, TICK_MS, fall_interval_ms};
use crate::host::HostNotifier;
use crate::input::KeyId;
use crate::scoring::{SpeedController, score_for_clear};
use crate::shape::{Preview, Randomizer, Shape, ShapeKind};
use std::time::Instant;

/// Why a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// A new piece could not be placed (topped out).
    Collision,
    /// The round clock ran out.
    Timeout,
}

impl GameOverReason {
    /// Tag passed to the host.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collision => "gameover",
            Self::Timeout => "timeup",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Self::Collision => "Game Over!",
            Self::Timeout => "Time Up!",
        }
    }
}

/// Piece under player control. (x, y) is the board cell of the shape's top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: ShapeKind,
    pub shape: Shape,
    pub color: u8,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Centered horizontally at row 0.
    pub fn spawn(preview: Preview, cols: usize) -> Self {
        let x = cols as i32 / 2 - preview.shape.width() as i32 / 2;
        Self {
            kind: preview.kind,
            shape: preview.shape,
            color: preview.color,
            x,
            y: 0,
        }
    }
}

/// Everything one round mutates. Owned by the app loop; every handler takes `&mut self`.
pub struct GameSession {
    config: GameConfig,
    board: Board,
    piece: Piece,
    next: Preview,
    score: u32,
    lines_cleared: u32,
    speed: SpeedController,
    fall: FallScheduler,
    soft_drop: SoftDrop,
    round: RoundClock,
    over: Option<GameOverReason>,
    status: String,
    rng: Box<dyn Randomizer>,
    host: Option<Box<dyn HostNotifier>>,
}

impl GameSession {
    pub fn new(
        config: GameConfig,
        mut rng: Box<dyn Randomizer>,
        host: Option<Box<dyn HostNotifier>>,
        now: Instant,
    ) -> Self {
        let board = Board::new(crate::board::COLS, config.rows);
        let first = Preview::random(rng.as_mut());
        let next = Preview::random(rng.as_mut());
        let piece = Piece::spawn(first, board.width);
        log::info!(
            "new round: {}x{} board, {}s, base speed x{:.2}",
            board.height,
            board.width,
            config.round.as_secs(),
            config.base_speed
        );
        Self {
            board,
            piece,
            next,
            score: 0,
            lines_cleared: 0,
            speed: SpeedController::new(config.base_speed),
            fall: FallScheduler::new(),
            soft_drop: SoftDrop::default(),
            round: RoundClock::new(now, config.round),
            over: None,
            status: String::new(),
            rng,
            host,
            config,
        }
    }

    /// Start a fresh round with the same configuration, randomizer and host.
    pub fn restart(&mut self, now: Instant) {
        self.board.clear();
        let first = Preview::random(self.rng.as_mut());
        self.next = Preview::random(self.rng.as_mut());
        self.piece = Piece::spawn(first, self.board.width);
        self.score = 0;
        self.lines_cleared = 0;
        self.speed = SpeedController::new(self.config.base_speed);
        self.fall.reset();
        self.soft_drop.cancel();
        self.round = RoundClock::new(now, self.config.round);
        self.over = None;
        self.status.clear();
        log::info!("round restarted");
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    pub fn next(&self) -> &Preview {
        &self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed.multiplier()
    }

    #[cfg(test)]
    pub fn fall_accumulator_ms(&self) -> u64 {
        self.fall.accumulator_ms()
    }

    pub fn soft_drop_active(&self, now: Instant) -> bool {
        self.soft_drop.is_active(now)
    }

    pub fn game_over(&self) -> Option<GameOverReason> {
        self.over
    }

    pub fn is_over(&self) -> bool {
        self.over.is_some()
    }

    /// User-facing end-of-round text; empty while playing.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.round.remaining_secs(now)
    }

    /// Row the active piece would land on.
    pub fn ghost_y(&self) -> i32 {
        let p = &self.piece;
        p.y + self.board.drop_distance(&p.shape, p.x, p.y)
    }

    /// One fixed tick: accumulate time, take every due fall step, then check the round clock.
    pub fn tick(&mut self, now: Instant) {
        if self.is_over() {
            return;
        }
        self.soft_drop.poll(now);
        self.fall.advance(TICK_MS);
        let interval = fall_interval_ms(self.speed.multiplier(), self.soft_drop.is_active(now));
        while !self.is_over() && self.fall.take_step(interval) {
            self.step_down();
        }
        self.poll_round_clock(now);
    }

    /// Remaining whole seconds; ends the round when it reaches zero.
    pub fn poll_round_clock(&mut self, now: Instant) -> u64 {
        let remaining = self.round.remaining_secs(now);
        if self.round.is_up(now) && !self.is_over() {
            self.end_game(GameOverReason::Timeout);
        }
        remaining
    }

    /// Gravity step: move down, or lock in place when blocked.
    fn step_down(&mut self) {
        self.piece.y += 1;
        if !self.fits() {
            self.piece.y -= 1;
            self.lock_piece();
        }
    }

    fn fits(&self) -> bool {
        self.board
            .can_place(&self.piece.shape, self.piece.x, self.piece.y)
    }

    fn lock_piece(&mut self) {
        let p = &self.piece;
        self.board.merge(&p.shape, p.x, p.y, p.color);

        let lines = self.board.clear_lines();
        if lines > 0 {
            self.score += score_for_clear(lines);
            self.lines_cleared += lines;
            log::info!("cleared {} line(s), score {}", lines, self.score);
        }
        if self.speed.adjust(self.score) {
            log::info!("speed now x{:.2}", self.speed.multiplier());
        }
        self.spawn_next();
    }

    /// Promote the preview to the active piece and draw a new preview.
    /// Ends the round if the new piece does not fit.
    pub fn spawn_next(&mut self) {
        let promoted = std::mem::replace(&mut self.next, Preview::random(self.rng.as_mut()));
        self.piece = Piece::spawn(promoted, self.board.width);
        if !self.fits() {
            self.end_game(GameOverReason::Collision);
        }
    }

    /// Enter the terminal state. Later calls are no-ops.
    pub fn end_game(&mut self, reason: GameOverReason) {
        if self.over.is_some() {
            return;
        }
        self.over = Some(reason);
        self.soft_drop.cancel();
        self.status = format!("{} Score: {}", reason.headline(), self.score);
        log::info!("round over ({}), score {}", reason.as_str(), self.score);

        if let Some(host) = self.host.as_mut() {
            if let Err(e) = host.game_over(self.score, reason) {
                log::warn!("could not report final score: {}", e);
            }
        }
    }

    /// Discrete key press (keyboard or on-screen button).
    pub fn on_key(&mut self, key: KeyId) {
        if self.is_over() {
            return;
        }
        match key {
            KeyId::ArrowLeft => self.shift(-1),
            KeyId::ArrowRight => self.shift(1),
            KeyId::ArrowDown => {
                self.piece.y += 1;
                if !self.fits() {
                    self.piece.y -= 1;
                }
                self.fall.reset();
            }
            KeyId::ArrowUp => self.rotate_cw(),
        }
    }

    fn shift(&mut self, dx: i32) {
        self.piece.x += dx;
        if !self.fits() {
            self.piece.x -= dx;
        }
    }

    /// Rotation in place; discarded if the rotated shape collides.
    fn rotate_cw(&mut self) {
        let rotated = self.piece.shape.rotate_cw();
        if self
            .board
            .can_place(&rotated, self.piece.x, self.piece.y)
        {
            self.piece.shape = rotated;
        }
    }

    pub fn start_soft_drop_hold(&mut self) {
        if !self.is_over() && !self.soft_drop.held {
            self.soft_drop.held = true;
        }
    }

    pub fn stop_soft_drop_hold(&mut self) {
        self.soft_drop.held = false;
    }

    /// Short burst of fast fall; a new tap restarts the window.
    pub fn soft_drop_tap(&mut self, now: Instant) {
        if self.is_over() {
            return;
        }
        self.soft_drop.tap(now);
    }
}
