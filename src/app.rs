//! App: terminal init, main loop, tick and input handling.

use crate::GameConfig;
use crate::clock::TICK_MS;
use crate::game::GameSession;
use crate::host::{HostNotifier, ScoreFile};
use crate::input::{Action, key_to_action};
use crate::render;
use crate::shape::RandomSource;
use crate::theme::Theme;
use crate::ui::{self, GameOverFx, Viewport};
use anyhow::Result;
use crossterm::event::{self, Event, MouseButton, MouseEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Upper bound between redraws while waiting for input.
const FRAME_MS: u64 = 16;
/// Ticks replayed at most after a stall; older ones are dropped.
const MAX_CATCHUP_TICKS: u32 = 20;

pub struct App {
    theme: Theme,
    session: GameSession,
    /// Best recorded score, when scores are saved.
    best: Option<u32>,
    /// Final score of this round already folded into `best`.
    round_recorded: bool,
    /// Terminal reports key releases (Down can be held).
    releases_reported: bool,
    viewport: Option<Viewport>,
    fade: GameOverFx,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, seed: Option<u64>, scores: Option<ScoreFile>) -> Self {
        let best = scores.as_ref().map(ScoreFile::best);
        let host = scores.map(|s| Box::new(s) as Box<dyn HostNotifier>);
        let session = GameSession::new(
            config,
            Box::new(RandomSource::new(seed)),
            host,
            Instant::now(),
        );
        Self {
            theme,
            session,
            best,
            round_recorded: false,
            releases_reported: false,
            viewport: None,
            fade: GameOverFx::default(),
        }
    }

    /// Apply one input action. Returns false when the player quits.
    fn apply_action(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Quit => return false,
            Action::Restart => {
                if self.session.is_over() {
                    self.session.restart(now);
                    self.round_recorded = false;
                    self.fade.reset();
                }
            }
            Action::Key(key) => {
                log::trace!("key {}", key.as_str());
                self.session.on_key(key);
            }
            Action::SoftDropHold => self.session.start_soft_drop_hold(),
            Action::SoftDropRelease => self.session.stop_soft_drop_hold(),
            Action::SoftDropTap => self.session.soft_drop_tap(now),
            Action::None => {}
        }
        true
    }

    /// Map a click on the on-screen buttons to the action it stands for.
    fn click_action(&self, column: u16, row: u16) -> Option<Action> {
        let (px, py) = self.viewport?.to_pixel(column, row)?;
        let board = self.session.board();
        render::Layout::new(board.width, board.height)
            .button_at(px, py)
            .map(render::Button::action)
    }

    fn record_round_end(&mut self) {
        if let Some(reason) = self.session.game_over() {
            if !self.round_recorded {
                self.round_recorded = true;
                let score = self.session.score();
                self.best = self.best.map(|b| b.max(score));
                log::debug!("round recorded: {} with {}", reason.as_str(), score);
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
                PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
                supports_keyboard_enhancement,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        // Release events make Down a real hold; without them a press is a tap burst.
        self.releases_reported = supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        log::info!("key release events: {}", self.releases_reported);

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.session.restart(Instant::now());

        let result = self.run_loop(&mut terminal);

        // Restore
        if self.releases_reported {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick = Duration::from_millis(TICK_MS);
        let mut next_tick = Instant::now() + tick;
        loop {
            let now = Instant::now();
            self.session.poll_round_clock(now);
            self.record_round_end();

            terminal.draw(|f| {
                self.viewport = Some(ui::draw(
                    f,
                    &self.session,
                    &self.theme,
                    now,
                    self.best,
                    &mut self.fade,
                ));
            })?;

            let timeout = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(FRAME_MS));
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let action = match event::read()? {
                        Event::Key(key) => key_to_action(key, self.releases_reported),
                        Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                            self.click_action(m.column, m.row).unwrap_or(Action::None)
                        }
                        _ => Action::None,
                    };
                    if !self.apply_action(action, Instant::now()) {
                        return Ok(());
                    }
                }
            }

            let mut ticks = 0;
            while Instant::now() >= next_tick {
                if ticks == MAX_CATCHUP_TICKS {
                    log::debug!("tick loop stalled, skipping ahead");
                    next_tick = Instant::now() + tick;
                    break;
                }
                self.session.tick(Instant::now());
                next_tick += tick;
                ticks += 1;
            }
            self.record_round_end();
        }
    }
}
