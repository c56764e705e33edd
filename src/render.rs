//! Frame description: the draw commands for one frame, in pixel space.
//!
//! Block (col, row) covers pixels `col * BLOCK_SIZE .. (col + 1) * BLOCK_SIZE` horizontally and
//! the same vertically. `ui` rasterises the commands; nothing here knows about terminals.

use crate::board::Cell;
use crate::game::GameSession;
use crate::input::{Action, KeyId};
use crate::shape::Shape;
use crate::theme::Theme;
use ratatui::style::Color;
use std::time::Instant;

pub const BLOCK_SIZE: i32 = 30;
/// Ghost piece opacity.
const GHOST_ALPHA: f32 = 0.3;
/// Backdrop opacity behind the info text.
const PANEL_ALPHA: f32 = 0.6;
/// Backdrop opacity behind the end-of-round message.
const OVERLAY_ALPHA: f32 = 0.85;
/// Info panel height in blocks (score, time, speed).
const INFO_ROWS: i32 = 3;
/// Sidebar width in blocks.
const SIDEBAR_BLOCKS: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rect of board block (col, row).
    pub const fn block(col: i32, row: i32) -> Self {
        Self::new(col * BLOCK_SIZE, row * BLOCK_SIZE, BLOCK_SIZE, BLOCK_SIZE)
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Fill {
        rect: PixelRect,
        color: Color,
        alpha: f32,
    },
    Stroke {
        rect: PixelRect,
        color: Color,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Color,
    },
}

/// On-screen controls; clicking one synthesizes the matching key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Rotate,
    Step,
    Drop,
}

impl Button {
    pub const ALL: [Self; 5] = [Self::Left, Self::Right, Self::Rotate, Self::Step, Self::Drop];

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "◀ left",
            Self::Right => "▶ right",
            Self::Rotate => "⟳ rotate",
            Self::Step => "▽ step",
            Self::Drop => "▼ drop",
        }
    }

    pub fn action(self) -> Action {
        match self {
            Self::Left => Action::Key(KeyId::ArrowLeft),
            Self::Right => Action::Key(KeyId::ArrowRight),
            Self::Rotate => Action::Key(KeyId::ArrowUp),
            Self::Step => Action::Key(KeyId::ArrowDown),
            Self::Drop => Action::SoftDropTap,
        }
    }
}

/// Layout of the whole canvas for a board of `cols` x `rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: i32,
    pub rows: i32,
}

impl Layout {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols: cols as i32,
            rows: rows as i32,
        }
    }

    pub fn board(&self) -> PixelRect {
        PixelRect::new(0, 0, self.cols * BLOCK_SIZE, self.rows * BLOCK_SIZE)
    }

    /// Canvas size in pixels: board plus a one-block gap and the sidebar.
    pub fn canvas(&self) -> PixelRect {
        PixelRect::new(
            0,
            0,
            (self.cols + 1 + SIDEBAR_BLOCKS) * BLOCK_SIZE,
            self.rows * BLOCK_SIZE,
        )
    }

    fn sidebar_x(&self) -> i32 {
        (self.cols + 1) * BLOCK_SIZE
    }

    /// Preview block (dx, dy) of the next piece.
    fn preview_block(&self, dx: i32, dy: i32) -> PixelRect {
        PixelRect::new(
            self.sidebar_x() + dx * BLOCK_SIZE,
            (1 + dy) * BLOCK_SIZE,
            BLOCK_SIZE,
            BLOCK_SIZE,
        )
    }

    pub fn button(&self, button: Button) -> PixelRect {
        let i = Button::ALL.iter().position(|b| *b == button).unwrap_or(0) as i32;
        PixelRect::new(
            self.sidebar_x(),
            (7 + i) * BLOCK_SIZE,
            (SIDEBAR_BLOCKS - 1) * BLOCK_SIZE,
            BLOCK_SIZE,
        )
    }

    pub fn button_at(&self, px: i32, py: i32) -> Option<Button> {
        Button::ALL
            .into_iter()
            .find(|b| self.button(*b).contains(px, py))
    }
}

/// Fill + outline for each visible block of `shape` at (x, y).
fn push_shape(cmds: &mut Vec<DrawCmd>, shape: &Shape, x: i32, y: i32, color: Color, edge: Color) {
    for (dx, dy) in shape.occupied() {
        let (cx, cy) = (x + dx as i32, y + dy as i32);
        if cy < 0 {
            continue;
        }
        let rect = PixelRect::block(cx, cy);
        cmds.push(DrawCmd::Fill {
            rect,
            color,
            alpha: 1.0,
        });
        cmds.push(DrawCmd::Stroke { rect, color: edge });
    }
}

/// Draw commands for the board, pieces, info panel, preview and buttons.
/// `best` is the host's best score, if it keeps one.
pub fn frame(session: &GameSession, theme: &Theme, now: Instant, best: Option<u32>) -> Vec<DrawCmd> {
    let board = session.board();
    let layout = Layout::new(board.width, board.height);
    let mut cmds = Vec::with_capacity(board.width * board.height * 2 + 64);

    for (y, row) in board.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let rect = PixelRect::block(x as i32, y as i32);
            let (fill, edge) = match cell {
                Cell::Empty => (theme.bg, theme.grid),
                Cell::Filled(c) => (theme.piece_color(*c), theme.edge),
            };
            cmds.push(DrawCmd::Fill {
                rect,
                color: fill,
                alpha: 1.0,
            });
            cmds.push(DrawCmd::Stroke { rect, color: edge });
        }
    }

    let piece = session.piece();
    if !session.is_over() {
        let ghost_y = session.ghost_y();
        for (dx, dy) in piece.shape.occupied() {
            let cy = ghost_y + dy as i32;
            if cy >= 0 {
                cmds.push(DrawCmd::Fill {
                    rect: PixelRect::block(piece.x + dx as i32, cy),
                    color: theme.ghost,
                    alpha: GHOST_ALPHA,
                });
            }
        }
    }
    push_shape(
        &mut cmds,
        &piece.shape,
        piece.x,
        piece.y,
        theme.piece_color(piece.color),
        theme.edge,
    );

    // Info panel over the top of the board.
    cmds.push(DrawCmd::Fill {
        rect: PixelRect::new(0, 0, layout.cols * BLOCK_SIZE, INFO_ROWS * BLOCK_SIZE),
        color: theme.panel,
        alpha: PANEL_ALPHA,
    });
    let dropping = session.soft_drop_active(now);
    let info = [
        format!("Score: {}", session.score()),
        format!("Time: {}s", session.remaining_secs(now)),
        format!(
            "Speed: x{:.2}{}",
            session.speed_multiplier(),
            if dropping { " (drop)" } else { "" }
        ),
    ];
    for (i, text) in info.into_iter().enumerate() {
        cmds.push(DrawCmd::Text {
            x: BLOCK_SIZE / 2,
            y: i as i32 * BLOCK_SIZE,
            text,
            color: theme.info_fg,
        });
    }

    // Sidebar: next piece, stats, buttons.
    let sx = layout.sidebar_x();
    cmds.push(DrawCmd::Text {
        x: sx,
        y: 0,
        text: "Next:".to_string(),
        color: theme.main_fg,
    });
    let next = session.next();
    for (dx, dy) in next.shape.occupied() {
        let rect = layout.preview_block(dx as i32, dy as i32);
        cmds.push(DrawCmd::Fill {
            rect,
            color: theme.piece_color(next.color),
            alpha: 1.0,
        });
        cmds.push(DrawCmd::Stroke {
            rect,
            color: theme.edge,
        });
    }
    cmds.push(DrawCmd::Text {
        x: sx,
        y: 4 * BLOCK_SIZE,
        text: format!("Lines: {}", session.lines_cleared()),
        color: theme.main_fg,
    });
    if let Some(best) = best {
        cmds.push(DrawCmd::Text {
            x: sx,
            y: 5 * BLOCK_SIZE,
            text: format!("Best: {}", best.max(session.score())),
            color: theme.main_fg,
        });
    }
    for button in Button::ALL {
        let rect = layout.button(button);
        cmds.push(DrawCmd::Stroke {
            rect,
            color: theme.grid,
        });
        cmds.push(DrawCmd::Text {
            x: rect.x + BLOCK_SIZE / 2,
            y: rect.y,
            text: button.label().to_string(),
            color: theme.main_fg,
        });
    }
    cmds
}

/// End-of-round message over the middle of the board; empty while playing.
pub fn overlay(session: &GameSession, theme: &Theme) -> Vec<DrawCmd> {
    if !session.is_over() {
        return Vec::new();
    }
    let board = session.board();
    let layout = Layout::new(board.width, board.height);
    let top = (layout.rows / 2 - 2) * BLOCK_SIZE;
    vec![
        DrawCmd::Fill {
            rect: PixelRect::new(0, top, layout.cols * BLOCK_SIZE, 4 * BLOCK_SIZE),
            color: theme.panel,
            alpha: OVERLAY_ALPHA,
        },
        DrawCmd::Text {
            x: BLOCK_SIZE / 2,
            y: top + BLOCK_SIZE,
            text: session.status().to_string(),
            color: theme.info_fg,
        },
        DrawCmd::Text {
            x: BLOCK_SIZE / 2,
            y: top + 2 * BLOCK_SIZE,
            text: "R restart  Q quit".to_string(),
            color: theme.main_fg,
        },
    ]
}
