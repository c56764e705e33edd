//! Terminal painter: rasterises draw commands into the ratatui buffer.

use crate::game::GameSession;
use crate::render::{self, BLOCK_SIZE, DrawCmd, PixelRect};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Pixels per terminal column: one block is two columns wide.
const PX_PER_COL: i32 = BLOCK_SIZE / 2;
/// Pixels per terminal row: one block is one row tall.
const PX_PER_ROW: i32 = BLOCK_SIZE;

/// Duration of the end-of-round board fade in ms.
const GAME_OVER_FADE_MS: u32 = 600;

/// Where the canvas sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub origin_x: u16,
    pub origin_y: u16,
}

impl Viewport {
    /// Center a canvas of `canvas` pixels in `area`.
    pub fn centered(area: Rect, canvas: PixelRect) -> Self {
        let w = (canvas.w / PX_PER_COL) as u16;
        let h = (canvas.h / PX_PER_ROW) as u16;
        Self {
            origin_x: area.x + area.width.saturating_sub(w) / 2,
            origin_y: area.y + area.height.saturating_sub(h) / 2,
        }
    }

    /// Terminal rect covered by a pixel rect.
    pub fn to_cells(&self, r: PixelRect) -> Rect {
        let x0 = r.x.div_euclid(PX_PER_COL);
        let y0 = r.y.div_euclid(PX_PER_ROW);
        let x1 = (r.x + r.w + PX_PER_COL - 1).div_euclid(PX_PER_COL);
        let y1 = (r.y + r.h + PX_PER_ROW - 1).div_euclid(PX_PER_ROW);
        Rect {
            x: self.origin_x.saturating_add(x0.max(0) as u16),
            y: self.origin_y.saturating_add(y0.max(0) as u16),
            width: (x1 - x0.max(0)).max(0) as u16,
            height: (y1 - y0.max(0)).max(0) as u16,
        }
    }

    /// Pixel at the center of terminal cell (col, row); None left of or above the canvas.
    pub fn to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let dx = col.checked_sub(self.origin_x)? as i32;
        let dy = row.checked_sub(self.origin_y)? as i32;
        Some((dx * PX_PER_COL + PX_PER_COL / 2, dy * PX_PER_ROW + PX_PER_ROW / 2))
    }
}

/// State of the end-of-round fade, owned by the app between frames.
#[derive(Default)]
pub struct GameOverFx {
    effect: Option<Effect>,
    last_process: Option<Instant>,
    settled: bool,
}

impl GameOverFx {
    pub fn reset(&mut self) {
        self.effect = None;
        self.last_process = None;
        self.settled = false;
    }
}

/// Draw one frame of the session.
pub fn draw(
    frame: &mut Frame,
    session: &GameSession,
    theme: &Theme,
    now: Instant,
    best: Option<u32>,
    fade: &mut GameOverFx,
) -> Viewport {
    let area = frame.area();
    let board = session.board();
    let layout = render::Layout::new(board.width, board.height);
    let viewport = Viewport::centered(area, layout.canvas());

    let buf = frame.buffer_mut();
    buf.set_style(area, Style::default().bg(theme.panel));
    paint(buf, viewport, &render::frame(session, theme, now, best));

    if session.is_over() {
        let board_rect = viewport.to_cells(layout.board()).intersection(area);
        apply_game_over_fade(frame, theme, board_rect, fade, now);
        paint(
            frame.buffer_mut(),
            viewport,
            &render::overlay(session, theme),
        );
    } else {
        fade.reset();
    }
    viewport
}

/// Fade the board towards the grid colour (TachyonFX), then hold the faded look.
fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    board_rect: Rect,
    fade: &mut GameOverFx,
    now: Instant,
) {
    if fade.settled {
        frame
            .buffer_mut()
            .set_style(board_rect, Style::default().fg(theme.grid).bg(theme.bg));
        return;
    }
    let delta = fade
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last_process = Some(now);

    let effect = fade.effect.get_or_insert_with(|| {
        fx::fade_to(
            theme.grid,
            theme.bg,
            (GAME_OVER_FADE_MS, Interpolation::Linear),
        )
        .with_area(board_rect)
    });
    frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
    if effect.done() {
        fade.effect = None;
        fade.settled = true;
    }
}

/// Rasterise commands in order. Cells outside the buffer are skipped.
pub fn paint(buf: &mut Buffer, viewport: Viewport, cmds: &[DrawCmd]) {
    let bounds = buf.area;
    for cmd in cmds {
        match cmd {
            DrawCmd::Fill { rect, color, alpha } => {
                let cells = viewport.to_cells(*rect).intersection(bounds);
                for y in cells.top()..cells.bottom() {
                    for x in cells.left()..cells.right() {
                        if let Some(cell) = buf.cell_mut((x, y)) {
                            if *alpha >= 1.0 {
                                cell.set_symbol(" ").set_bg(*color);
                            } else {
                                let under = cell.bg;
                                cell.set_bg(blend(*color, under, *alpha));
                            }
                        }
                    }
                }
            }
            DrawCmd::Stroke { rect, color } => {
                let cells = viewport.to_cells(*rect).intersection(bounds);
                if cells.width == 0 || cells.height == 0 {
                    continue;
                }
                for y in cells.top()..cells.bottom() {
                    if let Some(cell) = buf.cell_mut((cells.left(), y)) {
                        cell.set_symbol("[").set_fg(*color);
                    }
                    if cells.width > 1 {
                        if let Some(cell) = buf.cell_mut((cells.right() - 1, y)) {
                            cell.set_symbol("]").set_fg(*color);
                        }
                    }
                }
            }
            DrawCmd::Text { x, y, text, color } => {
                let at = viewport.to_cells(PixelRect::new(*x, *y, 1, 1));
                if bounds.contains(at.as_position()) {
                    let max = (bounds.right() - at.x) as usize;
                    buf.set_stringn(at.x, at.y, text, max, Style::default().fg(*color));
                }
            }
        }
    }
}

/// `over` drawn with opacity `alpha` on top of `under`.
fn blend(over: Color, under: Color, alpha: f32) -> Color {
    let alpha = alpha.clamp(0.0, 1.0);
    match (over, under) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |a: u8, b: u8| (a as f32 * alpha + b as f32 * (1.0 - alpha)).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ if alpha >= 0.5 => over,
        _ => under,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            origin_x: 2,
            origin_y: 1,
        }
    }

    #[test]
    fn test_block_maps_to_two_columns() {
        let r = viewport().to_cells(PixelRect::block(3, 4));
        assert_eq!(r, Rect::new(8, 5, 2, 1));
    }

    #[test]
    fn test_pixel_round_trip() {
        let vp = viewport();
        let (px, py) = vp.to_pixel(8, 5).unwrap();
        assert!(PixelRect::block(3, 4).contains(px, py));
        assert_eq!(vp.to_pixel(0, 5), None);
    }

    #[test]
    fn test_paint_fill_stroke_text() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 6));
        let red = Color::Rgb(255, 0, 0);
        let white = Color::Rgb(255, 255, 255);
        paint(
            &mut buf,
            viewport(),
            &[
                DrawCmd::Fill {
                    rect: PixelRect::block(0, 0),
                    color: red,
                    alpha: 1.0,
                },
                DrawCmd::Stroke {
                    rect: PixelRect::block(0, 0),
                    color: white,
                },
                DrawCmd::Text {
                    x: 0,
                    y: 30,
                    text: "Hi".to_string(),
                    color: white,
                },
            ],
        );
        assert_eq!(buf[(2, 1)].symbol(), "[");
        assert_eq!(buf[(3, 1)].symbol(), "]");
        assert_eq!(buf[(2, 1)].bg, red);
        assert_eq!(buf[(2, 2)].symbol(), "H");
        assert_eq!(buf[(3, 2)].fg, white);
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 3));
        let black = Color::Rgb(0, 0, 0);
        let grey = Color::Rgb(200, 200, 200);
        paint(
            &mut buf,
            viewport(),
            &[
                DrawCmd::Fill {
                    rect: PixelRect::block(0, 0),
                    color: black,
                    alpha: 1.0,
                },
                DrawCmd::Fill {
                    rect: PixelRect::block(0, 0),
                    color: grey,
                    alpha: 0.5,
                },
            ],
        );
        assert_eq!(buf[(2, 1)].bg, Color::Rgb(100, 100, 100));
    }

    #[test]
    fn test_offscreen_commands_are_clipped() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 2));
        paint(
            &mut buf,
            viewport(),
            &[
                DrawCmd::Fill {
                    rect: PixelRect::block(5, 5),
                    color: Color::Rgb(1, 2, 3),
                    alpha: 1.0,
                },
                DrawCmd::Text {
                    x: 0,
                    y: 0,
                    text: "long text".to_string(),
                    color: Color::Rgb(1, 2, 3),
                },
            ],
        );
        assert_eq!(buf[(2, 1)].symbol(), "l");
        assert_eq!(buf[(3, 1)].symbol(), "o");
    }
}
