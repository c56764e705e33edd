//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::shape::PALETTE_LEN;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece palette and board colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Piece colours (index 0..7): red, green, blue, yellow, orange, purple, cyan.
    pub pieces: [Color; PALETTE_LEN],
    /// Empty cell fill.
    pub bg: Color,
    /// Outline of empty cells.
    pub grid: Color,
    /// Outline of filled cells.
    pub edge: Color,
    /// Ghost piece fill (drawn translucent).
    pub ghost: Color,
    /// Info text (score, time, speed).
    pub info_fg: Color,
    /// Labels and other text.
    pub main_fg: Color,
    /// Backdrop behind the info text.
    pub panel: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const DEFAULT_PIECES: [Color; PALETTE_LEN] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0x00, 0x00, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xA5, 0x00),
    Color::Rgb(0x80, 0x00, 0x80),
    Color::Rgb(0x00, 0xFF, 0xFF),
];

/// btop keys for each piece colour, with a fallback key.
const PIECE_KEYS: [(&str, &str); PALETTE_LEN] = [
    ("cpu_end", "temp_end"),
    ("mem_box", "cpu_start"),
    ("cpu_box", "proc_box"),
    ("title", "cpu_mid"),
    ("temp_mid", "used_mid"),
    ("net_box", "process_end"),
    ("hi_fg", "proc_misc"),
];

impl Default for Theme {
    fn default() -> Self {
        Self {
            pieces: DEFAULT_PIECES,
            bg: Color::Rgb(0x00, 0x00, 0x00),
            grid: Color::Rgb(0x3F, 0x44, 0x4F),
            edge: Color::Rgb(0xFF, 0xFF, 0xFF),
            ghost: Color::Rgb(0xCC, 0xCC, 0xCC),
            info_fg: Color::Rgb(0xFF, 0xFF, 0x00),
            main_fg: Color::Rgb(0xFF, 0xFF, 0xFF),
            panel: Color::Rgb(0x00, 0x00, 0x00),
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Missing path or file gives the default palette; unknown or bad keys keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_theme_file(&s)))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::default();
        let mut pieces = d.pieces;
        for (slot, (key, alt)) in pieces.iter_mut().zip(PIECE_KEYS) {
            if let Some(c) = get(key).or_else(|| get(alt)) {
                *slot = c;
            }
        }
        Self {
            pieces,
            bg: get("main_bg").unwrap_or(d.bg),
            grid: get("div_line").unwrap_or(d.grid),
            edge: get("main_fg").unwrap_or(d.edge),
            ghost: get("inactive_fg").unwrap_or(d.ghost),
            info_fg: get("title").unwrap_or(d.info_fg),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            panel: get("meter_bg").unwrap_or(d.panel),
        }
    }

    /// Piece colour for palette index (0..7).
    #[inline]
    pub fn piece_color(&self, index: u8) -> Color {
        self.pieces[(index as usize) % PALETTE_LEN]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?),
        3 => (channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#FFA500").unwrap();
        assert!(matches!(c, Color::Rgb(0xFF, 0xA5, 0x00)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GG0000").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#31353F""##);
        assert_eq!(map.get("main_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_overrides_some_keys() {
        let map = parse_theme_file(
            "# comment\ntheme[cpu_end]=\"#E06C75\"\ntheme[proc_misc]='#56B6C2'\ntheme[div_line]=\"oops\"\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.pieces[0], Color::Rgb(0xE0, 0x6C, 0x75));
        assert_eq!(theme.pieces[6], Color::Rgb(0x56, 0xB6, 0xC2));
        assert_eq!(theme.pieces[1], DEFAULT_PIECES[1]);
        assert_eq!(theme.grid, Theme::default().grid);
    }

    #[test]
    fn test_missing_file_gives_default() {
        let theme = Theme::load(Some(Path::new("/nonexistent/blockfall.theme"))).unwrap();
        assert_eq!(theme, Theme::default());
        assert_eq!(theme.piece_color(9), DEFAULT_PIECES[2]);
    }
}
