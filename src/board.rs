//! Board: occupancy grid, collision test, merge and line clear.

use crate::shape::Shape;
use std::collections::VecDeque;

/// Board width in cells (both variants).
pub const COLS: usize = 10;

/// Single cell: either empty or filled with a palette colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Filled(u8),
}

/// Occupancy grid. y=0 is the top row; rows are stored [0..height].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![Cell::Empty; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    /// Reset every cell to empty (new game).
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(Cell::Empty);
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|c| *c == Cell::Empty))
    }

    /// True if `shape` anchored at (x, y) fits: inside the side walls, above the floor and
    /// not overlapping filled cells. Cells above row 0 never collide (spawn buffer).
    pub fn can_place(&self, shape: &Shape, x: i32, y: i32) -> bool {
        for (dx, dy) in shape.occupied() {
            let cx = x + dx as i32;
            let cy = y + dy as i32;

            if cx < 0 || cx >= self.width as i32 || cy >= self.height as i32 {
                return false;
            }
            if cy < 0 {
                continue;
            }
            if let Some(Cell::Filled(_)) = self.get(cx as usize, cy as usize) {
                return false;
            }
        }
        true
    }

    /// Write `color` into every occupied cell of `shape` at (x, y).
    /// Caller must have checked `can_place`; cells above the board are dropped.
    pub fn merge(&mut self, shape: &Shape, x: i32, y: i32, color: u8) {
        for (dx, dy) in shape.occupied() {
            let cx = x + dx as i32;
            let cy = y + dy as i32;
            if cx >= 0 && cy >= 0 {
                self.set(cx as usize, cy as usize, Cell::Filled(color));
            }
        }
    }

    /// Remove full rows, shift the rest down and refill the top with empty rows.
    /// Returns the number of rows removed.
    pub fn clear_lines(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows
            .retain(|row| row.iter().any(|c| *c == Cell::Empty));
        let removed = before - self.rows.len();
        for _ in 0..removed {
            self.rows.push_front(vec![Cell::Empty; self.width]);
        }
        removed as u32
    }

    /// Rows the shape can still fall from (x, y) before landing. Used for the ghost piece.
    pub fn drop_distance(&self, shape: &Shape, x: i32, y: i32) -> i32 {
        let mut d = 0;
        while d <= self.height as i32 && self.can_place(shape, x, y + d + 1) {
            d += 1;
        }
        d
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &Vec<Cell>> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;

    fn fill_row(board: &mut Board, y: usize, color: u8) {
        for x in 0..board.width {
            board.set(x, y, Cell::Filled(color));
        }
    }

    #[test]
    fn test_walls_and_floor_collide() {
        let board = Board::new(COLS, 20);
        let o = ShapeKind::O.shape();
        assert!(board.can_place(&o, 0, 0));
        assert!(board.can_place(&o, 8, 18));
        assert!(!board.can_place(&o, -1, 0));
        assert!(!board.can_place(&o, 9, 0));
        assert!(!board.can_place(&o, 4, 19));
    }

    #[test]
    fn test_rows_above_board_never_collide() {
        let mut board = Board::new(COLS, 20);
        fill_row(&mut board, 0, 1);
        let i = ShapeKind::I.shape();
        assert!(board.can_place(&i, 3, -1));
        assert!(board.can_place(&i, 3, -5));
        assert!(!board.can_place(&i, 3, 0));
        // Walls still apply above the board.
        assert!(!board.can_place(&i, 7, -3));
    }

    #[test]
    fn test_merge_then_collides() {
        let mut board = Board::new(COLS, 20);
        let t = ShapeKind::T.shape();
        assert!(board.can_place(&t, 2, 10));
        board.merge(&t, 2, 10, 5);
        assert!(!board.can_place(&t, 2, 10));
        assert_eq!(board.get(3, 10), Some(Cell::Filled(5)));
        assert_eq!(board.get(2, 10), Some(Cell::Empty));
        assert_eq!(board.get(2, 11), Some(Cell::Filled(5)));
    }

    #[test]
    fn test_merge_drops_cells_above_board() {
        let mut board = Board::new(COLS, 20);
        board.merge(&ShapeKind::O.shape(), 0, -1, 2);
        assert_eq!(board.get(0, 0), Some(Cell::Filled(2)));
        assert_eq!(board.get(1, 0), Some(Cell::Filled(2)));
        assert_eq!(board.get(0, 1), Some(Cell::Empty));
    }

    #[test]
    fn test_clear_lines_no_full_rows_is_noop() {
        let mut board = Board::new(COLS, 20);
        board.set(0, 19, Cell::Filled(1));
        board.set(4, 10, Cell::Filled(2));
        let before = board.clone();
        assert_eq!(board.clear_lines(), 0);
        assert_eq!(board, before);
    }

    #[test]
    fn test_clear_lines_compacts_and_keeps_order() {
        let mut board = Board::new(COLS, 20);
        fill_row(&mut board, 19, 0);
        board.set(1, 18, Cell::Filled(3));
        fill_row(&mut board, 17, 0);
        board.set(2, 16, Cell::Filled(4));

        assert_eq!(board.clear_lines(), 2);
        assert_eq!(board.rows().count(), 20);
        assert_eq!(board.get(1, 19), Some(Cell::Filled(3)));
        assert_eq!(board.get(2, 18), Some(Cell::Filled(4)));
        assert!(board.rows().take(18).all(|r| r.iter().all(|c| *c == Cell::Empty)));
        assert_eq!(board.clear_lines(), 0);
    }

    #[test]
    fn test_clear_lines_counts_every_full_row() {
        let mut board = Board::new(COLS, 15);
        for y in 0..15 {
            fill_row(&mut board, y, 6);
        }
        assert_eq!(board.clear_lines(), 15);
        assert!(board.is_empty());
    }

    #[test]
    fn test_drop_distance() {
        let mut board = Board::new(COLS, 20);
        let o = ShapeKind::O.shape();
        assert_eq!(board.drop_distance(&o, 4, 0), 18);
        fill_row(&mut board, 19, 1);
        assert_eq!(board.drop_distance(&o, 4, 0), 17);
        board.clear();
        assert!(board.is_empty());
    }
}
