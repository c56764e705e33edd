//! Shape catalog (seven tetrominoes), rotation and the random piece source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of piece colours in the palette.
pub const PALETTE_LEN: usize = 7;

/// Tetromino kinds (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Template rows, top to bottom.
    fn template(self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1]],
            Self::L => &[&[1, 0, 0], &[1, 1, 1]],
            Self::J => &[&[0, 0, 1], &[1, 1, 1]],
            Self::S => &[&[1, 1, 0], &[0, 1, 1]],
            Self::Z => &[&[0, 1, 1], &[1, 1, 0]],
        }
    }

    /// Fresh shape in spawn orientation.
    pub fn shape(self) -> Shape {
        Shape {
            rows: self
                .template()
                .iter()
                .map(|row| row.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }
}

/// Dense boolean matrix; `rows[y][x]` is true where the shape has a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// (dx, dy) of each occupied cell relative to the top-left anchor.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(x, _)| (x, y))
        })
    }

    /// 90° clockwise: reverse the row order, then transpose.
    pub fn rotate_cw(&self) -> Self {
        let h = self.height();
        let rows = (0..self.width())
            .map(|x| (0..h).rev().map(|y| self.rows[y][x]).collect())
            .collect();
        Self { rows }
    }
}

/// Uniform index source for shape and colour selection.
pub trait Randomizer {
    /// Uniform index in `0..n` (`n > 0`).
    fn pick(&mut self, n: usize) -> usize;
}

/// Production randomizer backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct RandomSource(StdRng);

impl RandomSource {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self(StdRng::seed_from_u64(s)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

impl Randomizer for RandomSource {
    fn pick(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }
}

/// Shape and colour drawn together for a new piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub kind: ShapeKind,
    pub shape: Shape,
    pub color: u8,
}

impl Preview {
    /// Shape and colour are chosen independently, with replacement.
    pub fn random(rng: &mut dyn Randomizer) -> Self {
        let kind = ShapeKind::ALL[rng.pick(ShapeKind::ALL.len()) % ShapeKind::ALL.len()];
        let color = (rng.pick(PALETTE_LEN) % PALETTE_LEN) as u8;
        Self {
            kind,
            shape: kind.shape(),
            color,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed list of indices, then repeats the last one.
    #[derive(Debug, Default)]
    pub(crate) struct Scripted {
        queue: VecDeque<usize>,
        last: usize,
    }

    impl Scripted {
        pub(crate) fn new(values: &[usize]) -> Self {
            Self {
                queue: values.iter().copied().collect(),
                last: 0,
            }
        }
    }

    impl Randomizer for Scripted {
        fn pick(&mut self, n: usize) -> usize {
            if let Some(v) = self.queue.pop_front() {
                self.last = v;
            }
            self.last % n
        }
    }

    #[test]
    fn test_four_rotations_is_identity() {
        for kind in ShapeKind::ALL {
            let s = kind.shape();
            let r = s.rotate_cw().rotate_cw().rotate_cw().rotate_cw();
            assert_eq!(r, s, "{kind:?}");
        }
    }

    #[test]
    fn test_rotate_t_clockwise() {
        // 010    10
        // 111 -> 11
        //        10
        let r = ShapeKind::T.shape().rotate_cw();
        assert_eq!(r.width(), 2);
        assert_eq!(r.height(), 3);
        let cells: Vec<_> = r.occupied().collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 1), (0, 2)]);
    }

    #[test]
    fn test_rotate_i_is_vertical() {
        let r = ShapeKind::I.shape().rotate_cw();
        assert_eq!((r.width(), r.height()), (1, 4));
        assert_eq!(r.rotate_cw(), ShapeKind::I.shape());
    }

    #[test]
    fn test_every_shape_has_four_cells() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.shape().occupied().count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn test_preview_uses_independent_picks() {
        let mut rng = Scripted::new(&[1, 6]);
        let p = Preview::random(&mut rng);
        assert_eq!(p.kind, ShapeKind::O);
        assert_eq!(p.color, 6);
        assert_eq!(p.shape, ShapeKind::O.shape());
    }

    #[test]
    fn test_seeded_source_is_repeatable() {
        let mut a = RandomSource::new(Some(42));
        let mut b = RandomSource::new(Some(42));
        let xs: Vec<_> = (0..16).map(|_| a.pick(7)).collect();
        let ys: Vec<_> = (0..16).map(|_| b.pick(7)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&x| x < 7));
    }
}
