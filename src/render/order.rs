use std::fmt;
use std::str::FromStr;

use macroquad::prelude::*;

use crate::error::MapError;

/// Raster direction used to walk a tile grid.
///
/// The first word is the horizontal direction, the second the vertical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

impl RenderOrder {
    pub const ALL: [RenderOrder; 4] = [
        RenderOrder::RightDown,
        RenderOrder::RightUp,
        RenderOrder::LeftDown,
        RenderOrder::LeftUp,
    ];

    /// The Tiled spelling of this order (`"right-down"` etc).
    pub fn as_str(self) -> &'static str {
        match self {
            RenderOrder::RightDown => "right-down",
            RenderOrder::RightUp => "right-up",
            RenderOrder::LeftDown => "left-down",
            RenderOrder::LeftUp => "left-up",
        }
    }

    /// Signed (horizontal, vertical) step in tiles.
    #[inline]
    fn steps(self) -> (i64, i64) {
        match self {
            RenderOrder::RightDown => (1, 1),
            RenderOrder::RightUp => (1, -1),
            RenderOrder::LeftDown => (-1, 1),
            RenderOrder::LeftUp => (-1, -1),
        }
    }
}

impl FromStr for RenderOrder {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| MapError::UnsupportedRenderOrder(s.to_owned()))
    }
}

impl fmt::Display for RenderOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `cols x rows` grid walk for one render order.
///
/// The four orders differ only in their start corner and step signs, so they
/// are resolved to those once here and [`Cells`] runs the same loop for all
/// of them. Positions are pixel offsets relative to the grid's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    cols: u32,
    rows: u32,
    width: i64,
    step_x: i64,
    step_y: i64,
    row_start_x: i64,
    start_y: i64,
}

impl Traversal {
    pub fn new(order: RenderOrder, cols: u32, rows: u32, tile_w: u32, tile_h: u32) -> Self {
        let (dx, dy) = order.steps();
        let width = cols as i64 * tile_w as i64;
        let height = rows as i64 * tile_h as i64;

        let row_start_x = if dx > 0 { 0 } else { width - tile_w as i64 };
        let start_y = if dy > 0 { 0 } else { height - tile_h as i64 };

        Traversal {
            cols,
            rows,
            width,
            step_x: dx * tile_w as i64,
            step_y: dy * tile_h as i64,
            row_start_x,
            start_y,
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn cells(&self) -> Cells {
        Cells {
            walk: *self,
            next: 0,
            x: self.row_start_x,
            y: self.start_y,
        }
    }
}

/// Iterator over the pixel positions of a [`Traversal`], in draw order.
#[derive(Debug, Clone)]
pub struct Cells {
    walk: Traversal,
    next: usize,
    x: i64,
    y: i64,
}

impl Iterator for Cells {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        if self.next >= self.walk.cell_count() {
            return None;
        }
        let pos = vec2(self.x as f32, self.y as f32);
        self.next += 1;

        self.x += self.walk.step_x;
        if self.x < 0 || self.x >= self.walk.width {
            self.x = self.walk.row_start_x;
            self.y += self.walk.step_y;
        }
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.walk.cell_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Cells {}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(order: RenderOrder, cols: u32, rows: u32) -> Vec<(f32, f32)> {
        Traversal::new(order, cols, rows, 16, 16)
            .cells()
            .map(|p| (p.x, p.y))
            .collect()
    }

    #[test]
    fn two_by_two_orders() {
        let cases = [
            (RenderOrder::RightDown, [(0., 0.), (16., 0.), (0., 16.), (16., 16.)]),
            (RenderOrder::RightUp, [(0., 16.), (16., 16.), (0., 0.), (16., 0.)]),
            (RenderOrder::LeftDown, [(16., 0.), (0., 0.), (16., 16.), (0., 16.)]),
            (RenderOrder::LeftUp, [(16., 16.), (0., 16.), (16., 0.), (0., 0.)]),
        ];
        for (order, expected) in cases {
            assert_eq!(walk(order, 2, 2), expected.to_vec(), "{order}");
        }
    }

    #[test]
    fn every_order_covers_the_grid_once() {
        for order in RenderOrder::ALL {
            let mut cells = walk(order, 3, 2);
            assert_eq!(cells.len(), 6);
            cells.sort_by(|a, b| a.partial_cmp(b).unwrap());
            cells.dedup();
            assert_eq!(cells.len(), 6, "{order} visited a cell twice");
            assert!(cells
                .iter()
                .all(|&(x, y)| (0.0..48.0).contains(&x) && (0.0..32.0).contains(&y)));
        }
    }

    #[test]
    fn non_square_tiles_step_per_axis() {
        let cells: Vec<_> = Traversal::new(RenderOrder::LeftUp, 2, 2, 8, 4)
            .cells()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(cells, vec![(8., 4.), (0., 4.), (8., 0.), (0., 0.)]);
    }

    #[test]
    fn empty_grid_yields_nothing() {
        assert_eq!(walk(RenderOrder::LeftUp, 0, 4).len(), 0);
        assert_eq!(walk(RenderOrder::RightDown, 4, 0).len(), 0);
    }

    #[test]
    fn parses_tiled_spellings() {
        for order in RenderOrder::ALL {
            assert_eq!(order.as_str().parse::<RenderOrder>().unwrap(), order);
        }
        let err = "diagonal".parse::<RenderOrder>().unwrap_err();
        assert!(matches!(err, MapError::UnsupportedRenderOrder(s) if s == "diagonal"));
    }

    #[test]
    fn size_hint_is_exact() {
        let mut cells = Traversal::new(RenderOrder::RightDown, 3, 3, 16, 16).cells();
        assert_eq!(cells.len(), 9);
        cells.next();
        assert_eq!(cells.len(), 8);
    }
}
