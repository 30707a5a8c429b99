use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;

use macroquad::prelude::*;
use tracing::debug;

use crate::error::MapError;
use crate::tile::{TileIndex, GID_MASK};

/// Per-layer parameters forwarded with each draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub tint: Color,
}

impl Default for DrawParams {
    fn default() -> Self {
        DrawParams { tint: WHITE }
    }
}

impl DrawParams {
    pub fn with_opacity(opacity: f32) -> Self {
        DrawParams {
            tint: Color::new(1.0, 1.0, 1.0, opacity.clamp(0.0, 1.0)),
        }
    }
}

/// The only drawing surface the compositor needs: put the glyph for `tile`
/// at `position`.
///
/// Implementations must not fail the frame on an index they do not know;
/// they either skip it or draw a placeholder.
pub trait Tileset {
    fn draw_tile(&self, position: Vec2, tile: TileIndex);

    /// Draw with layer parameters. Backends that cannot tint ignore `params`.
    fn draw_tile_with(&self, position: Vec2, tile: TileIndex, params: &DrawParams) {
        let _ = params;
        self.draw_tile(position, tile);
    }
}

/// Grid geometry of one atlas image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasGrid {
    pub first_gid: u32,
    pub tilecount: u32,
    pub columns: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub spacing: u32,
    pub margin: u32,
}

impl AtlasGrid {
    /// One past the last gid, or `None` when the range leaves `1..=GID_MASK`.
    pub fn gid_end(&self) -> Option<u32> {
        if self.first_gid == 0 {
            return None;
        }
        self.first_gid
            .checked_add(self.tilecount)
            .filter(|&end| end - 1 <= GID_MASK)
    }

    #[inline]
    pub fn last_gid(&self) -> u32 {
        self.first_gid.saturating_add(self.tilecount.saturating_sub(1))
    }

    /// Source rectangle of the `local`-th tile in the image.
    pub fn source_rect(&self, local: u32) -> Option<Rect> {
        if local >= self.tilecount || self.columns == 0 {
            return None;
        }
        let col = local % self.columns;
        let row = local / self.columns;
        let sx = self.margin + col * (self.tile_w + self.spacing);
        let sy = self.margin + row * (self.tile_h + self.spacing);
        Some(Rect::new(
            sx as f32,
            sy as f32,
            self.tile_w as f32,
            self.tile_h as f32,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GidRange {
    first: u32,
    end: u32,
    sheet: usize,
}

/// Gid -> sheet table, one range per non-empty sheet, sorted by first gid.
#[derive(Debug, Clone, Default)]
pub struct GidLookup {
    ranges: Vec<GidRange>,
}

impl GidLookup {
    /// Sheet indices returned by [`GidLookup::resolve`] are positions in `grids`.
    pub fn new(grids: &[AtlasGrid]) -> Result<Self, MapError> {
        let mut ranges = Vec::with_capacity(grids.len());
        for (sheet, g) in grids.iter().enumerate() {
            let end = g.gid_end().ok_or_else(|| {
                MapError::InvalidMap(format!(
                    "tileset gids {}+{} fall outside 1..={GID_MASK}",
                    g.first_gid, g.tilecount
                ))
            })?;
            if g.tilecount > 0 {
                ranges.push(GidRange {
                    first: g.first_gid,
                    end,
                    sheet,
                });
            }
        }

        ranges.sort_unstable_by_key(|r| r.first);
        if let Some(w) = ranges.windows(2).find(|w| w[1].first < w[0].end) {
            return Err(MapError::InvalidMap(format!(
                "tilesets overlap at gid {}",
                w[1].first
            )));
        }

        Ok(GidLookup { ranges })
    }

    #[inline]
    pub fn max_gid(&self) -> u32 {
        self.ranges.iter().map(|r| r.end - 1).max().unwrap_or(0)
    }

    /// Sheet index and sheet-local tile number for `tile`.
    pub fn resolve(&self, tile: TileIndex) -> Option<(usize, u32)> {
        let gid = tile.clean();
        let at = self.ranges.partition_point(|r| r.first <= gid);
        let range = self.ranges[..at].last()?;
        (gid < range.end).then(|| (range.sheet, gid - range.first))
    }

    /// [`GidLookup::resolve`], falling back to the placeholder of `unknown`.
    pub fn resolve_with(&self, tile: TileIndex, unknown: UnknownTile) -> Option<(usize, u32)> {
        self.resolve(tile).or_else(|| match unknown {
            UnknownTile::Skip => None,
            UnknownTile::Placeholder(p) => self.resolve(p),
        })
    }
}

/// Maps Tiled flip bits onto macroquad's flip-then-rotate draw parameters.
///
/// Returns `(flip_x, flip_y, rotation)`.
pub fn flip_params(tile: TileIndex) -> (bool, bool, f32) {
    if tile.flip_d() {
        (tile.flip_v(), !tile.flip_h(), FRAC_PI_2)
    } else {
        (tile.flip_h(), tile.flip_v(), 0.0)
    }
}

/// What an [`AtlasTileset`] does with an index it cannot resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTile {
    #[default]
    Skip,
    Placeholder(TileIndex),
}

pub struct AtlasSheet {
    pub grid: AtlasGrid,
    pub texture: Texture2D,
}

/// Texture-backed tileset made of one or more atlas images.
pub struct AtlasTileset {
    sheets: Vec<AtlasSheet>,
    lookup: GidLookup,
    unknown: UnknownTile,
}

impl AtlasTileset {
    pub fn new(mut sheets: Vec<AtlasSheet>) -> Result<Self, MapError> {
        sheets.sort_unstable_by_key(|s| s.grid.first_gid);
        let grids: Vec<AtlasGrid> = sheets.iter().map(|s| s.grid).collect();
        let lookup = GidLookup::new(&grids)?;
        Ok(AtlasTileset {
            sheets,
            lookup,
            unknown: UnknownTile::default(),
        })
    }

    pub fn with_unknown(mut self, unknown: UnknownTile) -> Self {
        self.unknown = unknown;
        self
    }

    pub fn sheets(&self) -> &[AtlasSheet] {
        &self.sheets
    }

    fn resolve(&self, tile: TileIndex) -> Option<(&AtlasSheet, Rect)> {
        let (idx, local) = self.lookup.resolve_with(tile, self.unknown)?;
        let sheet = self.sheets.get(idx)?;
        Some((sheet, sheet.grid.source_rect(local)?))
    }
}

impl Tileset for AtlasTileset {
    fn draw_tile(&self, position: Vec2, tile: TileIndex) {
        self.draw_tile_with(position, tile, &DrawParams::default());
    }

    fn draw_tile_with(&self, position: Vec2, tile: TileIndex, params: &DrawParams) {
        let Some((sheet, src)) = self.resolve(tile) else {
            debug!(gid = tile.clean(), x = position.x, y = position.y, "skipping unknown tile");
            return;
        };

        let (flip_x, flip_y, rotation) = flip_params(tile);
        draw_texture_ex(
            &sheet.texture,
            position.x,
            position.y,
            params.tint,
            DrawTextureParams {
                source: Some(src),
                flip_x,
                flip_y,
                rotation,
                ..Default::default()
            },
        );
    }
}

/// A [`Tileset`] that draws nothing and remembers every call, in order.
#[derive(Debug, Default)]
pub struct TileRecorder {
    calls: RefCell<Vec<(Vec2, TileIndex)>>,
}

impl TileRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Vec2, TileIndex)> {
        self.calls.borrow().clone()
    }

    pub fn positions(&self) -> Vec<(f32, f32)> {
        self.calls.borrow().iter().map(|(p, _)| (p.x, p.y)).collect()
    }

    pub fn tiles(&self) -> Vec<u32> {
        self.calls.borrow().iter().map(|(_, t)| t.raw()).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Tileset for TileRecorder {
    fn draw_tile(&self, position: Vec2, tile: TileIndex) {
        self.calls.borrow_mut().push((position, tile));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{FLIP_D, FLIP_H, FLIP_V};

    fn grid(first_gid: u32, tilecount: u32) -> AtlasGrid {
        AtlasGrid {
            first_gid,
            tilecount,
            columns: 4,
            tile_w: 16,
            tile_h: 16,
            spacing: 0,
            margin: 0,
        }
    }

    #[test]
    fn source_rect_honours_margin_and_spacing() {
        let g = AtlasGrid {
            spacing: 2,
            margin: 1,
            ..grid(1, 8)
        };
        assert_eq!(g.source_rect(0), Some(Rect::new(1.0, 1.0, 16.0, 16.0)));
        assert_eq!(g.source_rect(5), Some(Rect::new(19.0, 19.0, 16.0, 16.0)));
        assert_eq!(g.source_rect(8), None);
    }

    #[test]
    fn lookup_resolves_across_sheets() {
        let lookup = GidLookup::new(&[grid(1, 4), grid(5, 8)]).unwrap();
        assert_eq!(lookup.max_gid(), 12);
        assert_eq!(lookup.resolve(TileIndex(1)), Some((0, 0)));
        assert_eq!(lookup.resolve(TileIndex(4)), Some((0, 3)));
        assert_eq!(lookup.resolve(TileIndex(5)), Some((1, 0)));
        assert_eq!(lookup.resolve(TileIndex(FLIP_H | 6)), Some((1, 1)));
    }

    #[test]
    fn lookup_reports_unknown_indices() {
        let lookup = GidLookup::new(&[grid(1, 4)]).unwrap();
        assert_eq!(lookup.resolve(TileIndex(0)), None);
        assert_eq!(lookup.resolve(TileIndex(5)), None);
        assert_eq!(lookup.resolve(TileIndex(u32::MAX)), None);
    }

    #[test]
    fn lookup_rejects_overlapping_sheets() {
        let err = GidLookup::new(&[grid(1, 4), grid(3, 4)]).unwrap_err();
        assert!(matches!(err, MapError::InvalidMap(_)));
    }

    #[test]
    fn lookup_accepts_unsorted_sheets() {
        let lookup = GidLookup::new(&[grid(5, 4), grid(1, 4)]).unwrap();
        assert_eq!(lookup.resolve(TileIndex(2)), Some((1, 1)));
        assert_eq!(lookup.resolve(TileIndex(8)), Some((0, 3)));
    }

    #[test]
    fn lookup_rejects_gid_ranges_that_overflow() {
        let err = GidLookup::new(&[grid(u32::MAX - 1, 4)]).unwrap_err();
        assert!(matches!(err, MapError::InvalidMap(_)));
        let err = GidLookup::new(&[grid(GID_MASK, 2)]).unwrap_err();
        assert!(matches!(err, MapError::InvalidMap(_)));
        let err = GidLookup::new(&[grid(0, 4)]).unwrap_err();
        assert!(matches!(err, MapError::InvalidMap(_)));
    }

    #[test]
    fn lookup_stays_small_for_high_first_gid() {
        let lookup = GidLookup::new(&[grid(500_000_000, 4)]).unwrap();
        assert_eq!(lookup.max_gid(), 500_000_003);
        assert_eq!(lookup.resolve(TileIndex(500_000_002)), Some((0, 2)));
        assert_eq!(lookup.resolve(TileIndex(499_999_999)), None);
    }

    #[test]
    fn last_gid_saturates() {
        assert_eq!(grid(u32::MAX, 4).last_gid(), u32::MAX);
        assert_eq!(grid(u32::MAX, 4).gid_end(), None);
        assert_eq!(grid(1, 0).last_gid(), 1);
    }

    #[test]
    fn unknown_policy_skip_resolves_nothing() {
        let lookup = GidLookup::new(&[grid(1, 4)]).unwrap();
        assert_eq!(lookup.resolve_with(TileIndex(2), UnknownTile::Skip), Some((0, 1)));
        assert_eq!(lookup.resolve_with(TileIndex(9), UnknownTile::Skip), None);
    }

    #[test]
    fn unknown_policy_placeholder_substitutes_known_tile() {
        let lookup = GidLookup::new(&[grid(1, 4), grid(5, 4)]).unwrap();
        let policy = UnknownTile::Placeholder(TileIndex(6));
        assert_eq!(lookup.resolve_with(TileIndex(99), policy), Some((1, 1)));
        // known tiles are never replaced
        assert_eq!(lookup.resolve_with(TileIndex(3), policy), Some((0, 2)));
    }

    #[test]
    fn unknown_placeholder_that_is_itself_unknown_skips() {
        let lookup = GidLookup::new(&[grid(1, 4)]).unwrap();
        let policy = UnknownTile::Placeholder(TileIndex(42));
        assert_eq!(lookup.resolve_with(TileIndex(99), policy), None);
        assert_eq!(lookup.resolve_with(TileIndex(0), policy), None);
    }

    #[test]
    fn diagonal_flip_is_a_transpose() {
        assert_eq!(flip_params(TileIndex(1)), (false, false, 0.0));
        assert_eq!(flip_params(TileIndex(FLIP_H | 1)), (true, false, 0.0));
        assert_eq!(flip_params(TileIndex(FLIP_D | 1)), (false, true, FRAC_PI_2));
        assert_eq!(flip_params(TileIndex(FLIP_D | FLIP_H | 1)), (false, false, FRAC_PI_2));
        assert_eq!(flip_params(TileIndex(FLIP_D | FLIP_V | 1)), (true, true, FRAC_PI_2));
    }

    #[test]
    fn recorder_keeps_call_order() {
        let rec = TileRecorder::new();
        rec.draw_tile(vec2(16.0, 0.0), TileIndex(2));
        rec.draw_tile_with(vec2(0.0, 0.0), TileIndex(1), &DrawParams::with_opacity(0.5));
        assert_eq!(rec.positions(), vec![(16.0, 0.0), (0.0, 0.0)]);
        assert_eq!(rec.tiles(), vec![2, 1]);
        rec.clear();
        assert!(rec.is_empty());
    }
}
