use macroquad::prelude::*;
use tracing::trace;

use crate::ir_map::Properties;
use crate::map::{LayerId, Map};
use crate::render::{RenderConfig, Traversal};
use crate::tile::TileIndex;
use crate::tileset::{DrawParams, Tileset};

/// Bounded sub-grid of an infinite layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileChunk {
    /// Top-left anchor in world pixels.
    pub offset_x: i32,
    pub offset_y: i32,
    /// Extent in tiles.
    pub width: u32,
    pub height: u32,
    /// Row-major, may be shorter than `width * height`.
    pub tiles: Vec<TileIndex>,
}

impl TileChunk {
    pub fn new(offset_x: i32, offset_y: i32, width: u32, height: u32, tiles: Vec<TileIndex>) -> Self {
        TileChunk {
            offset_x,
            offset_y,
            width,
            height,
            tiles,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        vec2(self.offset_x as f32, self.offset_y as f32)
    }

    /// Stored tile at chunk-local `(col, row)`.
    pub fn tile_at(&self, col: u32, row: u32) -> Option<TileIndex> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles.get((row * self.width + col) as usize).copied()
    }
}

/// Storage of a tile layer. Which variant is used follows the map's
/// `infinite` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerData {
    Finite(Vec<TileIndex>),
    Chunked(Vec<TileChunk>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    /// Pixel extent.
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub opacity: f32,
    pub offset: Vec2,
    pub properties: Properties,
    data: LayerData,
}

impl Layer {
    fn with_data(name: impl Into<String>, width: u32, height: u32, data: LayerData) -> Self {
        Layer {
            id: LayerId::DETACHED,
            name: name.into(),
            width,
            height,
            visible: true,
            opacity: 1.0,
            offset: Vec2::ZERO,
            properties: Properties::new(),
            data,
        }
    }

    pub fn finite(name: impl Into<String>, width: u32, height: u32, tiles: Vec<TileIndex>) -> Self {
        Self::with_data(name, width, height, LayerData::Finite(tiles))
    }

    pub fn chunked(name: impl Into<String>, width: u32, height: u32, chunks: Vec<TileChunk>) -> Self {
        Self::with_data(name, width, height, LayerData::Chunked(chunks))
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Handle of this layer inside its map.
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    /// Flat tiles of a finite layer.
    pub fn tiles(&self) -> Option<&[TileIndex]> {
        match &self.data {
            LayerData::Finite(tiles) => Some(tiles),
            LayerData::Chunked(_) => None,
        }
    }

    /// Chunks of an infinite layer.
    pub fn chunks(&self) -> Option<&[TileChunk]> {
        match &self.data {
            LayerData::Finite(_) => None,
            LayerData::Chunked(chunks) => Some(chunks),
        }
    }

    /// Paint every stored cell into the map's tileset, walking in the map's
    /// render order. Finite layers stop at the end of `tiles`; chunked layers
    /// paint chunk after chunk, each walked over its own extent.
    pub(crate) fn render<T: Tileset>(&self, map: &Map<T>) {
        let geo = map.geometry();
        let params = DrawParams::with_opacity(self.opacity);
        let painter = Painter {
            tileset: map.tileset(),
            config: map.config(),
            params: &params,
        };

        let drawn = match &self.data {
            LayerData::Finite(tiles) => {
                let walk = Traversal::new(
                    geo.render_order,
                    self.width / geo.tile_width,
                    self.height / geo.tile_height,
                    geo.tile_width,
                    geo.tile_height,
                );
                painter.paint(walk, tiles, self.offset)
            }
            LayerData::Chunked(chunks) => chunks
                .iter()
                .map(|chunk| {
                    let walk = Traversal::new(
                        geo.render_order,
                        chunk.width,
                        chunk.height,
                        geo.tile_width,
                        geo.tile_height,
                    );
                    painter.paint(walk, &chunk.tiles, self.offset + chunk.origin())
                })
                .sum(),
        };

        trace!(layer = %self.name, drawn, "rendered layer");
    }
}

struct Painter<'a, T> {
    tileset: &'a T,
    config: &'a RenderConfig,
    params: &'a DrawParams,
}

impl<T: Tileset> Painter<'_, T> {
    /// Pairs cells with tiles; a short `tiles` ends the walk early.
    fn paint(&self, walk: Traversal, tiles: &[TileIndex], origin: Vec2) -> usize {
        let mut drawn = 0;
        for (pos, &tile) in walk.cells().zip(tiles) {
            if self.config.skip_empty_tiles && tile.is_empty() {
                continue;
            }
            self.tileset.draw_tile_with(origin + pos, tile, self.params);
            drawn += 1;
        }
        drawn
    }
}
