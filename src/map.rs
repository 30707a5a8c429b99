use std::fmt;
use std::path::Path;
use std::str::FromStr;

use macroquad::prelude::*;
use tracing::debug;

use crate::error::MapError;
use crate::ir_map::*;
use crate::layer::{Layer, LayerData, TileChunk};
use crate::loader::json_loader::*;
use crate::object_layer::{ObjectLayer, TiledObject};
use crate::render::{RenderConfig, RenderOrder};
use crate::tile::TileIndex;
use crate::tileset::{AtlasGrid, AtlasSheet, AtlasTileset, Tileset};

/// Handle of a tile layer inside the [`Map`] that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) usize);

impl LayerId {
    pub(crate) const DETACHED: LayerId = LayerId(usize::MAX);

    /// Paint-order position of the layer.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Orthogonal,
}

impl FromStr for Orientation {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orthogonal" => Ok(Orientation::Orthogonal),
            other => Err(MapError::UnsupportedOrientation(other.to_owned())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Orthogonal => f.write_str("orthogonal"),
        }
    }
}

/// Map-wide grid description. `width`/`height` are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapGeometry {
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub infinite: bool,
}

impl MapGeometry {
    pub fn finite(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        MapGeometry {
            orientation: Orientation::Orthogonal,
            render_order: RenderOrder::RightDown,
            width,
            height,
            tile_width,
            tile_height,
            infinite: false,
        }
    }

    pub fn infinite(tile_width: u32, tile_height: u32) -> Self {
        MapGeometry {
            infinite: true,
            ..Self::finite(0, 0, tile_width, tile_height)
        }
    }

    pub fn with_render_order(mut self, render_order: RenderOrder) -> Self {
        self.render_order = render_order;
        self
    }

    /// Map extent in tiles.
    pub fn columns(&self) -> u32 {
        self.width / self.tile_width.max(1)
    }

    pub fn rows(&self) -> u32 {
        self.height / self.tile_height.max(1)
    }

    fn validate(&self) -> Result<(), MapError> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(MapError::ZeroTileSize);
        }
        self.check_aligned("map", self.width, self.height)
    }

    fn check_aligned(&self, what: &str, width: u32, height: u32) -> Result<(), MapError> {
        if width % self.tile_width != 0 {
            return Err(MapError::MisalignedGrid {
                what: format!("{what} width"),
                extent: width,
                tile: self.tile_width,
            });
        }
        if height % self.tile_height != 0 {
            return Err(MapError::MisalignedGrid {
                what: format!("{what} height"),
                extent: height,
                tile: self.tile_height,
            });
        }
        Ok(())
    }
}

/// Collects layers and validates them into a [`Map`].
pub struct MapBuilder {
    geometry: MapGeometry,
    layers: Vec<Layer>,
    object_layers: Vec<ObjectLayer>,
    properties: Properties,
    config: RenderConfig,
}

impl MapBuilder {
    pub fn new(geometry: MapGeometry) -> Self {
        MapBuilder {
            geometry,
            layers: Vec::new(),
            object_layers: Vec::new(),
            properties: Properties::new(),
            config: RenderConfig::default(),
        }
    }

    /// Appends a tile layer; later layers paint over earlier ones.
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn object_layer(mut self, layer: ObjectLayer) -> Self {
        self.object_layers.push(layer);
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build<T: Tileset>(self, tileset: T) -> Result<Map<T>, MapError> {
        let geo = self.geometry;
        geo.validate()?;

        let mut layers = self.layers;
        for (i, layer) in layers.iter_mut().enumerate() {
            geo.check_aligned(&format!("layer '{}'", layer.name), layer.width, layer.height)?;

            match (layer.data(), geo.infinite) {
                (LayerData::Finite(tiles), false) => {
                    let cells = (layer.width / geo.tile_width) as usize
                        * (layer.height / geo.tile_height) as usize;
                    if tiles.len() > cells {
                        debug!(
                            layer = %layer.name,
                            tiles = tiles.len(),
                            cells,
                            "layer has more tiles than cells; extra tiles are never drawn"
                        );
                    }
                }
                (LayerData::Chunked(chunks), true) => check_chunks(&layer.name, chunks, &geo)?,
                (_, infinite) => {
                    return Err(MapError::StorageMismatch {
                        layer: layer.name.clone(),
                        infinite,
                    });
                }
            }

            layer.id = LayerId(i);
        }

        debug!(
            layers = layers.len(),
            object_layers = self.object_layers.len(),
            render_order = %geo.render_order,
            infinite = geo.infinite,
            "built map"
        );

        Ok(Map {
            geometry: geo,
            tileset,
            layers,
            object_layers: self.object_layers,
            properties: self.properties,
            config: self.config,
        })
    }
}

/// A validated, read-only tile map plus the tileset it draws with.
pub struct Map<T = AtlasTileset> {
    geometry: MapGeometry,
    tileset: T,
    layers: Vec<Layer>,
    object_layers: Vec<ObjectLayer>,
    properties: Properties,
    config: RenderConfig,
}

impl<T> Map<T> {
    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    pub fn tileset(&self) -> &T {
        &self.tileset
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Tile layers in paint order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0)
    }

    /// First layer called `name`; names need not be unique.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn object_layers(&self) -> &[ObjectLayer] {
        &self.object_layers
    }

    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.object_layers.iter().find(|l| l.name == name)
    }

    /// Every object of every object layer, layer by layer.
    pub fn objects(&self) -> impl Iterator<Item = &TiledObject> {
        self.object_layers.iter().flat_map(|l| l.objects().iter())
    }

    /// Stored tile at grid cell `(col, row)` of a layer.
    ///
    /// Finite layers index their row-major storage; chunked layers look up the
    /// chunk covering the cell. `None` for cells outside storage.
    pub fn tile_at(&self, id: LayerId, col: i32, row: i32) -> Option<TileIndex> {
        let layer = self.layer(id)?;
        let tw = self.geometry.tile_width as i64;
        let th = self.geometry.tile_height as i64;

        match layer.data() {
            LayerData::Finite(tiles) => {
                let cols = layer.width as i64 / tw;
                let rows = layer.height as i64 / th;
                let (col, row) = (col as i64, row as i64);
                if col < 0 || row < 0 || col >= cols || row >= rows {
                    return None;
                }
                tiles.get((row * cols + col) as usize).copied()
            }
            LayerData::Chunked(chunks) => {
                let px = col as i64 * tw;
                let py = row as i64 * th;
                chunks.iter().find_map(|c| chunk_cell(c, px, py, tw, th))
            }
        }
    }
}

fn chunk_cell(c: &TileChunk, px: i64, py: i64, tw: i64, th: i64) -> Option<TileIndex> {
    let dx = px - c.offset_x as i64;
    let dy = py - c.offset_y as i64;
    if dx < 0 || dy < 0 || dx % tw != 0 || dy % th != 0 {
        return None;
    }
    let (lc, lr) = (dx / tw, dy / th);
    if lc >= c.width as i64 || lr >= c.height as i64 {
        return None;
    }
    c.tile_at(lc as u32, lr as u32)
}

impl<T: Tileset> Map<T> {
    /// Build a map from loader IR using a caller-supplied tileset.
    ///
    /// The IR's tileset entries are ignored; use [`Map::from_ir`] to build an
    /// [`AtlasTileset`] from them.
    pub fn from_ir_with(ir: IrMap, tileset: T) -> Result<Self, MapError> {
        let geometry = MapGeometry {
            orientation: ir.orientation.parse()?,
            render_order: ir.render_order.parse()?,
            width: ir.width,
            height: ir.height,
            tile_width: ir.tile_w,
            tile_height: ir.tile_h,
            infinite: ir.infinite,
        };

        let mut builder = MapBuilder::new(geometry).properties(ir.properties);
        for layer in ir.layers {
            let tiles = match layer.kind {
                IrLayerKind::Tiles {
                    width,
                    height,
                    data,
                } => Layer::finite(layer.name, width, height, to_indices(data)),
                IrLayerKind::Chunks {
                    width,
                    height,
                    chunks,
                } => {
                    let chunks = chunks
                        .into_iter()
                        .map(|c| {
                            TileChunk::new(c.offset_x, c.offset_y, c.width, c.height, to_indices(c.data))
                        })
                        .collect();
                    Layer::chunked(layer.name, width, height, chunks)
                }
                IrLayerKind::Objects { objects } => {
                    let mut group = ObjectLayer::new(layer.name, objects);
                    group.visible = layer.visible;
                    group.properties = layer.properties;
                    builder = builder.object_layer(group);
                    continue;
                }
                IrLayerKind::Unsupported => continue,
            };

            builder = builder.layer(
                tiles
                    .with_visible(layer.visible)
                    .with_opacity(layer.opacity)
                    .with_offset(layer.offset)
                    .with_properties(layer.properties),
            );
        }

        builder.build(tileset)
    }

    /// Paint every visible layer in order; later layers land on top.
    pub fn render(&self) {
        for layer in self.layers.iter().filter(|l| l.visible) {
            layer.render(self);
        }
    }

    /// Paint a single layer, visible or not. Returns `false` for an id this
    /// map did not hand out.
    pub fn render_layer(&self, id: LayerId) -> bool {
        match self.layer(id) {
            Some(layer) => {
                layer.render(self);
                true
            }
            None => false,
        }
    }
}

/// Chunks must be non-empty, sit on the tile grid and not cover the same cell twice.
fn check_chunks(layer: &str, chunks: &[TileChunk], geo: &MapGeometry) -> Result<(), MapError> {
    let (tw, th) = (i64::from(geo.tile_width), i64::from(geo.tile_height));
    let invalid = |c: &TileChunk, reason: &'static str| MapError::InvalidChunk {
        layer: layer.to_owned(),
        offset_x: c.offset_x,
        offset_y: c.offset_y,
        reason,
    };
    // pixel bounds as [x0, x1) x [y0, y1)
    let bounds = |c: &TileChunk| {
        let (x, y) = (i64::from(c.offset_x), i64::from(c.offset_y));
        (x, x + i64::from(c.width) * tw, y, y + i64::from(c.height) * th)
    };

    for (i, c) in chunks.iter().enumerate() {
        if c.width == 0 || c.height == 0 {
            return Err(invalid(c, "chunk is empty"));
        }
        if i64::from(c.offset_x).rem_euclid(tw) != 0 || i64::from(c.offset_y).rem_euclid(th) != 0 {
            return Err(invalid(c, "offset is not a multiple of the tile size"));
        }
        let (ax0, ax1, ay0, ay1) = bounds(c);
        let overlaps = chunks[..i].iter().any(|prev| {
            let (bx0, bx1, by0, by1) = bounds(prev);
            ax0 < bx1 && bx0 < ax1 && ay0 < by1 && by0 < ay1
        });
        if overlaps {
            return Err(invalid(c, "chunk overlaps an earlier chunk"));
        }
    }
    Ok(())
}

fn to_indices(data: Vec<u32>) -> Vec<TileIndex> {
    data.into_iter().map(TileIndex).collect()
}

impl Map<AtlasTileset> {
    /// Load a Tiled JSON map and its atlas textures.
    pub async fn load(path: &str) -> Result<Self, MapError> {
        let (ir, base) = decode_map_file_to_ir(path)?;
        Self::from_ir(ir, &base).await
    }

    pub async fn from_ir(ir: IrMap, base_dir: &Path) -> Result<Self, MapError> {
        let mut sheets = Vec::with_capacity(ir.tilesets.len());

        for t in &ir.tilesets {
            match t {
                IrTileset::Atlas {
                    first_gid,
                    image,
                    tile_w,
                    tile_h,
                    tilecount,
                    columns,
                    spacing,
                    margin,
                    ..
                } => {
                    let img_path = base_dir.join(image);
                    let tex = load_atlas_texture(&img_path).await?;

                    sheets.push(AtlasSheet {
                        grid: AtlasGrid {
                            first_gid: *first_gid,
                            tilecount: *tilecount,
                            columns: *columns,
                            tile_w: *tile_w,
                            tile_h: *tile_h,
                            spacing: *spacing,
                            margin: *margin,
                        },
                        texture: tex,
                    });
                }
            }
        }

        let tileset = AtlasTileset::new(sheets)?;
        Self::from_ir_with(ir, tileset)
    }
}

async fn load_atlas_texture(path: &Path) -> Result<Texture2D, MapError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| MapError::InvalidMap(format!("non UTF-8 image path {}", path.display())))?;
    let tex = load_texture(path_str)
        .await
        .map_err(|e| MapError::Texture {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tex.set_filter(FilterMode::Nearest);
    Ok(tex)
}
