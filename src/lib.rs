//! Orthogonal Tiled map compositor for Macroquad.
//!
//! A [`Map`] owns its tile layers, object layers and a [`Tileset`]. Calling
//! [`Map::render`] once per frame walks every visible layer in the map's
//! [`RenderOrder`] and issues one [`Tileset::draw_tile`] per stored cell.
//! Finite layers hold a flat tile array, infinite layers hold [`TileChunk`]s
//! anchored at pixel offsets.

mod error;
mod ir_map;
mod layer;
pub mod loader {
    pub mod json_loader;
}
mod map;
mod object_layer;
mod render;
mod tile;
mod tileset;

pub use error::MapError;
pub use ir_map::{IrChunk, IrLayer, IrLayerKind, IrMap, IrTileset, Properties, PropertyValue};
pub use layer::{Layer, LayerData, TileChunk};
pub use map::{LayerId, Map, MapBuilder, MapGeometry, Orientation};
pub use object_layer::{ObjectLayer, ObjectShape, TiledObject};
pub use render::{Cells, RenderConfig, RenderOrder, Traversal};
pub use tile::{TileIndex, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
pub use tileset::{
    flip_params, AtlasGrid, AtlasSheet, AtlasTileset, DrawParams, GidLookup, TileRecorder,
    Tileset, UnknownTile,
};
