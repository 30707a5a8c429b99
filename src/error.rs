use std::io;
use std::path::PathBuf;

/// Errors raised while decoding or constructing a [`Map`](crate::Map).
///
/// Every variant is structural: a map that fails with one of these is never
/// rendered. Per-cell problems (unknown tile indices) are handled by the
/// [`Tileset`](crate::Tileset) at draw time instead.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Only orthogonal maps are supported.
    #[error("unsupported map orientation '{0}'")]
    UnsupportedOrientation(String),

    /// The render order string is not one of the four raster orders.
    #[error("unsupported render order '{0}'")]
    UnsupportedRenderOrder(String),

    /// Tile width or height is zero.
    #[error("tile size must be non-zero")]
    ZeroTileSize,

    /// A pixel extent is not an exact multiple of the tile size.
    #[error("{what} extent {extent}px is not a multiple of tile size {tile}px")]
    MisalignedGrid {
        what: String,
        extent: u32,
        tile: u32,
    },

    /// A layer's storage does not match the map's finite/infinite flag.
    #[error("layer '{layer}' storage does not match map (infinite = {infinite})")]
    StorageMismatch { layer: String, infinite: bool },

    /// A chunk is empty, off the tile grid, or overlaps an earlier chunk.
    #[error("layer '{layer}' has an invalid chunk at ({offset_x}, {offset_y}): {reason}")]
    InvalidChunk {
        layer: String,
        offset_x: i32,
        offset_y: i32,
        reason: &'static str,
    },

    /// A tile layer references a GID no tileset covers.
    #[error("layer '{layer}' references gid {gid}, but the highest known gid is {max_gid}")]
    InvalidTileGid { layer: String, gid: u32, max_gid: u32 },

    /// A tile object references a GID no tileset covers.
    #[error("object {object_id} in layer '{layer}' references gid {gid}, but the highest known gid is {max_gid}")]
    InvalidObjectGid {
        layer: String,
        object_id: u32,
        gid: u32,
        max_gid: u32,
    },

    /// A custom property uses a type tag this crate does not understand.
    #[error("property '{name}' has unsupported type '{kind}'")]
    UnsupportedPropertyType { name: String, kind: String },

    /// Catch-all for malformed input that has no dedicated variant.
    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load texture {path}: {message}")]
    Texture { path: PathBuf, message: String },
}
