// Format-agnostic map description produced by loaders.
//
// Nothing here is validated; `Map::from_ir` is where orientation, render
// order and grid alignment are checked.
use macroquad::prelude::*;
use std::collections::HashMap;

use crate::object_layer::TiledObject;

/// Typed custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    I64(i64),
    F32(f32),
    String(String),
}

/// Name -> value bag attached to maps, layers, objects and tiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// `None` when the value does not fit in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Canonical, format-agnostic map.
pub struct IrMap {
    pub orientation: String,
    pub render_order: String,
    pub infinite: bool,
    /// Map extent in pixels.
    pub width: u32,
    pub height: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub properties: Properties,
    pub tilesets: Vec<IrTileset>, // must be sorted by first_gid
    pub layers: Vec<IrLayer>,     // draw order: array order
}

pub enum IrTileset {
    /// One image atlas with a regular grid.
    Atlas {
        first_gid: u32,
        image: String,
        tile_w: u32,
        tile_h: u32,
        tilecount: u32,
        columns: u32,
        spacing: u32, // 0 if not used
        margin: u32,  // 0 if not used
        properties: Properties,
    },
}

impl IrTileset {
    pub fn first_gid(&self) -> u32 {
        match self {
            IrTileset::Atlas { first_gid, .. } => *first_gid,
        }
    }

    pub fn last_gid(&self) -> u32 {
        match self {
            IrTileset::Atlas {
                first_gid,
                tilecount,
                ..
            } => first_gid.saturating_add(tilecount.saturating_sub(1)),
        }
    }
}

/// One chunk of an infinite tile layer, offset already in pixels.
pub struct IrChunk {
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
}

pub enum IrLayerKind {
    Tiles {
        /// Pixel extent of the layer.
        width: u32,
        height: u32,
        data: Vec<u32>, // raw GIDs (including flip flags ok)
    },
    Chunks {
        width: u32,
        height: u32,
        chunks: Vec<IrChunk>,
    },
    Objects {
        objects: Vec<TiledObject>,
    },
    Unsupported,
}

pub struct IrLayer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub offset: Vec2, // world offset for this layer
    pub properties: Properties,
    pub kind: IrLayerKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_reject_other_types() {
        let mut p = Properties::new();
        p.insert("solid", PropertyValue::Bool(true));
        p.insert("big", PropertyValue::I64(5_000_000_000));
        p.insert("speed", PropertyValue::F32(1.5));

        assert_eq!(p.get_bool("solid"), Some(true));
        assert_eq!(p.get_i64("solid"), None);
        assert_eq!(p.get_i64("big"), Some(5_000_000_000));
        assert_eq!(p.get_i32("big"), None);
        assert_eq!(p.get_f32("speed"), Some(1.5));
        assert_eq!(p.get_string("missing"), None);
        assert_eq!(p.len(), 3);
    }
}
