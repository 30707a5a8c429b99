// src/loader/json_loader.rs
use crate::error::MapError;
use crate::ir_map::*;
use crate::object_layer::{ObjectShape, TiledObject};
use crate::tile::GID_MASK;
use macroquad::prelude::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default = "orthogonal")]
    orientation: String,
    #[serde(default = "right_down")]
    renderorder: String,
    #[serde(default)]
    infinite: bool,
    // in tiles
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonValue>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    chunks: Vec<JsonChunk>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" when absent
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objects: Vec<JsonObject>,
}

#[derive(Deserialize)]
struct JsonChunk {
    // in tiles
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    #[serde(default)]
    data: Vec<u32>,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}
fn orthogonal() -> String {
    "orthogonal".to_owned()
}
fn right_down() -> String {
    "right-down".to_owned()
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
}

/// Atlas fields, shared by external files and tilesets embedded in the map.
#[derive(Deserialize)]
struct JsonAtlas {
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    columns: u32,
    image: String,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    polygon: Vec<JsonObjectPoint>,
    #[serde(default)]
    polyline: Vec<JsonObjectPoint>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

fn property_value(name: &str, kind: Option<&str>, value: &JsonValue) -> Result<Option<PropertyValue>, MapError> {
    let parsed = match kind {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name: name.to_owned(),
                kind: other.to_owned(),
            });
        }
        // untyped: take the narrowest match
        None => value
            .as_bool()
            .map(PropertyValue::Bool)
            .or_else(|| value.as_i64().map(PropertyValue::I64))
            .or_else(|| value.as_f64().map(|n| PropertyValue::F32(n as f32)))
            .or_else(|| value.as_str().map(|s| PropertyValue::String(s.to_owned()))),
    };
    Ok(parsed)
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    for p in props {
        if let Some(value) = property_value(&p.name, p.kind.as_deref(), &p.value)? {
            out.insert(p.name, value);
        }
    }
    Ok(out)
}

fn object_from_json(obj: JsonObject) -> Result<TiledObject, MapError> {
    let points = |pts: Vec<JsonObjectPoint>| -> Vec<Vec2> {
        pts.into_iter().map(|p| vec2(p.x, p.y)).collect()
    };

    let shape = if let Some(gid) = obj.gid {
        ObjectShape::Tile { gid }
    } else if obj.point {
        ObjectShape::Point
    } else if obj.ellipse {
        ObjectShape::Ellipse
    } else if !obj.polygon.is_empty() {
        ObjectShape::Polygon(points(obj.polygon))
    } else if !obj.polyline.is_empty() {
        ObjectShape::Polyline(points(obj.polyline))
    } else {
        ObjectShape::Rectangle
    };

    let class_name = if obj.class.is_empty() { obj.kind } else { obj.class };

    Ok(TiledObject {
        id: obj.id,
        name: obj.name,
        class_name,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        visible: obj.visible,
        shape,
        properties: properties_from_json(obj.properties)?,
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn tileset_from_json(entry: JsonValue, map_dir: &Path, map_path: &Path) -> Result<IrTileset, MapError> {
    let as_json_err = |source| MapError::Json {
        path: map_path.to_path_buf(),
        source,
    };
    let r: JsonTilesetRef = serde_json::from_value(entry.clone()).map_err(as_json_err)?;

    let atlas: JsonAtlas = match &r.source {
        Some(source) => {
            if !source.ends_with(".json") {
                return Err(MapError::InvalidMap(format!(
                    "External tileset must be JSON: {source}"
                )));
            }
            read_json(&map_dir.join(source))?
        }
        None => serde_json::from_value(entry).map_err(as_json_err)?,
    };

    let in_range = r
        .firstgid
        .checked_add(atlas.tilecount)
        .is_some_and(|end| end - 1 <= GID_MASK);
    if r.firstgid == 0 || !in_range {
        return Err(MapError::InvalidMap(format!(
            "tileset '{}' gids {}+{} fall outside 1..={GID_MASK}",
            atlas.image, r.firstgid, atlas.tilecount
        )));
    }

    // image path stays relative; Map::from_ir joins it with the map dir
    Ok(IrTileset::Atlas {
        first_gid: r.firstgid,
        image: atlas.image,
        tile_w: atlas.tilewidth,
        tile_h: atlas.tileheight,
        tilecount: atlas.tilecount,
        columns: atlas.columns,
        spacing: atlas.spacing,
        margin: atlas.margin,
        properties: properties_from_json(atlas.properties)?,
    })
}

/// Tile count to pixels, failing instead of wrapping.
fn to_pixels(what: &str, tiles: u32, tile: u32) -> Result<u32, MapError> {
    tiles.checked_mul(tile).ok_or_else(|| {
        MapError::InvalidMap(format!("{what}: {tiles} tiles of {tile}px overflow a pixel extent"))
    })
}

fn chunk_offset(layer: &str, tiles: i32, tile: u32) -> Result<i32, MapError> {
    i32::try_from(tile)
        .ok()
        .and_then(|t| tiles.checked_mul(t))
        .ok_or_else(|| {
            MapError::InvalidMap(format!(
                "layer '{layer}': chunk at {tiles} tiles of {tile}px overflows a pixel offset"
            ))
        })
}

fn check_gids(layer: &str, data: &[u32], max_gid: u32) -> Result<(), MapError> {
    match data.iter().map(|raw| raw & GID_MASK).find(|&gid| gid > max_gid) {
        Some(gid) => Err(MapError::InvalidTileGid {
            layer: layer.to_owned(),
            gid,
            max_gid,
        }),
        None => Ok(()),
    }
}

fn layer_from_json(l: JsonLayer, j: &JsonMap, max_gid: u32) -> Result<IrLayer, MapError> {
    let (tw, th) = (j.tilewidth, j.tileheight);

    let kind = match l.kind.as_deref().unwrap_or("tilelayer") {
        "tilelayer" if j.infinite => {
            let mut chunks = Vec::with_capacity(l.chunks.len());
            for c in l.chunks {
                check_gids(&l.name, &c.data, max_gid)?;
                chunks.push(IrChunk {
                    offset_x: chunk_offset(&l.name, c.x, tw)?,
                    offset_y: chunk_offset(&l.name, c.y, th)?,
                    width: c.width,
                    height: c.height,
                    data: c.data,
                });
            }
            IrLayerKind::Chunks {
                width: to_pixels(&l.name, l.width, tw)?,
                height: to_pixels(&l.name, l.height, th)?,
                chunks,
            }
        }
        "tilelayer" => {
            check_gids(&l.name, &l.data, max_gid)?;
            IrLayerKind::Tiles {
                width: to_pixels(&l.name, l.width, tw)?,
                height: to_pixels(&l.name, l.height, th)?,
                data: l.data,
            }
        }
        "objectgroup" => {
            for obj in &l.objects {
                if let Some(raw_gid) = obj.gid {
                    let gid = raw_gid & GID_MASK;
                    if gid == 0 || gid > max_gid {
                        return Err(MapError::InvalidObjectGid {
                            layer: l.name.clone(),
                            object_id: obj.id,
                            gid,
                            max_gid,
                        });
                    }
                }
            }
            IrLayerKind::Objects {
                objects: l
                    .objects
                    .into_iter()
                    .map(object_from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            }
        }
        other => {
            warn!(layer = %l.name, kind = other, "ignoring unsupported layer type");
            IrLayerKind::Unsupported
        }
    };

    Ok(IrLayer {
        name: l.name,
        visible: l.visible,
        opacity: l.opacity,
        offset: vec2(l.offsetx, l.offsety),
        properties: properties_from_json(l.properties)?,
        kind,
    })
}

fn decode(txt: &str, map_dir: &Path, map_path: &Path) -> Result<IrMap, MapError> {
    let mut j: JsonMap = serde_json::from_str(txt).map_err(|source| MapError::Json {
        path: map_path.to_path_buf(),
        source,
    })?;
    let width = to_pixels("map width", j.width, j.tilewidth)?;
    let height = to_pixels("map height", j.height, j.tileheight)?;

    let mut tilesets = std::mem::take(&mut j.tilesets)
        .into_iter()
        .map(|entry| tileset_from_json(entry, map_dir, map_path))
        .collect::<Result<Vec<_>, _>>()?;
    tilesets.sort_by_key(IrTileset::first_gid);

    let max_gid = tilesets.iter().map(IrTileset::last_gid).max().unwrap_or(0);

    let layers = std::mem::take(&mut j.layers)
        .into_iter()
        .map(|l| layer_from_json(l, &j, max_gid))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        path = %map_path.display(),
        layers = layers.len(),
        tilesets = tilesets.len(),
        infinite = j.infinite,
        "decoded map json"
    );

    Ok(IrMap {
        orientation: j.orientation,
        render_order: j.renderorder,
        infinite: j.infinite,
        width,
        height,
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        properties: properties_from_json(j.properties)?,
        tilesets,
        layers,
    })
}

/// Decode a Tiled JSON map file, returning the IR and the map's directory.
pub fn decode_map_file_to_ir(path: &str) -> Result<(IrMap, PathBuf), MapError> {
    let p = Path::new(path);
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {path}"
        )));
    }

    let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })?;

    let map_dir = p
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    Ok((decode(&txt, &map_dir, p)?, map_dir))
}

/// Decode an in-memory Tiled JSON map. External tilesets resolve against `map_dir`.
pub fn decode_map_str_to_ir(json: &str, map_dir: &Path) -> Result<IrMap, MapError> {
    decode(json, map_dir, Path::new("<inline>"))
}
