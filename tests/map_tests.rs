// tests/map_tests.rs

use std::path::Path;

use macroquad_tiled_compositor::loader::json_loader::decode_map_str_to_ir;
use macroquad_tiled_compositor::{
    Layer, LayerData, Map, MapError, ObjectShape, Orientation, RenderOrder, TileIndex,
    TileRecorder,
};

fn build(json: &str) -> Result<Map<TileRecorder>, MapError> {
    let ir = decode_map_str_to_ir(json, Path::new(".")).expect("json should decode");
    Map::from_ir_with(ir, TileRecorder::new())
}

const TILESET: &str = r#"{"firstgid":1,"tilewidth":8,"tileheight":8,"tilecount":8,"columns":4,"image":"t.png"}"#;

fn map_json(orientation: &str, order: &str, width: u32) -> String {
    format!(
        r#"{{
          "orientation":"{orientation}", "renderorder":"{order}",
          "width":{width}, "height":2, "tilewidth":8, "tileheight":8,
          "layers":[{{"name":"L","width":{width},"height":2,"data":[1,2,3,4]}}],
          "tilesets":[{TILESET}]
        }}"#
    )
}

#[test]
fn builds_from_ir_with_parsed_geometry() {
    let map = build(&map_json("orthogonal", "left-down", 2)).expect("valid map");
    let geo = map.geometry();
    assert_eq!(geo.orientation, Orientation::Orthogonal);
    assert_eq!(geo.render_order, RenderOrder::LeftDown);
    assert_eq!((geo.width, geo.height), (16, 16));
    assert_eq!((geo.columns(), geo.rows()), (2, 2));
    assert!(!geo.infinite);

    let layer = &map.layers()[0];
    assert_eq!(layer.name, "L");
    assert_eq!(layer.tiles().map(<[TileIndex]>::len), Some(4));
}

#[test]
fn error_on_unsupported_orientation() {
    let err = build(&map_json("isometric", "right-down", 2))
        .err()
        .expect("expected orientation error");
    assert!(matches!(err, MapError::UnsupportedOrientation(o) if o == "isometric"));
}

#[test]
fn error_on_unsupported_render_order() {
    let err = build(&map_json("orthogonal", "down-right", 2))
        .err()
        .expect("expected render order error");
    assert!(matches!(err, MapError::UnsupportedRenderOrder(ref o) if o == "down-right"));
    assert!(err.to_string().contains("down-right"));
}

#[test]
fn error_on_layer_not_aligned_to_tiles() {
    let json = format!(
        r#"{{
          "width":2, "height":2, "tilewidth":8, "tileheight":8,
          "layers":[{{"name":"L","width":2,"height":2,"offsetx":0,"data":[1]}}],
          "tilesets":[{TILESET}]
        }}"#
    );
    let mut ir = decode_map_str_to_ir(&json, Path::new(".")).expect("decode");
    ir.width = 20;
    let err = Map::from_ir_with(ir, TileRecorder::new())
        .err()
        .expect("expected misaligned grid");
    assert!(matches!(err, MapError::MisalignedGrid { extent: 20, tile: 8, .. }));
}

#[test]
fn infinite_map_gets_chunked_layers_and_objects() {
    let json = format!(
        r#"{{
          "infinite":true, "renderorder":"right-up",
          "tilewidth":8, "tileheight":8,
          "layers":[
            {{"type":"tilelayer","name":"world","width":2,"height":2,
              "chunks":[{{"x":1,"y":-1,"width":2,"height":1,"data":[3,4]}}]}},
            {{"type":"objectgroup","name":"spawns","objects":[
              {{"id":1,"name":"p","class":"player","x":4,"y":4,"point":true}},
              {{"id":2,"name":"c","type":"chest","gid":2,"width":8,"height":8}}
            ]}}
          ],
          "tilesets":[{TILESET}]
        }}"#
    );
    let map = build(&json).expect("valid map");

    match map.layers()[0].data() {
        LayerData::Chunked(chunks) => {
            assert_eq!((chunks[0].offset_x, chunks[0].offset_y), (8, -8));
        }
        LayerData::Finite(_) => panic!("expected chunked layer"),
    }
    assert_eq!(map.tile_at(map.layers()[0].id(), 2, -1), Some(TileIndex(4)));

    let spawns = map.object_layer("spawns").expect("object layer");
    assert_eq!(spawns.objects().len(), 2);
    assert_eq!(map.objects().count(), 2);
    let shapes: Vec<_> = map.objects().map(|o| o.shape.clone()).collect();
    assert_eq!(shapes, vec![ObjectShape::Point, ObjectShape::Tile { gid: 2 }]);
    assert_eq!(map.objects().nth(1).map(|o| o.class_name.as_str()), Some("chest"));

    map.render();
    assert_eq!(map.tileset().positions(), vec![(8., -8.), (16., -8.)]);
}

#[test]
fn error_when_finite_layer_lands_in_infinite_map() {
    let json = format!(
        r#"{{
          "infinite":true, "tilewidth":8, "tileheight":8,
          "layers":[{{"name":"world","chunks":[]}}],
          "tilesets":[{TILESET}]
        }}"#
    );
    let mut ir = decode_map_str_to_ir(&json, Path::new(".")).expect("decode");
    ir.infinite = false;
    let err = Map::from_ir_with(ir, TileRecorder::new())
        .err()
        .expect("expected storage mismatch");
    assert!(matches!(err, MapError::StorageMismatch { ref layer, .. } if layer == "world"));
}

#[test]
fn load_allows_duplicate_and_empty_layer_names() {
    let json = format!(
        r#"{{
          "width":1, "height":1, "tilewidth":8, "tileheight":8,
          "layers":[
            {{"name":"","width":1,"height":1,"data":[1]}},
            {{"name":"","width":1,"height":1,"data":[2]}}
          ],
          "tilesets":[{TILESET}]
        }}"#
    );
    let map = build(&json).expect("valid map");
    assert_eq!(map.layers().len(), 2);
    assert_eq!(map.layer_by_name("").map(Layer::id), Some(map.layers()[0].id()));
}
