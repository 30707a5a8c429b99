use macroquad::prelude::*;

use crate::ir_map::Properties;

/// Geometry of a placed object. Points are relative to the object's `x/y`.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    Rectangle,
    Point,
    Ellipse,
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
    Tile { gid: u32 },
}

/// A free-form object placed in an object layer. Inert data for gameplay code.
#[derive(Debug, Clone, PartialEq)]
pub struct TiledObject {
    pub id: u32,
    pub name: String,
    /// Tiled `class`, falling back to the legacy `type` field.
    pub class_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl TiledObject {
    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }
}

/// Named group of objects. Never rendered by the compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayer {
    pub name: String,
    pub visible: bool,
    pub properties: Properties,
    objects: Vec<TiledObject>,
}

impl ObjectLayer {
    pub fn new(name: impl Into<String>, objects: Vec<TiledObject>) -> Self {
        ObjectLayer {
            name: name.into(),
            visible: true,
            properties: Properties::new(),
            objects,
        }
    }

    pub fn objects(&self) -> &[TiledObject] {
        &self.objects
    }

    pub fn object_by_id(&self, id: u32) -> Option<&TiledObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Objects whose class matches `class_name`, in layer order.
    pub fn objects_of_class<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = &'a TiledObject> + 'a {
        self.objects.iter().filter(move |o| o.class_name == class_name)
    }
}
