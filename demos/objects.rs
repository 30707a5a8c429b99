use anyhow::Context;
use macroquad::prelude::*;
use macroquad_tiled_compositor::{Map, ObjectShape};
use tracing_subscriber::EnvFilter;

fn window_conf() -> Conf {
    Conf {
        window_title: "Objects Example".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        tracing::error!("{err:#}");
    }
}

async fn run() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "assets/map.json".into());
    let map = Map::load(&path)
        .await
        .with_context(|| format!("Loading map {path}"))?;

    tracing::info!(
        object_layers = map.object_layers().len(),
        objects = map.objects().count(),
        "map loaded"
    );

    loop {
        clear_background(BLACK);

        map.render();

        // object layers are gameplay data; outline them for debugging
        for obj in map.objects().filter(|o| o.visible) {
            let p = obj.position();
            match &obj.shape {
                ObjectShape::Point => draw_circle(p.x, p.y, 3.0, YELLOW),
                ObjectShape::Ellipse => draw_ellipse_lines(
                    p.x + obj.width / 2.0,
                    p.y + obj.height / 2.0,
                    obj.width / 2.0,
                    obj.height / 2.0,
                    0.0,
                    1.0,
                    YELLOW,
                ),
                ObjectShape::Polygon(points) | ObjectShape::Polyline(points) => {
                    for w in points.windows(2) {
                        draw_line(p.x + w[0].x, p.y + w[0].y, p.x + w[1].x, p.y + w[1].y, 1.0, YELLOW);
                    }
                }
                ObjectShape::Rectangle => {
                    draw_rectangle_lines(p.x, p.y, obj.width, obj.height, 1.0, YELLOW)
                }
                // tile objects are anchored bottom-left
                ObjectShape::Tile { .. } => {
                    draw_rectangle_lines(p.x, p.y - obj.height, obj.width, obj.height, 1.0, YELLOW)
                }
            }
        }

        draw_text("objects example", 20.0, 30.0, 32.0, WHITE);
        next_frame().await;
    }
}
