use anyhow::Context;
use macroquad::prelude::*;
use macroquad_tiled_compositor::Map;
use tracing_subscriber::EnvFilter;

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Map".into(),
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

    loop {
        clear_background(BLACK);

        map.render();

        draw_text(
            &format!("FPS: {} order: {}", get_fps(), map.geometry().render_order),
            20.0,
            30.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
