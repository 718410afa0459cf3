use lavalamp::{Background, RendererKind};

fn main() {
    env_logger::init();

    // `lavalamp raster` for the CPU compositor, anything else gets the
    // GPU field renderer.
    let renderer = match std::env::args().nth(1).as_deref() {
        Some("raster") => RendererKind::Raster,
        _ => RendererKind::Field,
    };

    if let Err(e) = Background::new().with_renderer(renderer).run() {
        log::error!("lavalamp exited: {}", e);
        std::process::exit(1);
    }
}
