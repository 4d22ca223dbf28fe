// tunnel-preview - Render the tunnel to a PNG without a browser
//
// Drives the engine for a number of frames at a fixed scroll offset,
// resolving slab images from local files, and saves the last frame.
//
// Usage: cargo run --bin tunnel-preview -- [--frames N] [--scroll PX]
//        [--width W] [--height H] [--dark] [--config file.json]
//        [--out path.png] [--images a.jpg b.png ...]

mod files;
mod raster;

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;
use tunnel_engine::camera::Viewport;
use tunnel_engine::config::TunnelConfig;
use tunnel_engine::loader::QueuedLoader;
use tunnel_engine::rng::Xorshift32;
use tunnel_engine::theme::Theme;
use tunnel_engine::tunnel::{FrameOutcome, Tunnel};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();

    let mut frames = 120u32;
    let mut scroll = 0.0f32;
    let mut width = 1280u32;
    let mut height = 720u32;
    let mut dark = false;
    let mut out = String::from("tunnel.png");
    let mut config_path: Option<String> = None;
    let mut images: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => { frames = args.get(i+1).and_then(|s| s.parse().ok()).unwrap_or(120); i += 2; }
            "--scroll" => { scroll = args.get(i+1).and_then(|s| s.parse().ok()).unwrap_or(0.0); i += 2; }
            "--width" => { width = args.get(i+1).and_then(|s| s.parse().ok()).unwrap_or(1280); i += 2; }
            "--height" => { height = args.get(i+1).and_then(|s| s.parse().ok()).unwrap_or(720); i += 2; }
            "--out" => { if let Some(p) = args.get(i+1) { out = p.clone(); } i += 2; }
            "--config" => { config_path = args.get(i+1).cloned(); i += 2; }
            "--dark" => { dark = true; i += 1; }
            "--images" => {
                i += 1;
                while i < args.len() && !args[i].starts_with("--") {
                    images.push(args[i].clone());
                    i += 1;
                }
            }
            other => { eprintln!("ignoring unknown argument {other}"); i += 1; }
        }
    }

    let mut config = match config_path {
        Some(path) => {
            let json = match std::fs::read_to_string(&path) {
                Ok(j) => j,
                Err(e) => { eprintln!("cannot read {path}: {e}"); std::process::exit(1); }
            };
            match TunnelConfig::from_json(&json) {
                Ok(c) => c,
                Err(e) => { eprintln!("{path}: {e}"); std::process::exit(1); }
            }
        }
        None => TunnelConfig::default(),
    };
    if !images.is_empty() {
        config.catalog = images;
    }

    let seed = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.subsec_nanos()).unwrap_or(1);
    let mut tunnel = match Tunnel::new(
        config,
        Viewport::new(width, height),
        Theme::from_dark_flag(dark),
        QueuedLoader::new(),
        Box::new(Xorshift32::new(seed)),
    ) {
        Ok(t) => t,
        Err(e) => { eprintln!("invalid config: {e}"); std::process::exit(1); }
    };

    println!("Rendering {} frames at scroll {} ({}x{})...", frames, scroll, width, height);

    let mut surface = raster::ImageSurface::new(width, height);
    let mut files = files::FileImages::default();
    tunnel.set_scroll(scroll);

    let (mut loaded, mut failed, mut recycled) = (0, 0, 0);
    for f in 0..frames {
        let now = f as f64 * FRAME_MS;
        let (l, e) = files.resolve(&mut tunnel, &mut surface, now);
        loaded += l;
        failed += e;
        if let FrameOutcome::Drawn { recycled: r, .. } = tunnel.tick(now, Some(&mut surface)) {
            recycled += r.forward + r.backward;
        }
    }

    println!("  Camera depth: {:.2} (target {:.2})", tunnel.camera_depth(), tunnel.camera_target());
    println!("  Segments recycled: {}", recycled);
    println!("  Images loaded: {} (failed {}), textures bound: {}", loaded, failed, surface.bound());

    if let Err(e) = surface.image().save(&out) {
        eprintln!("cannot write {out}: {e}");
        std::process::exit(1);
    }
    tunnel.teardown();

    println!("Wrote {}", out);
}
