//! Headless driver: builds a small scene, plays it for a few frames and
//! stops again.
//!
//! Usage: `shapeplay [SCRIPT...]`. The n-th script file is attached to the
//! n-th demo object; without arguments a built-in demo script is used.

use kurbo::{Point, Shape as _};
use shapeplay_core::{DisplayList, LogConsole, RuntimeConfig, SceneRuntime, ShapeKind};
use std::process::ExitCode;
use std::time::Instant;

/// Frames to run before leaving play mode.
const FRAMES: u32 = 120;

const DEMO_SCRIPT: &str = r##"
print(`${self.kind} starts at ${self.position}`);
self.color = "#ff8000";
fn on_tick(dt) {
    this.position[0] += dt * 60.0;
}
"##;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Shapeplay");

    let config = RuntimeConfig::new().with_tick_hook(true);
    let interval = config.tick_interval();
    let mut runtime = SceneRuntime::new(config, LogConsole);

    let demo = [
        (ShapeKind::Square, Point::new(100.0, 100.0)),
        (ShapeKind::Circle, Point::new(200.0, 100.0)),
        (ShapeKind::Text, Point::new(100.0, 200.0)),
    ];
    let ids: Vec<_> = demo
        .iter()
        .filter_map(|&(kind, at)| runtime.add_object(kind, at))
        .collect();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    for (index, &id) in ids.iter().enumerate() {
        let script = match paths.get(index) {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) => {
                    log::error!("Failed to read script {}: {}", path, err);
                    return ExitCode::FAILURE;
                }
            },
            None if paths.is_empty() => DEMO_SCRIPT.to_string(),
            None => continue,
        };
        if let Some(obj) = runtime.object_mut(id) {
            obj.script = script;
        }
    }

    if let Err(err) = runtime.enter_play() {
        log::error!("{}", err);
        return ExitCode::FAILURE;
    }

    let mut display = DisplayList::new();
    let mut last = Instant::now();
    for _ in 0..FRAMES {
        std::thread::sleep(interval);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;
        if let Err(err) = runtime.tick(dt, &mut display) {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
        if !runtime.is_playing() {
            break;
        }
    }

    for obj in runtime.objects() {
        log::info!("{} {} ends at {:?}", obj.shape.kind, obj.id(), obj.shape.position);
    }
    for cmd in display.commands() {
        log::info!("Last frame drew {} {:?} in {:?}", cmd.kind, cmd.path.bounding_box(), cmd.paint());
    }

    if let Err(err) = runtime.exit_play() {
        log::error!("{}", err);
        return ExitCode::FAILURE;
    }
    log::info!("Ran {} frames", display.frames());
    ExitCode::SUCCESS
}
