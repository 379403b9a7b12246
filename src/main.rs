use bevy::log::LogPlugin;
use bevy::prelude::*;

use koalio::config::PhysicsConfig;
use koalio::input::InputPlugin;
use koalio::physics::{PhysicsPlugin, TerminalEvent};
use koalio::player::PlayerPlugin;
use koalio::simulation::{run_request, SimulationRequest};
use koalio::tilemap::Tilemap;

fn load_physics_config() -> PhysicsConfig {
    let path = std::env::var("KOALIO_PHYSICS_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "physics.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match PhysicsConfig::from_json_str(&contents) {
            Ok(cfg) => {
                println!("[Koalio] Loaded physics config from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Koalio] Failed to parse {}: {}", path, e);
                PhysicsConfig::default()
            }
        },
        Err(_) => PhysicsConfig::default(),
    }
}

fn load_level() -> Tilemap {
    let Some(path) = std::env::var("KOALIO_LEVEL").ok().filter(|s| !s.is_empty()) else {
        return Tilemap::test_level();
    };
    match std::fs::read_to_string(&path).map_err(|e| e.to_string()).and_then(|s| Tilemap::from_json_str(&s)) {
        Ok(level) => {
            println!("[Koalio] Loaded level {} ({}x{})", path, level.width, level.height);
            level
        }
        Err(e) => {
            eprintln!("[Koalio] Failed to load level {}: {}", path, e);
            Tilemap::test_level()
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn simulate(path: &str, level: &Tilemap, physics: &PhysicsConfig) -> Result<String, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    let request = SimulationRequest::from_json_str(&contents)?;
    let result = run_request(&request, level, physics);
    serde_json::to_string_pretty(&result).map_err(|e| e.to_string())
}

#[derive(Resource)]
struct FrameLimit(Option<u32>);

fn exit_on_terminal(mut events: EventReader<TerminalEvent>, mut exit: EventWriter<AppExit>) {
    if let Some(event) = events.read().next() {
        println!("[Koalio] Game over: {}", event.reason.label());
        exit.send(AppExit::Success);
    }
}

fn exit_after_frame_limit(limit: Res<FrameLimit>, mut frames: Local<u32>, mut exit: EventWriter<AppExit>) {
    let Some(max) = limit.0 else {
        return;
    };
    *frames += 1;
    if *frames >= max {
        println!("[Koalio] Frame limit reached ({})", max);
        exit.send(AppExit::Success);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let physics = load_physics_config();
    let level = load_level();

    if let Some(path) = arg_value(&args, "--simulate") {
        match simulate(path, &level, &physics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("[Koalio] Simulation failed: {e}");
                std::process::exit(2);
            }
        }
        return;
    }

    let frame_limit = match arg_value(&args, "--frames").map(str::parse::<u32>) {
        Some(Ok(n)) => Some(n),
        Some(Err(e)) => {
            eprintln!("[Koalio] Invalid --frames value: {e}");
            std::process::exit(2);
        }
        None => None,
    };

    println!("[Koalio] Starting headless run");
    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(physics)
        .insert_resource(level)
        .insert_resource(FrameLimit(frame_limit))
        .add_plugins(InputPlugin)
        .add_plugins(PlayerPlugin)
        .add_plugins(PhysicsPlugin)
        .add_systems(FixedUpdate, (exit_on_terminal, exit_after_frame_limit))
        .run();
}
