//! Tilerun headless runner
//!
//! Loads a level, drives the simulation for a fixed number of ticks and
//! logs what happened.
//!
//! Usage: `tilerun [LEVEL.json] [--ticks N] [--soak SEED] [--follower]`

use std::path::Path;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tilerun::audio::LogSink;
use tilerun::input::{Buttons, ControllerInput};
use tilerun::settings::Settings;
use tilerun::sim::{
    CollisionProfile, CollisionStore, GameEvent, Level, MovingPlatform, ObjectId, PlatformList,
    Routine, TickInput, TileMap, TileRef, World, tick,
};

const SETTINGS_PATH: &str = "tilerun.json";
const DEFAULT_TICKS: u32 = 600;

struct Args {
    level: Option<String>,
    ticks: u32,
    soak: Option<u64>,
    follower: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        level: None,
        ticks: DEFAULT_TICKS,
        soak: None,
        follower: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--ticks" => match it.next().and_then(|v| v.parse().ok()) {
                Some(n) => args.ticks = n,
                None => log::warn!("--ticks needs a number, keeping {}", args.ticks),
            },
            "--soak" => args.soak = Some(it.next().and_then(|v| v.parse().ok()).unwrap_or(0)),
            "--follower" => args.follower = true,
            _ => args.level = Some(arg),
        }
    }
    args
}

/// Rolling floor with a ramp, a pit and a platform over it
fn demo_level() -> Level {
    const FLOOR: u16 = 1;
    const RAMP: u16 = 2;
    let store = CollisionStore {
        profiles: vec![
            CollisionProfile::flat(0),
            CollisionProfile::flat(16),
            CollisionProfile::slope_up_right(),
        ],
        primary_index: vec![0, 1, 2],
        secondary_index: vec![0, 1, 2],
    };
    let (width, height) = (96, 24);
    let mut map = TileMap::flat(width, height);
    for tx in 0..width {
        // Pit under the platform
        if (40..44).contains(&tx) {
            continue;
        }
        for ty in 18..height {
            map.set_tile(tx, ty, TileRef::solid(FLOOR));
        }
    }
    for k in 0..4 {
        let tx = 20 + k;
        let top = 17 - k;
        map.set_tile(tx, top, TileRef::solid(RAMP));
        for ty in top + 1..18 {
            map.set_tile(tx, ty, TileRef::solid(FLOOR));
        }
    }
    for ty in 14..18 {
        map.set_tile(24, ty, TileRef::solid(FLOOR));
    }

    let mut level = Level::new(map, store);
    level.spawn = IVec2::new(64, 18 * 16 - 19);
    level.water_level = Some(20 * 16);
    level
}

fn load_level(path: Option<&str>) -> Level {
    let Some(path) = path else {
        log::info!("No level given, using the demo level");
        return demo_level();
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Level::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(level) => level,
        Err(e) => {
            log::error!("Failed to load {}: {}, using the demo level", path, e);
            demo_level()
        }
    }
}

/// Run right, jumping for a moment every second and a half
fn scripted(frame: u32) -> Buttons {
    let held = Buttons::NONE.with_right();
    if frame % 90 < 12 { held.with_jump() } else { held }
}

fn random(rng: &mut Pcg32, prev: Buttons) -> Buttons {
    // Sticky buttons so held inputs last a while
    let mut flip = |b: bool, p: f64| if rng.random_bool(p) { !b } else { b };
    Buttons {
        left: flip(prev.left, 0.03),
        right: flip(prev.right, 0.05),
        down: flip(prev.down, 0.02),
        a: flip(prev.a, 0.1),
        ..Buttons::NONE
    }
}

fn main() {
    env_logger::init();
    log::info!("Tilerun (headless) starting...");

    let args = parse_args();
    let settings = Settings::load(Path::new(SETTINGS_PATH));
    let level = load_level(args.level.as_deref());
    let spawn = level.spawn;

    let mut world = World::new(level, &settings);
    if args.follower {
        world.add_follower();
    }
    let mut objects = PlatformList::default();
    objects.push(
        ObjectId(1),
        MovingPlatform::new(spawn + IVec2::new(600, -8), IVec2::new(48, 0), 240, 24),
    );

    let mut rng = args.soak.map(Pcg32::seed_from_u64);
    let mut held = Buttons::NONE;
    let mut sink = LogSink::default();
    let mut last_routine = world.players[0].routine;
    let (mut deaths, mut restarts) = (0u32, 0u32);

    for _ in 0..args.ticks {
        held = match rng.as_mut() {
            Some(rng) => random(rng, held),
            None => scripted(world.frame),
        };
        let input = TickInput {
            controllers: vec![ControllerInput {
                held,
                ..Default::default()
            }],
        };

        objects.step(world.frame);
        tick(&mut world, &input, &mut objects);
        world.sounds.flush(&mut sink);

        for event in world.drain_events() {
            match event {
                GameEvent::Died { .. } => deaths += 1,
                GameEvent::LevelRestart => restarts += 1,
                _ => {}
            }
            log::info!("frame {}: {:?}", world.frame, event);
        }

        let routine = world.players[0].routine;
        if std::mem::discriminant(&routine) != std::mem::discriminant(&last_routine) {
            log::info!("frame {}: {:?} -> {:?}", world.frame, last_routine, routine);
        }
        last_routine = routine;
        if matches!(routine, Routine::ResetLevel { .. }) && world.players[0].lives == 0 {
            log::info!("Out of lives at frame {}", world.frame);
            break;
        }
    }

    let p = &world.players[0];
    println!(
        "{} ticks: x={} y={} inertia={:#x} angle={:#04x} in_air={} deaths={} restarts={} sounds={}",
        world.frame,
        p.x.pixel(),
        p.world_y(),
        p.inertia,
        p.angle,
        p.status.in_air,
        deaths,
        restarts,
        sink.played,
    );
}
