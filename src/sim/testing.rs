//! Small hand-built levels and a context harness for unit tests

use super::boundary::PlatformList;
use super::level::Level;
use super::state::{GameEvent, Player};
use super::tick::SimContext;
use super::tiles::{CollisionProfile, CollisionStore, TileMap, TileRef};
use crate::audio::SoundQueue;
use crate::settings::PhysicsTuning;

pub const WIDTH_TILES: usize = 32;
pub const HEIGHT_TILES: usize = 16;

pub const FLOOR: u16 = 1;
pub const SLOPE: u16 = 2;
/// Solid from the top edge, 8 px deep
pub const LIP: u16 = 3;

/// Everything a [`SimContext`] borrows, owned in one place
pub struct Harness {
    pub level: Level,
    pub players: Vec<Player>,
    pub tuning: PhysicsTuning,
    pub sounds: SoundQueue,
    pub events: Vec<GameEvent>,
    pub objects: PlatformList,
    pub frame: u32,
}

impl Harness {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            players: vec![Player::new(64, 40)],
            tuning: PhysicsTuning::default(),
            sounds: SoundQueue::new(),
            events: Vec::new(),
            objects: PlatformList::default(),
            frame: 0,
        }
    }

    /// Run `f` against one player with a context built from the harness
    pub fn with_cx<F>(&mut self, slot: usize, f: F)
    where
        F: FnOnce(&mut Player, &mut SimContext<'_>),
    {
        let player = &mut self.players[slot];
        let mut cx = SimContext {
            level: self.level.view(player.status.reverse_gravity),
            tuning: &self.tuning,
            sounds: &mut self.sounds,
            events: &mut self.events,
            objects: &mut self.objects,
            slot,
            frame: self.frame,
            debug_enabled: true,
        };
        f(player, &mut cx);
    }
}

fn empty_level() -> Level {
    let store = CollisionStore {
        profiles: vec![
            CollisionProfile::flat(0),
            CollisionProfile::flat(16),
            CollisionProfile::slope_up_right(),
            CollisionProfile::flat(-8),
        ],
        primary_index: vec![0, 1, 2, 3],
        secondary_index: vec![0, 1, 2, 3],
    };
    Level::new(TileMap::flat(WIDTH_TILES, HEIGHT_TILES), store)
}

fn fill_rows(level: &mut Level, rows: std::ops::Range<usize>, block: u16) {
    for ty in rows {
        for tx in 0..WIDTH_TILES {
            level.map.set_tile(tx, ty, TileRef::solid(block));
        }
    }
}

/// Solid ground with its surface at `top` (a multiple of 16)
pub fn floor_level(top: i32) -> Level {
    let mut level = empty_level();
    fill_rows(&mut level, (top / 16) as usize..HEIGHT_TILES, FLOOR);
    level
}

/// Solid block carrying a surface angle of its own, for landing tests
fn angled_block(level: &mut Level, angle: u8) -> u16 {
    let index = level.store.profiles.len() as u16;
    level.store.profiles.push(CollisionProfile::from_heights([16; 16], angle));
    level.store.primary_index.push(index);
    level.store.secondary_index.push(index);
    (level.store.primary_index.len() - 1) as u16
}

/// Solid ground from `top` down whose surface reports `angle`
pub fn angled_floor_level(top: i32, angle: u8) -> Level {
    let mut level = empty_level();
    let block = angled_block(&mut level, angle);
    fill_rows(&mut level, (top / 16) as usize..HEIGHT_TILES, block);
    level
}

/// Vertically flipped ceiling above `underside` whose profile reports `angle`
pub fn angled_ceiling_level(underside: i32, angle: u8) -> Level {
    let mut level = floor_level(208);
    let block = angled_block(&mut level, angle);
    for ty in 0..(underside / 16) as usize {
        for tx in 0..WIDTH_TILES {
            level.map.set_tile(tx, ty, TileRef::solid(block).with_flip(false, true));
        }
    }
    level
}

/// Floor at y = 160 with a four-tile 45° ramp rising right from x = 128
pub fn slope_level() -> Level {
    let mut level = floor_level(160);
    for k in 0..4 {
        let tx = 8 + k;
        let top_row = 9 - k;
        level.map.set_tile(tx, top_row, TileRef::solid(SLOPE));
        for ty in top_row + 1..10 {
            level.map.set_tile(tx, ty, TileRef::solid(FLOOR));
        }
    }
    level
}

/// Solid wall filling every column from `x` (a multiple of 16) rightwards
pub fn wall_level(x: i32) -> Level {
    let mut level = empty_level();
    for ty in 0..HEIGHT_TILES {
        for tx in (x / 16) as usize..WIDTH_TILES {
            level.map.set_tile(tx, ty, TileRef::solid(FLOOR));
        }
    }
    level
}

/// Floor at `floor` plus a ceiling whose underside is at `ceiling`
///
/// `ceiling` must be a multiple of 8; a half row becomes a lip tile.
pub fn tunnel_level(floor: i32, ceiling: i32) -> Level {
    let mut level = floor_level(floor);
    let full_rows = (ceiling / 16) as usize;
    fill_rows(&mut level, 0..full_rows, FLOOR);
    if ceiling % 16 != 0 {
        fill_rows(&mut level, full_rows..full_rows + 1, LIP);
    }
    level
}
