//! Level collision data and runtime boundaries
//!
//! A [`Level`] owns the tile map, the collision store and the mutable
//! camera boundaries. It is built once from [`LevelData`] (validated) or
//! directly from in-memory parts, then only read by the simulation.

use std::cell::RefCell;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sensor::{SensorTrace, Terrain};
use super::tiles::{CollisionLayer, CollisionProfile, CollisionStore, Layout, TileMap, TileRef};
use crate::consts::*;

/// Errors that keep a level from loading
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("collision index tables differ in length (primary {primary}, secondary {secondary})")]
    IndexTableMismatch { primary: usize, secondary: usize },

    #[error("block {block} maps to profile {index}, but only {profiles} profiles exist")]
    ProfileOutOfRange {
        block: usize,
        index: u16,
        profiles: usize,
    },

    #[error("layout cell {cell} references chunk {chunk}, but only {chunks} chunks exist")]
    ChunkOutOfRange {
        cell: usize,
        chunk: u16,
        chunks: usize,
    },

    #[error("chunk {chunk} has {len} tiles, expected {expected}")]
    ChunkSize {
        chunk: usize,
        len: usize,
        expected: usize,
    },

    #[error("tile references block {block}, but only {blocks} blocks exist")]
    BlockOutOfRange { block: u16, blocks: usize },

    #[error("layout has {actual} cells, expected {expected}")]
    LayoutSize { expected: usize, actual: usize },

    #[error("malformed level document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Camera-driven level boundaries in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Same boundaries seen from the reverse-gravity frame
    pub fn mirrored(self) -> Self {
        Self {
            left: self.left,
            right: self.right,
            top: !self.bottom,
            bottom: !self.top,
        }
    }
}

/// Serialized collision profile; `rotated` is derived when omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileData {
    pub heights: [i8; 16],
    #[serde(default)]
    pub rotated: Option<[i8; 16]>,
    #[serde(default)]
    pub angle: u8,
}

/// Level document handed over by the asset loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    pub profiles: Vec<ProfileData>,
    pub primary_index: Vec<u16>,
    pub secondary_index: Vec<u16>,
    pub map: TileMap,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub water_level: Option<i32>,
    pub spawn: IVec2,
}

/// A loaded level
#[derive(Debug)]
pub struct Level {
    pub map: TileMap,
    pub store: CollisionStore,
    /// Mutable at runtime for camera-locked arenas
    pub bounds: Bounds,
    /// World y of the water surface
    pub water_level: Option<i32>,
    pub spawn: IVec2,
    trace: RefCell<SensorTrace>,
}

impl Level {
    /// Build a level from in-memory parts, bounds covering the whole map
    pub fn new(map: TileMap, store: CollisionStore) -> Self {
        let (w, h) = map.pixel_size();
        Self {
            map,
            store,
            bounds: Bounds {
                left: 0,
                right: w,
                top: 0,
                bottom: h,
            },
            water_level: None,
            spawn: IVec2::ZERO,
            trace: RefCell::new(SensorTrace::default()),
        }
    }

    /// Validate and build a level
    pub fn from_data(data: LevelData) -> Result<Self, LevelError> {
        let profiles: Vec<CollisionProfile> = data
            .profiles
            .into_iter()
            .map(|p| match p.rotated {
                Some(rotated) => CollisionProfile {
                    heights: p.heights,
                    rotated,
                    angle: p.angle,
                },
                None => CollisionProfile::from_heights(p.heights, p.angle),
            })
            .collect();
        let store = CollisionStore {
            profiles,
            primary_index: data.primary_index,
            secondary_index: data.secondary_index,
        };
        validate(&store, &data.map)?;

        let mut level = Level::new(data.map, store);
        if let Some(bounds) = data.bounds {
            level.bounds = bounds;
        }
        level.water_level = data.water_level;
        level.spawn = data.spawn;

        let (w, h) = level.map.pixel_size();
        log::info!(
            "Level loaded: {}x{} px, {} blocks, {} profiles, water {:?}",
            w,
            h,
            level.store.block_count(),
            level.store.profiles.len(),
            level.water_level
        );
        Ok(level)
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let data: LevelData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// View of the level in the player's gravity frame
    pub fn view(&self, reverse_gravity: bool) -> LevelView<'_> {
        LevelView {
            level: self,
            mirrored: reverse_gravity,
        }
    }

    /// Start or stop recording sensor probe points
    pub fn set_tracing(&self, enabled: bool) {
        let mut trace = self.trace.borrow_mut();
        trace.enabled = enabled;
        trace.clear();
    }

    /// Drain recorded probe points
    pub fn take_trace(&self) -> Vec<IVec2> {
        std::mem::take(&mut self.trace.borrow_mut().points)
    }
}

impl Terrain for Level {
    fn tile_at(&self, x: i32, y: i32) -> TileRef {
        self.map.tile_at(x, y)
    }

    fn profile(&self, tile: &TileRef, layer: CollisionLayer) -> Option<&CollisionProfile> {
        self.store.profile(tile, layer.path)
    }

    fn trace(&self, point: IVec2) {
        if let Ok(mut trace) = self.trace.try_borrow_mut() {
            trace.record(point);
        }
    }
}

/// Level as seen from one gravity frame
///
/// The reverse-gravity frame uses `y_local = !y_world`: every tile is read
/// from the mirrored row with its vertical flip toggled, so floor casts in
/// the local frame are ceiling casts in the world.
#[derive(Debug, Clone, Copy)]
pub struct LevelView<'a> {
    pub level: &'a Level,
    pub mirrored: bool,
}

impl LevelView<'_> {
    pub fn bounds(&self) -> Bounds {
        if self.mirrored {
            self.level.bounds.mirrored()
        } else {
            self.level.bounds
        }
    }

    /// Convert a local y to world space (the mapping is its own inverse)
    pub fn world_y(&self, y: i32) -> i32 {
        if self.mirrored { !y } else { y }
    }

    /// Wrap a local y into the layout when it wraps vertically
    pub fn wrap_y(&self, y: i32) -> Option<i32> {
        if !self.level.map.wrap_vertical {
            return None;
        }
        let (_, h) = self.level.map.pixel_size();
        if h == 0 {
            return None;
        }
        let world = self.world_y(y);
        let wrapped = world.rem_euclid(h);
        (wrapped != world).then(|| self.world_y(wrapped))
    }
}

impl Terrain for LevelView<'_> {
    fn tile_at(&self, x: i32, y: i32) -> TileRef {
        if self.mirrored {
            let mut tile = self.level.tile_at(x, !y);
            tile.y_flip = !tile.y_flip;
            tile
        } else {
            self.level.tile_at(x, y)
        }
    }

    fn profile(&self, tile: &TileRef, layer: CollisionLayer) -> Option<&CollisionProfile> {
        self.level.profile(tile, layer)
    }

    fn trace(&self, point: IVec2) {
        let world = IVec2::new(point.x, self.world_y(point.y));
        self.level.trace(world);
    }
}

fn validate(store: &CollisionStore, map: &TileMap) -> Result<(), LevelError> {
    if store.primary_index.len() != store.secondary_index.len() {
        return Err(LevelError::IndexTableMismatch {
            primary: store.primary_index.len(),
            secondary: store.secondary_index.len(),
        });
    }
    let profiles = store.profiles.len();
    for (block, &index) in store
        .primary_index
        .iter()
        .chain(store.secondary_index.iter())
        .enumerate()
    {
        if index != 0 && index as usize >= profiles {
            return Err(LevelError::ProfileOutOfRange {
                block: block % store.primary_index.len().max(1),
                index,
                profiles,
            });
        }
    }

    let blocks = store.block_count();
    let check_tile = |tile: &TileRef| {
        if tile.block as usize >= blocks && *tile != TileRef::EMPTY {
            Err(LevelError::BlockOutOfRange {
                block: tile.block,
                blocks,
            })
        } else {
            Ok(())
        }
    };

    match &map.layout {
        Layout::Chunked {
            width,
            height,
            chunks,
            cells,
        } => {
            if cells.len() != width * height {
                return Err(LevelError::LayoutSize {
                    expected: width * height,
                    actual: cells.len(),
                });
            }
            let expected = CHUNK_TILES * CHUNK_TILES;
            for (i, chunk) in chunks.iter().enumerate() {
                if chunk.tiles.len() != expected {
                    return Err(LevelError::ChunkSize {
                        chunk: i,
                        len: chunk.tiles.len(),
                        expected,
                    });
                }
                chunk.tiles.iter().try_for_each(check_tile)?;
            }
            for (cell, &chunk) in cells.iter().enumerate() {
                if chunk as usize >= chunks.len() {
                    return Err(LevelError::ChunkOutOfRange {
                        cell,
                        chunk,
                        chunks: chunks.len(),
                    });
                }
            }
        }
        Layout::Flat {
            width,
            height,
            tiles,
        } => {
            if tiles.len() != width * height {
                return Err(LevelError::LayoutSize {
                    expected: width * height,
                    actual: tiles.len(),
                });
            }
            tiles.iter().try_for_each(check_tile)?;
        }
    }
    Ok(())
}
