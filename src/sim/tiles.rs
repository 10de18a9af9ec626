//! Tile collision store
//!
//! A level is a grid of [`TileRef`]s, either stored flat or grouped into
//! 8×8 chunks. Each tile points at a block; the block's collision profile
//! comes from one of two index tables (primary / secondary path) so a
//! level can switch collision paths at runtime.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which collision-index table a player reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionPath {
    #[default]
    Primary,
    Secondary,
}

/// Which face of a tile a cast tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    /// Landing surface, tested by downward floor casts
    Top,
    /// Left, right and bottom, tested by wall and ceiling casts
    Sides,
}

/// One of the four selectable solidity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer {
    pub path: CollisionPath,
    pub face: Face,
}

impl CollisionLayer {
    pub const fn new(path: CollisionPath, face: Face) -> Self {
        Self { path, face }
    }
}

/// Solidity of a tile on one collision path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solidity {
    #[serde(default)]
    pub top: bool,
    #[serde(default)]
    pub sides: bool,
}

impl Solidity {
    pub const NONE: Solidity = Solidity { top: false, sides: false };
    pub const TOP_ONLY: Solidity = Solidity { top: true, sides: false };
    pub const ALL: Solidity = Solidity { top: true, sides: true };

    fn from_bits(bits: u16) -> Self {
        Self {
            top: bits & 1 != 0,
            sides: bits & 2 != 0,
        }
    }
}

/// A single cell of the level layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    /// Block index into the collision-index tables
    pub block: u16,
    #[serde(default)]
    pub x_flip: bool,
    #[serde(default)]
    pub y_flip: bool,
    #[serde(default)]
    pub primary: Solidity,
    #[serde(default)]
    pub secondary: Solidity,
}

impl TileRef {
    pub const EMPTY: TileRef = TileRef {
        block: 0,
        x_flip: false,
        y_flip: false,
        primary: Solidity::NONE,
        secondary: Solidity::NONE,
    };

    /// Solid block on both paths
    pub const fn solid(block: u16) -> Self {
        Self {
            block,
            x_flip: false,
            y_flip: false,
            primary: Solidity::ALL,
            secondary: Solidity::ALL,
        }
    }

    /// Decode a packed chunk-mapping word (`SSTT YXII IIII IIII`)
    pub fn from_word(word: u16) -> Self {
        Self {
            block: word & 0x03FF,
            x_flip: word & 0x0400 != 0,
            y_flip: word & 0x0800 != 0,
            primary: Solidity::from_bits((word >> 12) & 3),
            secondary: Solidity::from_bits((word >> 14) & 3),
        }
    }

    pub fn with_flip(mut self, x_flip: bool, y_flip: bool) -> Self {
        self.x_flip = x_flip;
        self.y_flip = y_flip;
        self
    }

    /// Does this tile take part in `layer`?
    pub fn is_solid(&self, layer: CollisionLayer) -> bool {
        let s = match layer.path {
            CollisionPath::Primary => self.primary,
            CollisionPath::Secondary => self.secondary,
        };
        match layer.face {
            Face::Top => s.top,
            Face::Sides => s.sides,
        }
    }
}

/// Height map and surface angle for one block shape
///
/// `heights[col]` is the number of solid pixels in a column, measured up
/// from the bottom edge when positive or down from the top edge when
/// negative. `rotated[row]` is the same for rows, measured from the right
/// edge when positive and from the left edge when negative. A magnitude of
/// 0x10 means the whole column or row is solid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionProfile {
    pub heights: [i8; 16],
    pub rotated: [i8; 16],
    /// Surface angle; odd values mean "snap to the nearest cardinal"
    pub angle: u8,
}

/// Angle value that tells the ground follower to snap to a cardinal
pub const SNAP_ANGLE: u8 = 0xFF;

impl CollisionProfile {
    /// Build a profile from column heights, deriving the row widths
    pub fn from_heights(heights: [i8; 16], angle: u8) -> Self {
        let mut rotated = [0i8; 16];
        for (row, width) in rotated.iter_mut().enumerate() {
            let solid = |col: usize| column_covers(heights[col], row);
            let count = (0..16).filter(|&c| solid(c)).count() as i8;
            *width = if count == 0 || count == 16 {
                count
            } else if solid(15) {
                count
            } else if solid(0) {
                -count
            } else {
                // Interior islands can't be expressed; treat the row as open
                0
            };
        }
        Self {
            heights,
            rotated,
            angle,
        }
    }

    /// Flat floor `height` pixels tall
    pub fn flat(height: i8) -> Self {
        Self::from_heights([height; 16], 0)
    }

    /// Completely solid block; its angle snaps to cardinal
    pub fn full() -> Self {
        Self::from_heights([FULL_HEIGHT; 16], SNAP_ANGLE)
    }

    /// 45° slope rising to the right
    pub fn slope_up_right() -> Self {
        let mut heights = [0i8; 16];
        for (i, h) in heights.iter_mut().enumerate() {
            *h = i as i8 + 1;
        }
        Self::from_heights(heights, 0xE0)
    }
}

fn column_covers(height: i8, row: usize) -> bool {
    let row = row as i32;
    let h = height as i32;
    if h > 0 {
        row >= TILE_SIZE - h
    } else if h < 0 {
        row < -h
    } else {
        false
    }
}

/// Profiles plus the two block → profile index tables
///
/// Profile index 0 is reserved for "no collision".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionStore {
    pub profiles: Vec<CollisionProfile>,
    pub primary_index: Vec<u16>,
    pub secondary_index: Vec<u16>,
}

impl CollisionStore {
    /// Profile of `tile` on `path`, `None` when the block has no collision
    pub fn profile(&self, tile: &TileRef, path: CollisionPath) -> Option<&CollisionProfile> {
        let table = match path {
            CollisionPath::Primary => &self.primary_index,
            CollisionPath::Secondary => &self.secondary_index,
        };
        let idx = *table.get(tile.block as usize)?;
        if idx == 0 {
            return None;
        }
        self.profiles.get(idx as usize)
    }

    pub fn block_count(&self) -> usize {
        self.primary_index.len()
    }
}

/// 8×8 group of tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub tiles: Vec<TileRef>,
}

impl Chunk {
    pub fn empty() -> Self {
        Self {
            tiles: vec![TileRef::EMPTY; CHUNK_TILES * CHUNK_TILES],
        }
    }

    pub fn filled(tile: TileRef) -> Self {
        Self {
            tiles: vec![tile; CHUNK_TILES * CHUNK_TILES],
        }
    }

    pub fn get(&self, tx: usize, ty: usize) -> TileRef {
        self.tiles
            .get(ty * CHUNK_TILES + tx)
            .copied()
            .unwrap_or(TileRef::EMPTY)
    }

    pub fn set(&mut self, tx: usize, ty: usize, tile: TileRef) {
        if let Some(slot) = self.tiles.get_mut(ty * CHUNK_TILES + tx) {
            *slot = tile;
        }
    }
}

/// Level grid, chunked or flat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    Chunked {
        width: usize,
        height: usize,
        chunks: Vec<Chunk>,
        cells: Vec<u16>,
    },
    Flat {
        width: usize,
        height: usize,
        tiles: Vec<TileRef>,
    },
}

/// Layout plus addressing rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMap {
    pub layout: Layout,
    #[serde(default)]
    pub wrap_vertical: bool,
}

impl TileMap {
    /// Empty flat map of `width` × `height` tiles
    pub fn flat(width: usize, height: usize) -> Self {
        Self {
            layout: Layout::Flat {
                width,
                height,
                tiles: vec![TileRef::EMPTY; width * height],
            },
            wrap_vertical: false,
        }
    }

    /// Map dimensions in pixels
    pub fn pixel_size(&self) -> (i32, i32) {
        match &self.layout {
            Layout::Chunked { width, height, .. } => {
                (*width as i32 * CHUNK_SIZE, *height as i32 * CHUNK_SIZE)
            }
            Layout::Flat { width, height, .. } => {
                (*width as i32 * TILE_SIZE, *height as i32 * TILE_SIZE)
            }
        }
    }

    /// Tile under a pixel; anything outside the layout is empty
    pub fn tile_at(&self, x: i32, y: i32) -> TileRef {
        let (w, h) = self.pixel_size();
        if x < 0 || x >= w || h == 0 {
            return TileRef::EMPTY;
        }
        let y = if self.wrap_vertical {
            y.rem_euclid(h)
        } else if y < 0 || y >= h {
            return TileRef::EMPTY;
        } else {
            y
        };
        let (x, y) = (x as usize, y as usize);

        match &self.layout {
            Layout::Chunked {
                width,
                chunks,
                cells,
                ..
            } => {
                let size = CHUNK_SIZE as usize;
                let Some(&chunk) = cells.get((y / size) * width + x / size) else {
                    return TileRef::EMPTY;
                };
                let Some(chunk) = chunks.get(chunk as usize) else {
                    return TileRef::EMPTY;
                };
                let tile = TILE_SIZE as usize;
                chunk.get((x % size) / tile, (y % size) / tile)
            }
            Layout::Flat { width, tiles, .. } => {
                let tile = TILE_SIZE as usize;
                tiles
                    .get((y / tile) * width + x / tile)
                    .copied()
                    .unwrap_or(TileRef::EMPTY)
            }
        }
    }

    /// Overwrite a tile of a flat layout by tile coordinate
    pub fn set_tile(&mut self, tx: usize, ty: usize, tile: TileRef) {
        if let Layout::Flat { width, height, tiles } = &mut self.layout {
            if tx < *width && ty < *height {
                tiles[ty * *width + tx] = tile;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY_TOP: CollisionLayer = CollisionLayer::new(CollisionPath::Primary, Face::Top);

    #[test]
    fn test_decode_mapping_word() {
        let t = TileRef::from_word(0b0110_1100_0000_0101);
        assert_eq!(t.block, 5);
        assert!(t.x_flip);
        assert!(t.y_flip);
        assert_eq!(t.primary, Solidity { top: false, sides: true });
        assert_eq!(t.secondary, Solidity { top: true, sides: false });
        assert!(!t.is_solid(PRIMARY_TOP));
        assert!(t.is_solid(CollisionLayer::new(CollisionPath::Secondary, Face::Top)));
    }

    #[test]
    fn test_flat_rotated_widths() {
        let p = CollisionProfile::flat(4);
        assert_eq!(p.rotated[11], 0);
        assert_eq!(p.rotated[12], 16);
        assert_eq!(p.rotated[15], 16);
    }

    #[test]
    fn test_slope_rotated_widths() {
        let p = CollisionProfile::slope_up_right();
        assert_eq!(p.rotated[0], 1);
        assert_eq!(p.rotated[7], 8);
        assert_eq!(p.rotated[15], 16);

        let mut heights = [0i8; 16];
        for (i, h) in heights.iter_mut().enumerate() {
            *h = 16 - i as i8;
        }
        let down = CollisionProfile::from_heights(heights, 0x20);
        assert_eq!(down.rotated[0], -1);
        assert_eq!(down.rotated[7], -8);
    }

    #[test]
    fn test_profile_zero_is_none() {
        let store = CollisionStore {
            profiles: vec![CollisionProfile::flat(0), CollisionProfile::full()],
            primary_index: vec![0, 1],
            secondary_index: vec![0, 0],
        };
        assert!(store.profile(&TileRef::solid(0), CollisionPath::Primary).is_none());
        assert!(store.profile(&TileRef::solid(1), CollisionPath::Primary).is_some());
        assert!(store.profile(&TileRef::solid(1), CollisionPath::Secondary).is_none());
        assert!(store.profile(&TileRef::solid(9), CollisionPath::Primary).is_none());
    }

    #[test]
    fn test_chunked_lookup() {
        let mut chunk = Chunk::empty();
        chunk.set(2, 3, TileRef::solid(7));
        let map = TileMap {
            layout: Layout::Chunked {
                width: 2,
                height: 1,
                chunks: vec![Chunk::empty(), chunk],
                cells: vec![0, 1],
            },
            wrap_vertical: false,
        };
        assert_eq!(map.tile_at(128 + 2 * 16 + 5, 3 * 16 + 1).block, 7);
        assert_eq!(map.tile_at(2 * 16 + 5, 3 * 16 + 1), TileRef::EMPTY);
        assert_eq!(map.tile_at(-1, 0), TileRef::EMPTY);
        assert_eq!(map.tile_at(0, 128), TileRef::EMPTY);
    }

    #[test]
    fn test_vertical_wrap() {
        let mut map = TileMap::flat(2, 4);
        map.set_tile(1, 0, TileRef::solid(3));
        assert_eq!(map.tile_at(20, 64), TileRef::EMPTY);
        map.wrap_vertical = true;
        assert_eq!(map.tile_at(20, 64).block, 3);
        assert_eq!(map.tile_at(20, -64).block, 3);
    }
}
