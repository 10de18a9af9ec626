//! Floor and wall sensor casting
//!
//! A cast answers "how far is the nearest solid surface from this point,
//! along this axis, on this layer, and what angle does it have?" Distances
//! are signed: negative means the point is already inside the surface.
//!
//! Each cast looks at most one tile beyond the one containing the point.
//! The outer cast ([`cast_floor`], [`cast_wall`]) may step once; the
//! terminal variant never steps.

use glam::IVec2;

use super::tiles::{CollisionLayer, CollisionProfile, TileRef};
use crate::consts::*;

/// Anything sensors can read tiles from
pub trait Terrain {
    /// Tile under a pixel, empty outside the layout
    fn tile_at(&self, x: i32, y: i32) -> TileRef;

    /// Collision profile for a tile on a layer's path
    fn profile(&self, tile: &TileRef, layer: CollisionLayer) -> Option<&CollisionProfile>;

    /// Called for every probed point; no effect on the result
    fn trace(&self, _point: IVec2) {}
}

/// Result of a single cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Signed distance to the first solid pixel
    pub distance: i32,
    /// Surface angle, `None` when no surface tile was found
    pub angle: Option<u8>,
}

impl Probe {
    pub fn hit(&self) -> bool {
        self.distance < 0
    }
}

/// Opt-in record of probed points for diagnostics
#[derive(Debug, Clone, Default)]
pub struct SensorTrace {
    pub enabled: bool,
    pub points: Vec<IVec2>,
}

impl SensorTrace {
    pub fn record(&mut self, point: IVec2) {
        if self.enabled {
            self.points.push(point);
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Cast along y, sampling column heights
    Vertical,
    /// Cast along x, sampling row widths
    Horizontal,
}

struct Cast {
    axis: Axis,
    layer: CollisionLayer,
    flipped: bool,
}

/// A tile column/row sample, height already oriented for the cast
struct Sample {
    height: i32,
    angle: u8,
}

impl Cast {
    /// Offset of the point into its tile, measured along the cast
    fn offset(&self, x: i32, y: i32) -> i32 {
        let along = match self.axis {
            Axis::Vertical => y,
            Axis::Horizontal => x,
        } & 0xF;
        if self.flipped { 15 - along } else { along }
    }

    fn step(&self, x: i32, y: i32, forward: bool) -> (i32, i32) {
        let d = if forward != self.flipped { TILE_SIZE } else { -TILE_SIZE };
        match self.axis {
            Axis::Vertical => (x, y + d),
            Axis::Horizontal => (x + d, y),
        }
    }

    fn sample<T: Terrain + ?Sized>(&self, terrain: &T, x: i32, y: i32) -> Option<Sample> {
        terrain.trace(IVec2::new(x, y));
        let tile = terrain.tile_at(x, y);
        if !tile.is_solid(self.layer) {
            return None;
        }
        let profile = terrain.profile(&tile, self.layer)?;

        let (raw, negate) = match self.axis {
            Axis::Vertical => {
                let col = (x & 0xF) as usize;
                let col = if tile.x_flip { 15 - col } else { col };
                (profile.heights[col], tile.y_flip != self.flipped)
            }
            Axis::Horizontal => {
                let row = (y & 0xF) as usize;
                let row = if tile.y_flip { 15 - row } else { row };
                (profile.rotated[row], tile.x_flip != self.flipped)
            }
        };
        let height = (raw as i32).clamp(-(FULL_HEIGHT as i32), FULL_HEIGHT as i32);

        let mut angle = profile.angle;
        if tile.x_flip {
            angle = angle.wrapping_neg();
        }
        if tile.y_flip {
            angle = 0x80u8.wrapping_sub(angle);
        }

        Some(Sample {
            height: if negate { -height } else { height },
            angle,
        })
    }

    /// Look at the tile under the point, stepping at most once
    fn outer<T: Terrain + ?Sized>(&self, terrain: &T, x: i32, y: i32) -> Probe {
        let off = self.offset(x, y);
        let full = FULL_HEIGHT as i32;

        let sample = self.sample(terrain, x, y);
        let (height, angle) = match &sample {
            Some(s) => (s.height, Some(s.angle)),
            None => (0, None),
        };

        let empty = height == 0 || (height < 0 && off + height >= 0);
        if empty {
            let (nx, ny) = self.step(x, y, true);
            let inner = self.terminal(terrain, nx, ny);
            return Probe {
                distance: inner.distance + full,
                angle: inner.angle.or(angle),
            };
        }

        if height >= full || height < 0 {
            let (px, py) = self.step(x, y, false);
            let inner = self.terminal(terrain, px, py);
            return Probe {
                distance: inner.distance - full,
                angle: inner.angle.or(angle),
            };
        }

        Probe {
            distance: full - (height + off),
            angle,
        }
    }

    /// Resolve against the tile under the point without stepping
    fn terminal<T: Terrain + ?Sized>(&self, terrain: &T, x: i32, y: i32) -> Probe {
        let off = self.offset(x, y);
        let full = FULL_HEIGHT as i32;

        match self.sample(terrain, x, y) {
            Some(s) if s.height > 0 => Probe {
                distance: full - (s.height + off),
                angle: Some(s.angle),
            },
            Some(s) if s.height < 0 && off + s.height < 0 => Probe {
                distance: -off,
                angle: Some(s.angle),
            },
            _ => Probe {
                distance: full - off,
                angle: None,
            },
        }
    }
}

/// Cast down (or up when `flipped`) from a point
pub fn cast_floor<T: Terrain + ?Sized>(
    terrain: &T,
    x: i32,
    y: i32,
    layer: CollisionLayer,
    flipped: bool,
) -> Probe {
    Cast {
        axis: Axis::Vertical,
        layer,
        flipped,
    }
    .outer(terrain, x, y)
}

/// Cast right (or left when `flipped`) from a point
pub fn cast_wall<T: Terrain + ?Sized>(
    terrain: &T,
    x: i32,
    y: i32,
    layer: CollisionLayer,
    flipped: bool,
) -> Probe {
    Cast {
        axis: Axis::Horizontal,
        layer,
        flipped,
    }
    .outer(terrain, x, y)
}

/// Single-tile floor cast with no look-ahead
pub fn cast_floor_terminal<T: Terrain + ?Sized>(
    terrain: &T,
    x: i32,
    y: i32,
    layer: CollisionLayer,
    flipped: bool,
) -> Probe {
    Cast {
        axis: Axis::Vertical,
        layer,
        flipped,
    }
    .terminal(terrain, x, y)
}

/// Single-tile wall cast with no look-ahead
pub fn cast_wall_terminal<T: Terrain + ?Sized>(
    terrain: &T,
    x: i32,
    y: i32,
    layer: CollisionLayer,
    flipped: bool,
) -> Probe {
    Cast {
        axis: Axis::Horizontal,
        layer,
        flipped,
    }
    .terminal(terrain, x, y)
}
