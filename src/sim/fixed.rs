//! 16.16 fixed-point coordinates
//!
//! The upper half is the signed pixel, the lower half the sub-pixel
//! fraction. Velocities are 1/256 px per tick and accumulate as `vel << 8`.

use serde::{Deserialize, Serialize};

/// One axis of an entity position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    /// Whole pixel at the start of a pixel
    pub const fn from_pixel(px: i32) -> Self {
        Fixed(px << 16)
    }

    /// Signed pixel component
    #[inline]
    pub const fn pixel(self) -> i32 {
        self.0 >> 16
    }

    /// Unsigned sub-pixel component
    #[inline]
    pub const fn subpixel(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Replace the pixel, keep the fraction
    #[inline]
    pub fn set_pixel(&mut self, px: i32) {
        self.0 = (px << 16) | self.subpixel() as i32;
    }

    /// Replace the pixel and clear the fraction
    #[inline]
    pub fn snap(&mut self, px: i32) {
        self.0 = px << 16;
    }

    #[inline]
    pub fn add_pixels(&mut self, dpx: i32) {
        self.0 = self.0.wrapping_add(dpx << 16);
    }

    /// Accumulate a velocity in 1/256 px units
    #[inline]
    pub fn apply_velocity(&mut self, vel: i32) {
        self.0 = self.0.wrapping_add(vel << 8);
    }

    /// Where this axis lands after one tick at `vel`, without moving
    #[inline]
    pub fn predict(self, vel: i32) -> i32 {
        self.0.wrapping_add(vel << 8) >> 16
    }

    /// Mirror across the horizontal axis used by reverse gravity (`!y`)
    #[inline]
    pub fn mirrored(self) -> Self {
        Fixed(!self.0)
    }
}
