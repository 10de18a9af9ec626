//! Table-driven trigonometry over the 256-step angle domain
//!
//! Angle 0 points along +x (the floor's running direction), 0x40 along +y
//! (screen down), so angles grow clockwise on screen. Sine and cosine are
//! scaled by 256; multiply and shift right by 8 to project a speed.

/// First quarter of the sine wave, `round(256 * sin(i * 2π / 256))`
const QUARTER_SINE: [i16; 65] = [
    0, 6, 13, 19, 25, 31, 38, 44, 50, 56, 62, 68, 74, 80, 86, 92, 98, 104, 109, 115, 121, 126,
    132, 137, 142, 147, 152, 157, 162, 167, 172, 177, 181, 185, 190, 194, 198, 202, 206, 209, 213,
    216, 220, 223, 226, 229, 231, 234, 237, 239, 241, 243, 245, 247, 248, 250, 251, 252, 253, 254,
    255, 255, 256, 256, 256,
];

static SINE_TABLE: [i16; 256] = build_sine_table();

const fn build_sine_table() -> [i16; 256] {
    let mut table = [0i16; 256];
    let mut i = 0;
    while i < 256 {
        let half = i & 0x7F;
        let v = if half <= 64 {
            QUARTER_SINE[half]
        } else {
            QUARTER_SINE[128 - half]
        };
        table[i] = if i < 128 { v } else { -v };
        i += 1;
    }
    table
}

/// `round(atan(i / 256) * 128 / π)` for one octant, 257 entries
static ATAN_TABLE: [u8; 257] = [
    0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 5, 5, 5,
    5, 5, 5, 6, 6, 6, 6, 6, 6, 6, 7, 7, 7, 7, 7, 7, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 10, 10,
    10, 10, 10, 10, 10, 11, 11, 11, 11, 11, 11, 11, 12, 12, 12, 12, 12, 12, 12, 13, 13, 13, 13, 13,
    13, 13, 14, 14, 14, 14, 14, 14, 14, 15, 15, 15, 15, 15, 15, 15, 16, 16, 16, 16, 16, 16, 16, 17,
    17, 17, 17, 17, 17, 17, 17, 18, 18, 18, 18, 18, 18, 18, 19, 19, 19, 19, 19, 19, 19, 19, 20, 20,
    20, 20, 20, 20, 20, 20, 21, 21, 21, 21, 21, 21, 21, 21, 21, 22, 22, 22, 22, 22, 22, 22, 22, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 24, 24, 24, 24, 24, 24, 24, 24, 24, 25, 25, 25, 25, 25, 25, 25,
    25, 25, 25, 26, 26, 26, 26, 26, 26, 26, 26, 26, 27, 27, 27, 27, 27, 27, 27, 27, 27, 27, 28, 28,
    28, 28, 28, 28, 28, 28, 28, 28, 28, 29, 29, 29, 29, 29, 29, 29, 29, 29, 29, 29, 30, 30, 30, 30,
    30, 30, 30, 30, 30, 30, 30, 31, 31, 31, 31, 31, 31, 31, 31, 31, 31, 31, 31, 32, 32, 32, 32, 32,
    32, 32,
];

/// Sine of an angle, scaled by 256
#[inline]
pub fn sin(angle: u8) -> i32 {
    SINE_TABLE[angle as usize] as i32
}

/// Cosine of an angle, scaled by 256
#[inline]
pub fn cos(angle: u8) -> i32 {
    SINE_TABLE[angle.wrapping_add(0x40) as usize] as i32
}

/// Project a scalar speed along an angle: `(speed * cos >> 8, speed * sin >> 8)`
#[inline]
pub fn project(angle: u8, speed: i32) -> (i32, i32) {
    ((speed * cos(angle)) >> 8, (speed * sin(angle)) >> 8)
}

/// Angle of the vector `(dx, dy)`.
///
/// The zero vector reports 0x40 (straight down).
pub fn atan(dx: i32, dy: i32) -> u8 {
    if dx == 0 && dy == 0 {
        return 0x40;
    }
    let ax = dx.unsigned_abs();
    let ay = dy.unsigned_abs();

    let mut angle = if ay < ax {
        ATAN_TABLE[((ay << 8) / ax) as usize] as i32
    } else {
        0x40 - ATAN_TABLE[((ax << 8) / ay) as usize] as i32
    };
    if dx < 0 {
        angle = 0x80 - angle;
    }
    if dy < 0 {
        angle = 0x100 - angle;
    }
    (angle & 0xFF) as u8
}

/// Signed shortest difference `a - b` in angle steps
#[inline]
pub fn angle_delta(a: u8, b: u8) -> i8 {
    a.wrapping_sub(b) as i8
}

/// Which surface an angle is resting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Surface below (angle 0x00)
    Floor,
    /// Surface to the left (angle 0x40)
    LeftWall,
    /// Surface above (angle 0x80)
    Ceiling,
    /// Surface to the right (angle 0xC0)
    RightWall,
}

impl Quadrant {
    /// Plain 90° sector of an angle, boundaries at odd multiples of 0x20
    pub fn of(angle: u8) -> Self {
        Self::from_sector(angle.wrapping_add(0x20) & 0xC0)
    }

    /// Sector used for ground following.
    ///
    /// Exact diagonals (0x20, 0x60, 0xA0, 0xE0) resolve toward the floor or
    /// ceiling so that running through a 45° seam doesn't flip-flop between
    /// sensor orientations.
    pub fn of_ground(angle: u8) -> Self {
        let biased = if (angle.wrapping_add(0x20) as i8) < 0 {
            if (angle as i8) < 0 {
                angle.wrapping_add(0x1F)
            } else {
                angle.wrapping_add(0x20)
            }
        } else if (angle as i8) < 0 {
            angle.wrapping_add(0x20)
        } else {
            angle.wrapping_add(0x1F)
        };
        Self::from_sector(biased & 0xC0)
    }

    fn from_sector(sector: u8) -> Self {
        match sector {
            0x40 => Quadrant::LeftWall,
            0x80 => Quadrant::Ceiling,
            0xC0 => Quadrant::RightWall,
            _ => Quadrant::Floor,
        }
    }

    /// Cardinal angle of the sector
    pub fn angle(self) -> u8 {
        match self {
            Quadrant::Floor => 0x00,
            Quadrant::LeftWall => 0x40,
            Quadrant::Ceiling => 0x80,
            Quadrant::RightWall => 0xC0,
        }
    }
}
