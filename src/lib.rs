//! Tilerun - tile-sensor collision and character physics
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile sensors, player state machine)
//! - `audio`: Fire-and-forget sound requests to the audio collaborator
//! - `input`: Per-tick controller snapshots
//! - `bindings`: Control-binding persistence (the only on-disk format the core reads)
//! - `settings`: Physics tuning and preferences

pub mod audio;
pub mod bindings;
pub mod input;
pub mod settings;
pub mod sim;

pub use settings::{PhysicsTuning, Settings, SpeedProfile};

/// Simulation constants
///
/// Speeds are in 1/256 px per tick, distances in pixels.
pub mod consts {
    /// Simulation rate (one tick per rendered frame)
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Edge length of a collision tile
    pub const TILE_SIZE: i32 = 16;
    /// Height value meaning "column fully solid, keep looking"
    pub const FULL_HEIGHT: i8 = 0x10;
    /// Tiles per chunk edge
    pub const CHUNK_TILES: usize = 8;
    /// Chunk edge in pixels
    pub const CHUNK_SIZE: i32 = TILE_SIZE * CHUNK_TILES as i32;

    /// Hitbox radii
    pub const STAND_RADIUS_X: i32 = 9;
    pub const STAND_RADIUS_Y: i32 = 19;
    pub const BALL_RADIUS_X: i32 = 7;
    pub const BALL_RADIUS_Y: i32 = 14;

    /// Ground following
    pub const CLIP_TOLERANCE_MAX: i32 = 14;
    pub const CLIP_TOLERANCE_BASE: i32 = 4;
    /// Reach of the wall-in-front and wall-side probes
    pub const WALL_REACH: i32 = 10;
    /// Floor distance under the centre probe that counts as a ledge
    pub const LEDGE_DISTANCE: i32 = 0x0C;
    /// Minimum ceiling clearance for a jump
    pub const JUMP_HEADROOM: i32 = 6;

    /// Slopes
    pub const SLOPE_FACTOR: i32 = 0x20;
    pub const ROLL_SLOPE_FACTOR: i32 = 0x50;
    pub const REPEL_MIN_SPEED: i32 = 0x280;
    pub const REPEL_NUDGE: i32 = 0x80;
    pub const MOVE_LOCK_TICKS: u16 = 30;

    /// Ground speeds
    pub const TURN_RESET_SPEED: i32 = 0x80;
    pub const SKID_MIN_SPEED: i32 = 0x400;
    pub const MIN_ROLL_SPEED: i32 = 0x80;
    pub const ROLL_X_SPEED_CAP: i32 = 0x1000;
    pub const PINBALL_RELAUNCH_SPEED: i32 = 0x400;

    /// Air
    pub const MAX_UP_SPEED: i32 = -0xFC0;
    pub const MAX_LANDING_SPEED: i32 = 0xFC0;
    pub const AIR_DRAG_WINDOW: i32 = -0x400;
    pub const JUMP_ANGLE_DECAY: u8 = 2;
    pub const WATER_EXIT_MAX_UP: i32 = -0x1000;

    /// Shield abilities
    pub const FIRE_DASH_SPEED: i32 = 0x800;
    pub const LIGHTNING_JUMP_SPEED: i32 = -0x580;
    pub const BUBBLE_DROP_SPEED: i32 = 0x800;
    pub const BUBBLE_BOUNCE_SPEED: i32 = 0x780;
    pub const BUBBLE_BOUNCE_SPEED_WATER: i32 = 0x400;

    /// Hurt / death
    pub const HURT_Y_SPEED: i32 = -0x400;
    pub const HURT_X_SPEED: i32 = 0x200;
    pub const HURT_GRAVITY: i32 = 0x30;
    pub const HURT_WATER_GRAVITY_CUT: i32 = 0x20;
    pub const INVULNERABLE_TICKS: u16 = 0x78;
    pub const DEATH_Y_SPEED: i32 = -0x700;
    pub const DEATH_FALL_MARGIN: i32 = 0x100;
    pub const RESTART_COUNTDOWN: u16 = 60;
    pub const STARTING_LIVES: u8 = 3;
    pub const SPEED_SHOES_TICKS: u16 = 1200;

    /// Level bounds margins
    pub const LEFT_MARGIN: i32 = 0x10;
    pub const RIGHT_MARGIN: i32 = 0x18;

    /// Position record ring buffer
    pub const RECORD_LENGTH: usize = 64;
    /// Ticks of lag between leader and follower
    pub const FOLLOW_DELAY: usize = 16;
}
