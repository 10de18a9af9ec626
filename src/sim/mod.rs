//! Deterministic simulation module
//!
//! All collision and movement logic lives here. This module must be pure
//! and deterministic:
//! - Fixed timestep only
//! - Integer and 16.16 fixed-point arithmetic only
//! - Stable iteration order (by player slot)
//! - No rendering, audio output or platform dependencies

pub mod air;
pub mod boundary;
pub mod collision;
pub mod damage;
pub mod fixed;
pub mod follower;
pub mod ground;
pub mod level;
pub mod sensor;
pub mod state;
pub mod tick;
pub mod tiles;
pub mod trig;

#[cfg(test)]
pub(crate) mod testing;

pub use boundary::{MovingPlatform, NoObjects, ObjectLayer, Platform, PlatformList, Standable};
pub use collision::{Contact, check_ceiling, check_floor, level_collision};
pub use fixed::Fixed;
pub use follower::FollowerBrain;
pub use level::{Bounds, Level, LevelData, LevelError, LevelView};
pub use sensor::{Probe, Terrain, cast_floor, cast_wall};
pub use state::{
    Animation, Attachment, GameEvent, ObjectId, Player, RenderState, Routine, Shield, Status,
};
pub use tick::{SimContext, TickInput, World, tick};
pub use tiles::{CollisionLayer, CollisionPath, CollisionProfile, CollisionStore, Face, TileMap, TileRef};
pub use trig::{Quadrant, project};
