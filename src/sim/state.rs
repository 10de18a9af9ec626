//! Player state and core simulation types
//!
//! Positions are stored in the player's gravity frame: with reverse gravity
//! on, `y` is `!y_world`. Render-facing accessors convert back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fixed::Fixed;
use super::tiles::CollisionPath;
use crate::consts::*;
use crate::input::{Buttons, ControllerInput};

/// Top-level player routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Routine {
    /// Normal play: grounded, rolling or airborne
    Control,
    /// Knocked back, no control until landing
    Hurt,
    /// Falling off screen, no collision
    Death,
    /// Waiting for the level to restart
    ResetLevel { countdown: u16 },
    /// Free movement, physics bypassed
    Debug { speed: u8 },
}

/// Animation selector read by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    Walk,
    Run,
    Roll,
    Wait,
    /// Teetering on a ledge; `facing_left` points at the drop
    Balance,
    LookUp,
    Duck,
    Skid,
    Spindash,
    Push,
    Hurt,
    Death,
}

/// Shield carried by the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shield {
    #[default]
    None,
    Basic,
    Fire,
    Lightning,
    Bubble,
}

/// Opaque identifier of an object-layer entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// What the player is standing on, if not terrain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attachment {
    #[default]
    None,
    /// A scripted object (platform, bridge, monitor)
    Object(ObjectId),
    /// Another player, by slot
    Player(usize),
}

/// Named status flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub facing_left: bool,
    pub in_air: bool,
    pub in_ball: bool,
    /// Standing on an object; never set together with `in_air`
    pub on_object: bool,
    /// Rolled into a jump, air control disabled
    pub roll_jump: bool,
    pub pushing: bool,
    pub jumping: bool,
    pub underwater: bool,
    pub reverse_gravity: bool,
    /// Forced rolling (tubes)
    pub pinball: bool,
    /// Keep following the ground past the clip tolerance
    pub stick_to_convex: bool,
    /// Shield ability already used this jump
    pub double_jump: bool,
    /// A collaborator owns the player's movement this tick
    pub object_control: bool,
}

/// One sample of the position record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub x: i32,
    pub y: i32,
    pub input: Buttons,
    pub in_air: bool,
}

/// Fixed-length ring buffer of recent positions and inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    entries: Vec<RecordEntry>,
    head: usize,
}

impl Default for PositionRecord {
    fn default() -> Self {
        Self {
            entries: vec![RecordEntry::default(); RECORD_LENGTH],
            head: 0,
        }
    }
}

impl PositionRecord {
    /// Fill every slot with one entry (spawn, respawn)
    pub fn reset(&mut self, entry: RecordEntry) {
        self.entries.iter_mut().for_each(|e| *e = entry);
        self.head = 0;
    }

    pub fn push(&mut self, entry: RecordEntry) {
        self.head = (self.head + 1) % RECORD_LENGTH;
        self.entries[self.head] = entry;
    }

    /// Entry recorded `ticks_ago` ticks before the newest one
    pub fn get(&self, ticks_ago: usize) -> RecordEntry {
        let idx = (self.head + RECORD_LENGTH - ticks_ago % RECORD_LENGTH) % RECORD_LENGTH;
        self.entries[idx]
    }

    pub fn latest(&self) -> RecordEntry {
        self.get(0)
    }
}

/// A physics-driven player entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub x: Fixed,
    pub y: Fixed,
    /// World-space velocity, 1/256 px per tick
    pub x_vel: i32,
    pub y_vel: i32,
    /// Speed along the surface while grounded
    pub inertia: i32,
    pub angle: u8,
    /// Angles reported by the two ground sensors last tick, `None` when
    /// that sensor found no surface
    pub primary_angle: Option<u8>,
    pub secondary_angle: Option<u8>,
    pub radius_x: i32,
    pub radius_y: i32,
    pub status: Status,
    pub routine: Routine,
    pub anim: Animation,
    /// Collision path for floor and wall casts
    pub path: CollisionPath,
    pub attachment: Attachment,
    /// Ticks left with left/right ignored
    pub move_lock: u16,
    /// Spin-dash charge while crouched and revving
    pub spindash: Option<u16>,
    pub invulnerable: u16,
    pub speed_shoes: u16,
    pub shield: Shield,
    pub rings: u16,
    pub lives: u8,
    /// Input for the current tick
    pub input: ControllerInput,
    pub record: PositionRecord,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        let mut player = Self {
            x: Fixed::from_pixel(x),
            y: Fixed::from_pixel(y),
            x_vel: 0,
            y_vel: 0,
            inertia: 0,
            angle: 0,
            primary_angle: None,
            secondary_angle: None,
            radius_x: STAND_RADIUS_X,
            radius_y: STAND_RADIUS_Y,
            status: Status::default(),
            routine: Routine::Control,
            anim: Animation::Wait,
            path: CollisionPath::Primary,
            attachment: Attachment::None,
            move_lock: 0,
            spindash: None,
            invulnerable: 0,
            speed_shoes: 0,
            shield: Shield::None,
            rings: 0,
            lives: STARTING_LIVES,
            input: ControllerInput::default(),
            record: PositionRecord::default(),
        };
        player.status.in_air = true;
        player.reset_record();
        player
    }

    /// Put the player back at a spawn point without recreating it
    pub fn respawn(&mut self, x: i32, y: i32) {
        let lives = self.lives;
        let path = self.path;
        *self = Player::new(x, y);
        self.lives = lives;
        self.path = path;
    }

    pub fn reset_record(&mut self) {
        let entry = RecordEntry {
            x: self.x.pixel(),
            y: self.y.pixel(),
            input: Buttons::NONE,
            in_air: self.status.in_air,
        };
        self.record.reset(entry);
    }

    /// Curl into a ball, keeping the feet where they are
    pub fn enter_ball(&mut self) {
        if self.status.in_ball {
            return;
        }
        self.status.in_ball = true;
        self.radius_x = BALL_RADIUS_X;
        self.radius_y = BALL_RADIUS_Y;
        self.y.add_pixels(STAND_RADIUS_Y - BALL_RADIUS_Y);
        self.anim = Animation::Roll;
    }

    /// Stand back up from a ball
    pub fn exit_ball(&mut self) {
        if !self.status.in_ball {
            return;
        }
        self.status.in_ball = false;
        self.radius_x = STAND_RADIUS_X;
        self.radius_y = STAND_RADIUS_Y;
        self.y.add_pixels(BALL_RADIUS_Y - STAND_RADIUS_Y);
    }

    /// Standing radii without moving (debug exit, respawn)
    pub fn reset_radii(&mut self) {
        self.status.in_ball = false;
        self.radius_x = STAND_RADIUS_X;
        self.radius_y = STAND_RADIUS_Y;
    }

    /// Leave the ground
    pub fn set_airborne(&mut self) {
        self.status.in_air = true;
        self.status.on_object = false;
        self.attachment = Attachment::None;
    }

    pub fn grounded(&self) -> bool {
        !self.status.in_air
    }

    pub fn is_alive(&self) -> bool {
        matches!(
            self.routine,
            Routine::Control | Routine::Hurt | Routine::Debug { .. }
        )
    }

    pub fn apply_velocity(&mut self) {
        self.x.apply_velocity(self.x_vel);
        self.y.apply_velocity(self.y_vel);
    }

    /// World-space y pixel
    pub fn world_y(&self) -> i32 {
        if self.status.reverse_gravity {
            !self.y.pixel()
        } else {
            self.y.pixel()
        }
    }

    /// Switch gravity direction, converting the local frame
    pub fn set_reverse_gravity(&mut self, reverse: bool) {
        if self.status.reverse_gravity == reverse {
            return;
        }
        self.status.reverse_gravity = reverse;
        self.y = self.y.mirrored();
        self.y_vel = -self.y_vel;
        self.angle = 0x80u8.wrapping_sub(self.angle);
        self.set_airborne();
        self.record.reset(RecordEntry {
            x: self.x.pixel(),
            y: self.y.pixel(),
            input: Buttons::NONE,
            in_air: true,
        });
        log::debug!("Gravity reversed: {}", reverse);
    }

    /// Append this tick's sample to the position record
    pub fn record_position(&mut self) {
        self.record.push(RecordEntry {
            x: self.x.pixel(),
            y: self.y.pixel(),
            input: self.input.held,
            in_air: self.status.in_air,
        });
    }

    /// Read-only snapshot for the renderer
    pub fn render_state(&self) -> RenderState {
        let world_y = self.world_y();
        RenderState {
            pos: Vec2::new(self.x.pixel() as f32, world_y as f32),
            anim: self.anim,
            angle: if self.status.reverse_gravity {
                0x80u8.wrapping_sub(self.angle)
            } else {
                self.angle
            },
            mirrored: self.status.facing_left,
            flipped: self.status.reverse_gravity,
            visible: self.invulnerable == 0 || self.invulnerable & 0x08 == 0,
        }
    }
}

/// What the renderer reads once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub pos: Vec2,
    pub anim: Animation,
    /// World-space surface angle
    pub angle: u8,
    pub mirrored: bool,
    pub flipped: bool,
    pub visible: bool,
}

/// Side effects for collaborators other than audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Scatter this many rings from the player's position
    RingLoss { slot: usize, count: u16, x: i32, y: i32 },
    ShieldLost { slot: usize },
    Hurt { slot: usize },
    Died { slot: usize },
    /// Last life lost
    GameOver { slot: usize },
    /// Restart fade has finished; reload the level
    LevelRestart,
    EnteredWater { slot: usize },
    LeftWater { slot: usize },
    DebugMode { slot: usize, enabled: bool },
    /// Player left the object it was standing on
    Detached { slot: usize, from: Attachment },
}
