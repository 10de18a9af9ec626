//! Fixed timestep simulation tick
//!
//! One call advances every player by one frame, in slot order. Each
//! player's routine runs against a [`SimContext`] holding the level view
//! for its gravity frame and the sinks for sounds and events.

use glam::IVec2;

use super::air::run_airborne;
use super::boundary::{NoObjects, ObjectLayer, attach, land_on_objects, ride_object, sync_standing};
use super::damage::{hurt, run_death, run_hurt, run_reset};
use super::follower::FollowerBrain;
use super::ground::{run_normal, run_rolling};
use super::level::{Level, LevelView};
use super::state::{Animation, Attachment, GameEvent, Player, RenderState, Routine, Shield};
use crate::audio::{SoundEffect, SoundQueue};
use crate::consts::*;
use crate::input::{Buttons, ControllerInput};
use crate::settings::{PhysicsTuning, Settings};

/// What a routine may touch besides the player itself
pub struct SimContext<'a> {
    /// Level in the player's gravity frame
    pub level: LevelView<'a>,
    pub tuning: &'a PhysicsTuning,
    pub sounds: &'a mut SoundQueue,
    pub events: &'a mut Vec<GameEvent>,
    pub objects: &'a mut dyn ObjectLayer,
    /// Slot of the player being simulated
    pub slot: usize,
    pub frame: u32,
    pub debug_enabled: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held buttons and stick per slot; edges are derived here. Missing
    /// slots read as released.
    pub controllers: Vec<ControllerInput>,
}

/// A level and the players in it
pub struct World {
    pub level: Level,
    pub players: Vec<Player>,
    /// CPU brains by slot; `None` for human-controlled slots
    pub followers: Vec<Option<FollowerBrain>>,
    pub tuning: PhysicsTuning,
    pub debug_enabled: bool,
    pub frame: u32,
    pub sounds: SoundQueue,
    pub events: Vec<GameEvent>,
    /// World-space displacement of each player during the last tick
    moved: Vec<IVec2>,
}

impl World {
    /// Start a level with one human player at its spawn point
    pub fn new(level: Level, settings: &Settings) -> Self {
        let spawn = level.spawn;
        let mut world = Self {
            level,
            players: Vec::new(),
            followers: Vec::new(),
            tuning: settings.tuning.clone(),
            debug_enabled: settings.debug_mode_enabled,
            frame: 0,
            sounds: SoundQueue::new(),
            events: Vec::new(),
            moved: Vec::new(),
        };
        world.add_player(spawn.x, spawn.y, None);
        world
    }

    /// Add a player, returning its slot
    pub fn add_player(&mut self, x: i32, y: i32, brain: Option<FollowerBrain>) -> usize {
        self.players.push(Player::new(x, y));
        self.followers.push(brain);
        self.moved.push(IVec2::ZERO);
        let slot = self.players.len() - 1;
        log::debug!("Player added in slot {} at ({}, {})", slot, x, y);
        slot
    }

    /// Add a CPU sidekick trailing slot 0
    pub fn add_follower(&mut self) -> usize {
        let spawn = self.level.spawn;
        self.add_player(spawn.x - 0x20, spawn.y, Some(FollowerBrain::new()))
    }

    pub fn is_follower(&self, slot: usize) -> bool {
        slot > 0 && matches!(self.followers.get(slot), Some(Some(_)))
    }

    /// Put every player back at the spawn point
    pub fn restart(&mut self) {
        let spawn = self.level.spawn;
        for slot in 0..self.players.len() {
            let x = if self.is_follower(slot) {
                spawn.x - 0x20
            } else {
                spawn.x
            };
            self.players[slot].respawn(x, spawn.y);
            self.moved[slot] = IVec2::ZERO;
        }
        log::info!("Level restarted at ({}, {})", spawn.x, spawn.y);
    }

    /// Run `f` against one player with a full context
    pub fn with_player<R>(
        &mut self,
        slot: usize,
        objects: &mut dyn ObjectLayer,
        f: impl FnOnce(&mut Player, &mut SimContext<'_>) -> R,
    ) -> Option<R> {
        let World {
            level,
            players,
            tuning,
            sounds,
            events,
            frame,
            debug_enabled,
            ..
        } = self;
        let p = players.get_mut(slot)?;
        let mut cx = SimContext {
            level: level.view(p.status.reverse_gravity),
            tuning: &*tuning,
            sounds,
            events,
            objects,
            slot,
            frame: *frame,
            debug_enabled: *debug_enabled,
        };
        Some(f(p, &mut cx))
    }

    /// Damage from a hazard at `source_x`; `false` when it had no effect
    pub fn hurt(
        &mut self,
        slot: usize,
        source_x: i32,
        spikes: bool,
        objects: &mut dyn ObjectLayer,
    ) -> bool {
        self.with_player(slot, objects, |p, cx| hurt(p, cx, source_x, spikes))
            .unwrap_or(false)
    }

    pub fn give_shield(&mut self, slot: usize, shield: Shield) {
        if let Some(p) = self.players.get_mut(slot) {
            p.shield = shield;
        }
    }

    pub fn give_speed_shoes(&mut self, slot: usize) {
        if let Some(p) = self.players.get_mut(slot) {
            p.speed_shoes = SPEED_SHOES_TICKS;
        }
    }

    pub fn add_rings(&mut self, slot: usize, count: u16) {
        if let Some(p) = self.players.get_mut(slot) {
            p.rings = p.rings.saturating_add(count);
        }
    }

    pub fn set_reverse_gravity(&mut self, slot: usize, reverse: bool) {
        if let Some(p) = self.players.get_mut(slot) {
            p.set_reverse_gravity(reverse);
        }
    }

    /// Stand `rider` on top of `carrier`
    pub fn attach_to_player(&mut self, rider: usize, carrier: usize) {
        if rider == carrier || carrier >= self.players.len() {
            return;
        }
        self.with_player(rider, &mut NoObjects, |p, cx| {
            attach(p, cx, Attachment::Player(carrier))
        });
    }

    pub fn render_states(&self) -> Vec<RenderState> {
        self.players.iter().map(Player::render_state).collect()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// This tick's input for `slot`
    fn read_input(&mut self, input: &TickInput, slot: usize) -> ControllerInput {
        if self.is_follower(slot) {
            let (leader, rest) = self.players.split_at(slot);
            if let (Some(brain), Some(leader)) = (self.followers[slot].as_mut(), leader.first()) {
                return brain.think(leader, &rest[0], self.frame);
            }
        }
        let prev = self.players[slot].input.held;
        let raw = input.controllers.get(slot).copied().unwrap_or_default();
        let mut controller = ControllerInput::from_held(raw.held, prev);
        controller.stick = raw.stick;
        controller.digital(prev)
    }

    /// Carry a player standing on another player
    fn ride_player(&mut self, slot: usize) {
        let Attachment::Player(carrier) = self.players[slot].attachment else {
            return;
        };
        let delta = self.moved.get(carrier).copied().unwrap_or_default();
        let carrier_state = self
            .players
            .get(carrier)
            .filter(|_| carrier != slot)
            .map(|c| (c.x.pixel(), c.radius_x, c.is_alive()));

        let rider = &mut self.players[slot];
        match carrier_state {
            Some((x, radius_x, true)) if (rider.x.pixel() - x).abs() < radius_x + rider.radius_x => {
                rider.x.add_pixels(delta.x);
                let dy = if rider.status.reverse_gravity {
                    -delta.y
                } else {
                    delta.y
                };
                rider.y.add_pixels(dy);
            }
            _ => {
                rider.attachment = Attachment::None;
                rider.status.on_object = false;
                rider.status.in_air = true;
            }
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, objects: &mut dyn ObjectLayer) {
    world.frame = world.frame.wrapping_add(1);
    let mut restart = false;

    for slot in 0..world.players.len() {
        let p = &world.players[slot];
        let start = IVec2::new(p.x.pixel(), p.world_y());
        let before = p.attachment;
        let human = !world.is_follower(slot);

        let controller = world.read_input(input, slot);
        world.players[slot].input = controller;
        world.ride_player(slot);

        let finished = world
            .with_player(slot, objects, |p, cx| {
                let finished = step_player(p, cx, human);
                sync_standing(cx, before, p.attachment);
                finished
            })
            .unwrap_or(false);

        let p = &world.players[slot];
        world.moved[slot] = IVec2::new(p.x.pixel(), p.world_y()) - start;

        if finished {
            if world.is_follower(slot) {
                let leader = &world.players[0];
                let (x, y) = (leader.x.pixel(), leader.world_y());
                world.players[slot].respawn(x, y);
                world.players[slot].lives = STARTING_LIVES;
                log::debug!("Follower {} respawned near the leader", slot);
            } else {
                restart = true;
            }
        }
    }

    if restart {
        world.events.push(GameEvent::LevelRestart);
        world.restart();
    }
}

/// One player's routine; `true` when its restart countdown just finished
fn step_player(p: &mut Player, cx: &mut SimContext, human: bool) -> bool {
    let can_toggle = !matches!(p.routine, Routine::Death | Routine::ResetLevel { .. });
    if human && can_toggle && cx.debug_enabled && p.input.pressed.b {
        toggle_debug(p, cx);
        return false;
    }

    match p.routine {
        Routine::Control => {
            run_control(p, cx);
            false
        }
        Routine::Hurt => {
            run_hurt(p, cx);
            wrap_vertical(p, cx);
            p.record_position();
            update_water(p, cx);
            false
        }
        Routine::Death => {
            run_death(p, cx);
            p.record_position();
            false
        }
        Routine::ResetLevel { .. } => run_reset(p),
        Routine::Debug { .. } => {
            run_debug(p);
            false
        }
    }
}

fn run_control(p: &mut Player, cx: &mut SimContext) {
    if !p.status.object_control {
        if p.status.in_air {
            run_airborne(p, cx);
        } else if p.status.in_ball {
            run_rolling(p, cx);
        } else {
            run_normal(p, cx);
        }
    }
    ride_object(p, cx);
    land_on_objects(p, cx);
    wrap_vertical(p, cx);
    update_timers(p, cx);
    p.record_position();
    update_water(p, cx);
}

fn wrap_vertical(p: &mut Player, cx: &SimContext) {
    if let Some(y) = cx.level.wrap_y(p.y.pixel()) {
        p.y.set_pixel(y);
    }
}

fn update_timers(p: &mut Player, cx: &SimContext) {
    p.invulnerable = p.invulnerable.saturating_sub(1);
    if p.speed_shoes > 0 {
        p.speed_shoes -= 1;
        if p.speed_shoes == 0 {
            log::debug!("slot {} speed shoes wore off", cx.slot);
        }
    }
}

/// Toggle `underwater` when crossing the water line
fn update_water(p: &mut Player, cx: &mut SimContext) {
    let Some(water) = cx.level.level.water_level else {
        return;
    };
    let below = p.world_y() > water;
    if below == p.status.underwater {
        return;
    }
    p.status.underwater = below;

    if below {
        p.x_vel >>= 1;
        p.y_vel >>= 2;
        cx.events.push(GameEvent::EnteredWater { slot: cx.slot });
        log::debug!("slot {} entered water", cx.slot);
    } else {
        if p.routine != Routine::Hurt {
            p.y_vel *= 2;
        }
        p.y_vel = p.y_vel.max(WATER_EXIT_MAX_UP);
        cx.events.push(GameEvent::LeftWater { slot: cx.slot });
        log::debug!("slot {} left water", cx.slot);
    }
    if p.y_vel != 0 {
        cx.sounds.request(SoundEffect::Splash);
    }
}

fn toggle_debug(p: &mut Player, cx: &mut SimContext) {
    let enabled = !matches!(p.routine, Routine::Debug { .. });
    if enabled {
        p.routine = Routine::Debug { speed: 0 };
        p.set_airborne();
        p.spindash = None;
    } else {
        p.routine = Routine::Control;
        p.x_vel = 0;
        p.y_vel = 0;
        p.inertia = 0;
        p.angle = 0;
        p.reset_radii();
        p.set_airborne();
        p.status.object_control = false;
        p.anim = Animation::Walk;
    }
    cx.events.push(GameEvent::DebugMode {
        slot: cx.slot,
        enabled,
    });
    log::info!("slot {} debug mode {}", cx.slot, if enabled { "on" } else { "off" });
}

/// Free flight with the d-pad, picking up speed while held
fn run_debug(p: &mut Player) {
    let Routine::Debug { speed } = p.routine else {
        return;
    };
    let held: Buttons = p.input.held;
    let moving = held.up || held.down || held.left || held.right;
    if !moving {
        p.routine = Routine::Debug { speed: 0 };
        return;
    }

    let step = (speed as i32 + 1) << 12;
    if held.up {
        p.y.0 = p.y.0.wrapping_sub(step);
    }
    if held.down {
        p.y.0 = p.y.0.wrapping_add(step);
    }
    if held.left {
        p.x.0 = p.x.0.wrapping_sub(step);
    }
    if held.right {
        p.x.0 = p.x.0.wrapping_add(step);
    }
    p.routine = Routine::Debug {
        speed: speed.saturating_add(1),
    };
}
