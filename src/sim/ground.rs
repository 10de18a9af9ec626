//! Grounded movement: walking, rolling, jumping and the spin-dash
//!
//! While grounded the player moves by `inertia`, a scalar along the
//! surface. Each tick it is projected onto the current angle to get the
//! world velocity, then the ground sensors re-align the player.

use super::boundary::{level_bound, object_edge};
use super::collision::{align_to_ground, check_walls_on_ground, floor_edge_distance, room_overhead};
use super::state::{Animation, Attachment, Player};
use super::tick::SimContext;
use super::trig::{Quadrant, project, sin};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Ground mode, upright
pub fn run_normal(p: &mut Player, cx: &mut SimContext) {
    if spindash(p, cx) {
        level_bound(p, cx);
        align_to_ground(p, cx);
        return;
    }
    if jump(p, cx) {
        return;
    }
    slope_resist(p);
    walk(p, cx);
    start_roll(p, cx);
    level_bound(p, cx);
    p.apply_velocity();
    align_to_ground(p, cx);
    slope_repel(p);
}

/// Ground mode, curled into a ball
pub fn run_rolling(p: &mut Player, cx: &mut SimContext) {
    if !p.status.pinball && jump(p, cx) {
        return;
    }
    roll_repel(p);
    roll_speed(p, cx);
    level_bound(p, cx);
    p.apply_velocity();
    align_to_ground(p, cx);
    slope_repel(p);
}

/// Charge or release a spin-dash; `true` skips the rest of the ground tick
pub fn spindash(p: &mut Player, cx: &mut SimContext) -> bool {
    let Some(counter) = p.spindash else {
        if p.anim != Animation::Duck || !p.input.pressed.jump() {
            return false;
        }
        p.anim = Animation::Spindash;
        p.spindash = Some(0);
        cx.sounds.request(SoundEffect::SpindashRev);
        return true;
    };

    if !p.input.held.down {
        p.spindash = None;
        p.enter_ball();
        let speed = cx.tuning.spindash_speed(counter);
        p.inertia = if p.status.facing_left { -speed } else { speed };
        cx.sounds.request(SoundEffect::SpindashRelease);
        log::debug!("slot {} spin-dash release {:#x}", cx.slot, p.inertia);
        return true;
    }

    let mut counter = counter - (counter >> 5);
    if p.input.pressed.jump() {
        p.anim = Animation::Spindash;
        cx.sounds.request(SoundEffect::SpindashRev);
        counter = (counter + 0x200).min(0x800);
    }
    p.spindash = Some(counter);
    true
}

/// Jump if a jump button was pressed and there is headroom
pub fn jump(p: &mut Player, cx: &mut SimContext) -> bool {
    if !p.input.pressed.jump() {
        return false;
    }
    if room_overhead(&cx.level, p, p.angle.wrapping_add(0x80)) < JUMP_HEADROOM {
        return false;
    }

    let speed = cx.tuning.jump_speed(p.status.underwater);
    let (dx, dy) = project(p.angle.wrapping_sub(0x40), speed);
    p.x_vel += dx;
    p.y_vel += dy;
    p.set_airborne();
    p.status.pushing = false;
    p.status.jumping = true;
    p.status.stick_to_convex = false;
    cx.sounds.request(SoundEffect::Jump);

    if p.status.in_ball {
        p.status.roll_jump = true;
    } else {
        p.enter_ball();
    }
    true
}

/// Gravity along the slope while standing or walking
pub fn slope_resist(p: &mut Player) {
    if p.angle.wrapping_add(0x60) >= 0xC0 {
        return;
    }
    let d = (sin(p.angle) * SLOPE_FACTOR) >> 8;
    if p.inertia != 0 {
        p.inertia += d;
    }
}

/// Left/right acceleration, friction, turning and idle animations
pub fn walk(p: &mut Player, cx: &mut SimContext) {
    let profile = cx.tuning.profile(p.status.underwater, p.speed_shoes > 0);
    let held = p.input.held;

    if p.move_lock == 0 {
        if held.left {
            move_left(p, cx, profile.top_speed, profile.acceleration, profile.deceleration);
        }
        if held.right {
            move_right(p, cx, profile.top_speed, profile.acceleration, profile.deceleration);
        }

        let on_flat = Quadrant::of(p.angle) == Quadrant::Floor;
        if on_flat && p.inertia == 0 {
            p.status.pushing = false;
            p.anim = Animation::Wait;
            if !balance(p, cx) {
                if held.up {
                    p.anim = Animation::LookUp;
                } else if held.down {
                    p.anim = Animation::Duck;
                }
            }
        }
    }

    if !held.horizontal() {
        p.inertia = if p.inertia > 0 {
            (p.inertia - profile.acceleration).max(0)
        } else {
            (p.inertia + profile.acceleration).min(0)
        };
    }

    let (vx, vy) = project(p.angle, p.inertia);
    p.x_vel = vx;
    p.y_vel = vy;
    check_walls_on_ground(p, cx);
}

/// Teeter on a ledge or object edge; `true` when balancing
fn balance(p: &mut Player, cx: &mut SimContext) -> bool {
    if p.status.on_object {
        let Attachment::Object(id) = p.attachment else {
            return false;
        };
        let Some(edge) = object_edge(cx, id, p.x.pixel()) else {
            return false;
        };
        p.status.facing_left = edge.is_lt();
        p.anim = Animation::Balance;
        return true;
    }

    if floor_edge_distance(&cx.level, p) < LEDGE_DISTANCE {
        return false;
    }
    // The sensor that found nothing is on the side of the drop
    if p.primary_angle.is_none() {
        p.status.facing_left = false;
    } else if p.secondary_angle.is_none() {
        p.status.facing_left = true;
    } else {
        return false;
    }
    p.anim = Animation::Balance;
    true
}

fn move_left(p: &mut Player, cx: &mut SimContext, top: i32, accel: i32, decel: i32) {
    if p.inertia > 0 {
        turn(p, cx, -decel);
        return;
    }
    if !p.status.facing_left {
        p.status.facing_left = true;
        p.status.pushing = false;
    }
    let mut v = p.inertia - accel;
    if v <= -top {
        // Keep overspeed from slopes and springs, but don't add to it
        v = (v + accel).min(-top);
    }
    p.inertia = v;
    p.anim = Animation::Walk;
}

fn move_right(p: &mut Player, cx: &mut SimContext, top: i32, accel: i32, decel: i32) {
    if p.inertia < 0 {
        turn(p, cx, decel);
        return;
    }
    if p.status.facing_left {
        p.status.facing_left = false;
        p.status.pushing = false;
    }
    let mut v = p.inertia + accel;
    if v >= top {
        v = (v - accel).max(top);
    }
    p.inertia = v;
    p.anim = Animation::Walk;
}

/// Brake against the direction of travel
fn turn(p: &mut Player, cx: &mut SimContext, delta: i32) {
    let before = p.inertia;
    let after = before + delta;
    p.inertia = if after != 0 && after.signum() != before.signum() {
        -TURN_RESET_SPEED * before.signum()
    } else {
        after
    };

    if Quadrant::of(p.angle) == Quadrant::Floor && p.inertia.abs() >= SKID_MIN_SPEED {
        p.anim = Animation::Skid;
        p.status.facing_left = p.inertia < 0;
        cx.sounds.request(SoundEffect::Skid);
    }
}

/// Curl up when ducking at speed
pub fn start_roll(p: &mut Player, cx: &mut SimContext) {
    let held = p.input.held;
    if p.inertia.abs() < MIN_ROLL_SPEED || held.horizontal() || !held.down {
        return;
    }
    if p.status.in_ball {
        return;
    }
    p.enter_ball();
    cx.sounds.request(SoundEffect::Roll);
}

/// Slide off slopes too steep to stand on at low speed
pub fn slope_repel(p: &mut Player) {
    if p.status.stick_to_convex {
        return;
    }
    if p.move_lock > 0 {
        p.move_lock -= 1;
        return;
    }
    if p.angle.wrapping_add(0x18) < 0x30 || p.inertia.abs() >= REPEL_MIN_SPEED {
        return;
    }

    p.move_lock = MOVE_LOCK_TICKS;
    let steepness = p.angle.wrapping_add(0x30);
    if steepness >= 0x60 {
        p.set_airborne();
    } else if steepness >= 0x30 {
        p.inertia += REPEL_NUDGE;
    } else {
        p.inertia -= REPEL_NUDGE;
    }
}

/// Slope gravity while rolling; weaker going uphill
pub fn roll_repel(p: &mut Player) {
    if p.angle.wrapping_add(0x60) >= 0xC0 {
        return;
    }
    let mut d = (sin(p.angle) * ROLL_SLOPE_FACTOR) >> 8;
    let opposing = (p.inertia >= 0 && d < 0) || (p.inertia < 0 && d > 0);
    if opposing {
        d >>= 1;
    }
    p.inertia += d;
}

/// Rolling friction, braking and the stop check
pub fn roll_speed(p: &mut Player, cx: &mut SimContext) {
    let profile = cx.tuning.profile(p.status.underwater, p.speed_shoes > 0);
    let friction = profile.acceleration >> 1;
    let brake = cx.tuning.roll_deceleration;

    if p.move_lock == 0 {
        if p.input.held.left {
            if p.inertia > 0 {
                p.inertia = brake_roll(p.inertia, -brake);
            } else {
                p.status.facing_left = true;
                p.anim = Animation::Roll;
            }
        }
        if p.input.held.right {
            if p.inertia < 0 {
                p.inertia = brake_roll(p.inertia, brake);
            } else {
                p.status.facing_left = false;
                p.anim = Animation::Roll;
            }
        }
    }

    p.inertia = if p.inertia > 0 {
        (p.inertia - friction).max(0)
    } else {
        (p.inertia + friction).min(0)
    };

    if p.inertia == 0 {
        if p.status.pinball {
            p.inertia = if p.status.facing_left {
                -PINBALL_RELAUNCH_SPEED
            } else {
                PINBALL_RELAUNCH_SPEED
            };
        } else {
            p.exit_ball();
            p.anim = Animation::Wait;
        }
    }

    let (vx, vy) = project(p.angle, p.inertia);
    p.x_vel = vx.clamp(-ROLL_X_SPEED_CAP, ROLL_X_SPEED_CAP);
    p.y_vel = vy;
    check_walls_on_ground(p, cx);
}

fn brake_roll(inertia: i32, delta: i32) -> i32 {
    let after = inertia + delta;
    if after != 0 && after.signum() != inertia.signum() {
        -TURN_RESET_SPEED * inertia.signum()
    } else {
        after
    }
}
