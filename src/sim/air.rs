//! Airborne movement and shield abilities

use super::boundary::level_bound;
use super::collision::level_collision;
use super::state::{Player, Shield};
use super::tick::SimContext;
use super::trig::project;
use crate::audio::SoundEffect;
use crate::consts::*;

/// Air mode: jumping, falling, launched
pub fn run_airborne(p: &mut Player, cx: &mut SimContext) {
    jump_height(p, cx);
    air_control(p, cx);
    level_bound(p, cx);
    fall(p, cx);
    if p.status.underwater {
        p.y_vel -= cx.tuning.water_gravity_cut;
    }
    decay_angle(p);
    level_collision(p, cx);
}

/// Variable jump height, the upward speed cap and shield abilities
pub fn jump_height(p: &mut Player, cx: &mut SimContext) {
    if !p.status.jumping {
        if !p.status.pinball && p.y_vel < MAX_UP_SPEED {
            p.y_vel = MAX_UP_SPEED;
        }
        return;
    }

    let cap = -cx.tuning.jump_release(p.status.underwater);
    if p.y_vel < cap {
        // Releasing jump early cuts the rise short
        if !p.input.held.jump() {
            p.y_vel = cap;
        }
        return;
    }
    shield_ability(p, cx);
}

/// Once per jump, near the top of the arc
fn shield_ability(p: &mut Player, cx: &mut SimContext) {
    if p.status.double_jump || !p.input.pressed.jump() {
        return;
    }
    p.status.roll_jump = false;

    match p.shield {
        Shield::Fire => {
            p.status.double_jump = true;
            let speed = if p.status.facing_left {
                -FIRE_DASH_SPEED
            } else {
                FIRE_DASH_SPEED
            };
            p.x_vel = speed;
            p.inertia = speed;
            p.y_vel = 0;
            // The follower would otherwise replay the dash path
            p.reset_record();
            cx.sounds.request(SoundEffect::FireAttack);
        }
        Shield::Lightning => {
            p.status.double_jump = true;
            p.y_vel = LIGHTNING_JUMP_SPEED;
            p.status.jumping = false;
            cx.sounds.request(SoundEffect::LightningAttack);
        }
        Shield::Bubble => {
            p.status.double_jump = true;
            p.x_vel = 0;
            p.inertia = 0;
            p.y_vel = BUBBLE_DROP_SPEED;
            cx.sounds.request(SoundEffect::BubbleAttack);
        }
        Shield::None => {
            p.status.double_jump = true;
            cx.sounds.request(SoundEffect::InstaShield);
        }
        Shield::Basic => {}
    }
    log::debug!("slot {} shield ability {:?}", cx.slot, p.shield);
}

/// Bounce off the ground after a bubble-shield drop
pub fn bubble_bounce(p: &mut Player, cx: &mut SimContext) {
    let speed = if p.status.underwater {
        BUBBLE_BOUNCE_SPEED_WATER
    } else {
        BUBBLE_BOUNCE_SPEED
    };
    let (dx, dy) = project(p.angle.wrapping_sub(0x40), speed);
    p.x_vel += dx;
    p.y_vel += dy;
    p.set_airborne();
    p.status.pushing = false;
    p.status.jumping = true;
    p.status.stick_to_convex = false;
    p.enter_ball();
    cx.sounds.request(SoundEffect::BubbleBounce);
}

/// Steering plus drag near the top of the arc
pub fn air_control(p: &mut Player, cx: &mut SimContext) {
    let profile = cx.tuning.profile(p.status.underwater, p.speed_shoes > 0);
    let top = profile.top_speed;
    let accel = profile.acceleration * 2;

    if !p.status.roll_jump {
        let mut v = p.x_vel;
        if p.input.held.left {
            p.status.facing_left = true;
            v -= accel;
            if v <= -top {
                v = (v + accel).min(-top);
            }
        }
        if p.input.held.right {
            p.status.facing_left = false;
            v += accel;
            if v >= top {
                v = (v - accel).max(top);
            }
        }
        p.x_vel = v;
    }

    if (AIR_DRAG_WINDOW..0).contains(&p.y_vel) {
        let drag = p.x_vel >> 5;
        if drag > 0 {
            p.x_vel = (p.x_vel - drag).max(0);
        } else if drag < 0 {
            p.x_vel = (p.x_vel - drag).min(0);
        }
    }
}

/// Move by the current velocity, then add gravity
pub fn fall(p: &mut Player, cx: &SimContext) {
    let y_vel = p.y_vel;
    p.y_vel += cx.tuning.gravity;
    p.x.apply_velocity(p.x_vel);
    p.y.apply_velocity(y_vel);
}

/// Rotate back towards upright while airborne
pub fn decay_angle(p: &mut Player) {
    if p.angle == 0 {
        return;
    }
    p.angle = if p.angle >= 0x80 {
        p.angle.checked_add(JUMP_ANGLE_DECAY).unwrap_or(0)
    } else {
        p.angle.saturating_sub(JUMP_ANGLE_DECAY)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Buttons, ControllerInput};
    use crate::sim::fixed::Fixed;
    use crate::sim::testing::{Harness, floor_level};

    fn airborne(h: &mut Harness) -> &mut Player {
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(60);
        p.enter_ball();
        p.status.jumping = true;
        p
    }

    #[test]
    fn test_release_caps_rise() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.y_vel = -0x680;
        p.input = ControllerInput::from_held(Buttons::NONE, Buttons::NONE.with_jump());
        h.with_cx(0, jump_height);
        assert_eq!(h.players[0].y_vel, -0x400);

        let p = &mut h.players[0];
        p.y_vel = -0x680;
        p.input = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE.with_jump());
        h.with_cx(0, jump_height);
        assert_eq!(h.players[0].y_vel, -0x680);
    }

    #[test]
    fn test_upward_speed_cap_when_launched() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.status.jumping = false;
        p.y_vel = -0x1400;
        h.with_cx(0, jump_height);
        assert_eq!(h.players[0].y_vel, MAX_UP_SPEED);
    }

    #[test]
    fn test_fire_dash_once_per_jump() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.shield = Shield::Fire;
        p.status.facing_left = true;
        p.y_vel = -0x100;
        p.input = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE);
        h.with_cx(0, jump_height);
        let p = &h.players[0];
        assert_eq!(p.x_vel, -FIRE_DASH_SPEED);
        assert_eq!(p.y_vel, 0);
        assert!(p.status.double_jump);
        assert!(h.sounds.contains(SoundEffect::FireAttack));

        let p = &mut h.players[0];
        p.x_vel = 0;
        h.with_cx(0, jump_height);
        assert_eq!(h.players[0].x_vel, 0);
    }

    #[test]
    fn test_lightning_and_bubble() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.shield = Shield::Lightning;
        p.input = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE);
        h.with_cx(0, jump_height);
        assert_eq!(h.players[0].y_vel, LIGHTNING_JUMP_SPEED);
        assert!(!h.players[0].status.jumping);

        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.shield = Shield::Bubble;
        p.x_vel = 0x300;
        p.input = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE);
        h.with_cx(0, jump_height);
        let p = &h.players[0];
        assert_eq!((p.x_vel, p.y_vel), (0, BUBBLE_DROP_SPEED));
    }

    #[test]
    fn test_air_control_and_drag() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.y_vel = 0x100;
        p.input = ControllerInput::from_held(Buttons::NONE.with_right(), Buttons::NONE);
        h.with_cx(0, air_control);
        assert_eq!(h.players[0].x_vel, 0x18);

        // Drag only near the apex
        let p = &mut h.players[0];
        p.x_vel = 0x400;
        p.y_vel = -0x200;
        p.input = ControllerInput::default();
        h.with_cx(0, air_control);
        assert_eq!(h.players[0].x_vel, 0x400 - 0x20);
    }

    #[test]
    fn test_roll_jump_locks_steering() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.status.roll_jump = true;
        p.y_vel = 0x100;
        p.input = ControllerInput::from_held(Buttons::NONE.with_left(), Buttons::NONE);
        h.with_cx(0, air_control);
        assert_eq!(h.players[0].x_vel, 0);
        assert!(!h.players[0].status.facing_left);
    }

    #[test]
    fn test_gravity_applies_after_move() {
        let mut h = Harness::new(floor_level(160));
        let p = airborne(&mut h);
        p.y_vel = 0;
        h.with_cx(0, |p, cx| fall(p, cx));
        let p = &h.players[0];
        assert_eq!(p.y.pixel(), 65);
        assert_eq!(p.y_vel, 0x38);
    }

    #[test]
    fn test_angle_decays_to_upright() {
        let mut p = Player::new(0, 0);
        p.angle = 0xFF;
        decay_angle(&mut p);
        assert_eq!(p.angle, 0);
        p.angle = 0x03;
        decay_angle(&mut p);
        assert_eq!(p.angle, 0x01);
        decay_angle(&mut p);
        assert_eq!(p.angle, 0);
        p.angle = 0x80;
        decay_angle(&mut p);
        assert_eq!(p.angle, 0x82);
    }

    #[test]
    fn test_jump_lands_back_on_floor() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(160 - STAND_RADIUS_Y);
        p.status.in_air = false;
        p.input = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE);
        h.with_cx(0, crate::sim::ground::run_normal);
        assert!(h.players[0].status.in_air);

        let mut landed = false;
        for _ in 0..120 {
            h.players[0].input = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE.with_jump());
            h.with_cx(0, run_airborne);
            if h.players[0].grounded() {
                landed = true;
                break;
            }
        }
        let p = &h.players[0];
        assert!(landed);
        assert!(!p.status.in_ball);
        assert_eq!(p.y.pixel() + p.radius_y, 160);
    }
}
