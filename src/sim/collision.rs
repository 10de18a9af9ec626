//! Player-versus-terrain collision
//!
//! Everything here runs in the player's gravity frame through the level
//! view held by the [`SimContext`]. Sensor geometry rotates with the
//! quadrant of the surface being probed:
//!
//! ```text
//! Floor      (x ± rx, y + ry)  cast down
//! Ceiling    (x ± rx, y - ry)  cast up
//! RightWall  (x + ry, y ∓ rx)  cast right
//! LeftWall   (x - ry, y ∓ rx)  cast left
//! ```

use super::sensor::{Probe, Terrain, cast_floor, cast_wall};
use super::state::{Animation, Player};
use super::tick::SimContext;
use super::tiles::{CollisionLayer, Face};
use super::trig::{Quadrant, angle_delta, atan};
use crate::consts::*;

/// Nearer result of a sensor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub distance: i32,
    /// Distance reported by the other sensor
    pub other: i32,
    pub angle: Option<u8>,
}

impl Contact {
    /// Angle, or a fallback when the tile asked for a cardinal snap
    pub fn angle_or(&self, fallback: u8) -> u8 {
        match self.angle {
            Some(a) if a & 1 == 0 => a,
            _ => fallback,
        }
    }
}

fn layer(p: &Player, face: Face) -> CollisionLayer {
    CollisionLayer::new(p.path, face)
}

/// Cast both sensors on one side of the hitbox
///
/// Returns `(primary, secondary)`: primary is the sensor on the +x side
/// for floors and ceilings, and on the -y side for walls.
pub fn sensor_pair<T: Terrain + ?Sized>(terrain: &T, p: &Player, side: Quadrant) -> (Probe, Probe) {
    let x = p.x.pixel();
    let y = p.y.pixel();
    let (rx, ry) = (p.radius_x, p.radius_y);
    let sides = layer(p, Face::Sides);
    match side {
        Quadrant::Floor => {
            let top = layer(p, Face::Top);
            (
                cast_floor(terrain, x + rx, y + ry, top, false),
                cast_floor(terrain, x - rx, y + ry, top, false),
            )
        }
        Quadrant::Ceiling => (
            cast_floor(terrain, x + rx, y - ry, sides, true),
            cast_floor(terrain, x - rx, y - ry, sides, true),
        ),
        Quadrant::RightWall => (
            cast_wall(terrain, x + ry, y - rx, sides, false),
            cast_wall(terrain, x + ry, y + rx, sides, false),
        ),
        Quadrant::LeftWall => (
            cast_wall(terrain, x - ry, y - rx, sides, true),
            cast_wall(terrain, x - ry, y + rx, sides, true),
        ),
    }
}

/// Pick the nearer sensor; ties go to the secondary one
pub fn nearer(primary: Probe, secondary: Probe) -> Contact {
    if secondary.distance <= primary.distance {
        Contact {
            distance: secondary.distance,
            other: primary.distance,
            angle: secondary.angle,
        }
    } else {
        Contact {
            distance: primary.distance,
            other: secondary.distance,
            angle: primary.angle,
        }
    }
}

/// Move the player along the axis facing `side` by a sensor distance
fn push_toward(p: &mut Player, side: Quadrant, distance: i32) {
    match side {
        Quadrant::Floor => p.y.add_pixels(distance),
        Quadrant::Ceiling => p.y.add_pixels(-distance),
        Quadrant::RightWall => p.x.add_pixels(distance),
        Quadrant::LeftWall => p.x.add_pixels(-distance),
    }
}

/// Keep a grounded player glued to the surface under its feet
///
/// Chooses sensor orientation from the current angle, adopts the nearer
/// sensor's angle when it is trustworthy, clips into or snaps down onto
/// the surface, and drops the player into the air past the clip tolerance.
pub fn align_to_ground(p: &mut Player, cx: &mut SimContext) {
    if p.status.on_object {
        p.primary_angle = Some(0);
        p.secondary_angle = Some(0);
        return;
    }

    let side = Quadrant::of_ground(p.angle);
    let (primary, secondary) = sensor_pair(&cx.level, p, side);
    p.primary_angle = primary.angle;
    p.secondary_angle = secondary.angle;
    let contact = nearer(primary, secondary);

    if contact.distance >= -CLIP_TOLERANCE_MAX {
        p.angle = match contact.angle {
            Some(a) if a & 1 == 0 && angle_delta(a, p.angle).unsigned_abs() < 0x20 => a,
            _ => Quadrant::of(p.angle).angle(),
        };
    }

    let d = contact.distance;
    if d == 0 {
        return;
    }
    if d < 0 {
        push_toward(p, side, d);
        return;
    }

    let axis_vel = match side {
        Quadrant::Floor | Quadrant::Ceiling => p.x_vel,
        Quadrant::LeftWall | Quadrant::RightWall => p.y_vel,
    };
    let tolerance = ((axis_vel >> 8).abs() + CLIP_TOLERANCE_BASE).min(CLIP_TOLERANCE_MAX);
    if d <= tolerance || p.status.stick_to_convex {
        push_toward(p, side, d);
    } else {
        p.set_airborne();
        p.status.pushing = false;
        log::trace!("slot {} ran off the ground ({} px gap)", cx.slot, d);
    }
}

/// Floor under both feet; snap angles read as 0
pub fn check_floor<T: Terrain + ?Sized>(terrain: &T, p: &Player) -> Contact {
    let (a, b) = sensor_pair(terrain, p, Quadrant::Floor);
    let c = nearer(a, b);
    Contact {
        angle: Some(c.angle_or(0x00)),
        ..c
    }
}

/// Ceiling over the head; snap angles read as 0x80
pub fn check_ceiling<T: Terrain + ?Sized>(terrain: &T, p: &Player) -> Contact {
    let (a, b) = sensor_pair(terrain, p, Quadrant::Ceiling);
    let c = nearer(a, b);
    Contact {
        angle: Some(c.angle_or(0x80)),
        ..c
    }
}

/// Wall distance `WALL_REACH` px left of centre
pub fn left_wall_distance<T: Terrain + ?Sized>(terrain: &T, p: &Player) -> i32 {
    let sides = layer(p, Face::Sides);
    cast_wall(terrain, p.x.pixel() - WALL_REACH, p.y.pixel(), sides, true).distance
}

/// Wall distance `WALL_REACH` px right of centre
pub fn right_wall_distance<T: Terrain + ?Sized>(terrain: &T, p: &Player) -> i32 {
    let sides = layer(p, Face::Sides);
    cast_wall(terrain, p.x.pixel() + WALL_REACH, p.y.pixel(), sides, false).distance
}

/// Free space ahead along `direction`, measured from next tick's position
pub fn room_in_front<T: Terrain + ?Sized>(terrain: &T, p: &Player, direction: u8) -> i32 {
    let mut x = p.x.predict(p.x_vel);
    let mut y = p.y.predict(p.y_vel);
    let sides = layer(p, Face::Sides);

    match Quadrant::of_ground(direction) {
        Quadrant::Floor => cast_floor(terrain, x, y + WALL_REACH, sides, false).distance,
        Quadrant::Ceiling => cast_floor(terrain, x, y - WALL_REACH, sides, true).distance,
        side => {
            // Low walls are probed at knee height on flat ground
            if direction & 0x38 == 0 {
                y += 8;
            }
            if side == Quadrant::LeftWall {
                x -= WALL_REACH;
                cast_wall(terrain, x, y, sides, true).distance
            } else {
                x += WALL_REACH;
                cast_wall(terrain, x, y, sides, false).distance
            }
        }
    }
}

/// Head clearance in `direction` (two sensors, nearer wins)
pub fn room_overhead<T: Terrain + ?Sized>(terrain: &T, p: &Player, direction: u8) -> i32 {
    let (a, b) = sensor_pair(terrain, p, Quadrant::of(direction));
    nearer(a, b).distance
}

/// Floor distance under the centre of the feet, for ledge balancing
pub fn floor_edge_distance<T: Terrain + ?Sized>(terrain: &T, p: &Player) -> i32 {
    let top = layer(p, Face::Top);
    cast_floor(terrain, p.x.pixel(), p.y.pixel() + p.radius_y, top, false).distance
}

/// Stop ground movement short of a wall ahead
pub fn check_walls_on_ground(p: &mut Player, cx: &mut SimContext) {
    if (p.angle.wrapping_add(0x40) as i8) < 0 || p.inertia == 0 {
        return;
    }
    let direction = if p.inertia > 0 {
        p.angle.wrapping_sub(0x40)
    } else {
        p.angle.wrapping_add(0x40)
    };
    let d = room_in_front(&cx.level, p, direction);
    if d >= 0 {
        return;
    }
    let d = d << 8;
    match Quadrant::of(direction) {
        Quadrant::Floor => p.y_vel += d,
        Quadrant::Ceiling => p.y_vel -= d,
        Quadrant::LeftWall => {
            p.x_vel -= d;
            hit_wall(p);
        }
        Quadrant::RightWall => {
            p.x_vel += d;
            hit_wall(p);
        }
    }
}

fn hit_wall(p: &mut Player) {
    p.status.pushing = true;
    p.inertia = 0;
    if !p.status.in_ball && p.input.held.horizontal() {
        p.anim = Animation::Push;
    }
}

/// Land on the floor: leave the ball, clear air flags
///
/// Returns `true` when a bubble-shield bounce is due, which the caller
/// applies once landing speed has been converted.
pub fn reset_on_floor(p: &mut Player) -> bool {
    if !p.status.pinball {
        p.exit_ball();
        p.anim = Animation::Walk;
    }
    let bounce = p.status.double_jump && p.shield == super::state::Shield::Bubble;
    p.status.in_air = false;
    p.status.pushing = false;
    p.status.roll_jump = false;
    p.status.jumping = false;
    p.status.double_jump = false;
    bounce
}

/// Air-to-ground collision, ordered by the dominant direction of travel
pub fn level_collision(p: &mut Player, cx: &mut SimContext) {
    let heading = atan(p.x_vel, p.y_vel).wrapping_sub(0x20) & 0xC0;
    let bounce = match heading {
        0x40 => hit_moving_sideways(p, cx, true),
        0x80 => hit_moving_up(p, cx),
        0xC0 => hit_moving_sideways(p, cx, false),
        _ => hit_moving_down(p, cx),
    };
    if bounce {
        super::air::bubble_bounce(p, cx);
    }
}

fn push_out_of_walls(p: &mut Player, cx: &SimContext) {
    let d = left_wall_distance(&cx.level, p);
    if d < 0 {
        p.x.add_pixels(-d);
        p.x_vel = 0;
    }
    let d = right_wall_distance(&cx.level, p);
    if d < 0 {
        p.x.add_pixels(d);
        p.x_vel = 0;
    }
}

fn hit_moving_down(p: &mut Player, cx: &mut SimContext) -> bool {
    push_out_of_walls(p, cx);

    let floor = check_floor(&cx.level, p);
    if floor.distance >= 0 {
        return false;
    }
    let reach = -((p.y_vel >> 8) + 8);
    if floor.distance < reach && floor.other < reach {
        return false;
    }

    let angle = floor.angle_or(0);
    p.y.add_pixels(floor.distance);
    p.angle = angle;
    let bounce = reset_on_floor(p);

    if angle.wrapping_add(0x20) & 0x40 != 0 {
        // Steep: all of the fall becomes ground speed
        p.x_vel = 0;
        p.y_vel = p.y_vel.min(MAX_LANDING_SPEED);
        p.inertia = signed_by_angle(p.y_vel, angle);
    } else if angle.wrapping_add(0x10) & 0x20 != 0 {
        p.y_vel >>= 1;
        p.inertia = signed_by_angle(p.y_vel, angle);
    } else {
        p.y_vel = 0;
        p.inertia = p.x_vel;
    }
    bounce
}

fn signed_by_angle(speed: i32, angle: u8) -> i32 {
    if (angle as i8) < 0 { -speed } else { speed }
}

fn hit_moving_sideways(p: &mut Player, cx: &mut SimContext, left: bool) -> bool {
    let wall = if left {
        left_wall_distance(&cx.level, p)
    } else {
        right_wall_distance(&cx.level, p)
    };
    if wall < 0 {
        p.x.add_pixels(if left { -wall } else { wall });
        p.x_vel = 0;
        p.inertia = p.y_vel;
        return false;
    }

    let ceiling = check_ceiling(&cx.level, p);
    if ceiling.distance < 0 {
        p.y.add_pixels(-ceiling.distance);
        if p.y_vel < 0 {
            p.y_vel = 0;
        }
        return false;
    }

    if p.y_vel < 0 {
        return false;
    }
    let floor = check_floor(&cx.level, p);
    if floor.distance >= 0 {
        return false;
    }
    p.y.add_pixels(floor.distance);
    p.angle = floor.angle_or(0);
    let bounce = reset_on_floor(p);
    p.y_vel = 0;
    p.inertia = p.x_vel;
    bounce
}

fn hit_moving_up(p: &mut Player, cx: &mut SimContext) -> bool {
    push_out_of_walls(p, cx);

    let ceiling = check_ceiling(&cx.level, p);
    if ceiling.distance >= 0 {
        return false;
    }
    p.y.add_pixels(-ceiling.distance);
    let angle = ceiling.angle_or(0x80);
    if angle.wrapping_add(0x20) & 0x40 == 0 {
        p.y_vel = 0;
        return false;
    }

    // Steep ceiling: start running on it
    p.angle = angle;
    let bounce = reset_on_floor(p);
    p.inertia = signed_by_angle(p.y_vel, angle);
    bounce
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Shield;
    use crate::sim::fixed::Fixed;
    use crate::sim::testing::{
        Harness, angled_ceiling_level, angled_floor_level, floor_level, slope_level, tunnel_level,
        wall_level,
    };

    #[test]
    fn test_nearer_prefers_secondary_on_tie() {
        let a = Probe { distance: 3, angle: Some(0x10) };
        let b = Probe { distance: 3, angle: Some(0x20) };
        assert_eq!(nearer(a, b).angle, Some(0x20));
        let c = Probe { distance: 1, angle: Some(0x30) };
        assert_eq!(nearer(c, b), Contact { distance: 1, other: 3, angle: Some(0x30) });
    }

    #[test]
    fn test_align_snaps_down_within_tolerance() {
        // Floor top at y = 160; standing feet at y + 19
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.y = Fixed::from_pixel(160 - 19 - 3);
        p.status.in_air = false;
        h.with_cx(0, align_to_ground);
        let p = &h.players[0];
        assert_eq!(p.y.pixel(), 160 - 19);
        assert!(p.grounded());
        assert_eq!(p.angle, 0);
    }

    #[test]
    fn test_align_clips_deep_penetration() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.y = Fixed::from_pixel(160 - 19 + 20);
        p.status.in_air = false;
        p.angle = 0x10;
        h.with_cx(0, align_to_ground);
        let p = &h.players[0];
        assert_eq!(p.y.pixel(), 160 - 19);
        // Too deep to trust the surface angle
        assert_eq!(p.angle, 0x10);
    }

    #[test]
    fn test_align_falls_off_past_tolerance() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.y = Fixed::from_pixel(160 - 19 - 10);
        p.status.in_air = false;
        p.x_vel = 0x100;
        h.with_cx(0, align_to_ground);
        assert!(h.players[0].status.in_air);

        let p = &mut h.players[0];
        p.y = Fixed::from_pixel(160 - 19 - 10);
        p.status.in_air = false;
        p.status.stick_to_convex = true;
        h.with_cx(0, align_to_ground);
        assert!(h.players[0].grounded());
        assert_eq!(h.players[0].y.pixel(), 160 - 19);
    }

    #[test]
    fn test_align_adopts_slope_angle() {
        let mut h = Harness::new(slope_level());
        let p = &mut h.players[0];
        p.status.in_air = false;
        p.angle = 0xF0;
        // Middle of the rising slope run
        p.x = Fixed::from_pixel(136);
        p.y = Fixed::from_pixel(150 - 19);
        h.with_cx(0, align_to_ground);
        assert_eq!(h.players[0].angle, 0xE0);
    }

    #[test]
    fn test_on_object_skips_sensing() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.status.in_air = false;
        p.status.on_object = true;
        p.y = Fixed::from_pixel(40);
        h.with_cx(0, align_to_ground);
        assert_eq!(h.players[0].y.pixel(), 40);
        assert_eq!(h.players[0].primary_angle, Some(0));
    }

    #[test]
    fn test_vertical_landing_on_flat_floor() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.y = Fixed::from_pixel(160 - 19 + 2);
        p.x_vel = 0x123;
        p.y_vel = 0x400;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(p.grounded());
        assert_eq!(p.y.pixel(), 160 - 19);
        assert_eq!(p.y_vel, 0);
        assert_eq!(p.inertia, 0x123);
    }

    #[test]
    fn test_landing_leaves_ball() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.enter_ball();
        p.status.jumping = true;
        p.y = Fixed::from_pixel(160 - 14 + 1);
        p.y_vel = 0x300;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(!p.status.in_ball);
        assert!(!p.status.jumping);
        assert_eq!(p.y.pixel() + p.radius_y, 160);
        assert_eq!(p.anim, Animation::Walk);
    }

    #[test]
    fn test_shallow_landing_ignores_far_floor() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        // 12 px into the floor but falling slowly
        p.y = Fixed::from_pixel(160 - 19 + 12);
        p.y_vel = 0x100;
        h.with_cx(0, level_collision);
        assert!(h.players[0].status.in_air);
    }

    #[test]
    fn test_wall_stops_fall_sideways() {
        let mut h = Harness::new(wall_level(208));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(208 - 10 + 3);
        p.y = Fixed::from_pixel(60);
        p.x_vel = 0x300;
        p.y_vel = 0x100;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert_eq!(p.x_vel, 0);
        assert_eq!(p.x.pixel(), 208 - 10);
    }

    #[test]
    fn test_bubble_bounce_on_landing() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.shield = Shield::Bubble;
        p.status.double_jump = true;
        p.enter_ball();
        p.y = Fixed::from_pixel(160 - 14 + 1);
        p.y_vel = 0x800;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(p.status.in_air);
        assert!(p.status.in_ball);
        assert_eq!(p.y_vel, -0x780);
    }

    #[test]
    fn test_walls_on_ground_stop_inertia() {
        let mut h = Harness::new(wall_level(208));
        let p = &mut h.players[0];
        p.status.in_air = false;
        p.x = Fixed::from_pixel(208 - 10 - 2);
        p.y = Fixed::from_pixel(60);
        p.inertia = 0x600;
        p.x_vel = 0x600;
        h.with_cx(0, check_walls_on_ground);
        let p = &h.players[0];
        assert!(p.status.pushing);
        assert_eq!(p.inertia, 0);
        // Lands exactly against the wall next tick
        assert_eq!(p.x.predict(p.x_vel), 208 - 10);
    }

    #[test]
    fn test_steep_landing_turns_fall_into_ground_speed() {
        let mut h = Harness::new(angled_floor_level(160, 0xD0));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(160 - 19 + 2);
        p.x_vel = 0x200;
        p.y_vel = 0x1200;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(p.grounded());
        assert_eq!(p.angle, 0xD0);
        assert_eq!(p.x_vel, 0);
        assert_eq!(p.y_vel, MAX_LANDING_SPEED);
        // Surface falls away to the left
        assert_eq!(p.inertia, -MAX_LANDING_SPEED);
    }

    #[test]
    fn test_medium_slope_landing_halves_fall() {
        let mut h = Harness::new(angled_floor_level(160, 0xE0));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(160 - 19 + 2);
        p.y_vel = 0x600;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(p.grounded());
        assert_eq!(p.angle, 0xE0);
        assert_eq!(p.y_vel, 0x300);
        assert_eq!(p.inertia, -0x300);
    }

    #[test]
    fn test_flat_ceiling_stops_rise() {
        let mut h = Harness::new(tunnel_level(160, 32));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(32 + 19 - 2);
        p.y_vel = -0x600;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(p.status.in_air);
        assert_eq!(p.y_vel, 0);
        assert!(p.y.pixel() - p.radius_y >= 30);
    }

    #[test]
    fn test_steep_ceiling_landing_runs_on_it() {
        // Flipped profile angle 0x30 reads as 0x50 from below
        let mut h = Harness::new(angled_ceiling_level(32, 0x30));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(32 + 19 - 2);
        p.y_vel = -0x600;
        h.with_cx(0, level_collision);
        let p = &h.players[0];
        assert!(p.grounded());
        assert_eq!(p.angle, 0x50);
        assert_eq!(p.inertia, -0x600);
    }

    #[test]
    fn test_align_runs_on_right_wall() {
        let mut h = Harness::new(wall_level(208));
        let p = &mut h.players[0];
        p.status.in_air = false;
        p.angle = 0xC0;
        // Feet 3 px short of the wall face
        p.x = Fixed::from_pixel(208 - 19 - 3);
        p.y = Fixed::from_pixel(100);
        h.with_cx(0, align_to_ground);
        let p = &h.players[0];
        assert!(p.grounded());
        assert_eq!(p.x.pixel(), 208 - 19);
        assert_eq!(p.y.pixel(), 100);
        assert_eq!(p.angle, 0xC0);
    }

    #[test]
    fn test_align_runs_on_ceiling() {
        let mut h = Harness::new(tunnel_level(160, 32));
        let p = &mut h.players[0];
        p.status.in_air = false;
        p.angle = 0x80;
        p.x = Fixed::from_pixel(200);
        p.y = Fixed::from_pixel(32 + 19 + 2);
        h.with_cx(0, align_to_ground);
        let p = &h.players[0];
        assert!(p.grounded());
        assert_eq!(p.angle, 0x80);
        // Head rests on the last solid row of the ceiling
        assert_eq!(p.y.pixel() - p.radius_y, 31);
    }
}
