//! Level bounds and standing on objects
//!
//! Objects are owned by a collaborator behind [`ObjectLayer`]. The core only
//! asks where a standable surface is, whether a falling player lands on it,
//! and tells it who is standing there.

use std::cmp::Ordering;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::collision::reset_on_floor;
use super::damage::kill;
use super::state::{Attachment, GameEvent, ObjectId, Player};
use super::tick::SimContext;
use super::trig::sin;
use crate::consts::{LEFT_MARGIN, RIGHT_MARGIN};

/// Standable surface of an object, in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Centre x
    pub x: i32,
    /// y of the walkable top edge
    pub top: i32,
    pub half_width: i32,
    /// How far the surface moved this tick
    pub delta: IVec2,
}

impl Platform {
    pub fn spans(&self, x: i32) -> bool {
        x >= self.x - self.half_width && x < self.x + self.half_width
    }
}

/// An object players can stand on
pub trait Standable {
    fn platform(&self) -> Platform;

    /// Whether a falling player with feet at `feet` lands this tick
    fn try_land(&mut self, _slot: usize, x: i32, feet: i32, y_vel: i32) -> bool {
        let pf = self.platform();
        y_vel >= 0 && pf.spans(x) && (pf.top..=pf.top + 16).contains(&feet)
    }

    /// Told when a player starts or stops standing on this object
    fn set_standing(&mut self, _slot: usize, _standing: bool) {}
}

/// Collaborator owning objects
pub trait ObjectLayer {
    /// Objects that can currently be landed on, in a stable order
    fn standables(&self) -> Vec<ObjectId>;
    fn standable(&mut self, id: ObjectId) -> Option<&mut dyn Standable>;
}

/// Object layer with nothing in it
#[derive(Debug, Default)]
pub struct NoObjects;

impl ObjectLayer for NoObjects {
    fn standables(&self) -> Vec<ObjectId> {
        Vec::new()
    }

    fn standable(&mut self, _id: ObjectId) -> Option<&mut dyn Standable> {
        None
    }
}

/// Platform swinging along a sine path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingPlatform {
    pub origin: IVec2,
    /// Peak offset from `origin`
    pub amplitude: IVec2,
    /// Ticks per full swing; 0 keeps it still
    pub period: u32,
    pub half_width: i32,
    pos: IVec2,
    delta: IVec2,
    standing: u8,
}

impl MovingPlatform {
    pub fn new(origin: IVec2, amplitude: IVec2, period: u32, half_width: i32) -> Self {
        Self {
            origin,
            amplitude,
            period,
            half_width,
            pos: origin,
            delta: IVec2::ZERO,
            standing: 0,
        }
    }

    /// Still platform
    pub fn fixed(top_centre: IVec2, half_width: i32) -> Self {
        Self::new(top_centre, IVec2::ZERO, 0, half_width)
    }

    /// Advance to `frame`, recording how far the top moved
    pub fn step(&mut self, frame: u32) {
        let phase = if self.period == 0 {
            0
        } else {
            ((frame % self.period) as u64 * 256 / self.period as u64) as u8
        };
        let s = sin(phase);
        let pos = self.origin + (self.amplitude * s) / 256;
        self.delta = pos - self.pos;
        self.pos = pos;
    }

    /// Shift by a fixed amount this tick (scripted movers)
    pub fn nudge(&mut self, delta: IVec2) {
        self.pos += delta;
        self.delta = delta;
    }

    pub fn is_occupied_by(&self, slot: usize) -> bool {
        slot < 8 && self.standing & (1 << slot) != 0
    }
}

impl Standable for MovingPlatform {
    fn platform(&self) -> Platform {
        Platform {
            x: self.pos.x,
            top: self.pos.y,
            half_width: self.half_width,
            delta: self.delta,
        }
    }

    fn set_standing(&mut self, slot: usize, standing: bool) {
        if slot >= 8 {
            return;
        }
        if standing {
            self.standing |= 1 << slot;
        } else {
            self.standing &= !(1 << slot);
        }
    }
}

/// Moving platforms keyed by id
#[derive(Debug, Default)]
pub struct PlatformList {
    pub platforms: Vec<(ObjectId, MovingPlatform)>,
}

impl PlatformList {
    pub fn push(&mut self, id: ObjectId, platform: MovingPlatform) {
        self.platforms.push((id, platform));
    }

    pub fn step(&mut self, frame: u32) {
        for (_, platform) in &mut self.platforms {
            platform.step(frame);
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&MovingPlatform> {
        self.platforms.iter().find(|(i, _)| *i == id).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut MovingPlatform> {
        self.platforms
            .iter_mut()
            .find(|(i, _)| *i == id)
            .map(|(_, p)| p)
    }
}

impl ObjectLayer for PlatformList {
    fn standables(&self) -> Vec<ObjectId> {
        self.platforms.iter().map(|(id, _)| *id).collect()
    }

    fn standable(&mut self, id: ObjectId) -> Option<&mut dyn Standable> {
        self.get_mut(id).map(|p| p as &mut dyn Standable)
    }
}

/// Keep the player inside the level's horizontal bounds and kill it
/// below the bottom
pub fn level_bound(p: &mut Player, cx: &mut SimContext) {
    let bounds = cx.level.bounds();
    let x = p.x.predict(p.x_vel);
    let left = bounds.left + LEFT_MARGIN;
    let right = bounds.right - RIGHT_MARGIN;
    if x < left || x >= right {
        p.x.snap(if x < left { left } else { right });
        p.x_vel = 0;
        p.inertia = 0;
    }

    if !cx.level.level.map.wrap_vertical && p.y.pixel() > bounds.bottom {
        log::debug!("slot {} fell out of the level", cx.slot);
        kill(p, cx, false);
    }
}

/// Which edge of the object the player is teetering on, if any
///
/// `Less` is the left edge, `Greater` the right one.
pub fn object_edge(cx: &mut SimContext, id: ObjectId, x: i32) -> Option<Ordering> {
    let pf = cx.objects.standable(id)?.platform();
    let offset = x - pf.x + pf.half_width;
    if offset < 2 {
        Some(Ordering::Less)
    } else if offset >= pf.half_width * 2 - 2 {
        Some(Ordering::Greater)
    } else {
        None
    }
}

/// Start standing on `target`
///
/// Speed along the ground becomes the horizontal speed, and a player
/// arriving from the air is landed.
pub fn attach(p: &mut Player, cx: &mut SimContext, target: Attachment) {
    p.attachment = target;
    p.angle = 0;
    p.y_vel = 0;
    p.inertia = p.x_vel;
    let bounce = p.status.in_air && reset_on_floor(p);
    p.status.on_object = true;
    p.status.in_air = false;
    if bounce {
        super::air::bubble_bounce(p, cx);
    }
}

/// Move a rider with the object under it, or drop it off the edge
pub fn ride_object(p: &mut Player, cx: &mut SimContext) {
    let Attachment::Object(id) = p.attachment else {
        return;
    };
    let platform = cx.objects.standable(id).map(|obj| obj.platform());
    let Some(pf) = platform else {
        walk_off(p);
        return;
    };
    if p.status.in_air || p.status.reverse_gravity || !pf.spans(p.x.pixel()) {
        walk_off(p);
        return;
    }
    p.x.add_pixels(pf.delta.x);
    p.y.set_pixel(pf.top - p.radius_y);
}

fn walk_off(p: &mut Player) {
    p.status.on_object = false;
    p.attachment = Attachment::None;
    p.status.in_air = true;
}

/// Land a falling player on the first object that accepts it
pub fn land_on_objects(p: &mut Player, cx: &mut SimContext) {
    if !p.status.in_air || p.y_vel < 0 || p.status.reverse_gravity {
        return;
    }
    let x = p.x.pixel();
    let feet = p.y.pixel() + p.radius_y;
    let slot = cx.slot;

    for id in cx.objects.standables() {
        let Some(obj) = cx.objects.standable(id) else {
            continue;
        };
        if !obj.try_land(slot, x, feet, p.y_vel) {
            continue;
        }
        let top = obj.platform().top;
        p.y.snap(top - p.radius_y);
        attach(p, cx, Attachment::Object(id));
        log::trace!("slot {} landed on object {}", slot, id.0);
        return;
    }
}

/// Tell objects about attachment changes made during a tick
pub fn sync_standing(cx: &mut SimContext, before: Attachment, after: Attachment) {
    if before == after {
        return;
    }
    if let Attachment::Object(id) = before {
        if let Some(obj) = cx.objects.standable(id) {
            obj.set_standing(cx.slot, false);
        }
    }
    if before != Attachment::None {
        cx.events.push(GameEvent::Detached {
            slot: cx.slot,
            from: before,
        });
    }
    if let Attachment::Object(id) = after {
        if let Some(obj) = cx.objects.standable(id) {
            obj.set_standing(cx.slot, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::fixed::Fixed;
    use crate::sim::state::{Animation, Routine};
    use crate::sim::testing::{Harness, floor_level};

    #[test]
    fn test_clamps_to_left_margin() {
        let mut h = Harness::new(floor_level(160));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(18);
        p.x_vel = -0x400;
        p.inertia = -0x400;
        h.with_cx(0, level_bound);
        let p = &h.players[0];
        assert_eq!(p.x.pixel(), LEFT_MARGIN);
        assert_eq!((p.x_vel, p.inertia), (0, 0));
    }

    #[test]
    fn test_clamps_to_right_margin() {
        let mut h = Harness::new(floor_level(160));
        let right = h.level.bounds.right;
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(right - RIGHT_MARGIN - 1);
        p.x_vel = 0x100;
        h.with_cx(0, level_bound);
        assert_eq!(h.players[0].x.pixel(), right - RIGHT_MARGIN);
        assert_eq!(h.players[0].x_vel, 0);
    }

    #[test]
    fn test_below_bottom_kills() {
        let mut h = Harness::new(floor_level(160));
        let bottom = h.level.bounds.bottom;
        h.players[0].y = Fixed::from_pixel(bottom + 1);
        h.with_cx(0, level_bound);
        assert_eq!(h.players[0].routine, Routine::Death);
        assert!(h.events.contains(&GameEvent::Died { slot: 0 }));
    }

    #[test]
    fn test_lands_on_platform_and_rides() {
        let mut h = Harness::new(floor_level(160));
        h.objects
            .push(ObjectId(7), MovingPlatform::fixed(IVec2::new(100, 100), 24));
        let p = &mut h.players[0];
        p.x = Fixed::from_pixel(100);
        p.y = Fixed::from_pixel(100 - STAND_RADIUS_Y + 3);
        p.x_vel = 0x80;
        p.y_vel = 0x300;
        h.with_cx(0, land_on_objects);

        let p = &h.players[0];
        assert!(p.grounded());
        assert!(p.status.on_object);
        assert_eq!(p.attachment, Attachment::Object(ObjectId(7)));
        assert_eq!(p.y.pixel(), 100 - STAND_RADIUS_Y);
        assert_eq!((p.y_vel, p.inertia), (0, 0x80));
        assert_eq!(p.anim, Animation::Walk);

        if let Some(pf) = h.objects.get_mut(ObjectId(7)) {
            pf.nudge(IVec2::new(5, 0));
        }
        let x0 = h.players[0].x.pixel();
        h.with_cx(0, ride_object);
        assert_eq!(h.players[0].x.pixel(), x0 + 5);
        assert!(h.players[0].grounded());
    }

    #[test]
    fn test_walks_off_platform_edge() {
        let mut h = Harness::new(floor_level(160));
        h.objects
            .push(ObjectId(1), MovingPlatform::fixed(IVec2::new(100, 100), 24));
        let p = &mut h.players[0];
        p.status.in_air = false;
        p.status.on_object = true;
        p.attachment = Attachment::Object(ObjectId(1));
        p.x = Fixed::from_pixel(124);
        h.with_cx(0, ride_object);
        let p = &h.players[0];
        assert!(p.status.in_air);
        assert!(!p.status.on_object);
        assert_eq!(p.attachment, Attachment::None);
    }

    #[test]
    fn test_object_edge() {
        let mut h = Harness::new(floor_level(160));
        h.objects
            .push(ObjectId(1), MovingPlatform::fixed(IVec2::new(100, 100), 24));
        let mut edges = Vec::new();
        h.with_cx(0, |_, cx| {
            for x in [76, 77, 78, 100, 121, 122] {
                edges.push(object_edge(cx, ObjectId(1), x));
            }
        });
        assert_eq!(
            edges,
            vec![
                Some(Ordering::Less),
                Some(Ordering::Less),
                None,
                None,
                None,
                Some(Ordering::Greater),
            ]
        );
    }

    #[test]
    fn test_sync_standing_notifies() {
        let mut h = Harness::new(floor_level(160));
        h.objects
            .push(ObjectId(3), MovingPlatform::fixed(IVec2::new(100, 100), 24));
        h.with_cx(0, |_, cx| {
            sync_standing(cx, Attachment::None, Attachment::Object(ObjectId(3)))
        });
        assert!(h.objects.get(ObjectId(3)).is_some_and(|p| p.is_occupied_by(0)));

        h.with_cx(0, |_, cx| {
            sync_standing(cx, Attachment::Object(ObjectId(3)), Attachment::None)
        });
        assert!(!h.objects.get(ObjectId(3)).is_some_and(|p| p.is_occupied_by(0)));
        assert_eq!(
            h.events,
            vec![GameEvent::Detached {
                slot: 0,
                from: Attachment::Object(ObjectId(3)),
            }]
        );
    }

    #[test]
    fn test_sine_platform_reports_delta() {
        let mut pf = MovingPlatform::new(IVec2::new(0, 50), IVec2::new(32, 0), 64, 16);
        pf.step(0);
        assert_eq!(pf.platform().delta, IVec2::ZERO);
        pf.step(16);
        assert_eq!(pf.platform().x, 32);
        assert_eq!(pf.platform().delta, IVec2::new(32, 0));
    }
}
