//! Per-tick controller snapshots
//!
//! The input collaborator polls devices and hands the simulation one
//! [`ControllerInput`] per player slot per tick. The core never persists it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Analog deflection past which the stick counts as a d-pad press
pub const STICK_DEADZONE: f32 = 0.5;

/// Digital button state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Buttons {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub start: bool,
}

impl Buttons {
    pub const NONE: Buttons = Buttons {
        up: false,
        down: false,
        left: false,
        right: false,
        a: false,
        b: false,
        c: false,
        start: false,
    };

    /// Any of the three jump buttons
    pub fn jump(&self) -> bool {
        self.a || self.b || self.c
    }

    /// Left or right held
    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    /// Buttons down now that weren't down before
    pub fn newly_pressed(self, previous: Buttons) -> Buttons {
        Buttons {
            up: self.up && !previous.up,
            down: self.down && !previous.down,
            left: self.left && !previous.left,
            right: self.right && !previous.right,
            a: self.a && !previous.a,
            b: self.b && !previous.b,
            c: self.c && !previous.c,
            start: self.start && !previous.start,
        }
    }

    pub fn with_right(mut self) -> Self {
        self.right = true;
        self
    }

    pub fn with_left(mut self) -> Self {
        self.left = true;
        self
    }

    pub fn with_down(mut self) -> Self {
        self.down = true;
        self
    }

    pub fn with_jump(mut self) -> Self {
        self.a = true;
        self
    }
}

/// One slot's input for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerInput {
    pub held: Buttons,
    /// Edge-triggered: down this tick and not the previous one
    pub pressed: Buttons,
    /// Raw stick deflection, each axis in `-1.0..=1.0`, +y down
    #[serde(default)]
    pub stick: Vec2,
}

impl ControllerInput {
    /// Build this tick's input from the held state and last tick's held state
    pub fn from_held(held: Buttons, previous: Buttons) -> Self {
        Self {
            held,
            pressed: held.newly_pressed(previous),
            stick: Vec2::ZERO,
        }
    }

    /// Held and pressed with stick deflection folded into the d-pad
    pub fn digital(&self, previous_held: Buttons) -> Self {
        let mut held = self.held;
        held.left |= self.stick.x <= -STICK_DEADZONE;
        held.right |= self.stick.x >= STICK_DEADZONE;
        held.up |= self.stick.y <= -STICK_DEADZONE;
        held.down |= self.stick.y >= STICK_DEADZONE;

        let mut pressed = self.pressed;
        let stick_edges = held.newly_pressed(previous_held);
        pressed.left |= stick_edges.left;
        pressed.right |= stick_edges.right;
        pressed.up |= stick_edges.up;
        pressed.down |= stick_edges.down;

        Self {
            held,
            pressed,
            stick: self.stick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressed_is_edge_triggered() {
        let first = ControllerInput::from_held(Buttons::NONE.with_jump(), Buttons::NONE);
        assert!(first.pressed.a);
        let second = ControllerInput::from_held(Buttons::NONE.with_jump(), first.held);
        assert!(second.held.a);
        assert!(!second.pressed.a);
    }

    #[test]
    fn test_stick_folds_into_dpad() {
        let input = ControllerInput {
            stick: Vec2::new(0.8, 0.2),
            ..Default::default()
        };
        let d = input.digital(Buttons::NONE);
        assert!(d.held.right);
        assert!(d.pressed.right);
        assert!(!d.held.down);

        let again = input.digital(d.held);
        assert!(again.held.right);
        assert!(!again.pressed.right);
    }
}
