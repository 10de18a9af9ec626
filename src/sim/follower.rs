//! CPU control for sidekick players
//!
//! A follower replays what the leader did a short while ago, read back
//! from the leader's position record, and corrects for drift by steering
//! toward where the leader was and hopping up when it fell behind below.

use serde::{Deserialize, Serialize};

use super::state::{Animation, Player};
use crate::consts::FOLLOW_DELAY;
use crate::input::ControllerInput;

/// Horizontal gap that makes the follower steer on its own
pub const STEER_DISTANCE: i32 = 0x10;
/// How far above the follower the leader must have been to trigger a hop
pub const JUMP_HEIGHT: i32 = 0x20;
/// Hops are only attempted on frames where `frame & JUMP_INTERVAL_MASK == 0`
pub const JUMP_INTERVAL_MASK: u32 = 0x3F;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerBrain {
    /// Ticks of lag behind the leader
    pub delay: usize,
    /// Holding jump through a hop until landing
    jumping: bool,
}

impl Default for FollowerBrain {
    fn default() -> Self {
        Self {
            delay: FOLLOW_DELAY,
            jumping: false,
        }
    }
}

impl FollowerBrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for `follower` this tick
    pub fn think(&mut self, leader: &Player, follower: &Player, frame: u32) -> ControllerInput {
        let then = leader.record.get(self.delay);
        let mut held = then.input;

        let dx = then.x - follower.x.pixel();
        if dx.abs() >= STEER_DISTANCE {
            held.left = dx < 0;
            held.right = dx > 0;
        }

        if self.jumping {
            if follower.grounded() {
                self.jumping = false;
            } else {
                held.a = true;
            }
        }

        let dy = then.y - follower.y.pixel();
        let hop_frame = frame & JUMP_INTERVAL_MASK == 0;
        if !self.jumping
            && follower.grounded()
            && dy <= -JUMP_HEIGHT
            && hop_frame
            && follower.anim != Animation::Duck
        {
            held.a = true;
            self.jumping = true;
            log::trace!("follower hop, leader {} px above", -dy);
        }

        ControllerInput::from_held(held, follower.input.held)
    }
}
