//! Sound-effect requests
//!
//! The simulation never plays audio itself. It queues fire-and-forget
//! requests that the audio collaborator drains once per tick.

use serde::{Deserialize, Serialize};

/// Sound effects the core asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    Jump,
    Roll,
    Skid,
    SpindashRev,
    SpindashRelease,
    /// Rings scattered on hurt
    RingLoss,
    Hurt,
    HurtBySpikes,
    Death,
    Splash,
    FireAttack,
    LightningAttack,
    BubbleAttack,
    BubbleBounce,
    InstaShield,
}

/// Something that can play sound effects
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Requests collected during a tick
#[derive(Debug, Clone, Default)]
pub struct SoundQueue {
    requests: Vec<SoundEffect>,
    muted: bool,
}

impl SoundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, effect: SoundEffect) {
        if !self.muted {
            self.requests.push(effect);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.requests.clear();
        }
    }

    pub fn contains(&self, effect: SoundEffect) -> bool {
        self.requests.contains(&effect)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Hand every queued request to a sink, in order
    pub fn flush(&mut self, sink: &mut dyn AudioSink) {
        for effect in self.requests.drain(..) {
            sink.play(effect);
        }
    }
}

/// Sink that just logs, for headless runs
#[derive(Debug, Default)]
pub struct LogSink {
    pub played: usize,
}

impl AudioSink for LogSink {
    fn play(&mut self, effect: SoundEffect) {
        self.played += 1;
        log::debug!("sfx {:?}", effect);
    }
}
