//! Getting hurt, dying and the restart countdown

use super::air::fall;
use super::boundary::level_bound;
use super::collision::{level_collision, reset_on_floor};
use super::state::{Animation, GameEvent, Player, Routine, Shield};
use super::tick::SimContext;
use crate::audio::SoundEffect;
use crate::consts::*;

/// Knock the player back from a hazard at `source_x`
///
/// The shield absorbs the hit first, then the rings scatter; with neither
/// the player dies. Returns `false` while invulnerable or not in control.
pub fn hurt(p: &mut Player, cx: &mut SimContext, source_x: i32, spikes: bool) -> bool {
    if p.routine != Routine::Control || p.invulnerable > 0 {
        return false;
    }

    if p.shield != Shield::None {
        p.shield = Shield::None;
        cx.events.push(GameEvent::ShieldLost { slot: cx.slot });
    } else if p.rings == 0 {
        kill(p, cx, spikes);
        return true;
    } else {
        cx.events.push(GameEvent::RingLoss {
            slot: cx.slot,
            count: p.rings,
            x: p.x.pixel(),
            y: p.world_y(),
        });
        p.rings = 0;
        cx.sounds.request(SoundEffect::RingLoss);
    }

    p.routine = Routine::Hurt;
    reset_on_floor(p);
    p.set_airborne();
    let (x_speed, y_speed) = if p.status.underwater {
        (HURT_X_SPEED / 2, HURT_Y_SPEED / 2)
    } else {
        (HURT_X_SPEED, HURT_Y_SPEED)
    };
    p.x_vel = if p.x.pixel() >= source_x { x_speed } else { -x_speed };
    p.y_vel = y_speed;
    p.inertia = 0;
    p.anim = Animation::Hurt;
    p.invulnerable = INVULNERABLE_TICKS;
    p.spindash = None;

    cx.sounds.request(if spikes {
        SoundEffect::HurtBySpikes
    } else {
        SoundEffect::Hurt
    });
    cx.events.push(GameEvent::Hurt { slot: cx.slot });
    log::debug!("slot {} hurt, knocked back {:#x}", cx.slot, p.x_vel);
    true
}

/// Start the death fall; ignored in debug mode and when already dead
pub fn kill(p: &mut Player, cx: &mut SimContext, spikes: bool) {
    if !matches!(p.routine, Routine::Control | Routine::Hurt) {
        return;
    }
    p.shield = Shield::None;
    p.speed_shoes = 0;
    p.routine = Routine::Death;
    reset_on_floor(p);
    p.set_airborne();
    p.y_vel = DEATH_Y_SPEED;
    p.x_vel = 0;
    p.inertia = 0;
    p.spindash = None;
    p.anim = Animation::Death;

    cx.sounds.request(if spikes {
        SoundEffect::HurtBySpikes
    } else {
        SoundEffect::Death
    });
    cx.events.push(GameEvent::Died { slot: cx.slot });
    log::info!("slot {} died", cx.slot);
}

/// Hurt routine: ballistic knock-back until touching the ground
pub fn run_hurt(p: &mut Player, cx: &mut SimContext) {
    p.apply_velocity();
    p.y_vel += HURT_GRAVITY;
    if p.status.underwater {
        p.y_vel -= HURT_WATER_GRAVITY_CUT;
    }

    level_collision(p, cx);
    if !p.status.in_air {
        p.x_vel = 0;
        p.y_vel = 0;
        p.inertia = 0;
        p.status.object_control = false;
        p.anim = Animation::Walk;
        p.routine = Routine::Control;
        p.invulnerable = INVULNERABLE_TICKS;
        p.spindash = None;
    }
    level_bound(p, cx);
}

/// Death routine: fall through everything, then start the restart countdown
pub fn run_death(p: &mut Player, cx: &mut SimContext) {
    p.spindash = None;
    if p.y.pixel() > cx.level.bounds().bottom + DEATH_FALL_MARGIN {
        p.lives = p.lives.saturating_sub(1);
        if p.lives == 0 {
            // A spent countdown never restarts the level
            p.routine = Routine::ResetLevel { countdown: 0 };
            cx.events.push(GameEvent::GameOver { slot: cx.slot });
            log::info!("slot {} game over", cx.slot);
        } else {
            p.routine = Routine::ResetLevel {
                countdown: RESTART_COUNTDOWN,
            };
        }
        return;
    }
    fall(p, cx);
}

/// Count down to the restart; `true` on the tick it finishes
pub fn run_reset(p: &mut Player) -> bool {
    let Routine::ResetLevel { countdown } = p.routine else {
        return false;
    };
    match countdown {
        0 => false,
        1 => {
            p.routine = Routine::ResetLevel { countdown: 0 };
            true
        }
        n => {
            p.routine = Routine::ResetLevel { countdown: n - 1 };
            false
        }
    }
}
