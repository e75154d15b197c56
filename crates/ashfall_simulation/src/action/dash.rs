//! Dash, GroundDash, ElectricDash.
//!
//! Общая форма: фиксированная длительность, velocity каждый тик
//! переписывается на dash_speed * dir с подавленной вертикалью, ghost mode
//! на всю длительность (avoidance-инвулн). Exit: обнулить горизонталь,
//! вернуть коллизии. ElectricDash поверх этого гоняет deferred
//! телепорт-последовательность и завершается принудительно отрицательным
//! таймером.

use bevy::prelude::*;

use crate::fx::{EffectKind, EffectSpawned};
use crate::skills::SkillKind;

use super::machine::{
    ActionState, BlinkPhase, DashMotion, ElectricDash, EnterOutcome, StateCtx,
};

pub const DASH_DURATION: f32 = 0.25;
pub const DASH_SPEED: f32 = 18.0;

/// Максимальная дальность блинка (клампится лучом до первого препятствия)
pub const BLINK_RANGE: f32 = 6.0;
/// Отступ от точки попадания луча (не телепортироваться в стену)
const BLINK_WALL_MARGIN: f32 = 0.4;
/// Скорость непрерывного движения во время блинка
const BLINK_GLIDE_SPEED: f32 = 10.0;
const BLINK_CHARGE_DELAY: f32 = 0.08;
const BLINK_SETTLE_DELAY: f32 = 0.12;
/// Верхняя граница длительности состояния (фазы завершают раньше)
const BLINK_TIMEOUT: f32 = 1.0;

/// Направление dash'а: знак input'а, при нулевом input'е — facing
fn dash_direction(ctx: &StateCtx) -> f32 {
    if ctx.input.move_x > 0.0 {
        1.0
    } else if ctx.input.move_x < 0.0 {
        -1.0
    } else {
        ctx.facing.dir_x()
    }
}

/// Enter общий для Dash (airborne) и GroundDash — гейты grounded/cooldown
/// уже проверены на request-стороне, здесь только side effects
pub fn enter_dash(
    motion: &mut DashMotion,
    _grounded_variant: bool,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> EnterOutcome {
    motion.dir_x = dash_direction(ctx);
    ctx.profile.ghost = true;
    ctx.cooldowns.start(SkillKind::Dash, ctx.skills);
    ctx.out.effects.push(EffectSpawned::new(
        EffectKind::DashTrail,
        ctx.position,
        ctx.facing.sign(),
    ));
    *timer = DASH_DURATION;
    EnterOutcome::Ok
}

pub fn update_dash(
    motion: &DashMotion,
    timer: f32,
    ctx: &mut StateCtx,
) -> Option<ActionState> {
    // Полный override velocity, вертикаль подавлена
    ctx.body.velocity = Vec2::new(DASH_SPEED * motion.dir_x, 0.0);

    if timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

pub fn exit_dash(ctx: &mut StateCtx) {
    ctx.body.velocity.x = 0.0;
    ctx.profile.ghost = false;
}

pub fn enter_electric_dash(
    blink: &mut ElectricDash,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> EnterOutcome {
    let cost = ctx.skills.mana_cost(SkillKind::ElectricDash);
    if !ctx.mana.consume(cost) {
        return EnterOutcome::Abort;
    }

    blink.dir_x = dash_direction(ctx);
    let dir = Vec2::new(blink.dir_x, 0.0);

    // Луч вперёд клампит дистанцию до первого препятствия
    let travel = match ctx.spatial.cast_ray(ctx.position, dir, BLINK_RANGE) {
        Some(hit) => (hit.distance - BLINK_WALL_MARGIN).max(0.0),
        None => BLINK_RANGE,
    };
    let destination = ctx.position + dir * travel;

    ctx.profile.ghost = true;
    ctx.cooldowns.start(SkillKind::ElectricDash, ctx.skills);
    ctx.out.effects.push(EffectSpawned::new(
        EffectKind::ElectricFlash,
        ctx.position,
        ctx.facing.sign(),
    ));

    blink.phase = BlinkPhase::Charge {
        wait: BLINK_CHARGE_DELAY,
        destination,
    };
    *timer = BLINK_TIMEOUT;
    EnterOutcome::Ok
}

/// Телепорт decoupled от непрерывного velocity: фазовый объект двигает
/// последовательность, velocity применяется каждый тик как у dash'а
pub fn update_electric_dash(
    blink: &mut ElectricDash,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> Option<ActionState> {
    ctx.body.velocity = Vec2::new(BLINK_GLIDE_SPEED * blink.dir_x, 0.0);

    match &mut blink.phase {
        BlinkPhase::Charge { wait, destination } => {
            *wait -= ctx.dt;
            if *wait <= 0.0 {
                ctx.out.teleport_to = Some(*destination);
                ctx.out.effects.push(EffectSpawned::new(
                    EffectKind::ElectricArrive,
                    *destination,
                    ctx.facing.sign(),
                ));
                blink.phase = BlinkPhase::Settle {
                    wait: BLINK_SETTLE_DELAY,
                };
            }
        }
        BlinkPhase::Settle { wait } => {
            *wait -= ctx.dt;
            if *wait <= 0.0 {
                // Завершение сигналится принудительно отрицательным таймером
                *timer = -1.0;
            }
        }
    }

    if *timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}
