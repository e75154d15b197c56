//! Защитные и терминальные состояния: Parry, SuccessfulParry, Stunned, Dead.
//!
//! Выбор Parry/SuccessfulParry происходит на request-стороне (по снапшоту
//! окон врагов); здесь SuccessfulParry синхронно в Enter разрешает
//! нотификации врагам, а Exit выдаёт invuln-окно только при подтверждённом
//! парировании — отмена уроном до Exit окно не выдаст.

use bevy::prelude::*;

use crate::fx::{EffectKind, EffectSpawned};
use crate::logger::log;

use super::machine::{ActionState, EnterOutcome, ParryResolve, StateCtx};

pub const PARRY_DURATION: f32 = 0.3;
pub const SUCCESSFUL_PARRY_DURATION: f32 = 0.35;
/// Invuln-окно после подтверждённого парирования
pub const PARRY_REWARD_WINDOW: f32 = 1.0;
/// Радиус разрешения парирования
pub const PARRY_RANGE: f32 = 2.0;

pub const STUN_DURATION: f32 = 0.5;

/// Промах: стойка отыгрывается целиком, без наград
pub fn enter_parry(timer: &mut f32, _ctx: &mut StateCtx) -> EnterOutcome {
    *timer = PARRY_DURATION;
    EnterOutcome::Ok
}

pub fn update_parry(timer: f32, ctx: &mut StateCtx) -> Option<ActionState> {
    ctx.body.velocity.x = 0.0;
    if timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

/// Разрешение — синхронно здесь, по снапшоту врагов этого тика:
/// каждый parryable-враг с открытым окном в радиусе получает нотификацию
/// ровно один раз
pub fn enter_successful_parry(
    resolve: &mut ParryResolve,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> EnterOutcome {
    ctx.invuln.block = true;

    let range_sq = PARRY_RANGE * PARRY_RANGE;
    for contact in &ctx.hostiles.contacts {
        if !contact.parryable || !contact.parry_open {
            continue;
        }
        if contact.position.distance_squared(ctx.position) > range_sq {
            continue;
        }
        if resolve.struck.contains(&contact.entity) {
            continue;
        }
        if !resolve.was_successful {
            ctx.out.effects.push(EffectSpawned::new(
                EffectKind::ParrySpark,
                ctx.position,
                ctx.facing.sign(),
            ));
            resolve.was_successful = true;
        }
        resolve.struck.push(contact.entity);
        ctx.out.parried.push(contact.entity);
    }

    *timer = SUCCESSFUL_PARRY_DURATION;
    EnterOutcome::Ok
}

pub fn update_successful_parry(
    timer: f32,
    trigger: &mut bool,
    ctx: &mut StateCtx,
) -> Option<ActionState> {
    ctx.body.velocity.x = 0.0;

    if *trigger {
        *trigger = false;
        return Some(ActionState::Idle);
    }
    if timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

pub fn exit_successful_parry(resolve: &ParryResolve, ctx: &mut StateCtx) {
    ctx.invuln.block = false;
    if resolve.was_successful {
        ctx.invuln.grant_window(PARRY_REWARD_WINDOW);
    }
}

pub fn enter_stunned(timer: &mut f32, ctx: &mut StateCtx) -> EnterOutcome {
    ctx.body.velocity = Vec2::ZERO;
    *timer = STUN_DURATION;
    EnterOutcome::Ok
}

pub fn update_stunned(timer: f32, ctx: &mut StateCtx) -> Option<ActionState> {
    ctx.body.velocity = Vec2::ZERO;
    if timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

/// Терминал: выход только через внешний respawn
pub fn enter_dead(ctx: &mut StateCtx) -> EnterOutcome {
    ctx.profile.disabled = true;
    ctx.body.zero();
    ctx.body.frozen = true;
    log("💀 Персонаж мёртв, ожидание respawn");
    EnterOutcome::Ok
}

pub fn exit_dead(ctx: &mut StateCtx) {
    ctx.profile.disabled = false;
    ctx.body.frozen = false;
}
