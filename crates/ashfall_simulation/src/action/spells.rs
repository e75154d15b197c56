//! Заклинания: IceShard, FireChannel, EarthPush, GalePush, Fireball.
//!
//! Instant-касты делят общий update (стоять на месте, ждать анимацию или
//! таймаут). FireChannel — единственный sustained-каст: вход по
//! достаточности (mana > 0), дренаж по тикам, выход по отпусканию кнопки,
//! опустошению или max duration. Визуальная зачистка канала в Exit, чтобы
//! пережить отмену через урон/смерть.

use bevy::prelude::*;

use crate::fx::{EffectKind, EffectSpawned};
use crate::skills::SkillKind;

use super::machine::{ActionState, EnterOutcome, FireChannel, StateCtx};

pub const CAST_DURATION: f32 = 0.45;
pub const ICE_SHARD_DURATION: f32 = 0.4;
pub const FIRE_CHANNEL_MAX_DURATION: f32 = 4.0;

/// Смещения точек спавна ледяных осколков вперёд по facing
const ICE_SHARD_OFFSETS: [f32; 3] = [1.5, 2.5, 3.5];
/// Глубина вертикального probe'а под каждой точкой
const ICE_GROUND_PROBE_DEPTH: f32 = 3.0;

/// Осколки растут из земли: сперва валидация поверхности, и только при
/// непустом наборе точек — списание маны. Пустой набор не тратит ничего.
pub fn enter_ice_shard(timer: &mut f32, ctx: &mut StateCtx) -> EnterOutcome {
    let dir = ctx.facing.dir_x();
    let mut spawn_points: Vec<Vec2> = Vec::new();
    for offset in ICE_SHARD_OFFSETS {
        let probe = ctx.position + Vec2::new(offset * dir, 0.0);
        if let Some(hit) = ctx.spatial.ground_below(probe, ICE_GROUND_PROBE_DEPTH) {
            spawn_points.push(hit.point);
        }
    }
    if spawn_points.is_empty() {
        return EnterOutcome::Abort;
    }

    if !ctx.mana.consume(ctx.skills.mana_cost(SkillKind::IceShard)) {
        return EnterOutcome::Abort;
    }
    ctx.cooldowns.start(SkillKind::IceShard, ctx.skills);

    let sign = ctx.facing.sign();
    for point in spawn_points {
        ctx.out
            .effects
            .push(EffectSpawned::new(EffectKind::IceShard, point, sign));
    }
    *timer = ICE_SHARD_DURATION;
    EnterOutcome::Ok
}

/// Гейт входа — достаточность, не стоимость: канал стартует при любом
/// ненулевом запасе и дренирует по тикам
pub fn enter_fire_channel(
    channel: &mut FireChannel,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> EnterOutcome {
    if ctx.mana.current <= 0.0 {
        return EnterOutcome::Abort;
    }
    channel.elapsed = 0.0;
    ctx.out.effects.push(EffectSpawned::new(
        EffectKind::FlameChannelStart,
        ctx.position,
        ctx.facing.sign(),
    ));
    *timer = FIRE_CHANNEL_MAX_DURATION;
    EnterOutcome::Ok
}

pub fn update_fire_channel(
    channel: &mut FireChannel,
    timer: f32,
    ctx: &mut StateCtx,
) -> Option<ActionState> {
    ctx.body.velocity.x = 0.0;

    let drain = ctx.skills.mana_cost(SkillKind::FireChannel) * ctx.dt;
    if !ctx.input.fire_held || timer < 0.0 || !ctx.mana.consume(drain) {
        return Some(ActionState::Idle);
    }
    channel.elapsed += ctx.dt;
    None
}

pub fn exit_fire_channel(ctx: &mut StateCtx) {
    // Stop-эффект в Exit: срабатывает и при отмене уроном/смертью
    ctx.out.effects.push(EffectSpawned::new(
        EffectKind::FlameChannelStop,
        ctx.position,
        ctx.facing.sign(),
    ));
}

fn enter_aimed_cast(
    kind: SkillKind,
    effect: EffectKind,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> EnterOutcome {
    if !ctx.mana.consume(ctx.skills.mana_cost(kind)) {
        return EnterOutcome::Abort;
    }
    ctx.cooldowns.start(kind, ctx.skills);
    ctx.out
        .effects
        .push(EffectSpawned::new(effect, ctx.position, ctx.facing.sign()));
    *timer = CAST_DURATION;
    EnterOutcome::Ok
}

pub fn enter_earth_push(timer: &mut f32, ctx: &mut StateCtx) -> EnterOutcome {
    enter_aimed_cast(SkillKind::EarthPush, EffectKind::EarthSpike, timer, ctx)
}

pub fn enter_gale_push(timer: &mut f32, ctx: &mut StateCtx) -> EnterOutcome {
    enter_aimed_cast(SkillKind::GalePush, EffectKind::GaleGust, timer, ctx)
}

pub fn enter_fireball(timer: &mut f32, ctx: &mut StateCtx) -> EnterOutcome {
    enter_aimed_cast(SkillKind::Fireball, EffectKind::Fireball, timer, ctx)
}

/// Общий update instant-кастов: стоим, ждём либо конца анимации
/// (trigger от frontend'а), либо fallback-таймаута
pub fn update_cast(timer: f32, trigger: &mut bool, ctx: &mut StateCtx) -> Option<ActionState> {
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
