//! VoidRush: исчезновение, серия из трёх ударов по выбранной цели,
//! реявление за её спиной.
//!
//! Валидация в Enter строго по порядку: цель → мана → side effects.
//! Весь скрипт — фазовый объект, движимый тиками; персонаж неподвижен
//! и бесплотен (ghost) на всю длительность.

use bevy::prelude::*;

use crate::fx::{EffectKind, EffectSpawned};
use crate::logger::log;
use crate::skills::SkillKind;

use super::machine::{ActionState, EnterOutcome, StateCtx, VoidPhase, VoidRush};

/// Радиус захвата цели
pub const TARGET_RANGE: f32 = 5.0;
/// Ударов в серии
pub const STRIKE_COUNT: u8 = 3;
/// Множитель урона каждого удара от базового
const STRIKE_DAMAGE_MULT: f32 = 0.6;
/// Реявление за спиной цели: смещение по X против её facing
const REAPPEAR_BACK_OFFSET: f32 = 1.2;

const VANISH_DELAY: f32 = 0.3;
const STRIKE_INTERVAL: f32 = 0.25;
const REAPPEAR_DELAY: f32 = 0.3;
/// Верхняя граница длительности на случай зависшей фазы
const TIMEOUT: f32 = 5.0;

pub fn enter(rush: &mut VoidRush, timer: &mut f32, ctx: &mut StateCtx) -> EnterOutcome {
    // Сначала цель: нет цели — мана не тратится
    let Some(target) = ctx.hostiles.nearest_within(ctx.position, TARGET_RANGE) else {
        return EnterOutcome::Abort;
    };
    let target_entity = target.entity;

    if !ctx.mana.consume(ctx.skills.mana_cost(SkillKind::VoidRush)) {
        return EnterOutcome::Abort;
    }
    ctx.cooldowns.start(SkillKind::VoidRush, ctx.skills);

    ctx.profile.ghost = true;
    ctx.out.effects.push(EffectSpawned::new(
        EffectKind::VoidVanish,
        ctx.position,
        ctx.facing.sign(),
    ));

    rush.target = target_entity;
    rush.phase = VoidPhase::Vanish { wait: VANISH_DELAY };
    *timer = TIMEOUT;
    EnterOutcome::Ok
}

pub fn update(rush: &mut VoidRush, timer: &mut f32, ctx: &mut StateCtx) -> Option<ActionState> {
    // Персонаж не движется и не падает на всю длительность скрипта
    ctx.body.velocity = Vec2::ZERO;

    match &mut rush.phase {
        VoidPhase::Vanish { wait } => {
            *wait -= ctx.dt;
            if *wait <= 0.0 {
                rush.phase = VoidPhase::Strikes {
                    remaining: STRIKE_COUNT,
                    wait: STRIKE_INTERVAL,
                };
            }
        }
        VoidPhase::Strikes { remaining, wait } => {
            *wait -= ctx.dt;
            if *wait <= 0.0 {
                let left = *remaining;
                match ctx.hostiles.by_entity(rush.target) {
                    Some(target) => {
                        let damage =
                            (ctx.stats.base_damage as f32 * STRIKE_DAMAGE_MULT).round() as u32;
                        ctx.out.strikes.push(crate::combat::StrikeLanded {
                            target: target.entity,
                            damage,
                        });
                        ctx.out.effects.push(EffectSpawned::new(
                            EffectKind::VoidStrike,
                            target.position,
                            ctx.facing.sign(),
                        ));

                        if left <= 1 {
                            // Серия закончена: реявиться за спиной цели
                            let behind = target.position
                                - Vec2::new(target.facing_sign as f32 * REAPPEAR_BACK_OFFSET, 0.0);
                            ctx.out.teleport_to = Some(behind);
                            ctx.facing.face_towards(target.position.x - behind.x);
                            ctx.out.effects.push(EffectSpawned::new(
                                EffectKind::VoidReappear,
                                behind,
                                ctx.facing.sign(),
                            ));
                            rush.phase = VoidPhase::Reappear {
                                wait: REAPPEAR_DELAY,
                            };
                        } else {
                            rush.phase = VoidPhase::Strikes {
                                remaining: left - 1,
                                wait: STRIKE_INTERVAL,
                            };
                        }
                    }
                    None => {
                        // Цель умерла/пропала посреди серии — сворачиваемся
                        // на текущей позиции без оставшихся ударов
                        log("⚫ VoidRush: цель потеряна, ранний выход из серии");
                        ctx.out.effects.push(EffectSpawned::new(
                            EffectKind::VoidReappear,
                            ctx.position,
                            ctx.facing.sign(),
                        ));
                        rush.phase = VoidPhase::Reappear {
                            wait: REAPPEAR_DELAY,
                        };
                    }
                }
            }
        }
        VoidPhase::Reappear { wait } => {
            *wait -= ctx.dt;
            if *wait <= 0.0 {
                *timer = -1.0;
            }
        }
    }

    if *timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

pub fn exit(ctx: &mut StateCtx) {
    ctx.profile.ghost = false;
    ctx.body.velocity = Vec2::ZERO;
}
