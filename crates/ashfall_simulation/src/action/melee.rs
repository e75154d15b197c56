//! Melee комбо: sword / hammer / crouch-attack.
//!
//! Порядок Enter'а: combo bookkeeping → facing correction по ближайшему
//! врагу → расчёт урона по индексу комбо → очистка hit registry. Exit
//! инкрементирует счётчик и ставит timestamp — окно комбо меряется от
//! выхода из предыдущего замаха.

use bevy::prelude::*;

use crate::combat::StrikeLanded;
use crate::components::WeaponKind;

use super::machine::{ActionState, EnterOutcome, MeleeAttack, StateCtx};

/// Окно комбо: сколько секунд после Exit следующий замах продолжает серию
pub const COMBO_WINDOW: f32 = 0.5;

pub const SWORD_SWING_DURATION: f32 = 0.5;
pub const HAMMER_SWING_DURATION: f32 = 0.8;
pub const CROUCH_SWING_DURATION: f32 = 0.4;

// Hitbox замаха (прямоугольник перед персонажем)
const HIT_OFFSET_X: f32 = 0.9;
const HIT_HALF_W: f32 = 0.8;
const HIT_HALF_H: f32 = 0.6;

// Targeting-объём для facing correction: бокс вокруг персонажа, шире
// hitbox'а — враг за спиной тоже разворачивает
const TARGET_HALF_W: f32 = 2.0;
const TARGET_HALF_H: f32 = 1.2;

/// Семейство атаки — у каждого свой combo tracker и длительность
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeleeFamily {
    Sword,
    Hammer,
    Crouch,
}

impl MeleeFamily {
    pub fn swing_duration(&self) -> f32 {
        match self {
            MeleeFamily::Sword => SWORD_SWING_DURATION,
            MeleeFamily::Hammer => HAMMER_SWING_DURATION,
            MeleeFamily::Crouch => CROUCH_SWING_DURATION,
        }
    }
}

/// Счётчик серии ударов одного семейства
///
/// Инвариант: на каждом Enter counter ∈ {0,1,2}; сбрасывается в 0, если
/// окно истекло или счётчик уже перевалил за 2 (после третьего удара).
#[derive(Debug, Clone, Copy, Reflect)]
pub struct ComboTracker {
    pub counter: u8,
    pub last_attack_at: f64,
}

impl Default for ComboTracker {
    fn default() -> Self {
        Self {
            counter: 0,
            last_attack_at: f64::NEG_INFINITY,
        }
    }
}

impl ComboTracker {
    /// Вызывается в Enter замаха: reset vs continuation
    pub fn begin(&mut self, now: f64) {
        let stale = now - self.last_attack_at > COMBO_WINDOW as f64;
        if stale || self.counter > 2 {
            self.counter = 0;
        }
    }

    /// Вызывается в Exit замаха: инкремент + timestamp
    pub fn finish(&mut self, now: f64) {
        self.counter += 1;
        self.last_attack_at = now;
    }
}

/// Combo trackers персонажа (по одному на семейство)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ComboTrackers {
    pub sword: ComboTracker,
    pub hammer: ComboTracker,
    pub crouch: ComboTracker,
}

impl ComboTrackers {
    pub fn get_mut(&mut self, family: MeleeFamily) -> &mut ComboTracker {
        match family {
            MeleeFamily::Sword => &mut self.sword,
            MeleeFamily::Hammer => &mut self.hammer,
            MeleeFamily::Crouch => &mut self.crouch,
        }
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}

/// Урон замаха: множитель по индексу комбо; hammer дополнительно
/// подмешивает raw damage stat (нормализация к 100-очковой шкале)
fn swing_damage(ctx: &StateCtx, family: MeleeFamily, combo_index: u8) -> u32 {
    let base = ctx.stats.base_damage as f32;
    let mut mult = ctx.stats.combo_multiplier(combo_index);
    if family == MeleeFamily::Hammer {
        mult *= 1.0 + ctx.stats.base_damage as f32 / 100.0;
    }
    (base * mult).round() as u32
}

fn point_in_box(point: Vec2, center: Vec2, half_w: f32, half_h: f32) -> bool {
    (point.x - center.x).abs() <= half_w && (point.y - center.y).abs() <= half_h
}

pub fn enter_swing(
    atk: &mut MeleeAttack,
    family: MeleeFamily,
    timer: &mut f32,
    ctx: &mut StateCtx,
) -> EnterOutcome {
    // 1. Combo bookkeeping: reset vs continuation
    let tracker = ctx.combos.get_mut(family);
    tracker.begin(ctx.now);
    atk.combo_index = tracker.counter;

    // 2. Facing correction: ближайший враг в targeting-объёме; flip только
    //    при несовпадении знака горизонтального смещения
    let nearest = ctx
        .hostiles
        .contacts
        .iter()
        .filter(|c| point_in_box(c.position, ctx.position, TARGET_HALF_W, TARGET_HALF_H))
        .min_by(|a, b| {
            a.position
                .distance_squared(ctx.position)
                .total_cmp(&b.position.distance_squared(ctx.position))
        });
    if let Some(target) = nearest {
        ctx.facing.face_towards(target.position.x - ctx.position.x);
    }

    // 3. Урон считается один раз на весь замах
    atk.damage = swing_damage(ctx, family, atk.combo_index);

    // 4. Свежий hit registry: новый замах может снова ударить всех
    atk.hit_entities.clear();

    *timer = family.swing_duration();
    EnterOutcome::Ok
}

pub fn update_swing(
    atk: &mut MeleeAttack,
    _family: MeleeFamily,
    timer: f32,
    trigger: &mut bool,
    ctx: &mut StateCtx,
) -> Option<ActionState> {
    ctx.body.velocity.x = 0.0;

    // Hitbox проверяется каждый тик; hit registry гарантирует не больше
    // одного удара по одной цели за свинг
    let hitbox_center = ctx.position + Vec2::new(HIT_OFFSET_X * ctx.facing.dir_x(), 0.0);
    for contact in &ctx.hostiles.contacts {
        if atk.hit_entities.contains(&contact.entity) {
            continue;
        }
        if point_in_box(contact.position, hitbox_center, HIT_HALF_W, HIT_HALF_H) {
            atk.hit_entities.push(contact.entity);
            ctx.out.strikes.push(StrikeLanded {
                target: contact.entity,
                damage: atk.damage,
            });
        }
    }

    // Два канонических сигнала завершения: animation-complete или таймер
    if *trigger {
        *trigger = false;
        return Some(ActionState::Idle);
    }
    if timer < 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

pub fn exit_swing(family: MeleeFamily, ctx: &mut StateCtx) {
    ctx.combos.get_mut(family).finish(ctx.now);
}

/// Какое melee-состояние даёт текущее оружие (capability tag, не type test)
pub fn standing_attack_state(weapon: WeaponKind) -> ActionState {
    match weapon {
        WeaponKind::Sword => ActionState::Melee(MeleeAttack::default()),
        WeaponKind::Hammer => ActionState::HammerMelee(MeleeAttack::default()),
    }
}
