//! Action state machine персонажа: 20 взаимоисключающих состояний.
//!
//! Протокол переходов:
//! - `change_state`: Exit(старого) ПОЛНОСТЬЮ завершается до Enter(нового)
//! - центральной валидации переходов нет — Enter каждого состояния сам
//!   решает, может ли оно начаться (soft-fail → редирект в Idle, ноль
//!   side effects)
//! - повторный вход в текущее состояние охраняется на call site
//!   (request checks), не внутри машины
//!
//! Логика состояний чистая: работает через `StateCtx` (split borrows
//! компонентов + out-буферы событий), поэтому юнит-тестируется без App.

use bevy::prelude::*;

use crate::combat::StrikeLanded;
use crate::components::{
    CharacterStats, Facing, Invulnerability, Mana, NearbyHostiles, PhysicsBody, WeaponKind,
};
use crate::fx::EffectSpawned;
use crate::input::FrameInput;
use crate::physics::{CollisionProfile, GroundSensor, SpatialView};
use crate::skills::{Cooldowns, SkillRegistry};

use super::melee::{ComboTrackers, MeleeFamily};
use super::{dash, defense, locomotion, melee, spells, void_rush};

// ============================================================================
// State data
// ============================================================================

/// Данные одного замаха (sword/hammer/crouch)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeleeAttack {
    /// Индекс комбо на момент Enter (0..=2)
    pub combo_index: u8,
    /// Урон замаха (посчитан один раз в Enter)
    pub damage: u32,
    /// Hit registry: кого этот замах уже ударил (макс один удар за свинг)
    pub hit_entities: Vec<Entity>,
}

/// Данные dash'а (направление фиксируется в Enter)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashMotion {
    pub dir_x: f32,
}

/// Фазы electric dash (deferred телепорт поверх непрерывного velocity)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkPhase {
    /// Вспышка уже показана, ждём телепорт
    Charge { wait: f32, destination: Vec2 },
    /// Телепорт выполнен, короткая пауза до завершения
    Settle { wait: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricDash {
    pub dir_x: f32,
    pub phase: BlinkPhase,
}

impl Default for ElectricDash {
    fn default() -> Self {
        Self {
            dir_x: 1.0,
            phase: BlinkPhase::Charge {
                wait: 0.0,
                destination: Vec2::ZERO,
            },
        }
    }
}

/// Channeled огонь: drain каждый тик пока держат кнопку
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FireChannel {
    pub elapsed: f32,
}

/// Фазы void rush (vanish → strikes → reappear)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoidPhase {
    Vanish { wait: f32 },
    Strikes { remaining: u8, wait: f32 },
    Reappear { wait: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoidRush {
    pub target: Entity,
    pub phase: VoidPhase,
}

impl Default for VoidRush {
    fn default() -> Self {
        // target перезаписывается в Enter до любого использования
        Self {
            target: Entity::PLACEHOLDER,
            phase: VoidPhase::Vanish { wait: 0.0 },
        }
    }
}

/// Результат разрешения успешного парирования (заполняется в Enter)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParryResolve {
    pub was_successful: bool,
    /// Кто уже получил "parried" нотификацию (ровно один раз каждый)
    pub struck: Vec<Entity>,
}

/// Состояние персонажа. Всегда ровно одно.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionState {
    #[default]
    Idle,
    Move,
    Air,
    Crouch,
    Melee(MeleeAttack),
    HammerMelee(MeleeAttack),
    CrouchMelee(MeleeAttack),
    Dash(DashMotion),
    GroundDash(DashMotion),
    ElectricDash(ElectricDash),
    IceShard,
    FireChannel(FireChannel),
    EarthPush,
    GalePush,
    Fireball,
    VoidRush(VoidRush),
    Parry,
    SuccessfulParry(ParryResolve),
    Stunned,
    Dead,
}

impl ActionState {
    pub fn name(&self) -> &'static str {
        match self {
            ActionState::Idle => "Idle",
            ActionState::Move => "Move",
            ActionState::Air => "Air",
            ActionState::Crouch => "Crouch",
            ActionState::Melee(_) => "Melee",
            ActionState::HammerMelee(_) => "HammerMelee",
            ActionState::CrouchMelee(_) => "CrouchMelee",
            ActionState::Dash(_) => "Dash",
            ActionState::GroundDash(_) => "GroundDash",
            ActionState::ElectricDash(_) => "ElectricDash",
            ActionState::IceShard => "IceShard",
            ActionState::FireChannel(_) => "FireChannel",
            ActionState::EarthPush => "EarthPush",
            ActionState::GalePush => "GalePush",
            ActionState::Fireball => "Fireball",
            ActionState::VoidRush(_) => "VoidRush",
            ActionState::Parry => "Parry",
            ActionState::SuccessfulParry(_) => "SuccessfulParry",
            ActionState::Stunned => "Stunned",
            ActionState::Dead => "Dead",
        }
    }

    /// Каст/канал заклинания активен: пассивный реген маны приостановлен,
    /// иначе дренаж канала нивелируется и канал никогда не иссякает
    pub fn is_spellcasting(&self) -> bool {
        matches!(
            self,
            ActionState::IceShard
                | ActionState::FireChannel(_)
                | ActionState::EarthPush
                | ActionState::GalePush
                | ActionState::Fireball
        )
    }
}

// ============================================================================
// Context
// ============================================================================

/// Буферы исходящих событий состояния (driver сбрасывает их в EventWriter'ы)
#[derive(Debug, Default)]
pub struct StateOutput {
    pub effects: Vec<EffectSpawned>,
    pub strikes: Vec<StrikeLanded>,
    /// Враги, получившие "parried" нотификацию
    pub parried: Vec<Entity>,
    pub teleport_to: Option<Vec2>,
}

/// Всё, что видит и мутирует логика состояния за один тик
pub struct StateCtx<'a> {
    pub dt: f32,
    /// Время симуляции (секунды от старта) — для combo timestamps
    pub now: f64,
    /// Позиция персонажа на начало тика (копия)
    pub position: Vec2,
    pub body: &'a mut PhysicsBody,
    pub facing: &'a mut Facing,
    pub mana: &'a mut Mana,
    pub stats: &'a CharacterStats,
    pub weapon: WeaponKind,
    pub skills: &'a SkillRegistry,
    pub cooldowns: &'a mut Cooldowns,
    pub combos: &'a mut ComboTrackers,
    pub input: &'a FrameInput,
    pub ground: &'a GroundSensor,
    pub hostiles: &'a NearbyHostiles,
    pub profile: &'a mut CollisionProfile,
    pub invuln: &'a mut Invulnerability,
    pub spatial: &'a dyn SpatialView,
    pub out: &'a mut StateOutput,
}

/// Вердикт Enter'а: Abort = валидация не прошла, редирект в Idle
/// (никаких side effects до точки проверки)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    Ok,
    Abort,
}

// ============================================================================
// Machine
// ============================================================================

/// Машина состояний персонажа
///
/// `timer` — state timer (countdown, семантика у каждого состояния своя);
/// `trigger_called` поднимается ТОЛЬКО внешним animation-complete сигналом
/// и гасится состоянием, которое его прочитало.
#[derive(Component, Debug, Default)]
pub struct ActionMachine {
    state: ActionState,
    pub timer: f32,
    pub trigger_called: bool,
}

impl ActionMachine {
    pub fn state(&self) -> &ActionState {
        &self.state
    }

    /// Одинаковый ли вид состояния (guard повторного входа на call site)
    pub fn same_kind(&self, other: &ActionState) -> bool {
        std::mem::discriminant(&self.state) == std::mem::discriminant(other)
    }

    /// Внешний animation-complete сигнал — единственный путь к trigger_called
    pub fn on_animation_complete(&mut self) {
        self.trigger_called = true;
    }

    /// Exit(старого) → Enter(нового). Exit не предполагает, что новое
    /// состояние уже активно (его ещё нет). Abort в Enter — редирект в Idle.
    pub fn change_state(&mut self, ctx: &mut StateCtx, next: ActionState) {
        self.run_exit(ctx);
        self.timer = 0.0;
        self.trigger_called = false;
        self.state = next;

        if let EnterOutcome::Abort = self.run_enter(ctx) {
            crate::log(&format!(
                "Action: {} rejected at Enter → Idle",
                self.state.name()
            ));
            self.state = ActionState::Idle;
        }
    }

    /// Per-tick update текущего состояния
    pub fn update(&mut self, ctx: &mut StateCtx) {
        if matches!(self.state, ActionState::Dead) {
            // Terminal: никакой логики до внешнего respawn сигнала
            return;
        }

        self.timer -= ctx.dt;

        let next = match &mut self.state {
            ActionState::Idle => locomotion::update_idle(ctx),
            ActionState::Move => locomotion::update_move(ctx),
            ActionState::Air => locomotion::update_air(ctx),
            ActionState::Crouch => locomotion::update_crouch(ctx),
            ActionState::Melee(atk) => melee::update_swing(
                atk,
                MeleeFamily::Sword,
                self.timer,
                &mut self.trigger_called,
                ctx,
            ),
            ActionState::HammerMelee(atk) => melee::update_swing(
                atk,
                MeleeFamily::Hammer,
                self.timer,
                &mut self.trigger_called,
                ctx,
            ),
            ActionState::CrouchMelee(atk) => melee::update_swing(
                atk,
                MeleeFamily::Crouch,
                self.timer,
                &mut self.trigger_called,
                ctx,
            ),
            ActionState::Dash(motion) => dash::update_dash(motion, self.timer, ctx),
            ActionState::GroundDash(motion) => dash::update_dash(motion, self.timer, ctx),
            ActionState::ElectricDash(blink) => {
                dash::update_electric_dash(blink, &mut self.timer, ctx)
            }
            ActionState::IceShard => {
                spells::update_cast(self.timer, &mut self.trigger_called, ctx)
            }
            ActionState::FireChannel(channel) => {
                spells::update_fire_channel(channel, self.timer, ctx)
            }
            ActionState::EarthPush => {
                spells::update_cast(self.timer, &mut self.trigger_called, ctx)
            }
            ActionState::GalePush => {
                spells::update_cast(self.timer, &mut self.trigger_called, ctx)
            }
            ActionState::Fireball => {
                spells::update_cast(self.timer, &mut self.trigger_called, ctx)
            }
            ActionState::VoidRush(rush) => void_rush::update(rush, &mut self.timer, ctx),
            ActionState::Parry => defense::update_parry(self.timer, ctx),
            ActionState::SuccessfulParry(_) => {
                defense::update_successful_parry(self.timer, &mut self.trigger_called, ctx)
            }
            ActionState::Stunned => defense::update_stunned(self.timer, ctx),
            ActionState::Dead => None,
        };

        if let Some(next) = next {
            self.change_state(ctx, next);
        }
    }

    fn run_enter(&mut self, ctx: &mut StateCtx) -> EnterOutcome {
        match &mut self.state {
            ActionState::Idle | ActionState::Move | ActionState::Air => EnterOutcome::Ok,
            ActionState::Crouch => locomotion::enter_crouch(ctx),
            ActionState::Melee(atk) => {
                melee::enter_swing(atk, MeleeFamily::Sword, &mut self.timer, ctx)
            }
            ActionState::HammerMelee(atk) => {
                melee::enter_swing(atk, MeleeFamily::Hammer, &mut self.timer, ctx)
            }
            ActionState::CrouchMelee(atk) => {
                melee::enter_swing(atk, MeleeFamily::Crouch, &mut self.timer, ctx)
            }
            ActionState::Dash(motion) => dash::enter_dash(motion, false, &mut self.timer, ctx),
            ActionState::GroundDash(motion) => {
                dash::enter_dash(motion, true, &mut self.timer, ctx)
            }
            ActionState::ElectricDash(blink) => {
                dash::enter_electric_dash(blink, &mut self.timer, ctx)
            }
            ActionState::IceShard => spells::enter_ice_shard(&mut self.timer, ctx),
            ActionState::FireChannel(channel) => {
                spells::enter_fire_channel(channel, &mut self.timer, ctx)
            }
            ActionState::EarthPush => spells::enter_earth_push(&mut self.timer, ctx),
            ActionState::GalePush => spells::enter_gale_push(&mut self.timer, ctx),
            ActionState::Fireball => spells::enter_fireball(&mut self.timer, ctx),
            ActionState::VoidRush(rush) => void_rush::enter(rush, &mut self.timer, ctx),
            ActionState::Parry => defense::enter_parry(&mut self.timer, ctx),
            ActionState::SuccessfulParry(resolve) => {
                defense::enter_successful_parry(resolve, &mut self.timer, ctx)
            }
            ActionState::Stunned => defense::enter_stunned(&mut self.timer, ctx),
            ActionState::Dead => defense::enter_dead(ctx),
        }
    }

    fn run_exit(&mut self, ctx: &mut StateCtx) {
        match &mut self.state {
            ActionState::Idle | ActionState::Move | ActionState::Air => {}
            ActionState::Crouch => locomotion::exit_crouch(ctx),
            ActionState::Melee(_) => melee::exit_swing(MeleeFamily::Sword, ctx),
            ActionState::HammerMelee(_) => melee::exit_swing(MeleeFamily::Hammer, ctx),
            ActionState::CrouchMelee(_) => melee::exit_swing(MeleeFamily::Crouch, ctx),
            ActionState::Dash(_) | ActionState::GroundDash(_) | ActionState::ElectricDash(_) => {
                dash::exit_dash(ctx)
            }
            ActionState::IceShard
            | ActionState::EarthPush
            | ActionState::GalePush
            | ActionState::Fireball => {}
            ActionState::FireChannel(_) => spells::exit_fire_channel(ctx),
            ActionState::VoidRush(_) => void_rush::exit(ctx),
            ActionState::Parry | ActionState::Stunned => {}
            ActionState::SuccessfulParry(resolve) => {
                // resolve заполнен синхронно в Enter — Exit всегда видит
                // финальное значение was_successful
                defense::exit_successful_parry(resolve, ctx)
            }
            ActionState::Dead => defense::exit_dead(ctx),
        }
    }

    /// Подстановка состояния в обход Enter (только тесты)
    #[cfg(test)]
    pub fn force_state_for_test(&mut self, state: ActionState) {
        self.state = state;
    }
}
