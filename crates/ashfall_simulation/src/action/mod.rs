//! Action-слой игрока: state machine + driver-система.
//!
//! Driver — единственное место, где состояния встречаются с ECS: он
//! собирает `StateCtx` из компонентов игрока, прогоняет внешние события
//! (анимации, урон, respawn), request checks и тик машины, затем
//! сливает out-буферы обратно в события и Transform.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::combat::{ParryConnected, PlayerHit, StrikeLanded};
use crate::components::{
    CharacterStats, EquippedWeapon, Facing, Health, Invulnerability, Mana, NearbyHostiles,
    PhysicsBody, Player,
};
use crate::fx::EffectSpawned;
use crate::input::FrameInput;
use crate::logger::log;
use crate::physics::{CollisionProfile, GroundSensor, NoRays, SpatialView};
use crate::skills::{Cooldowns, SkillKind, SkillRegistry};

pub mod dash;
pub mod defense;
pub mod locomotion;
pub mod machine;
pub mod melee;
pub mod spells;
pub mod void_rush;

#[cfg(test)]
mod machine_tests;

pub use machine::{ActionMachine, ActionState, EnterOutcome, StateCtx, StateOutput};
pub use melee::ComboTrackers;

// Радиус parry-решения на request-стороне совпадает с resolve-радиусом
use defense::PARRY_RANGE;

/// Frontend доиграл анимацию текущего состояния
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct AnimationFinished;

/// Внешний respawn-запрос (единственный выход из Dead)
#[derive(Event, Debug, Clone, Copy)]
pub struct RespawnPlayer {
    pub position: Vec2,
}

/// Запрошенное input'ом состояние, если текущее его допускает.
/// Cooldown-гейты здесь: заблокированный запрос игнорируется целиком,
/// без перехода и без side effects.
fn check_action_requests(machine: &ActionMachine, ctx: &mut StateCtx) -> Option<ActionState> {
    use ActionState::*;

    let at_rest = matches!(machine.state(), Idle | Move);
    let airborne = matches!(machine.state(), Air);

    // Парирование приоритетно и доступно почти из любого состояния;
    // cooldown стартует в момент решения — и для промаха тоже
    if ctx.input.parry
        && ctx.cooldowns.ready(SkillKind::Parry)
        && !matches!(machine.state(), Parry | SuccessfulParry(_) | Dead | Stunned)
    {
        ctx.cooldowns.start(SkillKind::Parry, ctx.skills);
        let in_window = ctx.hostiles.contacts.iter().any(|c| {
            c.parryable
                && c.parry_open
                && c.position.distance_squared(ctx.position) <= PARRY_RANGE * PARRY_RANGE
        });
        return Some(if in_window {
            SuccessfulParry(Default::default())
        } else {
            Parry
        });
    }

    if ctx.input.dash && ctx.cooldowns.ready(SkillKind::Dash) {
        if airborne {
            return Some(Dash(Default::default()));
        }
        if at_rest && ctx.ground.grounded {
            return Some(GroundDash(Default::default()));
        }
    }

    if ctx.input.electric_dash
        && (at_rest || airborne)
        && ctx.cooldowns.ready(SkillKind::ElectricDash)
    {
        return Some(ElectricDash(Default::default()));
    }

    if ctx.input.void_rush && at_rest && ctx.cooldowns.ready(SkillKind::VoidRush) {
        return Some(VoidRush(Default::default()));
    }

    if at_rest {
        if ctx.input.ice && ctx.cooldowns.ready(SkillKind::IceShard) {
            return Some(IceShard);
        }
        if ctx.input.fire_pressed {
            return Some(FireChannel(Default::default()));
        }
        if ctx.input.earth && ctx.cooldowns.ready(SkillKind::EarthPush) {
            return Some(EarthPush);
        }
        if ctx.input.gale && ctx.cooldowns.ready(SkillKind::GalePush) {
            return Some(GalePush);
        }
        if ctx.input.fireball && ctx.cooldowns.ready(SkillKind::Fireball) {
            return Some(Fireball);
        }
    }

    if ctx.input.attack {
        if at_rest {
            return Some(melee::standing_attack_state(ctx.weapon));
        }
        if matches!(machine.state(), Crouch) {
            return Some(CrouchMelee(Default::default()));
        }
    }

    if ctx.input.crouch_held && at_rest && ctx.ground.grounded {
        return Some(Crouch);
    }

    None
}

/// Per-tick прогон машины игрока
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn drive_player_actions(
    time: Res<Time<Fixed>>,
    input: Res<FrameInput>,
    skills: Res<SkillRegistry>,
    rapier: ReadRapierContext,
    mut players: Query<
        (
            &mut Transform,
            &mut PhysicsBody,
            &mut Facing,
            &mut Health,
            &mut Mana,
            &CharacterStats,
            &EquippedWeapon,
            &mut Cooldowns,
            &mut ComboTrackers,
            &GroundSensor,
            &NearbyHostiles,
            &mut CollisionProfile,
            &mut Invulnerability,
            &mut ActionMachine,
        ),
        With<Player>,
    >,
    mut anim_events: EventReader<AnimationFinished>,
    mut hit_events: EventReader<PlayerHit>,
    mut respawn_events: EventReader<RespawnPlayer>,
    mut effects: EventWriter<EffectSpawned>,
    mut strikes: EventWriter<StrikeLanded>,
    mut parried: EventWriter<ParryConnected>,
) {
    let Ok((
        mut transform,
        mut body,
        mut facing,
        mut health,
        mut mana,
        stats,
        weapon,
        mut cooldowns,
        mut combos,
        ground,
        hostiles,
        mut profile,
        mut invuln,
        mut machine,
    )) = players.single_mut()
    else {
        return;
    };

    let rapier_ctx = rapier.single().ok();
    let spatial: &dyn SpatialView = match &rapier_ctx {
        Some(ctx) => ctx,
        None => &NoRays,
    };

    let mut out = StateOutput::default();
    let mut ctx = StateCtx {
        dt: time.delta_secs(),
        now: time.elapsed_secs_f64(),
        position: transform.translation.truncate(),
        body: &mut body,
        facing: &mut facing,
        mana: &mut mana,
        stats,
        weapon: weapon.kind,
        skills: &skills,
        cooldowns: &mut cooldowns,
        combos: &mut combos,
        input: &input,
        ground,
        hostiles,
        profile: &mut profile,
        invuln: &mut invuln,
        spatial,
        out: &mut out,
    };

    for _ in anim_events.read() {
        machine.on_animation_complete();
    }

    for respawn in respawn_events.read() {
        health.restore_full();
        ctx.mana.restore_full();
        ctx.cooldowns.reset_all();
        ctx.combos.reset_all();
        ctx.out.teleport_to = Some(respawn.position);
        ctx.position = respawn.position;
        machine.change_state(&mut ctx, ActionState::Idle);
        log("✨ Respawn: персонаж восстановлен");
    }

    for hit in hit_events.read() {
        if matches!(machine.state(), ActionState::Dead) {
            break;
        }
        if ctx.invuln.is_active() || ctx.profile.ghost {
            log("Урон проигнорирован: персонаж неуязвим");
            continue;
        }
        health.take_damage(hit.damage);
        if !health.is_alive() {
            machine.change_state(&mut ctx, ActionState::Dead);
            break;
        }
        // Guard повторного входа: удар по уже оглушённому не сбрасывает
        // stun-таймер (урон при этом применён выше)
        if !machine.same_kind(&ActionState::Stunned) {
            machine.change_state(&mut ctx, ActionState::Stunned);
        }
    }

    if !matches!(machine.state(), ActionState::Dead | ActionState::Stunned) {
        if let Some(next) = check_action_requests(&machine, &mut ctx) {
            machine.change_state(&mut ctx, next);
        }
    }

    machine.update(&mut ctx);

    // Слив out-буферов в ECS
    if let Some(target) = out.teleport_to {
        transform.translation.x = target.x;
        transform.translation.y = target.y;
    }
    for effect in out.effects.drain(..) {
        effects.write(effect);
    }
    for strike in out.strikes.drain(..) {
        strikes.write(strike);
    }
    for target in out.parried.drain(..) {
        parried.write(ParryConnected { target });
    }
}
