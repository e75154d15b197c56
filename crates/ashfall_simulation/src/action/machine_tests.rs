//! Юнит-тесты state machine на чистом StateCtx (без App и Rapier).
//!
//! Rig владеет всеми компонентами персонажа и выдаёт StateCtx по запросу;
//! spatial подменяется моком (плоский пол на y=0 либо пустота).

use bevy::prelude::*;

use crate::components::{
    CharacterStats, Facing, HostileContact, Invulnerability, Mana, NearbyHostiles, PhysicsBody,
    WeaponKind,
};
use crate::fx::EffectKind;
use crate::input::FrameInput;
use crate::physics::{CollisionProfile, GroundSensor, NoRays, RayHitInfo, SpatialView};
use crate::skills::{Cooldowns, SkillKind, SkillRegistry};

use super::check_action_requests;
use super::machine::{ActionMachine, ActionState, StateCtx, StateOutput};
use super::melee::ComboTrackers;

const DT: f32 = 1.0 / 60.0;

/// Бесконечный плоский пол на y = 0
struct FlatFloor;

impl SpatialView for FlatFloor {
    fn cast_ray(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<RayHitInfo> {
        if dir.y >= 0.0 || origin.y <= 0.0 {
            return None;
        }
        let distance = origin.y / -dir.y;
        if distance > max_dist {
            return None;
        }
        Some(RayHitInfo {
            entity: Entity::PLACEHOLDER,
            point: origin + dir * distance,
            normal: Vec2::Y,
            distance,
        })
    }
}

static FLOOR: FlatFloor = FlatFloor;
static VOID: NoRays = NoRays;

struct Rig {
    now: f64,
    position: Vec2,
    body: PhysicsBody,
    facing: Facing,
    mana: Mana,
    stats: CharacterStats,
    weapon: WeaponKind,
    skills: SkillRegistry,
    cooldowns: Cooldowns,
    combos: ComboTrackers,
    input: FrameInput,
    ground: GroundSensor,
    hostiles: NearbyHostiles,
    profile: CollisionProfile,
    invuln: Invulnerability,
    flat_floor: bool,
    out: StateOutput,
}

impl Rig {
    fn new() -> Self {
        Self {
            now: 0.0,
            position: Vec2::new(0.0, 1.0),
            body: PhysicsBody::default(),
            facing: Facing::default(),
            mana: Mana::default(),
            stats: CharacterStats::default(),
            weapon: WeaponKind::Sword,
            skills: SkillRegistry::default(),
            cooldowns: Cooldowns::default(),
            combos: ComboTrackers::default(),
            input: FrameInput::default(),
            ground: GroundSensor { grounded: true },
            hostiles: NearbyHostiles::default(),
            profile: CollisionProfile::default(),
            invuln: Invulnerability::default(),
            flat_floor: true,
            out: StateOutput::default(),
        }
    }

    fn ctx(&mut self) -> StateCtx<'_> {
        let spatial: &'static dyn SpatialView = if self.flat_floor { &FLOOR } else { &VOID };
        StateCtx {
            dt: DT,
            now: self.now,
            position: self.position,
            body: &mut self.body,
            facing: &mut self.facing,
            mana: &mut self.mana,
            stats: &self.stats,
            weapon: self.weapon,
            skills: &self.skills,
            cooldowns: &mut self.cooldowns,
            combos: &mut self.combos,
            input: &self.input,
            ground: &self.ground,
            hostiles: &self.hostiles,
            profile: &mut self.profile,
            invuln: &mut self.invuln,
            spatial,
            out: &mut self.out,
        }
    }

    fn hostile_at(&mut self, x: f32, parry_open: bool) -> Entity {
        let entity = Entity::from_raw(self.hostiles.contacts.len() as u32 + 1);
        self.hostiles.contacts.push(HostileContact {
            entity,
            position: Vec2::new(x, 1.0),
            facing_sign: if x > self.position.x { -1 } else { 1 },
            parryable: true,
            parry_open,
        });
        entity
    }
}

// ============================================================================
// Ресурсные гейты
// ============================================================================

#[test]
fn test_ice_shard_without_mana_aborts_to_idle() {
    let mut rig = Rig::new();
    rig.mana.current = 0.0;
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::IceShard);

    assert_eq!(*machine.state(), ActionState::Idle);
    assert_eq!(rig.mana.current, 0.0);
    assert!(rig.cooldowns.ready(SkillKind::IceShard));
    assert!(rig.out.effects.is_empty());
}

#[test]
fn test_ice_shard_validates_ground_before_mana() {
    let mut rig = Rig::new();
    rig.flat_floor = false;
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::IceShard);

    // Нет поверхности — отказ ещё до списания маны
    assert_eq!(*machine.state(), ActionState::Idle);
    assert_eq!(rig.mana.current, rig.mana.max);
    assert!(rig.cooldowns.ready(SkillKind::IceShard));
}

#[test]
fn test_ice_shard_spawns_one_effect_per_valid_point() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::IceShard);

    assert!(matches!(machine.state(), ActionState::IceShard));
    let shards = rig
        .out
        .effects
        .iter()
        .filter(|e| e.kind == EffectKind::IceShard)
        .count();
    assert_eq!(shards, 3);
    assert_eq!(rig.mana.current, rig.mana.max - rig.skills.mana_cost(SkillKind::IceShard));
}

#[test]
fn test_void_rush_without_target_keeps_mana() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::VoidRush(Default::default()));

    assert_eq!(*machine.state(), ActionState::Idle);
    assert_eq!(rig.mana.current, rig.mana.max);
    assert!(rig.cooldowns.ready(SkillKind::VoidRush));
    assert!(rig.out.effects.is_empty());
}

// ============================================================================
// Комбо
// ============================================================================

fn swing_index_and_damage(machine: &ActionMachine) -> (u8, u32) {
    match machine.state() {
        ActionState::Melee(atk) => (atk.combo_index, atk.damage),
        other => panic!("ожидался sword swing, оказалось {}", other.name()),
    }
}

#[test]
fn test_combo_chain_within_window() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Melee(Default::default()));
    assert_eq!(swing_index_and_damage(&machine), (0, 20));
    machine.change_state(&mut rig.ctx(), ActionState::Idle);

    // 0.2s < окна 0.5s — комбо продолжается
    rig.now = 0.2;
    machine.change_state(&mut rig.ctx(), ActionState::Melee(Default::default()));
    assert_eq!(swing_index_and_damage(&machine), (1, 25));
    machine.change_state(&mut rig.ctx(), ActionState::Idle);

    rig.now = 0.4;
    machine.change_state(&mut rig.ctx(), ActionState::Melee(Default::default()));
    assert_eq!(swing_index_and_damage(&machine), (2, 32));
}

#[test]
fn test_hammer_combo_folds_raw_damage_stat() {
    let mut rig = Rig::new();
    rig.weapon = WeaponKind::Hammer;
    let machine = ActionMachine::default();

    // Атака с молотом в руках запрашивает HammerMelee
    rig.input.attack = true;
    let requested = check_action_requests(&machine, &mut rig.ctx());
    assert!(matches!(requested, Some(ActionState::HammerMelee(_))));
    rig.input.attack = false;

    fn hammer_index_and_damage(machine: &ActionMachine) -> (u8, u32) {
        match machine.state() {
            ActionState::HammerMelee(atk) => (atk.combo_index, atk.damage),
            other => panic!("ожидался hammer swing, оказалось {}", other.name()),
        }
    }

    // base 20, hammer fold ×(1 + 20/100): 24 / 30 / 38 (38.4 округляется вниз)
    let mut machine = ActionMachine::default();
    machine.change_state(&mut rig.ctx(), ActionState::HammerMelee(Default::default()));
    assert_eq!(hammer_index_and_damage(&machine), (0, 24));
    machine.change_state(&mut rig.ctx(), ActionState::Idle);

    rig.now = 0.2;
    machine.change_state(&mut rig.ctx(), ActionState::HammerMelee(Default::default()));
    assert_eq!(hammer_index_and_damage(&machine), (1, 30));
    machine.change_state(&mut rig.ctx(), ActionState::Idle);

    rig.now = 0.4;
    machine.change_state(&mut rig.ctx(), ActionState::HammerMelee(Default::default()));
    assert_eq!(hammer_index_and_damage(&machine), (2, 38));
}

#[test]
fn test_combo_resets_after_window() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Melee(Default::default()));
    machine.change_state(&mut rig.ctx(), ActionState::Idle);

    rig.now = 1.0;
    machine.change_state(&mut rig.ctx(), ActionState::Melee(Default::default()));
    assert_eq!(swing_index_and_damage(&machine).0, 0);
}

// ============================================================================
// Fire channel
// ============================================================================

#[test]
fn test_fire_channel_exits_when_mana_runs_dry() {
    let mut rig = Rig::new();
    rig.mana.current = 12.0;
    rig.input.fire_held = true;
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::FireChannel(Default::default()));
    assert!(matches!(machine.state(), ActionState::FireChannel(_)));

    let mut ticks = 0u32;
    while matches!(machine.state(), ActionState::FireChannel(_)) {
        machine.update(&mut rig.ctx());
        ticks += 1;
        assert!(ticks < 400, "канал не завершился");
    }

    // 12 маны при дренаже 5/s — выход около t = 2.4s
    let elapsed = ticks as f32 * DT;
    assert!((2.3..=2.5).contains(&elapsed), "вышел на t = {elapsed}");
    assert!(rig.mana.current < 0.1);
}

#[test]
fn test_fire_channel_exits_on_release() {
    let mut rig = Rig::new();
    rig.input.fire_held = true;
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::FireChannel(Default::default()));
    machine.update(&mut rig.ctx());
    assert!(matches!(machine.state(), ActionState::FireChannel(_)));

    rig.input.fire_held = false;
    machine.update(&mut rig.ctx());
    assert_eq!(*machine.state(), ActionState::Idle);

    // Stop-эффект из Exit
    assert!(rig
        .out
        .effects
        .iter()
        .any(|e| e.kind == EffectKind::FlameChannelStop));
}

// ============================================================================
// Dash
// ============================================================================

#[test]
fn test_dash_direction_follows_input_sign() {
    let mut rig = Rig::new();
    rig.input.move_x = -1.0;
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Dash(Default::default()));

    match machine.state() {
        ActionState::Dash(motion) => assert_eq!(motion.dir_x, -1.0),
        other => panic!("ожидался Dash, оказалось {}", other.name()),
    }
}

#[test]
fn test_dash_direction_falls_back_to_facing() {
    let mut rig = Rig::new();
    rig.facing.face_towards(-1.0);
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Dash(Default::default()));

    match machine.state() {
        ActionState::Dash(motion) => assert_eq!(motion.dir_x, -1.0),
        other => panic!("ожидался Dash, оказалось {}", other.name()),
    }
}

#[test]
fn test_dash_ghost_lifted_on_exit() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Dash(Default::default()));
    assert!(rig.profile.ghost);
    assert!(!rig.cooldowns.ready(SkillKind::Dash));

    let mut ticks = 0u32;
    while !matches!(machine.state(), ActionState::Idle) {
        machine.update(&mut rig.ctx());
        ticks += 1;
        assert!(ticks < 60, "dash не завершился");
    }

    assert!(!rig.profile.ghost);
    assert_eq!(rig.body.velocity.x, 0.0);
}

// ============================================================================
// Parry
// ============================================================================

#[test]
fn test_successful_parry_grants_window_after_exit() {
    let mut rig = Rig::new();
    let target = rig.hostile_at(1.0, true);
    let mut machine = ActionMachine::default();

    machine.change_state(
        &mut rig.ctx(),
        ActionState::SuccessfulParry(Default::default()),
    );

    // Разрешение синхронно в Enter: нотификация ушла, блок активен
    assert_eq!(rig.out.parried, vec![target]);
    assert!(rig.invuln.is_active());

    machine.change_state(&mut rig.ctx(), ActionState::Idle);
    assert!(!rig.invuln.block);
    assert_eq!(rig.invuln.window, 1.0);
}

#[test]
fn test_plain_parry_never_grants_window() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Parry);
    machine.change_state(&mut rig.ctx(), ActionState::Idle);

    assert!(!rig.invuln.is_active());
    assert!(rig.out.parried.is_empty());
}

#[test]
fn test_parry_request_picks_state_by_open_windows() {
    let mut rig = Rig::new();
    rig.input.parry = true;
    let machine = ActionMachine::default();

    // Окно закрыто → обычный Parry, cooldown тем не менее стартует
    rig.hostile_at(1.0, false);
    let next = check_action_requests(&machine, &mut rig.ctx());
    assert_eq!(next, Some(ActionState::Parry));
    assert!(!rig.cooldowns.ready(SkillKind::Parry));

    // Окно открыто, но cooldown уже занят — запрос игнорируется
    rig.hostiles.contacts[0].parry_open = true;
    assert_eq!(check_action_requests(&machine, &mut rig.ctx()), None);

    rig.cooldowns.reset_all();
    let next = check_action_requests(&machine, &mut rig.ctx());
    assert!(matches!(next, Some(ActionState::SuccessfulParry(_))));
}

// ============================================================================
// Request gating
// ============================================================================

#[test]
fn test_dash_request_ignored_on_cooldown() {
    let mut rig = Rig::new();
    rig.input.dash = true;
    let machine = ActionMachine::default();

    let ready = check_action_requests(&machine, &mut rig.ctx());
    assert!(matches!(ready, Some(ActionState::GroundDash(_))));

    rig.cooldowns.start(SkillKind::Dash, &rig.skills);
    assert_eq!(check_action_requests(&machine, &mut rig.ctx()), None);
}

#[test]
fn test_airborne_dash_variant() {
    let mut rig = Rig::new();
    rig.input.dash = true;
    rig.ground.grounded = false;
    let mut machine = ActionMachine::default();
    machine.force_state_for_test(ActionState::Air);

    let next = check_action_requests(&machine, &mut rig.ctx());
    assert!(matches!(next, Some(ActionState::Dash(_))));
}

// ============================================================================
// Air / анимационный триггер
// ============================================================================

#[test]
fn test_air_lands_only_with_zero_vertical_velocity() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();
    machine.force_state_for_test(ActionState::Air);

    rig.body.velocity.y = -0.5;
    machine.update(&mut rig.ctx());
    assert_eq!(*machine.state(), ActionState::Air);

    rig.body.velocity.y = 0.0;
    machine.update(&mut rig.ctx());
    assert_eq!(*machine.state(), ActionState::Idle);
}

#[test]
fn test_animation_trigger_finishes_cast() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();
    machine.force_state_for_test(ActionState::EarthPush);
    machine.timer = 10.0;

    machine.update(&mut rig.ctx());
    assert_eq!(*machine.state(), ActionState::EarthPush);

    machine.on_animation_complete();
    machine.update(&mut rig.ctx());
    assert_eq!(*machine.state(), ActionState::Idle);
}

// ============================================================================
// Dead / Stunned
// ============================================================================

#[test]
fn test_dead_is_terminal_for_update() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Dead);
    assert!(rig.profile.disabled);
    assert!(rig.body.frozen);

    for _ in 0..120 {
        machine.update(&mut rig.ctx());
    }
    assert_eq!(*machine.state(), ActionState::Dead);
}

#[test]
fn test_stunned_expires_to_idle() {
    let mut rig = Rig::new();
    let mut machine = ActionMachine::default();

    machine.change_state(&mut rig.ctx(), ActionState::Stunned);

    let mut ticks = 0u32;
    while matches!(machine.state(), ActionState::Stunned) {
        machine.update(&mut rig.ctx());
        ticks += 1;
        assert!(ticks < 120, "stun не закончился");
    }
    assert_eq!(*machine.state(), ActionState::Idle);
}
