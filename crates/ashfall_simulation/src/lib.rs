//! ASHFALL Simulation Core
//!
//! Детерминированное игровое ядро персонажа на Bevy 0.16: state machine
//! действий, ресурсы/cooldowns, ближний бой с комбо, заклинания, парирование.
//! Физика — Rapier 2D (kinematic тело, свой интегратор поверх scene queries).
//!
//! Frontend (рендер, анимации, звук) подключается через события:
//! `PlayerInputEvent` внутрь, `EffectSpawned`/`EntityDied` наружу,
//! `AnimationFinished` как обратный сигнал аниматора.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

pub mod action;
pub mod combat;
pub mod components;
pub mod fx;
pub mod input;
pub mod logger;
pub mod physics;
pub mod skills;

pub use action::{ActionMachine, ActionState, AnimationFinished, ComboTrackers, RespawnPlayer};
pub use combat::{EntityDied, ParryConnected, PlayerHit, StrikeLanded};
pub use components::*;
pub use fx::{EffectKind, EffectSpawned};
pub use input::{FrameInput, PlayerInputEvent};
pub use logger::*;
pub use skills::{Cooldowns, SkillKind, SkillRegistry};

/// Главный plugin симуляции (fixed 60Hz tick)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(60.0))
            .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
            .init_resource::<FrameInput>()
            .init_resource::<SkillRegistry>()
            // Frontend → симуляция
            .add_event::<PlayerInputEvent>()
            .add_event::<AnimationFinished>()
            .add_event::<PlayerHit>()
            .add_event::<RespawnPlayer>()
            // Симуляция → frontend
            .add_event::<EffectSpawned>()
            .add_event::<StrikeLanded>()
            .add_event::<ParryConnected>()
            .add_event::<EntityDied>()
            .add_systems(
                FixedUpdate,
                (
                    input::collect_frame_input,
                    combat::tick_cooldowns,
                    combat::regenerate_mana,
                    combat::tick_parry_windows,
                    combat::tick_staggered,
                    physics::update_ground_sensors,
                    combat::scan_hostiles,
                    physics::apply_gravity,
                    action::drive_player_actions,
                    physics::integrate_velocity,
                    physics::sync_collision_profile,
                    combat::apply_strikes,
                    combat::apply_parry_connected,
                    combat::despawn_after_timeout,
                    fx::log_effects,
                )
                    .chain(),
            );
    }
}

/// Minimal Bevy App для headless симуляции (тесты, CLI-прогоны)
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, TransformPlugin, SimulationPlugin));
    app
}

/// Spawn игрока со всеми компонентами ядра
pub fn spawn_player(commands: &mut Commands, position: Vec2) -> Entity {
    commands
        .spawn((
            Player,
            Transform::from_xyz(position.x, position.y, 0.0),
            physics::player_physics_bundle(),
            Facing::default(),
            Health::default(),
            Mana::default(),
            CharacterStats::default(),
            EquippedWeapon::default(),
            Cooldowns::default(),
            ComboTrackers::default(),
            NearbyHostiles::default(),
            Invulnerability::default(),
            ActionMachine::default(),
        ))
        .id()
}

/// Spawn врага (боевой минимум: AI-слой добавляет своё поверх)
pub fn spawn_hostile(commands: &mut Commands, position: Vec2, health: u32) -> Entity {
    commands
        .spawn((
            Hostile::default(),
            Transform::from_xyz(position.x, position.y, 0.0),
            Facing::default(),
            Health::new(health),
            ParryWindow::default(),
            Collider::capsule_y(0.5, 0.35),
            CollisionGroups::new(
                physics::GROUP_HOSTILE,
                physics::GROUP_PLAYER | physics::GROUP_WORLD | physics::GROUP_PROJECTILE,
            ),
        ))
        .id()
}

/// Spawn статической платформы (world geometry)
pub fn spawn_platform(commands: &mut Commands, center: Vec2, half_extents: Vec2) -> Entity {
    commands
        .spawn((
            Transform::from_xyz(center.x, center.y, 0.0),
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, half_extents.y),
            CollisionGroups::new(physics::GROUP_WORLD, Group::ALL),
        ))
        .id()
}
