//! Боевой слой вокруг state machine: события урона, снапшот врагов,
//! таймеры (cooldowns, invuln, окна парирования, stagger).
//!
//! События — единственный канал из состояний наружу: состояния пишут в
//! out-буферы, driver конвертирует их в ECS events, системы здесь
//! применяют последствия.

use bevy::prelude::*;

use crate::action::ActionMachine;
use crate::components::{
    Facing, Hostile, HostileContact, Invulnerability, Mana, NearbyHostiles, ParryWindow, Player,
    Staggered,
};
use crate::skills::Cooldowns;

pub mod damage;

pub use damage::{apply_parry_connected, apply_strikes, despawn_after_timeout};

/// Радиус, в котором враги попадают в снапшот NearbyHostiles
pub const HOSTILE_SCAN_RADIUS: f32 = 8.0;

/// Длительность stagger'а врага после парирования
pub const STAGGER_DURATION: f32 = 1.5;

// ============================================================================
// События
// ============================================================================

/// Удар игрока дошёл до врага (урон уже посчитан состоянием)
#[derive(Event, Debug, Clone, Copy)]
pub struct StrikeLanded {
    pub target: Entity,
    pub damage: u32,
}

/// Входящий урон по игроку (от AI-слоя врагов)
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerHit {
    pub damage: u32,
}

/// Атака врага спарирована
#[derive(Event, Debug, Clone, Copy)]
pub struct ParryConnected {
    pub target: Entity,
}

/// Враг умер (для frontend'а: анимация смерти, лут, счёт)
#[derive(Event, Debug, Clone, Copy)]
pub struct EntityDied {
    pub entity: Entity,
    pub position: Vec2,
}

// ============================================================================
// Маркеры
// ============================================================================

/// Мёртвый враг: исключён из снапшотов и таргетинга, ждёт despawn
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;

/// Отложенный despawn (труп живёт, пока frontend доигрывает смерть)
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnAfter {
    pub timer: f32,
}

impl DespawnAfter {
    pub fn new(seconds: f32) -> Self {
        Self { timer: seconds }
    }
}

// ============================================================================
// Системы
// ============================================================================

/// Per-tick снапшот врагов вокруг игрока (только живые, сортировка
/// по дистанции)
pub fn scan_hostiles(
    mut players: Query<(&Transform, &mut NearbyHostiles), With<Player>>,
    hostiles: Query<
        (
            Entity,
            &Transform,
            &Hostile,
            Option<&Facing>,
            Option<&ParryWindow>,
        ),
        Without<Dead>,
    >,
) {
    for (player_tf, mut nearby) in players.iter_mut() {
        let origin = player_tf.translation.truncate();
        nearby.contacts.clear();

        for (entity, tf, hostile, facing, window) in hostiles.iter() {
            let position = tf.translation.truncate();
            if position.distance_squared(origin) > HOSTILE_SCAN_RADIUS * HOSTILE_SCAN_RADIUS {
                continue;
            }
            nearby.contacts.push(HostileContact {
                entity,
                position,
                facing_sign: facing.map_or(1, |f| f.sign()),
                parryable: hostile.parryable,
                parry_open: window.is_some_and(|w| w.is_open()),
            });
        }

        nearby.contacts.sort_by(|a, b| {
            a.position
                .distance_squared(origin)
                .total_cmp(&b.position.distance_squared(origin))
        });
    }
}

/// Cooldowns и invuln-окно тикают ровно один раз за тик, независимо
/// от текущего состояния
pub fn tick_cooldowns(
    time: Res<Time<Fixed>>,
    mut query: Query<(&mut Cooldowns, Option<&mut Invulnerability>)>,
) {
    let delta = time.delta_secs();
    for (mut cooldowns, invuln) in query.iter_mut() {
        cooldowns.tick(delta);
        if let Some(mut invuln) = invuln {
            invuln.tick(delta);
        }
    }
}

/// Реген приостановлен на время каста/канала: иначе дренаж FireChannel
/// компенсируется регеном и канал не может иссякнуть
pub fn regenerate_mana(
    time: Res<Time<Fixed>>,
    mut query: Query<(&mut Mana, Option<&ActionMachine>)>,
) {
    let delta = time.delta_secs();
    for (mut mana, machine) in query.iter_mut() {
        if machine.is_some_and(|m| m.state().is_spellcasting()) {
            continue;
        }
        mana.regenerate(delta);
    }
}

pub fn tick_parry_windows(time: Res<Time<Fixed>>, mut query: Query<&mut ParryWindow>) {
    let delta = time.delta_secs();
    for mut window in query.iter_mut() {
        window.tick(delta);
    }
}

pub fn tick_staggered(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut Staggered)>,
) {
    let delta = time.delta_secs();
    for (entity, mut staggered) in query.iter_mut() {
        staggered.timer -= delta;
        if staggered.timer <= 0.0 {
            commands.entity(entity).remove::<Staggered>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_skips_dead_and_far() {
        let mut app = App::new();
        app.add_systems(Update, scan_hostiles);

        let near = app
            .world_mut()
            .spawn((
                Transform::from_xyz(2.0, 0.0, 0.0),
                Hostile::default(),
            ))
            .id();
        // За радиусом наблюдения
        app.world_mut().spawn((
            Transform::from_xyz(50.0, 0.0, 0.0),
            Hostile::default(),
        ));
        // Мёртвый рядом
        app.world_mut().spawn((
            Transform::from_xyz(1.0, 0.0, 0.0),
            Hostile::default(),
            Dead,
        ));

        let player = app
            .world_mut()
            .spawn((Player, Transform::default(), NearbyHostiles::default()))
            .id();

        app.update();

        let nearby = app.world().get::<NearbyHostiles>(player).unwrap();
        assert_eq!(nearby.contacts.len(), 1);
        assert_eq!(nearby.contacts[0].entity, near);
    }

    #[test]
    fn test_scan_sorted_by_distance() {
        let mut app = App::new();
        app.add_systems(Update, scan_hostiles);

        let far = app
            .world_mut()
            .spawn((Transform::from_xyz(6.0, 0.0, 0.0), Hostile::default()))
            .id();
        let near = app
            .world_mut()
            .spawn((Transform::from_xyz(-1.5, 0.0, 0.0), Hostile::default()))
            .id();

        let player = app
            .world_mut()
            .spawn((Player, Transform::default(), NearbyHostiles::default()))
            .id();

        app.update();

        let nearby = app.world().get::<NearbyHostiles>(player).unwrap();
        assert_eq!(nearby.contacts[0].entity, near);
        assert_eq!(nearby.contacts[1].entity, far);
    }

    #[test]
    fn test_stagger_expires() {
        use std::time::Duration;

        let mut app = App::new();
        let mut time = Time::<Fixed>::from_hz(60.0);
        time.advance_by(Duration::from_secs_f64(1.0 / 60.0));
        app.insert_resource(time);
        app.add_systems(Update, tick_staggered);

        let hostile = app
            .world_mut()
            .spawn((Hostile::default(), Staggered::new(0.01)))
            .id();

        app.update();

        assert!(app.world().get::<Staggered>(hostile).is_none());
    }
}
