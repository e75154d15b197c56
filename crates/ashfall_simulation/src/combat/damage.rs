//! Применение боевых событий к врагам: урон, stagger, отложенный despawn.

use bevy::prelude::*;

use crate::components::{Health, Hostile, Staggered};
use crate::logger::log;

use super::{Dead, DespawnAfter, EntityDied, ParryConnected, StrikeLanded, STAGGER_DURATION};

/// Сколько труп остаётся в мире до despawn
const CORPSE_LIFETIME: f32 = 2.0;

/// Урон по врагам из StrikeLanded; смерть → маркер Dead + EntityDied
pub fn apply_strikes(
    mut commands: Commands,
    mut strikes: EventReader<StrikeLanded>,
    mut died: EventWriter<EntityDied>,
    mut hostiles: Query<(&mut Health, &Transform), (With<Hostile>, Without<Dead>)>,
) {
    for strike in strikes.read() {
        let Ok((mut health, transform)) = hostiles.get_mut(strike.target) else {
            // Цель уже умерла или despawn'улась в этом же тике
            continue;
        };
        health.take_damage(strike.damage);
        if !health.is_alive() {
            let position = transform.translation.truncate();
            commands
                .entity(strike.target)
                .insert((Dead, DespawnAfter::new(CORPSE_LIFETIME)));
            died.write(EntityDied {
                entity: strike.target,
                position,
            });
            log("☠️ Враг повержен");
        }
    }
}

/// Спарированный враг получает Staggered (повтор парирования в окне
/// просто освежает таймер)
pub fn apply_parry_connected(
    mut commands: Commands,
    mut events: EventReader<ParryConnected>,
    hostiles: Query<(), (With<Hostile>, Without<Dead>)>,
) {
    for event in events.read() {
        if hostiles.get(event.target).is_ok() {
            commands
                .entity(event.target)
                .insert(Staggered::new(STAGGER_DURATION));
        }
    }
}

pub fn despawn_after_timeout(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut DespawnAfter)>,
) {
    let delta = time.delta_secs();
    for (entity, mut despawn) in query.iter_mut() {
        despawn.timer -= delta;
        if despawn.timer <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}
