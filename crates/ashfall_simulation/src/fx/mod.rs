//! Визуальные/звуковые эффекты: fire-and-forget события в frontend.
//!
//! Симуляция только объявляет "в этой точке возник эффект X"; spawn,
//! auto-destroy и ассеты — ответственность frontend'а. Отсутствие
//! подписчика — не ошибка (эффекты не влияют на game state).

use bevy::prelude::*;

/// Вид эффекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EffectKind {
    DashTrail,
    ElectricFlash,
    ElectricArrive,
    IceShard,
    FlameChannelStart,
    FlameChannelStop,
    EarthSpike,
    GaleGust,
    Fireball,
    VoidVanish,
    VoidStrike,
    VoidReappear,
    ParrySpark,
}

/// Event: эффект возник (симуляция → frontend)
#[derive(Event, Debug, Clone, Copy)]
pub struct EffectSpawned {
    pub kind: EffectKind,
    pub position: Vec2,
    /// Направление эффекта по X (±1), для зеркалирования/полёта
    pub facing_sign: i8,
}

impl EffectSpawned {
    pub fn new(kind: EffectKind, position: Vec2, facing_sign: i8) -> Self {
        Self {
            kind,
            position,
            facing_sign,
        }
    }
}

/// Система: debug-лог эффектов (headless-режим без frontend'а)
pub fn log_effects(mut events: EventReader<EffectSpawned>) {
    for effect in events.read() {
        crate::log(&format!(
            "✨ FX: {:?} at ({:.2}, {:.2}) dir {}",
            effect.kind, effect.position.x, effect.position.y, effect.facing_sign
        ));
    }
}
