//! Движение: velocity принадлежит симуляции, Rapier только коллизии

use bevy::prelude::*;

/// Скорость персонажа (m/s)
///
/// Custom velocity integration — Rapier используется для коллизий и
/// spatial queries, а позицию двигает `physics::integrate_velocity`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec2,
    /// Физика заморожена (Dead): ни гравитации, ни интеграции
    pub frozen: bool,
}

impl PhysicsBody {
    pub fn zero(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}
