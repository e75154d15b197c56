//! Враждебные entity с точки зрения ядра игрока.
//!
//! AI противников живёт снаружи — ядру нужны только маркер, окно парирования
//! и per-tick снапшот ближайших врагов (для targeting/parry resolution).

use bevy::prelude::*;

/// Маркер враждебного entity
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Hostile {
    /// Может ли атака этого врага быть спарирована в принципе
    pub parryable: bool,
}

impl Default for Hostile {
    fn default() -> Self {
        Self { parryable: true }
    }
}

/// Окно парирования врага (time-boxed)
///
/// Открывается AI-слоем противника на время замаха; пока `remaining > 0`
/// враг уязвим к SuccessfulParry.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ParryWindow {
    pub remaining: f32,
}

impl ParryWindow {
    pub fn open(duration: f32) -> Self {
        Self {
            remaining: duration,
        }
    }

    pub fn is_open(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn tick(&mut self, delta: f32) {
        if self.remaining > 0.0 {
            self.remaining -= delta;
        }
    }
}

/// Стан врага после успешного парирования
///
/// Пока timer > 0 враг не действует (его AI снаружи обязан уважать маркер).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Staggered {
    pub timer: f32,
}

impl Staggered {
    pub fn new(duration: f32) -> Self {
        Self { timer: duration }
    }
}

/// Снапшот одного врага в радиусе наблюдения (обновляется каждый тик)
#[derive(Debug, Clone, Copy)]
pub struct HostileContact {
    pub entity: Entity,
    pub position: Vec2,
    pub facing_sign: i8,
    pub parryable: bool,
    pub parry_open: bool,
}

/// Ближайшие враги игрока (per-tick снапшот, сортировка по дистанции)
///
/// Состояния читают снапшот вместо живых ECS query — логика state machine
/// остаётся чистой и юнит-тестируемой.
#[derive(Component, Debug, Clone, Default)]
pub struct NearbyHostiles {
    pub contacts: Vec<HostileContact>,
}

impl NearbyHostiles {
    /// Ближайший враг к точке (снапшот уже в радиусе наблюдения)
    pub fn nearest(&self, to: Vec2) -> Option<&HostileContact> {
        self.contacts.iter().min_by(|a, b| {
            a.position
                .distance_squared(to)
                .total_cmp(&b.position.distance_squared(to))
        })
    }

    /// Ближайший враг не дальше max_dist
    pub fn nearest_within(&self, to: Vec2, max_dist: f32) -> Option<&HostileContact> {
        self.nearest(to)
            .filter(|c| c.position.distance_squared(to) <= max_dist * max_dist)
    }

    pub fn by_entity(&self, entity: Entity) -> Option<&HostileContact> {
        self.contacts.iter().find(|c| c.entity == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(entity: Entity, x: f32) -> HostileContact {
        HostileContact {
            entity,
            position: Vec2::new(x, 0.0),
            facing_sign: 1,
            parryable: true,
            parry_open: false,
        }
    }

    #[test]
    fn test_nearest_picks_min_distance() {
        let far = Entity::from_raw(1);
        let near = Entity::from_raw(2);
        let hostiles = NearbyHostiles {
            contacts: vec![contact(far, 5.0), contact(near, -2.0)],
        };

        let found = hostiles.nearest(Vec2::ZERO).unwrap();
        assert_eq!(found.entity, near);
    }

    #[test]
    fn test_nearest_within_radius() {
        let hostiles = NearbyHostiles {
            contacts: vec![contact(Entity::from_raw(1), 6.0)],
        };
        assert!(hostiles.nearest_within(Vec2::ZERO, 5.0).is_none());
        assert!(hostiles.nearest_within(Vec2::ZERO, 7.0).is_some());
    }
}
