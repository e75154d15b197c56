//! Физический слой персонажа.
//!
//! Архитектура:
//! - Rapier для коллизий и spatial queries (KinematicPositionBased)
//! - Custom velocity integration (не используем Rapier forces)
//! - Gravity + multi-probe ground check + collision profile (ghost/crouch)
//!
//! Детерминизм: fixed timestep (60Hz), enhanced-determinism у Rapier.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::components::{PhysicsBody, Player};

// ============================================================================
// Collision layers
// ============================================================================

pub const GROUP_PLAYER: Group = Group::GROUP_1;
pub const GROUP_WORLD: Group = Group::GROUP_2;
pub const GROUP_HOSTILE: Group = Group::GROUP_3;
pub const GROUP_PROJECTILE: Group = Group::GROUP_4;

/// Гравитация (m/s²)
pub const GRAVITY: f32 = -30.0;

// Габариты капсулы персонажа (метры)
pub const STAND_HALF_HEIGHT: f32 = 0.55;
pub const CROUCH_HALF_HEIGHT: f32 = 0.25;
pub const BODY_RADIUS: f32 = 0.35;
/// Расстояние от центра до ступней в полный рост
pub const FEET_OFFSET: f32 = STAND_HALF_HEIGHT + BODY_RADIUS;

// Ground probes: центр, две внутренние, две внешние точки
const PROBE_OFFSETS: [f32; 5] = [-0.45, -0.2, 0.0, 0.2, 0.45];
const PROBE_START_ABOVE: f32 = 0.1;
const PROBE_LENGTH: f32 = 0.25;
/// cos(45°) — максимальный уклон, который считается землёй
const MAX_SLOPE_COS: f32 = std::f32::consts::FRAC_1_SQRT_2;

// ============================================================================
// Components
// ============================================================================

/// Профиль коллизий персонажа
///
/// Состояния выставляют флаги; `sync_collision_profile` конвертирует их
/// в Rapier collider/groups. Прямую работу с Rapier состояния не ведут.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CollisionProfile {
    /// Ghost mode: столкновения с hostile/projectile слоями подавлены
    /// (avoidance-инвулн во время dash'ей, НЕ флаговый)
    pub ghost: bool,
    /// Уменьшенная капсула со смещением вниз (присед)
    pub crouched: bool,
    /// Коллайдер полностью выключен (Dead)
    pub disabled: bool,
}

/// Результат multi-probe ground check (обновляется каждый тик)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct GroundSensor {
    pub grounded: bool,
}

// ============================================================================
// Spatial capability
// ============================================================================

/// Попадание луча
#[derive(Debug, Clone, Copy)]
pub struct RayHitInfo {
    pub entity: Entity,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Узкий интерфейс spatial queries для state-логики
///
/// Боевой код зависит от trait'а, не от Rapier напрямую — юнит-тесты
/// подставляют мок (плоский пол), как frontend подставляет LogPrinter.
pub trait SpatialView {
    /// Луч по world geometry (fixed colliders). `dir` нормализован.
    fn cast_ray(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<RayHitInfo>;

    /// Земля под точкой (вертикальный probe вниз)
    fn ground_below(&self, point: Vec2, max_depth: f32) -> Option<RayHitInfo> {
        self.cast_ray(point, Vec2::NEG_Y, max_depth)
    }
}

impl SpatialView for RapierContext<'_> {
    fn cast_ray(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<RayHitInfo> {
        self.cast_ray_and_get_normal(origin, dir, max_dist, true, QueryFilter::only_fixed())
            .map(|(entity, hit)| RayHitInfo {
                entity,
                point: hit.point,
                normal: hit.normal,
                distance: hit.time_of_impact,
            })
    }
}

/// Заглушка на случай отсутствия Rapier context (ничего не видит)
pub struct NoRays;

impl SpatialView for NoRays {
    fn cast_ray(&self, _origin: Vec2, _dir: Vec2, _max_dist: f32) -> Option<RayHitInfo> {
        None
    }
}

/// Уклон поверхности проходит как "земля" (нормаль в пределах 45° от up)
pub fn walkable_normal(normal: Vec2) -> bool {
    normal.normalize_or_zero().dot(Vec2::Y) >= MAX_SLOPE_COS
}

// ============================================================================
// Systems
// ============================================================================

/// Система: гравитация (до driver'а — состояния могут перетереть velocity)
pub fn apply_gravity(
    mut query: Query<(&GroundSensor, &mut PhysicsBody), With<Player>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (sensor, mut body) in query.iter_mut() {
        if body.frozen {
            continue;
        }
        if !sensor.grounded {
            body.velocity.y += GRAVITY * delta;
        }
    }
}

/// Система: интеграция velocity → Transform
///
/// Rapier тело KinematicPositionBased — позицию двигаем сами, Rapier
/// подхватывает Transform для коллайдера и queries.
pub fn integrate_velocity(
    mut query: Query<(&PhysicsBody, &mut Transform), With<Player>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (body, mut transform) in query.iter_mut() {
        if body.frozen {
            continue;
        }
        transform.translation.x += body.velocity.x * delta;
        transform.translation.y += body.velocity.y * delta;
    }
}

/// Система: multi-probe ground check + вертикальный clamp
///
/// 5 лучей вниз (центр, 2 внутренних, 2 внешних) + box probe. Луч валиден
/// если нормаль в пределах 45° от up; любого бокового попадания достаточно
/// (углы ledge'ей). На валидной земле с нисходящей скоростью vy зажимается
/// ровно в ноль — иначе персонаж проседает сквозь склоны.
pub fn update_ground_sensors(
    rapier: ReadRapierContext,
    mut query: Query<(&Transform, &mut PhysicsBody, &mut GroundSensor), With<Player>>,
) {
    let Ok(ctx) = rapier.single() else {
        return;
    };

    for (transform, mut body, mut sensor) in query.iter_mut() {
        let feet = Vec2::new(
            transform.translation.x,
            transform.translation.y - FEET_OFFSET,
        );

        let mut grounded = false;
        for offset in PROBE_OFFSETS {
            let origin = Vec2::new(feet.x + offset, feet.y + PROBE_START_ABOVE);
            if let Some((_, hit)) = ctx.cast_ray_and_get_normal(
                origin,
                Vec2::NEG_Y,
                PROBE_START_ABOVE + PROBE_LENGTH,
                true,
                QueryFilter::only_fixed(),
            ) {
                if walkable_normal(hit.normal) {
                    grounded = true;
                    break;
                }
            }
        }

        // Box probe: ловит опору, по которой лучи промахнулись
        if !grounded {
            let box_center = Vec2::new(feet.x, feet.y - 0.05);
            let box_shape = Collider::cuboid(0.3, 0.05);
            ctx.intersect_shape(
                box_center,
                0.0,
                box_shape.raw.as_ref(),
                QueryFilter::only_fixed(),
                |_| {
                    grounded = true;
                    false
                },
            );
        }

        sensor.grounded = grounded;

        if grounded && body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
    }
}

/// Система: CollisionProfile → Rapier collider/groups
///
/// Ghost mode убирает hostile/projectile из filter'а (avoidance-инвулн),
/// crouch подменяет капсулу на низкую со смещением вниз, disabled
/// выключает коллайдер целиком (Dead).
pub fn sync_collision_profile(
    mut commands: Commands,
    mut query: Query<
        (Entity, &CollisionProfile, &mut CollisionGroups),
        (Changed<CollisionProfile>, With<Player>),
    >,
) {
    for (entity, profile, mut groups) in query.iter_mut() {
        let filters = if profile.ghost {
            GROUP_WORLD
        } else {
            GROUP_WORLD | GROUP_HOSTILE | GROUP_PROJECTILE
        };
        *groups = CollisionGroups::new(GROUP_PLAYER, filters);

        let mut entity_commands = commands.entity(entity);
        entity_commands.insert(collider_for_profile(profile));

        if profile.disabled {
            entity_commands.insert(ColliderDisabled);
        } else {
            entity_commands.remove::<ColliderDisabled>();
        }
    }
}

/// Коллайдер под текущий профиль (stand vs crouch)
pub fn collider_for_profile(profile: &CollisionProfile) -> Collider {
    if profile.crouched {
        // Низкая капсула, смещённая вниз — ступни остаются на месте
        let shift = STAND_HALF_HEIGHT - CROUCH_HALF_HEIGHT;
        Collider::compound(vec![(
            Vec2::new(0.0, -shift),
            0.0,
            Collider::capsule_y(CROUCH_HALF_HEIGHT, BODY_RADIUS),
        )])
    } else {
        Collider::capsule_y(STAND_HALF_HEIGHT, BODY_RADIUS)
    }
}

/// Bundle физики игрока (spawn helper)
pub fn player_physics_bundle() -> impl Bundle {
    (
        RigidBody::KinematicPositionBased,
        collider_for_profile(&CollisionProfile::default()),
        CollisionGroups::new(
            GROUP_PLAYER,
            GROUP_WORLD | GROUP_HOSTILE | GROUP_PROJECTILE,
        ),
        CollisionProfile::default(),
        GroundSensor::default(),
        PhysicsBody::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkable_normal_45_degrees() {
        assert!(walkable_normal(Vec2::Y));
        // Чуть положе 45° проходит
        assert!(walkable_normal(Vec2::new(1.0, 1.01)));
        // Стена — нет
        assert!(!walkable_normal(Vec2::X));
        assert!(!walkable_normal(Vec2::new(1.0, 0.5)));
    }

    #[test]
    fn test_crouch_collider_is_compound() {
        let standing = collider_for_profile(&CollisionProfile::default());
        let crouched = collider_for_profile(&CollisionProfile {
            crouched: true,
            ..Default::default()
        });
        // Разные shape'ы — просто sanity, без доступа к internal geometry
        assert!(standing.as_capsule().is_some());
        assert!(crouched.as_compound().is_some());
    }
}
