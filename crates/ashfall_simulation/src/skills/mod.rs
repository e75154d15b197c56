//! Skill registry и cooldown'ы.
//!
//! Registry — единый источник истины для стоимости/кулдауна скиллов.
//! `Default` совпадает с локальными константами состояний, так что путь
//! "registry отсутствует → локальная константа" не может разъехаться.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// Локальные константы скиллов (fallback значения, они же defaults registry)
pub const DASH_COOLDOWN: f32 = 1.2;
pub const ELECTRIC_DASH_COST: f32 = 15.0;
pub const ELECTRIC_DASH_COOLDOWN: f32 = 3.0;
pub const ICE_SHARD_COST: f32 = 20.0;
pub const ICE_SHARD_COOLDOWN: f32 = 1.5;
/// Для fire channel "cost" — это drain в секунду, не разовый платёж
pub const FIRE_CHANNEL_DRAIN_PER_SEC: f32 = 5.0;
pub const EARTH_PUSH_COST: f32 = 25.0;
pub const EARTH_PUSH_COOLDOWN: f32 = 4.0;
pub const GALE_PUSH_COST: f32 = 15.0;
pub const GALE_PUSH_COOLDOWN: f32 = 2.5;
pub const FIREBALL_COST: f32 = 30.0;
pub const FIREBALL_COOLDOWN: f32 = 5.0;
pub const VOID_RUSH_COST: f32 = 40.0;
pub const VOID_RUSH_COOLDOWN: f32 = 8.0;
pub const PARRY_COOLDOWN: f32 = 0.8;

/// Вид скилла (ключ registry и cooldown-слота)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum SkillKind {
    /// Dash и GroundDash делят один cooldown
    Dash,
    ElectricDash,
    IceShard,
    FireChannel,
    EarthPush,
    GalePush,
    Fireball,
    VoidRush,
    Parry,
}

/// Параметры одного скилла
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkillSpec {
    /// Мана-стоимость (для FireChannel — drain/sec)
    pub mana_cost: f32,
    /// Cooldown после использования (секунды), 0 = нет кулдауна
    pub cooldown: f32,
}

/// Registry скиллов (Resource; tuning data, сериализуется)
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SkillRegistry {
    pub dash: SkillSpec,
    pub electric_dash: SkillSpec,
    pub ice_shard: SkillSpec,
    pub fire_channel: SkillSpec,
    pub earth_push: SkillSpec,
    pub gale_push: SkillSpec,
    pub fireball: SkillSpec,
    pub void_rush: SkillSpec,
    pub parry: SkillSpec,
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self {
            dash: SkillSpec {
                mana_cost: 0.0,
                cooldown: DASH_COOLDOWN,
            },
            electric_dash: SkillSpec {
                mana_cost: ELECTRIC_DASH_COST,
                cooldown: ELECTRIC_DASH_COOLDOWN,
            },
            ice_shard: SkillSpec {
                mana_cost: ICE_SHARD_COST,
                cooldown: ICE_SHARD_COOLDOWN,
            },
            fire_channel: SkillSpec {
                mana_cost: FIRE_CHANNEL_DRAIN_PER_SEC,
                cooldown: 0.0,
            },
            earth_push: SkillSpec {
                mana_cost: EARTH_PUSH_COST,
                cooldown: EARTH_PUSH_COOLDOWN,
            },
            gale_push: SkillSpec {
                mana_cost: GALE_PUSH_COST,
                cooldown: GALE_PUSH_COOLDOWN,
            },
            fireball: SkillSpec {
                mana_cost: FIREBALL_COST,
                cooldown: FIREBALL_COOLDOWN,
            },
            void_rush: SkillSpec {
                mana_cost: VOID_RUSH_COST,
                cooldown: VOID_RUSH_COOLDOWN,
            },
            parry: SkillSpec {
                mana_cost: 0.0,
                cooldown: PARRY_COOLDOWN,
            },
        }
    }
}

impl SkillRegistry {
    pub fn spec(&self, kind: SkillKind) -> &SkillSpec {
        match kind {
            SkillKind::Dash => &self.dash,
            SkillKind::ElectricDash => &self.electric_dash,
            SkillKind::IceShard => &self.ice_shard,
            SkillKind::FireChannel => &self.fire_channel,
            SkillKind::EarthPush => &self.earth_push,
            SkillKind::GalePush => &self.gale_push,
            SkillKind::Fireball => &self.fireball,
            SkillKind::VoidRush => &self.void_rush,
            SkillKind::Parry => &self.parry,
        }
    }

    pub fn mana_cost(&self, kind: SkillKind) -> f32 {
        self.spec(kind).mana_cost
    }

    pub fn cooldown(&self, kind: SkillKind) -> f32 {
        self.spec(kind).cooldown
    }
}

/// Cooldown-таймеры персонажа (по слоту на скилл)
///
/// Инвариант тика: все таймеры уменьшаются ровно один раз за тик,
/// независимо от текущего состояния. Таймер ≤ 0 означает "готов".
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Cooldowns {
    dash: f32,
    electric_dash: f32,
    ice_shard: f32,
    fire_channel: f32,
    earth_push: f32,
    gale_push: f32,
    fireball: f32,
    void_rush: f32,
    parry: f32,
}

impl Cooldowns {
    fn slot_mut(&mut self, kind: SkillKind) -> &mut f32 {
        match kind {
            SkillKind::Dash => &mut self.dash,
            SkillKind::ElectricDash => &mut self.electric_dash,
            SkillKind::IceShard => &mut self.ice_shard,
            SkillKind::FireChannel => &mut self.fire_channel,
            SkillKind::EarthPush => &mut self.earth_push,
            SkillKind::GalePush => &mut self.gale_push,
            SkillKind::Fireball => &mut self.fireball,
            SkillKind::VoidRush => &mut self.void_rush,
            SkillKind::Parry => &mut self.parry,
        }
    }

    fn slot(&self, kind: SkillKind) -> f32 {
        match kind {
            SkillKind::Dash => self.dash,
            SkillKind::ElectricDash => self.electric_dash,
            SkillKind::IceShard => self.ice_shard,
            SkillKind::FireChannel => self.fire_channel,
            SkillKind::EarthPush => self.earth_push,
            SkillKind::GalePush => self.gale_push,
            SkillKind::Fireball => self.fireball,
            SkillKind::VoidRush => self.void_rush,
            SkillKind::Parry => self.parry,
        }
    }

    pub fn ready(&self, kind: SkillKind) -> bool {
        self.slot(kind) <= 0.0
    }

    pub fn remaining(&self, kind: SkillKind) -> f32 {
        self.slot(kind).max(0.0)
    }

    /// Запустить cooldown с длительностью из registry
    pub fn start(&mut self, kind: SkillKind, registry: &SkillRegistry) {
        *self.slot_mut(kind) = registry.cooldown(kind);
    }

    /// Один декремент всех слотов (вызывается ровно раз за тик)
    pub fn tick(&mut self, delta: f32) {
        for kind in [
            SkillKind::Dash,
            SkillKind::ElectricDash,
            SkillKind::IceShard,
            SkillKind::FireChannel,
            SkillKind::EarthPush,
            SkillKind::GalePush,
            SkillKind::Fireball,
            SkillKind::VoidRush,
            SkillKind::Parry,
        ] {
            let slot = self.slot_mut(kind);
            if *slot > 0.0 {
                *slot -= delta;
            }
        }
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults_match_constants() {
        let registry = SkillRegistry::default();
        assert_eq!(registry.mana_cost(SkillKind::IceShard), ICE_SHARD_COST);
        assert_eq!(registry.mana_cost(SkillKind::VoidRush), VOID_RUSH_COST);
        assert_eq!(registry.cooldown(SkillKind::Parry), PARRY_COOLDOWN);
        assert_eq!(registry.cooldown(SkillKind::Dash), DASH_COOLDOWN);
    }

    #[test]
    fn test_cooldown_start_and_tick_to_ready() {
        let registry = SkillRegistry::default();
        let mut cd = Cooldowns::default();
        assert!(cd.ready(SkillKind::Dash));

        cd.start(SkillKind::Dash, &registry);
        assert!(!cd.ready(SkillKind::Dash));

        // DASH_COOLDOWN секунд тиков по 0.1
        let ticks = (DASH_COOLDOWN / 0.1).ceil() as usize + 1;
        for _ in 0..ticks {
            cd.tick(0.1);
        }
        assert!(cd.ready(SkillKind::Dash));
    }

    #[test]
    fn test_tick_decrements_every_slot_once() {
        let registry = SkillRegistry::default();
        let mut cd = Cooldowns::default();
        cd.start(SkillKind::Fireball, &registry);
        cd.start(SkillKind::Parry, &registry);

        let fireball_before = cd.remaining(SkillKind::Fireball);
        let parry_before = cd.remaining(SkillKind::Parry);
        cd.tick(0.25);

        assert_eq!(cd.remaining(SkillKind::Fireball), fireball_before - 0.25);
        assert_eq!(cd.remaining(SkillKind::Parry), parry_before - 0.25);
    }
}
