//! Player marker + экипированное оружие

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component для player-controlled entity
///
/// Input systems используют `With<Player>` filter; в single-player
/// режиме этот компонент несёт ровно один entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Тип оружия ближнего боя — capability tag, решается при экипировке,
/// НЕ через runtime type inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Быстрый меч (стандартное комбо)
    Sword,
    /// Тяжёлый молот (медленнее, урон нормализован от raw damage stat)
    Hammer,
}

/// Экипированное оружие (дескриптор, заполняется системой экипировки снаружи)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct EquippedWeapon {
    pub kind: WeaponKind,
}

impl Default for EquippedWeapon {
    fn default() -> Self {
        Self {
            kind: WeaponKind::Sword,
        }
    }
}
