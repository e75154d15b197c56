//! Базовые компоненты персонажа: Health, Mana, CharacterStats, Facing

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Здоровье персонажа
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }

    pub fn restore_full(&mut self) {
        self.current = self.max;
    }
}

/// Мана — ресурс для заклинаний
///
/// Инвариант: 0.0 ≤ current ≤ max.
/// Тратится только через `consume`, который сначала проверяет достаточность:
/// либо весь списанный объём, либо ничего.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Mana {
    pub current: f32,
    pub max: f32,
    /// Пассивное восстановление (units per second)
    pub regen_rate: f32,
}

impl Default for Mana {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Mana {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 5.0,
        }
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    /// Списывает cost, если хватает. Возвращает false без side effects если нет.
    pub fn consume(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }

    pub fn regenerate(&mut self, delta_time: f32) {
        self.current = (self.current + self.regen_rate * delta_time).min(self.max);
    }

    pub fn restore_full(&mut self) {
        self.current = self.max;
    }
}

/// Боевые статы персонажа (query surface статовой модели)
///
/// Меняются уровнем/экипировкой снаружи симуляции; состояния их только читают.
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct CharacterStats {
    /// Базовый урон (baseline 100-point scale)
    pub base_damage: u32,
    /// Множитель второго удара комбо
    pub second_combo_mult: f32,
    /// Множитель третьего удара комбо
    pub third_combo_mult: f32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            base_damage: 20,
            second_combo_mult: 1.25,
            third_combo_mult: 1.6,
        }
    }
}

impl CharacterStats {
    /// Множитель по индексу комбо (0 → 1.0, 1 → second, 2 → third)
    pub fn combo_multiplier(&self, combo_index: u8) -> f32 {
        match combo_index {
            0 => 1.0,
            1 => self.second_combo_mult,
            _ => self.third_combo_mult,
        }
    }
}

/// Направление взгляда персонажа (±1 по X)
///
/// Меняется ТОЛЬКО через `flip()` — камера и зеркалирование hitbox'ов
/// во frontend'е зависят от консистентности sign/mirrored.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Facing {
    sign: i8,
    mirrored: bool,
}

impl Default for Facing {
    fn default() -> Self {
        Self {
            sign: 1,
            mirrored: false,
        }
    }
}

impl Facing {
    pub fn sign(&self) -> i8 {
        self.sign
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Направление как f32 (для velocity/offset математики)
    pub fn dir_x(&self) -> f32 {
        self.sign as f32
    }

    pub fn flip(&mut self) {
        self.sign = -self.sign;
        self.mirrored = !self.mirrored;
    }

    /// Повернуться в сторону точки (flip только при несовпадении знака)
    pub fn face_towards(&mut self, dx: f32) {
        if dx != 0.0 && (dx < 0.0) != (self.sign < 0) {
            self.flip();
        }
    }
}

/// Окно неуязвимости (независимо от ghost mode)
///
/// `block` — state-scoped флаг (живёт ровно пока активен выставивший его
/// state, снимается в его Exit). `window` — таймированное окно, гаснет само.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Invulnerability {
    pub block: bool,
    pub window: f32,
}

impl Invulnerability {
    pub fn is_active(&self) -> bool {
        self.block || self.window > 0.0
    }

    /// Выдать таймированное окно (не укорачивая уже активное)
    pub fn grant_window(&mut self, duration: f32) {
        self.window = self.window.max(duration);
    }

    pub fn tick(&mut self, delta: f32) {
        if self.window > 0.0 {
            self.window -= delta;
        }
    }
}
