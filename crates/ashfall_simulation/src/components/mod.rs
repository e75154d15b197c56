//! ECS Components игрового ядра
//!
//! Организация по доменам:
//! - actor: базовые характеристики (health, mana, статы, facing)
//! - player: player marker, экипированное оружие
//! - movement: velocity персонажа
//! - hostile: враждебные entity и их снапшот для targeting

pub mod actor;
pub mod hostile;
pub mod movement;
pub mod player;

// Re-exports для удобного импорта
pub use actor::*;
pub use hostile::*;
pub use movement::*;
pub use player::*;
