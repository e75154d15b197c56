//! Headless прогон симуляции ASHFALL
//!
//! Запускает App без рендера: игрок на платформе, пара врагов,
//! скриптованный input. Smoke-проверка тикового цикла.

use bevy::prelude::*;

use ashfall_simulation::{create_headless_app, spawn_hostile, spawn_platform, spawn_player};

fn main() {
    println!("Starting ASHFALL headless simulation");

    let mut app = create_headless_app();

    {
        let world = app.world_mut();
        let mut commands = world.commands();
        spawn_platform(&mut commands, Vec2::new(0.0, -0.5), Vec2::new(20.0, 0.5));
        spawn_player(&mut commands, Vec2::new(0.0, 1.0));
        spawn_hostile(&mut commands, Vec2::new(3.0, 1.0), 60);
        spawn_hostile(&mut commands, Vec2::new(-4.0, 1.0), 60);
    }
    app.world_mut().flush();

    for tick in 0..1000 {
        // Идём вправо, на 120-м тике бьём
        app.world_mut()
            .send_event(ashfall_simulation::PlayerInputEvent {
                move_x: 1.0,
                attack: tick == 120,
                ..Default::default()
            });
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("Simulation complete!");
}
