//! Логические input-сигналы игрока.
//!
//! Frontend (или тест) шлёт `PlayerInputEvent` каждый frame; симуляция
//! сворачивает их в per-tick снапшот `FrameInput`. Ядро не знает про
//! клавиатуру/геймпад — только edge/held сигналы.

use bevy::prelude::*;

/// Player input event (frontend → симуляция), один на frame
///
/// Edge-поля (`*_pressed`) — just_pressed на стороне frontend'а;
/// held-поля — состояние удержания в момент опроса.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct PlayerInputEvent {
    /// Горизонтальная ось движения, -1.0..1.0
    pub move_x: f32,
    /// Прыжок (edge)
    pub jump: bool,
    /// Основная атака (edge)
    pub attack: bool,
    /// Dash (edge); grounded/airborne решает симуляция
    pub dash: bool,
    /// Electric dash (edge)
    pub electric_dash: bool,
    /// Парирование (edge)
    pub parry: bool,
    /// Присед (held)
    pub crouch: bool,
    /// Ice shard / spell 1 (edge)
    pub ice: bool,
    /// Fire channel / spell 2 (held; edge выводится из перехода)
    pub fire_held: bool,
    /// Earth push (edge)
    pub earth: bool,
    /// Gale push (edge)
    pub gale: bool,
    /// Fireball (edge)
    pub fireball: bool,
    /// Void rush (edge)
    pub void_rush: bool,
}

/// Снапшот input'а текущего тика (single local player → Resource)
///
/// Заполняется `collect_frame_input` до driver-системы; состояния читают
/// только его, не события напрямую.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub move_x: f32,
    pub jump: bool,
    pub attack: bool,
    pub dash: bool,
    pub electric_dash: bool,
    pub parry: bool,
    pub crouch_held: bool,
    pub ice: bool,
    pub fire_held: bool,
    pub fire_pressed: bool,
    pub earth: bool,
    pub gale: bool,
    pub fireball: bool,
    pub void_rush: bool,
}

/// Система: свернуть события frame'а в FrameInput
///
/// Несколько событий за тик (frontend частит) — edges OR'ятся,
/// оси/held берут последнее значение. Нет событий → нейтральный input.
pub fn collect_frame_input(
    mut events: EventReader<PlayerInputEvent>,
    mut frame: ResMut<FrameInput>,
) {
    let was_fire_held = frame.fire_held;
    *frame = FrameInput::default();

    for ev in events.read() {
        frame.move_x = ev.move_x;
        frame.crouch_held = ev.crouch;
        frame.fire_held = ev.fire_held;

        frame.jump |= ev.jump;
        frame.attack |= ev.attack;
        frame.dash |= ev.dash;
        frame.electric_dash |= ev.electric_dash;
        frame.parry |= ev.parry;
        frame.ice |= ev.ice;
        frame.earth |= ev.earth;
        frame.gale |= ev.gale;
        frame.fireball |= ev.fireball;
        frame.void_rush |= ev.void_rush;
    }

    // Edge для fire channel: не был зажат → стал зажат
    frame.fire_pressed = frame.fire_held && !was_fire_held;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_ors_edges_and_takes_last_axis() {
        let mut app = App::new();
        app.add_event::<PlayerInputEvent>();
        app.insert_resource(FrameInput::default());
        app.add_systems(Update, collect_frame_input);

        app.world_mut().send_event(PlayerInputEvent {
            move_x: 0.5,
            attack: true,
            ..Default::default()
        });
        app.world_mut().send_event(PlayerInputEvent {
            move_x: -1.0,
            dash: true,
            ..Default::default()
        });
        app.update();

        let frame = app.world().resource::<FrameInput>();
        assert_eq!(frame.move_x, -1.0);
        assert!(frame.attack);
        assert!(frame.dash);
    }

    #[test]
    fn test_fire_edge_from_held_transition() {
        let mut app = App::new();
        app.add_event::<PlayerInputEvent>();
        app.insert_resource(FrameInput::default());
        app.add_systems(Update, collect_frame_input);

        app.world_mut().send_event(PlayerInputEvent {
            fire_held: true,
            ..Default::default()
        });
        app.update();
        assert!(app.world().resource::<FrameInput>().fire_pressed);

        app.world_mut().send_event(PlayerInputEvent {
            fire_held: true,
            ..Default::default()
        });
        app.update();
        // Всё ещё зажат — edge не повторяется
        assert!(!app.world().resource::<FrameInput>().fire_pressed);
        assert!(app.world().resource::<FrameInput>().fire_held);
    }

    #[test]
    fn test_no_events_means_neutral_input() {
        let mut app = App::new();
        app.add_event::<PlayerInputEvent>();
        app.insert_resource(FrameInput {
            move_x: 1.0,
            attack: true,
            ..Default::default()
        });
        app.add_systems(Update, collect_frame_input);
        app.update();

        let frame = app.world().resource::<FrameInput>();
        assert_eq!(frame.move_x, 0.0);
        assert!(!frame.attack);
    }
}
