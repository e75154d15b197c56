//! Локомоция: Idle, Move, Air, Crouch.

use super::machine::{ActionState, EnterOutcome, StateCtx};

/// Скорость бега (m/s)
pub const MOVE_SPEED: f32 = 6.0;
/// Импульс прыжка (m/s)
pub const JUMP_SPEED: f32 = 12.0;
/// Мёртвая зона оси движения
pub const AXIS_DEADZONE: f32 = 0.05;

fn has_move_input(ctx: &StateCtx) -> bool {
    ctx.input.move_x.abs() > AXIS_DEADZONE
}

fn try_jump(ctx: &mut StateCtx) {
    if ctx.input.jump && ctx.ground.grounded {
        ctx.body.velocity.y = JUMP_SPEED;
    }
}

pub fn update_idle(ctx: &mut StateCtx) -> Option<ActionState> {
    ctx.body.velocity.x = 0.0;
    try_jump(ctx);

    if !ctx.ground.grounded {
        return Some(ActionState::Air);
    }
    if has_move_input(ctx) {
        return Some(ActionState::Move);
    }
    None
}

pub fn update_move(ctx: &mut StateCtx) -> Option<ActionState> {
    ctx.body.velocity.x = ctx.input.move_x * MOVE_SPEED;
    ctx.facing.face_towards(ctx.input.move_x);
    try_jump(ctx);

    if !ctx.ground.grounded {
        return Some(ActionState::Air);
    }
    if !has_move_input(ctx) {
        return Some(ActionState::Idle);
    }
    None
}

/// Air: горизонтальный контроль сохраняется, вертикаль — у гравитации.
/// Назад в Idle когда vy ровно ноль (clamp приземления выставляет его).
pub fn update_air(ctx: &mut StateCtx) -> Option<ActionState> {
    ctx.body.velocity.x = ctx.input.move_x * MOVE_SPEED;
    ctx.facing.face_towards(ctx.input.move_x);

    if ctx.ground.grounded && ctx.body.velocity.y == 0.0 {
        return Some(ActionState::Idle);
    }
    None
}

/// Crouch: уменьшенный collision footprint на Enter, восстановление на Exit
pub fn enter_crouch(ctx: &mut StateCtx) -> EnterOutcome {
    ctx.profile.crouched = true;
    EnterOutcome::Ok
}

pub fn exit_crouch(ctx: &mut StateCtx) {
    ctx.profile.crouched = false;
}

pub fn update_crouch(ctx: &mut StateCtx) -> Option<ActionState> {
    ctx.body.velocity.x = 0.0;

    if !ctx.ground.grounded {
        return Some(ActionState::Air);
    }
    if !ctx.input.crouch_held {
        return Some(ActionState::Idle);
    }
    // Атака из приседа (CrouchMelee) запрашивается в request checks
    None
}
