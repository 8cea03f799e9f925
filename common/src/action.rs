use serde::{Deserialize, Serialize};

use crate::vec2::Vec2;

/// Mutually exclusive player decisions for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

impl Action {
    pub fn direction(self) -> Vec2 {
        action_direction(self)
    }
}

pub fn action_direction(action: Action) -> Vec2 {
    match action {
        Action::None => Vec2::ZERO,
        Action::MoveUp => Vec2::UP,
        Action::MoveDown => Vec2::DOWN,
        Action::MoveLeft => Vec2::LEFT,
        Action::MoveRight => Vec2::RIGHT,
    }
}
