//! Grid-based multiplayer snake simulation: toroidal map, ring-buffer snake
//! bodies, key binding table and the fixed-step update.

pub mod action;
pub mod config;
pub mod error;
pub mod game;
pub mod identifiers;
pub mod key_bindings;
pub mod logger;
pub mod map;
pub mod player;
pub mod session_rng;
pub mod settings;
pub mod setup;
pub mod vec2;

pub use action::{Action, action_direction};
pub use error::EngineError;
pub use game::{
    CollisionResolution, DeadPlayerBehavior, DeadPlayerPolicy, Death, DeathCause, Game, GameRules,
    Pickup, TickReport, resolve_direction,
};
pub use identifiers::{KeyCode, PlayerId};
pub use key_bindings::{Binding, KeyBindingTable};
pub use map::{Cell, Extent, Map};
pub use player::Player;
pub use session_rng::SessionRng;
pub use settings::GameSettings;
pub use setup::build_game;
pub use vec2::Vec2;
