use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::Validate;
use crate::game::GameRules;
use crate::identifiers::KeyCode;
use crate::vec2::Vec2;

pub const MAX_PLAYERS: u32 = 10;
const MIN_SIDE: u32 = 4;
const MAX_SIDE: u32 = 1024;

// Key codes as reported by GLFW.
pub const KEY_RIGHT: KeyCode = 262;
pub const KEY_LEFT: KeyCode = 263;
pub const KEY_DOWN: KeyCode = 264;
pub const KEY_UP: KeyCode = 265;
pub const KEY_A: KeyCode = 65;
pub const KEY_D: KeyCode = 68;
pub const KEY_S: KeyCode = 83;
pub const KEY_W: KeyCode = 87;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpPlacement {
    pub position: Vec2,
    pub power: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomPowerUps {
    pub count: u32,
    pub power: u32,
}

impl Default for RandomPowerUps {
    fn default() -> Self {
        Self { count: 0, power: 1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindingSettings {
    pub keycode: KeyCode,
    pub player: u32,
    pub action: Action,
}

impl KeyBindingSettings {
    pub fn new(keycode: KeyCode, player: u32, action: Action) -> Self {
        Self {
            keycode,
            player,
            action,
        }
    }
}

/// Everything needed to set up a game: field, obstacles, players, controls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub width: u32,
    pub height: u32,
    pub player_count: u32,
    pub border_walls: bool,
    pub walls: Vec<Vec2>,
    pub power_ups: Vec<PowerUpPlacement>,
    pub random_power_ups: RandomPowerUps,
    pub seed: Option<u64>,
    pub tick_interval_ms: u64,
    pub rules: GameRules,
    pub bindings: Vec<KeyBindingSettings>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            player_count: 1,
            border_walls: true,
            walls: Vec::new(),
            power_ups: vec![PowerUpPlacement {
                position: Vec2::new(4, 4),
                power: 5,
            }],
            random_power_ups: RandomPowerUps::default(),
            seed: None,
            tick_interval_ms: 125,
            rules: GameRules::default(),
            bindings: vec![
                KeyBindingSettings::new(KEY_UP, 0, Action::MoveUp),
                KeyBindingSettings::new(KEY_DOWN, 0, Action::MoveDown),
                KeyBindingSettings::new(KEY_LEFT, 0, Action::MoveLeft),
                KeyBindingSettings::new(KEY_RIGHT, 0, Action::MoveRight),
                KeyBindingSettings::new(KEY_W, 1, Action::MoveUp),
                KeyBindingSettings::new(KEY_S, 1, Action::MoveDown),
                KeyBindingSettings::new(KEY_A, 1, Action::MoveLeft),
                KeyBindingSettings::new(KEY_D, 1, Action::MoveRight),
            ],
        }
    }
}

impl GameSettings {
    /// Head and tail of every player's first spawn. Players are spread
    /// evenly along the middle row, all facing up.
    pub fn spawn_positions(&self) -> Vec<(Vec2, Vec2)> {
        let width = self.width as i32;
        let total = self.player_count as i32;
        let spacing = width / (total + 1);
        let y = self.height as i32 / 2;

        (0..total)
            .map(|index| {
                let x = if total == 1 { width / 2 } else { (index + 1) * spacing };
                let x = x.min(width - 1);
                (Vec2::new(x, y), Vec2::new(x, y - 1))
            })
            .collect()
    }

    fn in_bounds(&self, pos: Vec2) -> bool {
        (0..self.width as i32).contains(&pos.x) && (0..self.height as i32).contains(&pos.y)
    }

    fn is_border(&self, pos: Vec2) -> bool {
        pos.x == 0 || pos.y == 0 || pos.x == self.width as i32 - 1 || pos.y == self.height as i32 - 1
    }
}

impl Validate for GameSettings {
    fn validate(&self) -> Result<(), String> {
        if !(MIN_SIDE..=MAX_SIDE).contains(&self.width) {
            return Err(format!("Map width must be between {} and {}", MIN_SIDE, MAX_SIDE));
        }
        if !(MIN_SIDE..=MAX_SIDE).contains(&self.height) {
            return Err(format!("Map height must be between {} and {}", MIN_SIDE, MAX_SIDE));
        }
        if !(1..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(format!("Player count must be between 1 and {}", MAX_PLAYERS));
        }
        if self.width < 2 * self.player_count + 1 {
            return Err(format!(
                "Map width {} is too narrow for {} players",
                self.width, self.player_count
            ));
        }
        if !(10..=5000).contains(&self.tick_interval_ms) {
            return Err("Tick interval must be between 10ms and 5000ms".to_string());
        }

        for wall in &self.walls {
            if !self.in_bounds(*wall) {
                return Err(format!("Wall {} is outside the map", wall));
            }
        }
        for power_up in &self.power_ups {
            if !self.in_bounds(power_up.position) {
                return Err(format!("Power-up {} is outside the map", power_up.position));
            }
            if power_up.power == 0 {
                return Err(format!("Power-up {} must have a power of at least 1", power_up.position));
            }
        }
        if self.random_power_ups.count > 0 && self.random_power_ups.power == 0 {
            return Err("Random power-ups must have a power of at least 1".to_string());
        }
        if u64::from(self.random_power_ups.count) * 2 > u64::from(self.width) * u64::from(self.height) {
            return Err("Too many random power-ups for the map size".to_string());
        }

        let walls: HashSet<Vec2> = self.walls.iter().copied().collect();
        let power_ups: HashSet<Vec2> = self.power_ups.iter().map(|p| p.position).collect();
        let mut taken = HashSet::new();
        for (head, tail) in self.spawn_positions() {
            for pos in [head, tail] {
                let blocked = walls.contains(&pos)
                    || power_ups.contains(&pos)
                    || (self.border_walls && self.is_border(pos));
                if blocked || !taken.insert(pos) {
                    return Err(format!("Spawn position {} is blocked", pos));
                }
            }
        }

        let mut keycodes = HashSet::new();
        for binding in &self.bindings {
            if binding.action == Action::None {
                return Err(format!("Key {} is bound to no action", binding.keycode));
            }
            if !keycodes.insert(binding.keycode) {
                return Err(format!("Key {} is bound more than once", binding.keycode));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(GameSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "width: 20\nplayer_count: 2\nrules:\n  dead_player_policy: skip_player\n";
        let settings: GameSettings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.width, 20);
        assert_eq!(settings.height, 32);
        assert_eq!(settings.player_count, 2);
        assert_eq!(settings.rules.dead_player_policy, crate::game::DeadPlayerPolicy::SkipPlayer);
        assert_eq!(settings.bindings.len(), 8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_yaml_walls_and_power_ups() {
        let yaml = "walls:\n  - {x: 3, y: 3}\npower_ups:\n  - position: {x: 5, y: 6}\n    power: 2\n";
        let settings: GameSettings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.walls, vec![Vec2::new(3, 3)]);
        assert_eq!(settings.power_ups[0].power, 2);
    }

    #[test]
    fn test_spawn_positions_are_spread_and_facing_up() {
        let settings = GameSettings {
            player_count: 3,
            ..GameSettings::default()
        };
        let spawns = settings.spawn_positions();

        assert_eq!(spawns.len(), 3);
        assert_eq!(spawns[0], (Vec2::new(8, 16), Vec2::new(8, 15)));
        assert_eq!(spawns[2], (Vec2::new(24, 16), Vec2::new(24, 15)));
        assert_eq!(GameSettings::default().spawn_positions(), vec![(Vec2::new(16, 16), Vec2::new(16, 15))]);
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            GameSettings { width: 2, ..GameSettings::default() },
            GameSettings { player_count: 0, ..GameSettings::default() },
            GameSettings { player_count: 11, ..GameSettings::default() },
            GameSettings { tick_interval_ms: 1, ..GameSettings::default() },
            GameSettings { walls: vec![Vec2::new(32, 0)], ..GameSettings::default() },
            GameSettings { walls: vec![Vec2::new(16, 16)], ..GameSettings::default() },
            GameSettings {
                power_ups: vec![PowerUpPlacement { position: Vec2::new(2, 2), power: 0 }],
                ..GameSettings::default()
            },
            GameSettings {
                bindings: vec![KeyBindingSettings::new(1, 0, Action::None)],
                ..GameSettings::default()
            },
            GameSettings {
                bindings: vec![
                    KeyBindingSettings::new(1, 0, Action::MoveUp),
                    KeyBindingSettings::new(1, 0, Action::MoveDown),
                ],
                ..GameSettings::default()
            },
            GameSettings {
                random_power_ups: RandomPowerUps { count: 600, power: 1 },
                ..GameSettings::default()
            },
        ];

        for settings in cases {
            assert!(settings.validate().is_err(), "{:?} should be invalid", settings);
        }
    }
}
