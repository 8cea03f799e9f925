use serde::{Deserialize, Serialize};
use snake_common::GameSettings;
use snake_common::KeyCode;
use snake_common::config::Validate;

/// A key press the scripted input source delivers before the given tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedPress {
    pub tick: u64,
    pub keycode: KeyCode,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub game: GameSettings,
    pub max_ticks: Option<u64>,
    pub render: bool,
    pub script: Vec<ScriptedPress>,
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        self.game.validate()?;
        if self.max_ticks == Some(0) {
            return Err("Max ticks must be at least 1".to_string());
        }
        if let Some(press) = self.script.iter().find(|p| p.tick == 0) {
            return Err(format!("Scripted press of key {} must target tick 1 or later", press.keycode));
        }
        Ok(())
    }
}
