use crate::error::EngineError;
use crate::game::Game;
use crate::identifiers::PlayerId;
use crate::log;
use crate::map::{Cell, Extent, Map};
use crate::session_rng::SessionRng;
use crate::settings::GameSettings;
use crate::vec2::Vec2;

const PLACEMENT_ATTEMPTS: usize = 100;

fn checked(extent: Extent, pos: Vec2) -> Result<Vec2, EngineError> {
    if extent.contains(pos) {
        Ok(pos)
    } else {
        Err(EngineError::OutOfBounds {
            pos,
            width: extent.width,
            height: extent.height,
        })
    }
}

/// Builds a ready-to-run game from validated settings: map, obstacles,
/// spawned players and key bindings.
pub fn build_game(settings: &GameSettings, rng: &mut SessionRng) -> Result<Game, EngineError> {
    let mut map = Map::new(settings.width, settings.height)?;
    let extent = map.extent();

    if settings.border_walls {
        map.add_border_walls();
    }
    for wall in &settings.walls {
        map.set_cell(checked(extent, *wall)?, Cell::Wall);
    }
    for power_up in &settings.power_ups {
        map.set_cell(checked(extent, power_up.position)?, Cell::PowerUp(power_up.power));
    }

    let mut game = Game::with_rules(map, settings.rules);
    for (head, tail) in settings.spawn_positions() {
        let id = game.add_player();
        game.spawn_player(id, head, tail)?;
    }

    let mut placed = 0;
    for _ in 0..settings.random_power_ups.count {
        if place_random_power_up(game.map_mut(), rng, settings.random_power_ups.power) {
            placed += 1;
        }
    }
    if placed < settings.random_power_ups.count {
        log!(
            "Placed {} of {} random power-ups (seed {})",
            placed,
            settings.random_power_ups.count,
            rng.seed()
        );
    }

    for binding in &settings.bindings {
        if binding.player >= settings.player_count {
            continue;
        }
        game.key_bindings_mut()
            .map(binding.keycode, PlayerId::new(binding.player), binding.action)?;
    }

    log!(
        "Built {}x{} map with {} players and {} key bindings",
        extent.width,
        extent.height,
        game.player_count(),
        game.key_bindings().len()
    );
    Ok(game)
}

fn place_random_power_up(map: &mut Map, rng: &mut SessionRng, power: u32) -> bool {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let pos = rng.random_position(map.extent());
        if map.get_cell(pos).is_empty() {
            map.set_cell(pos, Cell::PowerUp(power));
            return true;
        }
    }
    false
}
