use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::EngineError;
use crate::identifiers::{KeyCode, PlayerId};
use crate::key_bindings::KeyBindingTable;
use crate::log;
use crate::map::{Cell, Map};
use crate::player::Player;
use crate::vec2::Vec2;

/// What the tick does when it reaches a dead player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadPlayerPolicy {
    /// Stop processing the tick; players after the dead one do not move.
    #[default]
    HaltTick,
    /// Leave the dead player alone and carry on with the next one.
    SkipPlayer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionResolution {
    /// Players move and collide one after another in id order.
    #[default]
    Sequential,
    /// Every player moves first, then collisions are checked against the
    /// whole batch; heads meeting on one cell kill each other.
    Simultaneous,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadPlayerBehavior {
    #[default]
    StayOnField,
    Disappear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub dead_player_policy: DeadPlayerPolicy,
    pub collision_resolution: CollisionResolution,
    pub dead_player_behavior: DeadPlayerBehavior,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    Wall,
    /// Ran into a cell occupied by this player (possibly itself).
    Body(PlayerId),
    /// Landed on the same cell as another head in the same tick.
    HeadOn(PlayerId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Death {
    pub player_id: PlayerId,
    pub position: Vec2,
    pub cause: DeathCause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pickup {
    pub player_id: PlayerId,
    pub position: Vec2,
    pub power: u32,
}

/// Outcome of one call to [`Game::update`]. Losing is reported here, never
/// as an error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub moved: Vec<PlayerId>,
    pub deaths: Vec<Death>,
    pub pickups: Vec<Pickup>,
    /// Set when the tick stopped early at this dead player.
    pub halted_at: Option<PlayerId>,
}

#[derive(Clone, Debug)]
struct PlayerSlot {
    player: Player,
    current_action: Action,
    previous_action: Action,
}

/// Honours only genuine 90 degree turns. No input, continuing straight and
/// reversing all keep the current heading.
pub fn resolve_direction(forward: Vec2, requested: Vec2) -> Vec2 {
    if requested.is_zero() || forward.dot(requested) != 0 {
        forward
    } else {
        requested
    }
}

pub struct Game {
    map: Map,
    slots: Vec<PlayerSlot>,
    key_bindings: KeyBindingTable,
    rules: GameRules,
    tick: u64,
}

impl Game {
    pub fn new(map: Map) -> Self {
        Self::with_rules(map, GameRules::default())
    }

    pub fn with_rules(map: Map, rules: GameRules) -> Self {
        Self {
            map,
            slots: Vec::new(),
            key_bindings: KeyBindingTable::new(),
            rules,
            tick: 0,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn key_bindings(&self) -> &KeyBindingTable {
        &self.key_bindings
    }

    pub fn key_bindings_mut(&mut self) -> &mut KeyBindingTable {
        &mut self.key_bindings
    }

    pub fn rules(&self) -> GameRules {
        self.rules
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Registers a new, not yet spawned player and returns its id.
    pub fn add_player(&mut self) -> PlayerId {
        let id = PlayerId::new(self.slots.len() as u32);
        self.slots.push(PlayerSlot {
            player: Player::new(id, self.map.extent()),
            current_action: Action::None,
            previous_action: Action::None,
        });
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.slots.get(id.index()).map(|slot| &slot.player)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.slots.iter().map(|slot| &slot.player)
    }

    pub fn player_count(&self) -> usize {
        self.slots.len()
    }

    pub fn alive_count(&self) -> usize {
        self.players().filter(|p| p.is_alive()).count()
    }

    /// Spawns a two-segment snake and marks it on the map.
    pub fn spawn_player(&mut self, id: PlayerId, head: Vec2, tail: Vec2) -> Result<(), EngineError> {
        let extent = self.map.extent();
        for pos in [head, tail] {
            if !extent.contains(pos) {
                return Err(EngineError::OutOfBounds {
                    pos,
                    width: extent.width,
                    height: extent.height,
                });
            }
        }

        let slot = self.slot_mut(id)?;
        slot.player.spawn(head, tail)?;
        slot.current_action = Action::None;
        slot.previous_action = Action::None;
        self.map.stamp_player(&self.slots[id.index()].player);
        Ok(())
    }

    /// Stores the action the player will take on the next tick.
    pub fn set_action(&mut self, id: PlayerId, action: Action) -> Result<(), EngineError> {
        self.slot_mut(id)?.current_action = action;
        Ok(())
    }

    pub fn pending_action(&self, id: PlayerId) -> Option<Action> {
        self.slots.get(id.index()).map(|slot| slot.current_action)
    }

    pub fn previous_action(&self, id: PlayerId) -> Option<Action> {
        self.slots.get(id.index()).map(|slot| slot.previous_action)
    }

    /// Resolves a key press through the binding table and queues the bound
    /// action. Returns the player it was queued for.
    pub fn handle_key(&mut self, keycode: KeyCode) -> Option<PlayerId> {
        let binding = self.key_bindings.lookup(keycode)?;
        match self.slots.get_mut(binding.player_id.index()) {
            Some(slot) => {
                slot.current_action = binding.action;
                Some(binding.player_id)
            }
            None => {
                log!("Key {} is bound to missing player {}", keycode, binding.player_id);
                None
            }
        }
    }

    /// Advances the simulation by one tick. Occupancy is read from the last
    /// [`Game::stamp_players`] pass, so callers must stamp after every update.
    pub fn update(&mut self) -> Result<TickReport, EngineError> {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let mut heads = Vec::with_capacity(self.slots.len());
        for index in 0..self.slots.len() {
            let player = &self.slots[index].player;
            if !player.is_alive() {
                match self.rules.dead_player_policy {
                    DeadPlayerPolicy::HaltTick => {
                        report.halted_at = Some(player.id());
                        break;
                    }
                    DeadPlayerPolicy::SkipPlayer => continue,
                }
            }

            let head = self.advance(index)?;
            report.moved.push(self.slots[index].player.id());
            match self.rules.collision_resolution {
                CollisionResolution::Sequential => self.resolve_head(index, head, None, &mut report),
                CollisionResolution::Simultaneous => heads.push((index, head)),
            }
        }

        for &(index, head) in &heads {
            let rival = heads
                .iter()
                .find(|(other, pos)| *other != index && *pos == head)
                .map(|(other, _)| self.slots[*other].player.id());
            self.resolve_head(index, head, rival, &mut report);
        }

        if self.rules.dead_player_behavior == DeadPlayerBehavior::Disappear {
            for death in &report.deaths {
                let slot = &mut self.slots[death.player_id.index()];
                self.map.erase_player(&slot.player);
                slot.player.kill();
            }
        }

        Ok(report)
    }

    /// Writes every live player's segments into the map, in id order. When
    /// two players share a cell the one stamped last owns it.
    pub fn stamp_players(&mut self) {
        for slot in &self.slots {
            self.map.stamp_player(&slot.player);
        }
    }

    /// Moves the player one cell and consumes its pending action. Returns the
    /// new head position.
    fn advance(&mut self, index: usize) -> Result<Vec2, EngineError> {
        let slot = &mut self.slots[index];
        let id = slot.player.id();
        let (Some(front), Some(forward)) = (slot.player.front(), slot.player.forward()) else {
            return Err(EngineError::NotAlive(id));
        };

        let direction = resolve_direction(forward, slot.current_action.direction());
        let head = self.map.wrap(front + direction);
        slot.player.push_front(head)?;

        if !slot.player.consume_growth()
            && let Some(tail) = slot.player.pop_back()
        {
            self.map.set_cell(tail, Cell::Empty);
        }

        slot.previous_action = slot.current_action;
        slot.current_action = Action::None;
        Ok(head)
    }

    fn resolve_head(
        &mut self,
        index: usize,
        head: Vec2,
        rival: Option<PlayerId>,
        report: &mut TickReport,
    ) {
        let player = &mut self.slots[index].player;
        let id = player.id();
        let cause = match (self.map.get_cell(head), rival) {
            (Cell::Wall, _) => Some(DeathCause::Wall),
            (Cell::Player(owner), _) => Some(DeathCause::Body(owner)),
            (_, Some(other)) => Some(DeathCause::HeadOn(other)),
            (Cell::PowerUp(power), None) => {
                player.add_growth(power);
                report.pickups.push(Pickup {
                    player_id: id,
                    position: head,
                    power,
                });
                log!("[{}] picked up power {} at {}", id, power, head);
                None
            }
            (Cell::Empty, None) => None,
        };

        if let Some(cause) = cause {
            player.mark_dead();
            report.deaths.push(Death {
                player_id: id,
                position: head,
                cause,
            });
            log!("[{}] died at {}: {:?}", id, head, cause);
        }
    }

    fn slot_mut(&mut self, id: PlayerId) -> Result<&mut PlayerSlot, EngineError> {
        self.slots
            .get_mut(id.index())
            .ok_or(EngineError::UnknownPlayer(id))
    }
}
