use std::ops::Index;

use crate::error::EngineError;
use crate::identifiers::PlayerId;
use crate::map::Extent;
use crate::vec2::Vec2;

const MIN_CAPACITY: usize = 8;

/// A single snake.
///
/// Segments are plain positions kept in a double-ended ring buffer: index 0
/// is the head, `len() - 1` the tail. Moving pushes a new head and pops the
/// tail instead of shifting every segment. While alive the body has at least
/// two segments and neighbouring segments are always 4-adjacent on the
/// wrapped field.
#[derive(Clone, Debug)]
pub struct Player {
    id: PlayerId,
    alive: bool,
    pending_growth: u32,
    extent: Extent,
    slots: Vec<Vec2>,
    head: usize,
    count: usize,
}

impl Player {
    pub fn new(id: PlayerId, extent: Extent) -> Self {
        Self {
            id,
            alive: false,
            pending_growth: 0,
            extent,
            slots: Vec::new(),
            head: 0,
            count: 0,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn pending_growth(&self) -> u32 {
        self.pending_growth
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Places a fresh two-segment snake. Only valid on a dead player.
    pub fn spawn(&mut self, head: Vec2, tail: Vec2) -> Result<(), EngineError> {
        if self.alive {
            return Err(EngineError::AlreadyAlive(self.id));
        }
        if !self.extent.is_adjacent(head, tail) {
            return Err(EngineError::NotAdjacent {
                segment: head,
                neighbour: tail,
            });
        }

        self.head = 0;
        self.count = 0;
        self.pending_growth = 0;
        if self.capacity() < 2 {
            self.grow()?;
        }
        self.slots[0] = head;
        self.slots[1] = tail;
        self.count = 2;
        self.alive = true;
        Ok(())
    }

    /// Resets to the empty, non-alive state. Storage is kept for the next
    /// spawn.
    pub fn kill(&mut self) {
        self.alive = false;
        self.pending_growth = 0;
        self.head = 0;
        self.count = 0;
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        (index < self.count).then(|| self.slots[self.physical(index)])
    }

    pub fn front(&self) -> Option<Vec2> {
        self.get(0)
    }

    pub fn back(&self) -> Option<Vec2> {
        self.count.checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.count).map(|i| self.slots[self.physical(i)])
    }

    /// Direction of the last step: the unit offset from the neck to the head.
    pub fn forward(&self) -> Option<Vec2> {
        let front = self.get(0)?;
        let neck = self.get(1)?;
        Some(self.extent.offset_between(neck, front))
    }

    pub fn push_front(&mut self, segment: Vec2) -> Result<(), EngineError> {
        self.check_extension(segment, self.front(), self.get(1))?;
        if self.count == self.capacity() {
            self.grow()?;
        }

        let capacity = self.capacity();
        self.head = (self.head + capacity - 1) % capacity;
        self.slots[self.head] = segment;
        self.count += 1;
        Ok(())
    }

    pub fn push_back(&mut self, segment: Vec2) -> Result<(), EngineError> {
        let before_back = self.count.checked_sub(2).and_then(|i| self.get(i));
        self.check_extension(segment, self.back(), before_back)?;
        if self.count == self.capacity() {
            self.grow()?;
        }

        let slot = self.physical(self.count);
        self.slots[slot] = segment;
        self.count += 1;
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<Vec2> {
        let segment = self.front()?;
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        Some(segment)
    }

    pub fn pop_back(&mut self) -> Option<Vec2> {
        let segment = self.back()?;
        self.count -= 1;
        Some(segment)
    }

    pub(crate) fn mark_dead(&mut self) {
        self.alive = false;
    }

    pub(crate) fn add_growth(&mut self, power: u32) {
        self.pending_growth = self.pending_growth.saturating_add(power);
    }

    /// Spends one unit of pending growth if there is any.
    pub(crate) fn consume_growth(&mut self) -> bool {
        if self.pending_growth == 0 {
            return false;
        }
        self.pending_growth -= 1;
        true
    }

    fn check_extension(
        &self,
        segment: Vec2,
        end: Option<Vec2>,
        beside_end: Option<Vec2>,
    ) -> Result<(), EngineError> {
        if let Some(end) = end
            && !self.extent.is_adjacent(segment, end)
        {
            return Err(EngineError::NotAdjacent {
                segment,
                neighbour: end,
            });
        }
        if beside_end == Some(segment) {
            return Err(EngineError::ReversalIntoNeck { segment });
        }
        Ok(())
    }

    fn physical(&self, index: usize) -> usize {
        (self.head + index) % self.capacity()
    }

    fn grow(&mut self) -> Result<(), EngineError> {
        let capacity = self.capacity().saturating_mul(2).max(MIN_CAPACITY);
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| EngineError::Allocation {
                what: "player",
                capacity,
            })?;

        slots.extend(self.iter());
        slots.resize(capacity, Vec2::ZERO);
        self.slots = slots;
        self.head = 0;
        Ok(())
    }
}

impl Index<usize> for Player {
    type Output = Vec2;

    fn index(&self, index: usize) -> &Vec2 {
        assert!(
            index < self.count,
            "segment index {} out of range for player {} with {} segments",
            index,
            self.id,
            self.count
        );
        &self.slots[self.physical(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent() -> Extent {
        Extent::new(16, 16).unwrap()
    }

    fn spawned(head: Vec2, tail: Vec2) -> Player {
        let mut player = Player::new(PlayerId::new(0), extent());
        player.spawn(head, tail).unwrap();
        player
    }

    fn assert_adjacent_chain(player: &Player) {
        let segments: Vec<Vec2> = player.iter().collect();
        for pair in segments.windows(2) {
            assert!(
                player.extent.is_adjacent(pair[0], pair[1]),
                "{} and {} are not adjacent",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_spawn_creates_two_segments() {
        let player = spawned(Vec2::new(5, 6), Vec2::new(5, 5));

        assert!(player.is_alive());
        assert_eq!(player.len(), 2);
        assert_eq!(player.front(), Some(Vec2::new(5, 6)));
        assert_eq!(player.back(), Some(Vec2::new(5, 5)));
        assert_eq!(player.forward(), Some(Vec2::UP));
    }

    #[test]
    fn test_spawn_rejects_live_player_and_gaps() {
        let mut player = spawned(Vec2::new(5, 6), Vec2::new(5, 5));
        assert_eq!(
            player.spawn(Vec2::new(1, 1), Vec2::new(1, 2)),
            Err(EngineError::AlreadyAlive(PlayerId::new(0)))
        );

        let mut fresh = Player::new(PlayerId::new(1), extent());
        assert!(matches!(
            fresh.spawn(Vec2::new(1, 1), Vec2::new(2, 2)),
            Err(EngineError::NotAdjacent { .. })
        ));
        assert!(!fresh.is_alive());
    }

    #[test]
    fn test_push_front_rejects_gap_and_reversal() {
        let mut player = spawned(Vec2::new(5, 6), Vec2::new(5, 5));

        assert!(matches!(
            player.push_front(Vec2::new(5, 8)),
            Err(EngineError::NotAdjacent { .. })
        ));
        assert_eq!(
            player.push_front(Vec2::new(5, 5)),
            Err(EngineError::ReversalIntoNeck {
                segment: Vec2::new(5, 5)
            })
        );
        assert_eq!(player.len(), 2);
    }

    #[test]
    fn test_push_back_checks_tail_side() {
        let mut player = spawned(Vec2::new(5, 6), Vec2::new(5, 5));

        player.push_back(Vec2::new(5, 4)).unwrap();
        assert_eq!(player.back(), Some(Vec2::new(5, 4)));
        assert!(matches!(
            player.push_back(Vec2::new(5, 6)),
            Err(EngineError::NotAdjacent { .. })
        ));
        assert_eq!(
            player.push_back(Vec2::new(5, 5)),
            Err(EngineError::ReversalIntoNeck {
                segment: Vec2::new(5, 5)
            })
        );
        assert_adjacent_chain(&player);
    }

    #[test]
    fn test_growth_preserves_logical_order() {
        let mut player = spawned(Vec2::new(0, 1), Vec2::new(0, 0));
        // Move the head offset away from zero before forcing a reallocation.
        player.push_front(Vec2::new(0, 2)).unwrap();
        assert_eq!(player.pop_back(), Some(Vec2::new(0, 0)));

        let mut expected: Vec<Vec2> = player.iter().collect();
        for y in 3..40 {
            let pos = player.extent.wrap(Vec2::new(0, y));
            player.push_front(pos).unwrap();
            expected.insert(0, pos);
        }

        assert_eq!(player.iter().collect::<Vec<_>>(), expected);
        assert!(player.capacity() >= player.len());
        assert_eq!(player[0], Vec2::new(0, 39 % 16));
        assert_adjacent_chain(&player);
    }

    #[test]
    fn test_capacity_at_least_doubles() {
        let mut player = spawned(Vec2::new(1, 0), Vec2::new(0, 0));
        let initial = player.capacity();

        for x in 2..initial as i32 {
            player.push_front(Vec2::new(x, 0)).unwrap();
        }
        assert_eq!(player.len(), initial);
        assert_eq!(player.capacity(), initial);

        player.push_front(Vec2::new(initial as i32, 0)).unwrap();
        assert!(player.capacity() >= initial * 2);
    }

    #[test]
    fn test_moves_keep_adjacency_across_edges() {
        let mut player = spawned(Vec2::new(14, 3), Vec2::new(13, 3));
        let mut directions = Vec::new();
        directions.extend(std::iter::repeat_n(Vec2::RIGHT, 20));
        directions.extend(std::iter::repeat_n(Vec2::DOWN, 20));
        directions.extend(std::iter::repeat_n(Vec2::LEFT, 20));
        directions.extend(std::iter::repeat_n(Vec2::UP, 20));

        for (step, dir) in directions.into_iter().enumerate() {
            let next = player.extent.wrap(player.front().unwrap() + dir);
            player.push_front(next).unwrap();
            if step % 3 != 0 {
                player.pop_back();
            }
            assert_adjacent_chain(&player);
        }
    }

    #[test]
    fn test_forward_across_edge() {
        let player = spawned(Vec2::new(0, 7), Vec2::new(15, 7));
        assert_eq!(player.forward(), Some(Vec2::RIGHT));
    }

    #[test]
    fn test_pop_both_ends() {
        let mut player = spawned(Vec2::new(3, 3), Vec2::new(3, 2));
        player.push_front(Vec2::new(4, 3)).unwrap();

        assert_eq!(player.pop_front(), Some(Vec2::new(4, 3)));
        assert_eq!(player.pop_back(), Some(Vec2::new(3, 2)));
        assert_eq!(player.pop_back(), Some(Vec2::new(3, 3)));
        assert_eq!(player.pop_back(), None);
        assert_eq!(player.pop_front(), None);
    }

    #[test]
    #[should_panic]
    fn test_index_past_count_panics() {
        let player = spawned(Vec2::new(3, 3), Vec2::new(3, 2));
        let _ = player[2];
    }

    #[test]
    fn test_kill_then_respawn() {
        let mut player = spawned(Vec2::new(3, 3), Vec2::new(3, 2));
        player.add_growth(4);
        player.kill();

        assert!(!player.is_alive());
        assert!(player.is_empty());
        assert_eq!(player.pending_growth(), 0);

        player.spawn(Vec2::new(9, 9), Vec2::new(10, 9)).unwrap();
        assert_eq!(player.forward(), Some(Vec2::LEFT));
    }

    #[test]
    fn test_consume_growth() {
        let mut player = spawned(Vec2::new(3, 3), Vec2::new(3, 2));
        player.add_growth(2);

        assert!(player.consume_growth());
        assert!(player.consume_growth());
        assert!(!player.consume_growth());
        assert_eq!(player.pending_growth(), 0);
    }
}
