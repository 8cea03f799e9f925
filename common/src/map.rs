use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::identifiers::PlayerId;
use crate::player::Player;
use crate::vec2::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Wall,
    Player(PlayerId),
    /// Number of segments the player grows by on pickup.
    PowerUp(u32),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Cell::Wall | Cell::Player(_))
    }

    fn symbol(&self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Wall => '#',
            Cell::Player(id) => char::from_digit(id.get() % 10, 10).unwrap_or('@'),
            Cell::PowerUp(_) => '*',
        }
    }
}

/// Size of the toroidal play-field. Every coordinate computation that can
/// leave the field goes through [`Extent::wrap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub width: i32,
    pub height: i32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        };
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        let width = i32::try_from(width).map_err(|_| invalid())?;
        let height = i32::try_from(height).map_err(|_| invalid())?;
        Ok(Self { width, height })
    }

    pub fn area(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        let mut x = pos.x % self.width;
        if x < 0 {
            x += self.width;
        }
        let mut y = pos.y % self.height;
        if y < 0 {
            y += self.height;
        }
        Vec2::new(x, y)
    }

    /// Shortest offset leading from `from` to `to` on the torus.
    pub fn offset_between(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            shortest_axis_offset(to.x - from.x, self.width),
            shortest_axis_offset(to.y - from.y, self.height),
        )
    }

    /// True when `a` and `b` are one step apart along exactly one axis,
    /// counting steps across an edge.
    pub fn is_adjacent(&self, a: Vec2, b: Vec2) -> bool {
        self.offset_between(b, a).is_cardinal()
    }

    fn index_of(&self, pos: Vec2) -> usize {
        assert!(
            self.contains(pos),
            "position {} is not wrapped to the {}x{} map",
            pos,
            self.width,
            self.height
        );
        pos.x as usize + pos.y as usize * self.width as usize
    }

    fn position_of(&self, index: usize) -> Vec2 {
        let width = self.width as usize;
        Vec2::new((index % width) as i32, (index / width) as i32)
    }
}

fn shortest_axis_offset(delta: i32, size: i32) -> i32 {
    let d = delta.rem_euclid(size);
    if d * 2 > size { d - size } else { d }
}

/// Flat row-major grid of cells with wraparound addressing.
#[derive(Clone, Debug)]
pub struct Map {
    extent: Extent,
    cells: Vec<Cell>,
}

impl Map {
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        let mut map = Self {
            extent: Extent { width: 1, height: 1 },
            cells: Vec::new(),
        };
        map.set_dimensions(width, height)?;
        map.fill(Cell::Empty);
        Ok(map)
    }

    /// Reallocates the backing storage. Cells keep their flat index, so after
    /// a change of width their positions are meaningless until the map is
    /// filled again; cells beyond the old size start out empty.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        let extent = Extent::new(width, height)?;
        let len = extent.area().ok_or(EngineError::Allocation {
            what: "map",
            capacity: usize::MAX,
        })?;

        if len > self.cells.len() {
            self.cells
                .try_reserve_exact(len - self.cells.len())
                .map_err(|_| EngineError::Allocation { what: "map", capacity: len })?;
        }
        self.cells.resize(len, Cell::Empty);
        self.extent = extent;
        Ok(())
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn width(&self) -> i32 {
        self.extent.width
    }

    pub fn height(&self) -> i32 {
        self.extent.height
    }

    /// `pos` must already be wrapped; anything else is a caller bug.
    pub fn get_cell(&self, pos: Vec2) -> Cell {
        self.cells[self.extent.index_of(pos)]
    }

    pub fn try_get_cell(&self, pos: Vec2) -> Option<Cell> {
        if !self.extent.contains(pos) {
            return None;
        }
        self.cells.get(self.extent.index_of(pos)).copied()
    }

    /// Writes `cell` at the wrapped position `pos` and returns what was there.
    pub fn set_cell(&mut self, pos: Vec2, cell: Cell) -> Cell {
        let index = self.extent.index_of(pos);
        std::mem::replace(&mut self.cells[index], cell)
    }

    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        self.extent.wrap(pos)
    }

    pub fn is_adjacent(&self, a: Vec2, b: Vec2) -> bool {
        self.extent.is_adjacent(a, b)
    }

    pub fn offset_between(&self, from: Vec2, to: Vec2) -> Vec2 {
        self.extent.offset_between(from, to)
    }

    /// Marks every segment of a live player as occupied. Dead players are
    /// left as they are.
    pub fn stamp_player(&mut self, player: &Player) {
        if !player.is_alive() {
            return;
        }
        for segment in player.iter() {
            self.set_cell(segment, Cell::Player(player.id()));
        }
    }

    /// Clears every cell still attributed to `player`.
    pub fn erase_player(&mut self, player: &Player) {
        for segment in player.iter() {
            if self.get_cell(segment) == Cell::Player(player.id()) {
                self.set_cell(segment, Cell::Empty);
            }
        }
    }

    pub fn add_border_walls(&mut self) {
        let (width, height) = (self.width(), self.height());
        for y in 0..height {
            self.set_cell(Vec2::new(0, y), Cell::Wall);
            self.set_cell(Vec2::new(width - 1, y), Cell::Wall);
        }
        for x in 0..width {
            self.set_cell(Vec2::new(x, 0), Cell::Wall);
            self.set_cell(Vec2::new(x, height - 1), Cell::Wall);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vec2, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (self.extent.position_of(i), *cell))
    }

    pub fn count(&self, predicate: impl Fn(&Cell) -> bool) -> usize {
        self.cells.iter().filter(|cell| predicate(cell)).count()
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height()).rev() {
            for x in 0..self.width() {
                write!(f, "{}", self.get_cell(Vec2::new(x, y)).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
