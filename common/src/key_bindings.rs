use crate::action::Action;
use crate::error::EngineError;
use crate::identifiers::{KeyCode, PlayerId};

const MIN_CAPACITY: usize = 8;
// Maximum load factor of 3/4, kept as a ratio to stay in integer arithmetic.
const MAX_LOAD_NUM: usize = 3;
const MAX_LOAD_DEN: usize = 4;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub player_id: PlayerId,
    pub action: Action,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Unused,
    Tombstone,
    Occupied { keycode: KeyCode, binding: Binding },
}

/// Maps input codes to player actions.
///
/// Open addressing with linear probing. Deleted entries leave a tombstone so
/// that probe chains running through them still reach later entries. Every
/// keycode value is usable; slot state is tracked separately from the key.
#[derive(Clone, Debug, Default)]
pub struct KeyBindingTable {
    slots: Vec<Slot>,
    // Live entries.
    len: usize,
    // Live entries plus tombstones; bounds the probe length.
    occupied: usize,
}

fn hash(keycode: KeyCode) -> u32 {
    keycode
        .to_le_bytes()
        .iter()
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME))
}

fn exceeds_load(entries: usize, capacity: usize) -> bool {
    entries * MAX_LOAD_DEN > capacity * MAX_LOAD_NUM
}

/// Returns the slot holding `keycode`, or else the slot an insert of it
/// should use: the first tombstone on the probe path if any, otherwise the
/// unused slot that ended the probe.
fn find_slot(slots: &[Slot], keycode: KeyCode) -> usize {
    let capacity = slots.len();
    let ideal = hash(keycode) as usize % capacity;
    let mut tombstone = None;

    for i in 0..capacity {
        let index = (ideal + i) % capacity;
        match slots[index] {
            Slot::Occupied { keycode: k, .. } if k == keycode => return index,
            Slot::Occupied { .. } => {}
            Slot::Tombstone => {
                tombstone.get_or_insert(index);
            }
            Slot::Unused => return tombstone.unwrap_or(index),
        }
    }

    // The load bound keeps at least one unused slot around, so a full probe
    // only ends here when it crossed a tombstone.
    match tombstone {
        Some(index) => index,
        None => unreachable!("key binding table probed {} slots without a free one", capacity),
    }
}

impl KeyBindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Binds `keycode`, overwriting any previous binding. Returns true when
    /// the key was not bound before.
    pub fn map(
        &mut self,
        keycode: KeyCode,
        player_id: PlayerId,
        action: Action,
    ) -> Result<bool, EngineError> {
        if self.slots.is_empty() {
            self.resize()?;
        }

        let binding = Binding { player_id, action };
        let mut index = find_slot(&self.slots, keycode);
        match self.slots[index] {
            Slot::Occupied { .. } => {
                self.slots[index] = Slot::Occupied { keycode, binding };
                return Ok(false);
            }
            Slot::Tombstone => {}
            Slot::Unused => {
                if exceeds_load(self.occupied + 1, self.capacity()) {
                    self.resize()?;
                    index = find_slot(&self.slots, keycode);
                }
                self.occupied += 1;
            }
        }

        self.slots[index] = Slot::Occupied { keycode, binding };
        self.len += 1;
        Ok(true)
    }

    /// Removes the binding for `keycode`. Returns whether one existed.
    pub fn unmap(&mut self, keycode: KeyCode) -> bool {
        if self.len == 0 {
            return false;
        }

        let index = find_slot(&self.slots, keycode);
        match self.slots[index] {
            Slot::Occupied { keycode: k, .. } if k == keycode => {
                self.slots[index] = Slot::Tombstone;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, keycode: KeyCode) -> Option<Binding> {
        if self.len == 0 {
            return None;
        }

        match self.slots[find_slot(&self.slots, keycode)] {
            Slot::Occupied { keycode: k, binding } if k == keycode => Some(binding),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyCode, Binding)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { keycode, binding } => Some((*keycode, *binding)),
            _ => None,
        })
    }

    /// Rebuilds into a table at least twice as large, rehashing live entries
    /// and dropping tombstones.
    fn resize(&mut self) -> Result<(), EngineError> {
        let capacity = self.capacity().saturating_mul(2).max(MIN_CAPACITY);
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| EngineError::Allocation {
                what: "key binding",
                capacity,
            })?;
        slots.resize(capacity, Slot::Unused);

        for slot in &self.slots {
            if let Slot::Occupied { keycode, .. } = slot {
                let index = find_slot(&slots, *keycode);
                slots[index] = *slot;
            }
        }

        self.slots = slots;
        self.occupied = self.len;
        Ok(())
    }
}
