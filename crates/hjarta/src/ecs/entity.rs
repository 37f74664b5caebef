//! # Entity — Opaque Identifiers
//!
//! An [`Entity`] carries no data. It is a key into the component tables owned
//! by the [`World`](super::world::World).
//!
//! ## Generational Indices
//!
//! Slots are recycled after despawn, so every id pairs a slot index with a
//! generation counter. A handle kept across a despawn keeps its old
//! generation and stops resolving:
//!
//! ```text
//! Entity { index: 3, generation: 0 }  ← spawned, then despawned
//! Entity { index: 3, generation: 1 }  ← next spawn reusing slot 3
//! ```
//!
//! This is what makes weak references such as
//! [`Parent`](super::hierarchy::Parent) safe: a stale id simply fails lookup.
//!
//! ## Opaque Integer Form
//!
//! Outside collaborators (recipe loaders, tooling) see entities as a single
//! `u64`. [`Entity::to_bits`] packs `generation << 32 | index`, and the serde
//! representation uses the same packed integer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A handle to an entity in a [`World`](super::world::World).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Slot index. Recycled after despawn.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into the opaque integer form.
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Rebuild a handle from [`to_bits`](Self::to_bits). The result may refer
    /// to an entity that never existed; lookups on it return nothing.
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.to_bits())
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Entity::from_bits)
    }
}

/// Hands out entity ids and recycles freed slots.
///
/// ```text
/// slots: [(gen 1, free), (gen 0, alive), (gen 2, free)]
/// free:  [0, 2]   ← slots waiting for reuse (LIFO)
/// ```
pub(crate) struct EntityAllocator {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

#[derive(Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn allocate(&mut self) -> Entity {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.alive = true;
                Entity {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    alive: true,
                });
                Entity {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Free a slot. Returns `false` for stale or unknown handles.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = false;
        self.free.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
