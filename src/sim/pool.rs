//! Fixed-capacity entity pools
//!
//! Every category (player bullets, enemy bullets, enemies, pickups) is a
//! preallocated slot arena with a free-list stack, so spawning never
//! allocates. Handles carry a generation so a stale handle to a recycled slot
//! resolves to nothing.

/// Entities stored in a pool must be able to wipe their per-spawn data
pub trait Recycle {
    /// Clear timers, counters and tint before the slot is reused
    fn recycle(&mut self);
}

/// Entity categories owned by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolCategory {
    PlayerBullet,
    EnemyBullet,
    Enemy,
    Pickup,
}

/// Stable reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    item: T,
    active: bool,
    generation: u32,
}

/// Slot arena with an O(1) free list
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
}

impl<T: Default + Recycle> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                item: T::default(),
                active: false,
                generation: 0,
            })
            .collect();
        // Stack pops from the back, so lowest slot is handed out first
        let free_list = (0..capacity).rev().collect();
        Self { slots, free_list }
    }

    /// Take a free slot, or `None` when the pool is exhausted
    pub fn acquire(&mut self) -> Option<(Handle, &mut T)> {
        let index = self.free_list.pop()?;
        let slot = &mut self.slots[index];
        slot.active = true;
        let handle = Handle {
            index: index as u32,
            generation: slot.generation,
        };
        Some((handle, &mut slot.item))
    }

    /// Return a slot to the pool. Stale or already-released handles are ignored.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if !slot.active || slot.generation != handle.generation {
            return false;
        }
        slot.item.recycle();
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index());
        true
    }

    /// Release every active slot
    pub fn release_all(&mut self) {
        let handles: Vec<Handle> = self.handles().collect();
        for handle in handles {
            self.release(handle);
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &s.item)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.item)
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Handles of active slots in slot order
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots.iter().enumerate().filter(|(_, s)| s.active).map(|(i, s)| Handle {
            index: i as u32,
            generation: s.generation,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.active).map(|(i, s)| {
            (
                Handle {
                    index: i as u32,
                    generation: s.generation,
                },
                &s.item,
            )
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter(|(_, s)| s.active).map(|(i, s)| {
            (
                Handle {
                    index: i as u32,
                    generation: s.generation,
                },
                &mut s.item,
            )
        })
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
