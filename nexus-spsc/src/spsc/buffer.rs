//! Fixed-size slot array with per-slot occupancy flags.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ slots[0]: { occupied: AtomicBool, value: T }             │
//! │ slots[1]: { occupied: AtomicBool, value: T }             │
//! │ ...                                                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The occupancy flag is the synchronization word. Writers publish a value
//! with a Release store of `true` after writing it; readers clear it with a
//! Release store of `false` after moving the value out. An Acquire load of
//! the flag therefore makes the value (or its removal) visible.

use std::mem::MaybeUninit;

use crate::sync::{AtomicBool, Ordering, UnsafeCell};

#[repr(C)]
struct Slot<T> {
    occupied: AtomicBool,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Power-of-two array of slots addressed by unbounded `u64` indices.
pub(crate) struct SlotBuffer<T> {
    slots: Box<[Slot<T>]>,
    mask: u64,
}

impl<T> SlotBuffer<T> {
    /// Allocates `capacity` empty slots.
    ///
    /// `capacity` must be a power of two.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());

        let slots = (0..capacity)
            .map(|_| Slot {
                occupied: AtomicBool::new(false),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            slots,
            mask: capacity as u64 - 1,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn mask(&self) -> u64 {
        self.mask
    }

    #[inline(always)]
    fn slot(&self, index: u64) -> &Slot<T> {
        // Masked index is always in bounds.
        &self.slots[(index & self.mask()) as usize]
    }

    /// Loads the occupancy of the slot for `index`.
    #[inline(always)]
    pub(crate) fn is_occupied(&self, index: u64, order: Ordering) -> bool {
        self.slot(index).occupied.load(order)
    }

    /// Writes `value` into the slot for `index` and publishes it.
    ///
    /// # Safety
    ///
    /// The slot must have been observed empty with Acquire ordering by the
    /// caller, and the caller must be the only writer of empty slots.
    #[inline(always)]
    pub(crate) unsafe fn write(&self, index: u64, value: T) {
        let slot = self.slot(index);
        slot.value.with_mut(|ptr| unsafe {
            (*ptr).write(value);
        });
        slot.occupied.store(true, Ordering::Release);
    }

    /// Moves the value out of the slot for `index` and clears it.
    ///
    /// # Safety
    ///
    /// The slot must have been observed occupied with Acquire ordering by the
    /// caller, and the caller must be the only reader of occupied slots.
    #[inline(always)]
    pub(crate) unsafe fn take(&self, index: u64) -> T {
        let slot = self.slot(index);
        let value = slot.value.with(|ptr| unsafe { (*ptr).assume_init_read() });
        slot.occupied.store(false, Ordering::Release);
        value
    }

    /// Borrows the value in the slot for `index`.
    ///
    /// # Safety
    ///
    /// Same as [`take`](Self::take). The slot must stay occupied for as long
    /// as the returned reference is alive.
    #[inline(always)]
    pub(crate) unsafe fn get(&self, index: u64) -> &T {
        let ptr = self
            .slot(index)
            .value
            .with(|ptr| unsafe { (*ptr).assume_init_ref() as *const T });
        unsafe { &*ptr }
    }

    /// Number of occupied slots. Only meaningful without concurrent access.
    pub(crate) fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.occupied.load(Ordering::Relaxed))
            .count()
    }
}

impl<T> Drop for SlotBuffer<T> {
    fn drop(&mut self) {
        for slot in self.slots.iter() {
            if slot.occupied.load(Ordering::Relaxed) {
                // Safety: occupied slots hold an initialized value, and we have
                // exclusive access during drop.
                slot.value.with_mut(|ptr| unsafe { (*ptr).assume_init_drop() });
            }
        }
    }
}
