//! Fixed-capacity byte rings for the scanner UART.
//!
//! The receive ring is filled from interrupt context and drained by the
//! main loop; the transmit ring the other way round. Each ring has exactly
//! one producer and one consumer, and the only shared access is guarded by
//! a critical section.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::spsc::Queue;

/// A `heapless` SPSC queue shareable between an interrupt handler and the
/// main loop. Holds at most `N - 1` bytes; every access runs inside a short
/// critical section.
pub struct SharedRing<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Queue<u8, N>>>,
}

impl<const N: usize> SharedRing<N> {
    const POWER_OF_TWO: () = assert!(N.is_power_of_two(), "ring capacity must be a power of two");

    pub const fn new() -> Self {
        let () = Self::POWER_OF_TWO;
        Self {
            inner: Mutex::new(RefCell::new(Queue::new())),
        }
    }

    /// Producer side. Returns `false` if the byte was dropped.
    pub fn push(&self, byte: u8) -> bool {
        self.inner.lock(|ring| ring.borrow_mut().enqueue(byte).is_ok())
    }

    /// Enqueue two bytes back to back, or neither.
    pub fn push_pair(&self, first: u8, second: u8) -> bool {
        self.inner.lock(|ring| {
            let mut ring = ring.borrow_mut();
            if ring.capacity() - ring.len() < 2 {
                return false;
            }
            ring.enqueue(first).is_ok() && ring.enqueue(second).is_ok()
        })
    }

    /// Consumer side.
    pub fn pop(&self) -> Option<u8> {
        self.inner.lock(|ring| ring.borrow_mut().dequeue())
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|ring| ring.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock(|ring| ring.borrow().is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock(|ring| ring.borrow().is_full())
    }

    /// Bytes that can still be pushed.
    pub fn free(&self) -> usize {
        self.inner.lock(|ring| {
            let ring = ring.borrow();
            ring.capacity() - ring.len()
        })
    }

    pub fn clear(&self) {
        self.inner.lock(|ring| *ring.borrow_mut() = Queue::new());
    }
}

impl<const N: usize> Default for SharedRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
