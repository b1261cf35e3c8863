//! Size-segregated free-list allocator for block buffers (component H).
//!
//! Every block in a single engine call is the same size
//! (`2^bits_per_block * type.bytes()`), so the pool only ever needs to
//! remember one size class at a time. If a caller asks for a different
//! size than the one currently pooled, the whole free list is dropped and
//! retuned to the new class — mirroring the reference allocator's
//! `set_min_max_size` behavior without carrying dead buffers of a stale
//! size across calls.

use std::sync::Mutex;

/// Default number of spare buffers the allocator will hold onto per size
/// class before letting further releases simply deallocate.
pub const DEFAULT_CAPACITY: usize = 256;

struct Pool {
    size: usize,
    free: Vec<Vec<u8>>,
}

/// A reusable pool of zero-initialized block buffers, shared across a
/// single engine call's worker fan-out.
pub struct BlockAllocator {
    pool: Mutex<Pool>,
    capacity: usize,
}

impl BlockAllocator {
    /// Creates an allocator that holds at most `capacity` spare buffers.
    pub fn new(capacity: usize) -> BlockAllocator {
        BlockAllocator {
            pool: Mutex::new(Pool {
                size: 0,
                free: Vec::new(),
            }),
            capacity,
        }
    }

    /// Takes a zero-initialized buffer of exactly `size` bytes, reusing a
    /// pooled one if available.
    pub fn acquire(&self, size: usize) -> Vec<u8> {
        let mut pool = self.pool.lock().expect("allocator pool lock poisoned");
        if pool.size != size {
            pool.size = size;
            pool.free.clear();
        }
        match pool.free.pop() {
            Some(mut buf) => {
                buf.iter_mut().for_each(|b| *b = 0);
                buf
            }
            None => vec![0u8; size],
        }
    }

    /// Returns a buffer to the pool. Dropped instead if its size no longer
    /// matches the pool's current class or the pool is at capacity.
    pub fn release(&self, buf: Vec<u8>) {
        let mut pool = self.pool.lock().expect("allocator pool lock poisoned");
        if buf.len() == pool.size && pool.free.len() < self.capacity {
            pool.free.push(buf);
        }
    }
}

impl Default for BlockAllocator {
    fn default() -> BlockAllocator {
        BlockAllocator::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_gives_zeroed_buffer_of_requested_size() {
        let alloc = BlockAllocator::default();
        let buf = alloc.acquire(16);
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn released_buffer_is_reused() {
        let alloc = BlockAllocator::default();
        let mut buf = alloc.acquire(8);
        buf[0] = 42;
        alloc.release(buf);
        let reused = alloc.acquire(8);
        assert_eq!(reused.len(), 8);
        assert!(reused.iter().all(|&b| b == 0), "reused buffer must be rezeroed");
    }

    #[test]
    fn new_size_class_drops_old_buffers() {
        let alloc = BlockAllocator::default();
        let buf = alloc.acquire(8);
        alloc.release(buf);
        // switching size classes clears the free list; nothing of the old
        // class comes back even if we ask for size 8 again afterward
        let _ = alloc.acquire(32);
        alloc.release(alloc.acquire(32));
        let buf8 = alloc.acquire(8);
        assert_eq!(buf8.len(), 8);
    }

    #[test]
    fn capacity_bounds_pooled_buffers() {
        let alloc = BlockAllocator::new(1);
        alloc.release(alloc.acquire(4));
        alloc.release(vec![0u8; 4]);
        let pool = alloc.pool.lock().unwrap();
        assert_eq!(pool.free.len(), 1);
    }
}
