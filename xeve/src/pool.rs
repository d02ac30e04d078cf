//! Reusable payload buffers keyed by size class.
//!
//! Encoded payloads are copied out of the engine on every pull. Under high
//! frame rates allocating a fresh vector per unit churns the allocator, so
//! payload vectors are drawn from and returned to a pool. Buffers are keyed
//! only by their power-of-two capacity class, never by identity, and the
//! pool is safe for concurrent use by any number of encoders.

use hashbrown::HashMap;
use lazy_static::lazy_static;
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Smallest size class handed out by the pool.
pub const MIN_SIZE_CLASS: usize = 1024;
/// Buffers retained per size class; extra returns are dropped.
pub const DEFAULT_MAX_PER_CLASS: usize = 64;

lazy_static! {
    static ref DEFAULT_POOL: Arc<BufferPool> = Arc::new(BufferPool::default());
}

/// Process-wide pool used by encoders that were not given their own.
pub fn default_pool() -> Arc<BufferPool> {
    DEFAULT_POOL.clone()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub returned: u64,
    pub discarded: u64,
}

#[derive(Debug)]
pub struct BufferPool {
    classes: Mutex<HashMap<usize, Vec<Vec<u8>>>>,
    max_per_class: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_CLASS)
    }
}

impl BufferPool {
    pub fn new(max_per_class: usize) -> Self {
        Self {
            classes: Mutex::new(HashMap::new()),
            max_per_class,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returned: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Class a request of `len` bytes is served from.
    pub fn class_for_request(len: usize) -> usize {
        len.max(MIN_SIZE_CLASS).next_power_of_two()
    }

    /// Class a buffer of `capacity` bytes is filed under: the largest class
    /// it can fully serve. `None` when it is too small to keep.
    pub fn class_for_capacity(capacity: usize) -> Option<usize> {
        if capacity < MIN_SIZE_CLASS {
            return None;
        }
        Some(1usize << (usize::BITS - 1 - capacity.leading_zeros()))
    }

    /// Take an empty buffer with at least `min_capacity` bytes of capacity.
    ///
    /// Served from the smallest non-empty class that fits the request, so a
    /// buffer that grew past its original class is still reused.
    pub fn get(&self, min_capacity: usize) -> Vec<u8> {
        let class = Self::class_for_request(min_capacity);
        let reused = {
            let mut classes = self.classes.lock();
            classes
                .iter_mut()
                .filter(|(c, bucket)| **c >= class && !bucket.is_empty())
                .min_by_key(|(c, _)| **c)
                .and_then(|(_, bucket)| bucket.pop())
        };
        match reused {
            Some(buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Buffer pool miss, allocating {} bytes", class);
                Vec::with_capacity(class)
            }
        }
    }

    /// Return a buffer. Its contents are cleared; its capacity decides the
    /// class it is filed under.
    pub fn put(&self, mut buf: Vec<u8>) {
        let Some(class) = Self::class_for_capacity(buf.capacity()) else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        };
        buf.clear();
        let mut classes = self.classes.lock();
        let bucket = classes.entry(class).or_default();
        if bucket.len() < self.max_per_class {
            bucket.push(buf);
            self.returned.fetch_add(1, Ordering::Relaxed);
        } else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of buffers currently held.
    pub fn idle(&self) -> usize {
        self.classes.lock().values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    /// Drop every idle buffer.
    pub fn clear(&self) {
        self.classes.lock().clear();
    }
}
