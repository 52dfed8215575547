//! Reusable byte buffers for encoded lines.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

/// Buffers that grew beyond this are dropped instead of being kept.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Upper bound on idle buffers kept by one pool.
const MAX_IDLE_BUFFERS: usize = 64;

/// Initial capacity of freshly allocated buffers.
const INITIAL_CAPACITY: usize = 256;

/// A shared free list of byte buffers.
///
/// Cloning shares the free list. Buffers are handed out as
/// [`PooledBuffer`]s and go back to the list when dropped.
#[derive(Debug, Clone, Default)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty buffer, reusing an idle one if possible.
    pub fn get(&self) -> PooledBuffer {
        let reused = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let buf = reused.unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        PooledBuffer {
            buf,
            pool: self.clone(),
        }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < MAX_IDLE_BUFFERS {
            free.push(buf);
        }
    }
}

/// A buffer checked out of a [`BufferPool`].
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: BufferPool,
}

impl PooledBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the bytes out; the pool gets nothing back.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // into_vec leaves an unallocated vector behind
        if self.buf.capacity() > 0 {
            self.pool.put(std::mem::take(&mut self.buf));
        }
    }
}
