//! Capacity-managed index buffers and a pool to recycle them.
//!
//! Growth is explicit: callers ask for a capacity up front and learn whether
//! the backing storage was replaced, so a GPU-side mirror can be recreated
//! only when needed.

use std::collections::BTreeMap;

/// Extra room, as a fraction of the requested size, on every reallocation.
const HEADROOM: f32 = 0.5;

/// A `u32` index list whose capacity only changes through
/// [`IndexBuffer::ensure_capacity`].
#[derive(Clone, Debug, Default)]
pub struct IndexBuffer {
  data: Vec<u32>,
  capacity: usize,
  reallocations: u32,
}

impl IndexBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      data: Vec::with_capacity(capacity),
      capacity,
      reallocations: 0,
    }
  }

  /// Make room for `required` indices.
  ///
  /// Returns `true` if the storage was reallocated, in which case it now holds
  /// `required` plus 50% headroom and its previous contents are discarded.
  pub fn ensure_capacity(&mut self, required: usize) -> bool {
    if required <= self.capacity {
      return false;
    }
    let capacity = required + (required as f32 * HEADROOM).ceil() as usize;
    self.data = Vec::with_capacity(capacity);
    self.capacity = capacity;
    self.reallocations += 1;
    true
  }

  /// Append indices. The caller must have reserved room first.
  #[inline]
  pub fn extend_from_slice(&mut self, indices: &[u32]) {
    debug_assert!(
      self.data.len() + indices.len() <= self.capacity,
      "IndexBuffer overflow: ensure_capacity was not called"
    );
    self.data.extend_from_slice(indices);
  }

  #[inline]
  pub fn push(&mut self, index: u32) {
    debug_assert!(self.data.len() < self.capacity, "IndexBuffer overflow: ensure_capacity was not called");
    self.data.push(index);
  }

  #[inline]
  pub fn clear(&mut self) {
    self.data.clear();
  }

  #[inline]
  pub fn as_slice(&self) -> &[u32] {
    &self.data
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Number of times [`ensure_capacity`](Self::ensure_capacity) reallocated.
  #[inline]
  pub fn reallocations(&self) -> u32 {
    self.reallocations
  }
}

/// Recycles released [`IndexBuffer`]s keyed by capacity.
#[derive(Debug, Default)]
pub struct BufferPool {
  free: BTreeMap<usize, Vec<IndexBuffer>>,
  pooled: usize,
  hit_count: usize,
  miss_count: usize,
}

impl BufferPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Smallest pooled buffer holding at least `min_capacity`, or a new one.
  pub fn acquire(&mut self, min_capacity: usize) -> IndexBuffer {
    let key = self.free.range(min_capacity..).next().map(|(&k, _)| k);
    if let Some(key) = key {
      if let Some(list) = self.free.get_mut(&key) {
        if let Some(buffer) = list.pop() {
          if list.is_empty() {
            self.free.remove(&key);
          }
          self.pooled -= 1;
          self.hit_count += 1;
          return buffer;
        }
      }
    }
    self.miss_count += 1;
    IndexBuffer::with_capacity(min_capacity)
  }

  /// Return a buffer to the pool. Its contents are cleared.
  pub fn release(&mut self, mut buffer: IndexBuffer) {
    if buffer.capacity() == 0 {
      return;
    }
    buffer.clear();
    self.free.entry(buffer.capacity()).or_default().push(buffer);
    self.pooled += 1;
  }

  /// Buffers currently waiting for reuse.
  #[inline]
  pub fn pooled(&self) -> usize {
    self.pooled
  }

  #[inline]
  pub fn hit_count(&self) -> usize {
    self.hit_count
  }

  #[inline]
  pub fn miss_count(&self) -> usize {
    self.miss_count
  }

  /// Drop every pooled buffer and reset the counters.
  pub fn clear(&mut self) {
    self.free.clear();
    self.pooled = 0;
    self.hit_count = 0;
    self.miss_count = 0;
  }
}
