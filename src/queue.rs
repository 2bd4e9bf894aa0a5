//! Bounded character queue between the decoder and the renderer.
//!
//! The queue never blocks and never grows past its capacity. When it is
//! full, the [`OverflowPolicy`] decides which character is lost. Under
//! the default drop-oldest policy a slow renderer silently loses the
//! start of a long answer; evictions are only counted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Which character to discard when a `put` hits a full queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued character, then append.
    #[default]
    DropOldest,
    /// Keep the queue as is and discard the incoming character.
    DropNewest,
}

/// Fixed-capacity, lossy FIFO of characters.
///
/// Clones share the same buffer. Every operation takes the lock once,
/// so a `put` and a `get` never see each other half-done.
#[derive(Clone)]
pub struct CharQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    capacity: usize,
    policy: OverflowPolicy,
    items: Mutex<VecDeque<char>>,
    evicted: AtomicU64,
}

impl CharQueue {
    /// Drop-oldest queue holding at most `capacity` characters (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, OverflowPolicy::DropOldest)
    }

    pub fn with_policy(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(QueueInner {
                capacity,
                policy,
                items: Mutex::new(VecDeque::with_capacity(capacity)),
                evicted: AtomicU64::new(0),
            }),
        }
    }

    pub fn put(&self, ch: char) {
        let mut items = self.inner.items.lock();
        if items.len() == self.inner.capacity {
            self.inner.evicted.fetch_add(1, Ordering::Relaxed);
            match self.inner.policy {
                OverflowPolicy::DropOldest => {
                    items.pop_front();
                }
                OverflowPolicy::DropNewest => return,
            }
        }
        items.push_back(ch);
    }

    /// Enqueue every character of `text` in order. Returns how many were put.
    pub fn put_str(&self, text: &str) -> usize {
        let mut count = 0;
        for ch in text.chars() {
            self.put(ch);
            count += 1;
        }
        count
    }

    /// Oldest character, or `None` when empty. Never waits.
    pub fn get(&self) -> Option<char> {
        self.inner.items.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.inner.policy
    }

    /// Characters lost to overflow since creation.
    pub fn evicted(&self) -> u64 {
        self.inner.evicted.load(Ordering::Relaxed)
    }

    /// Poll every `poll` until the queue is empty or `timeout` elapses.
    ///
    /// Returns `true` if the queue was observed empty. An already empty
    /// queue returns immediately without sleeping.
    pub async fn wait_until_empty(&self, poll: Duration, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_empty() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }
}
