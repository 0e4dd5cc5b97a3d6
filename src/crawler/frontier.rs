//! Crawl frontier: the shared FIFO queue, visited set and worker accounting
//!
//! All mutable state shared between crawl workers lives behind one mutex in
//! this module:
//! - the pending queue of `(url, depth)` entries
//! - the set of URLs a worker has committed to fetching
//! - the number of entries currently being processed
//!
//! Keeping the active count under the same lock as the queue is what makes
//! termination detection race-free: a worker only concludes the crawl is
//! over when, in one critical section, it sees an empty queue *and* no entry
//! in flight. Since only in-flight entries can push new work, nothing can
//! appear afterwards.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// A URL waiting to be crawled, with its link distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    active: usize,
    closed: bool,
}

/// Thread-safe breadth-first frontier
///
/// `push`, `pop` and `mark_visited` never block beyond the internal lock.
/// Crawl workers use [`Frontier::next_entry`] and [`Frontier::finish_entry`]
/// instead of `pop`, so that an idle worker can wait for siblings still
/// discovering links.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    wake: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock is never held across a panic point that could leave the
    /// state half-updated, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry to the tail of the queue
    pub fn push(&self, entry: FrontierEntry) {
        tracing::trace!("Queueing {} at depth {}", entry.url, entry.depth);
        self.lock().queue.push_back(entry);
        self.wake.notify_one();
    }

    /// Appends all entries discovered on one page in a single critical section
    ///
    /// Entries whose URL has already been visited are dropped here; the
    /// visited check at pop time stays authoritative.
    pub fn extend(&self, entries: impl IntoIterator<Item = FrontierEntry>) -> usize {
        let added = {
            let mut state = self.lock();
            let before = state.queue.len();
            let FrontierState { queue, visited, .. } = &mut *state;
            queue.extend(entries.into_iter().filter(|e| !visited.contains(&e.url)));
            queue.len() - before
        };

        for _ in 0..added {
            self.wake.notify_one();
        }
        added
    }

    /// Removes and returns the head entry without blocking
    pub fn pop(&self) -> Option<FrontierEntry> {
        self.lock().queue.pop_front()
    }

    /// Atomically records `url` as visited
    ///
    /// Returns true only for the first caller; every later caller must
    /// discard the URL.
    pub fn mark_visited(&self, url: &str) -> bool {
        let mut state = self.lock();
        if state.visited.contains(url) {
            return false;
        }
        state.visited.insert(url.to_string())
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Number of entries currently being processed
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Waits for the next entry, or `None` once the crawl is finished
    ///
    /// The crawl is finished when the queue is empty and no entry is in
    /// flight, or after [`Frontier::close`]. A returned entry counts as in
    /// flight until the caller reports it done with
    /// [`Frontier::finish_entry`].
    ///
    /// Cancel-safe: an entry is only taken in the same poll that returns it.
    pub async fn next_entry(&self) -> Option<FrontierEntry> {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(entry) = state.queue.pop_front() {
                    state.active += 1;
                    return Some(entry);
                }
                if state.active == 0 {
                    drop(state);
                    tracing::trace!("Frontier drained with no active workers");
                    self.wake.notify_waiters();
                    return None;
                }
                // Register before releasing the lock so a push or finish
                // between here and the await cannot be missed
                notified.as_mut().enable();
            }

            notified.await;
        }
    }

    /// Reports that an entry returned by [`Frontier::next_entry`] is done
    pub fn finish_entry(&self) {
        let drained = {
            let mut state = self.lock();
            state.active = state.active.saturating_sub(1);
            state.active == 0 && state.queue.is_empty()
        };
        if drained {
            self.wake.notify_waiters();
        }
    }

    /// Stops handing out entries; waiting workers return `None`
    pub fn close(&self) {
        self.lock().closed = true;
        self.wake.notify_waiters();
    }
}

/// Marks one frontier entry as in flight until dropped
///
/// Dropping the guard (including during a panic unwind) reports the entry
/// finished, so a failing worker cannot leave siblings waiting forever.
pub(crate) struct ActiveEntry<'a> {
    frontier: &'a Frontier,
}

impl<'a> ActiveEntry<'a> {
    pub fn new(frontier: &'a Frontier) -> Self {
        Self { frontier }
    }
}

impl Drop for ActiveEntry<'_> {
    fn drop(&mut self) {
        self.frontier.finish_entry();
    }
}
