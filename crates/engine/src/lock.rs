//! Keyed locks that serialize mutations touching the same paths.
//!
//! Every mutating operation is a check-then-act sequence spread over several
//! suspension points (does it exist? pick a name, create, copy, delete). Two
//! requests aimed at the same category or the same inbox file take turns;
//! requests on unrelated paths never wait on each other.

use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// What an operation needs exclusive access to.
///
/// Ordered so that a set of keys can always be acquired in the same order,
/// which rules out deadlocks between operations that share more than one key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    /// A folder in the archive, relative to its root.
    Archive(PathBuf),
    /// A file name in the inbox.
    Inbox(PathBuf),
}

type Entries = HashMap<LockKey, Arc<AsyncMutex<()>>>;
type Table = Arc<Mutex<Entries>>;

fn lock_table(table: &Table) -> MutexGuard<'_, Entries> {
    // The table is only ever mutated by single, non-panicking statements.
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drop `key` from the table once only the table's own reference is left:
/// nobody holds it and nobody is waiting for it.
fn remove_if_idle(entries: &mut Entries, key: &LockKey) {
    if entries.get(key).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
        entries.remove(key);
    }
}

/// Waiting for a single key.
///
/// Abandoning the wait (the acquiring future was dropped) must not leave an
/// entry behind if the holder already let go.
struct Waiting<'a> {
    // Fields drop in order: the pending lock gives up its reference to the
    // mutex before `Idle` looks at the count.
    lock: Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>,
    _idle: Idle<'a>,
}

struct Idle<'a> {
    table: &'a Table,
    key: LockKey,
}

impl Drop for Idle<'_> {
    fn drop(&mut self) {
        remove_if_idle(&mut lock_table(self.table), &self.key);
    }
}

impl Future for Waiting<'_> {
    type Output = OwnedMutexGuard<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.lock.as_mut().poll(cx)
    }
}

/// Per-namespace lock table.
#[derive(Debug, Default, Clone)]
pub struct PathLocks {
    table: Table,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until every key is held exclusively by the returned guard.
    ///
    /// Keys are sorted and deduplicated first. Dropping the guard releases
    /// them all, on every exit path.
    pub async fn acquire(&self, keys: impl IntoIterator<Item = LockKey>) -> PathGuard {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        // Built up front so that a cancelled acquisition still releases (and
        // cleans up) whatever it had already taken.
        let mut guard = PathGuard {
            table: self.table.clone(),
            held: Vec::with_capacity(keys.len()),
        };
        for key in keys {
            let mutex = lock_table(&self.table).entry(key.clone()).or_default().clone();
            let held = Waiting {
                lock: Box::pin(mutex.lock_owned()),
                _idle: Idle {
                    table: &self.table,
                    key: key.clone(),
                },
            }
            .await;
            guard.held.push((key, held));
        }
        guard
    }

    /// Number of keys currently in the table (held or waited on).
    pub fn len(&self) -> usize {
        lock_table(&self.table).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its keys when dropped.
#[derive(Debug)]
pub struct PathGuard {
    table: Table,
    held: Vec<(LockKey, OwnedMutexGuard<()>)>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        let mut table = lock_table(&self.table);
        for (key, held) in self.held.drain(..) {
            drop(held);
            remove_if_idle(&mut table, &key);
        }
    }
}
