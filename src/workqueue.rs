/*
 * This file is part of Galaxybook Extras.
 *
 * Copyright (C) 2025 Galaxybook Extras contributors
 *
 * Galaxybook Extras is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Galaxybook Extras is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Galaxybook Extras. If not, see <https://www.gnu.org/licenses/>.
 */

//! Deferred work queue
//!
//! Event entry points must not call firmware, so hotkey and notification actions
//! are queued here and run on a single worker thread. A work item is queued at
//! most once at a time; scheduling it again while it is pending is a no-op.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use gb_error::Result;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

type Job = Box<dyn Fn() + Send + Sync>;

/// A named, reusable unit of deferred work
pub struct WorkItem {
    name: &'static str,
    job: Job,
    pending: AtomicBool,
}

impl WorkItem {
    pub fn new<F>(name: &'static str, job: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new(Self {
            name,
            job: Box::new(job),
            pending: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<Arc<WorkItem>>,
    running: Option<Arc<WorkItem>>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    cond: Condvar,
}

pub struct WorkQueue {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl WorkQueue {
    pub fn new(name: &str) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            cond: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(&worker_shared))?;
        let worker_id = handle.thread().id();
        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
            worker_id,
        })
    }

    /// Queue `item`. Returns false if it was already pending or the queue is shut down.
    pub fn schedule(&self, item: &Arc<WorkItem>) -> bool {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            debug!("work queue shut down; dropping {}", item.name);
            return false;
        }
        if item.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        state.queue.push_back(Arc::clone(item));
        self.shared.cond.notify_all();
        true
    }

    /// Remove `item` if pending and wait for a running instance to finish.
    /// Returns true if a pending instance was removed.
    pub fn cancel_sync(&self, item: &Arc<WorkItem>) -> bool {
        let mut state = self.shared.state.lock();
        let before = state.queue.len();
        state.queue.retain(|queued| !Arc::ptr_eq(queued, item));
        let removed = state.queue.len() != before;
        if removed {
            item.pending.store(false, Ordering::Release);
        }
        if thread::current().id() != self.worker_id {
            while state
                .running
                .as_ref()
                .is_some_and(|running| Arc::ptr_eq(running, item))
            {
                self.shared.cond.wait(&mut state);
            }
        }
        removed
    }

    /// Wait until every queued item has run
    pub fn flush(&self) {
        if thread::current().id() == self.worker_id {
            return;
        }
        let mut state = self.shared.state.lock();
        while !state.queue.is_empty() || state.running.is_some() {
            self.shared.cond.wait(&mut state);
        }
    }

    /// Stop accepting work, drop anything still queued and join the worker
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            for item in state.queue.drain(..) {
                item.pending.store(false, Ordering::Release);
            }
            self.shared.cond.notify_all();
        }
        if thread::current().id() == self.worker_id {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("work queue worker panicked");
            }
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let item = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(item) = state.queue.pop_front() {
                    item.pending.store(false, Ordering::Release);
                    state.running = Some(Arc::clone(&item));
                    break item;
                }
                shared.cond.wait(&mut state);
            }
        };

        debug!("running work item {}", item.name);
        if panic::catch_unwind(AssertUnwindSafe(|| (item.job)())).is_err() {
            error!("work item {} panicked", item.name);
        }

        let mut state = shared.state.lock();
        state.running = None;
        shared.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_runs_scheduled_work() {
        let queue = WorkQueue::new("test-wq").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let item = WorkItem::new("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(queue.schedule(&item));
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(queue.schedule(&item));
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pending_item_is_single_instance() {
        let queue = WorkQueue::new("test-wq").unwrap();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate_rx = Mutex::new(gate_rx);
        let blocker = WorkItem::new("blocker", move || {
            let _ = gate_rx.lock().recv_timeout(Duration::from_secs(5));
        });
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let item = WorkItem::new("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(queue.schedule(&blocker));
        assert!(queue.schedule(&item));
        assert!(!queue.schedule(&item));
        assert!(item.is_pending());
        gate_tx.send(()).unwrap();
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_removes_pending() {
        let queue = WorkQueue::new("test-wq").unwrap();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate_rx = Mutex::new(gate_rx);
        let blocker = WorkItem::new("blocker", move || {
            let _ = gate_rx.lock().recv_timeout(Duration::from_secs(5));
        });
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let item = WorkItem::new("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        queue.schedule(&blocker);
        queue.schedule(&item);
        assert!(queue.cancel_sync(&item));
        assert!(!item.is_pending());
        gate_tx.send(()).unwrap();
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_item_does_not_stall_queue() {
        let queue = WorkQueue::new("test-wq").unwrap();
        let boom = WorkItem::new("boom", || panic!("work item failure"));
        assert!(queue.schedule(&boom));
        queue.flush();
        assert!(!queue.cancel_sync(&boom));

        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let item = WorkItem::new("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(queue.schedule(&item));
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        queue.shutdown();
    }

    #[test]
    fn test_shutdown_rejects_work() {
        let queue = WorkQueue::new("test-wq").unwrap();
        queue.shutdown();
        let item = WorkItem::new("noop", || {});
        assert!(!queue.schedule(&item));
        queue.shutdown();
    }
}
