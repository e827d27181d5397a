// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative event loop for the sync client.
//!
//! All protocol logic, tree mutation, and timer work runs as closures on a
//! single loop thread, strictly serialized. Registration is safe from any
//! thread; I/O collaborators hand inbound events to the loop by registering
//! a closure, which also wakes it. A closure never blocks — it either
//! completes or schedules a follow-up with [`EventScheduler::run_after`].
//!
//! Deadlines are absolute, so they are immune to loop-iteration jitter.
//! Closures whose deadlines have passed run in ascending deadline order,
//! with registration order breaking ties.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Maximum number of closures that may be pending at once.
///
/// This is a capacity assumption, not a backpressure mechanism: exceeding
/// it means the caller is scheduling faster than the loop can drain by
/// design, and registration fails loudly rather than dropping work.
pub const PENDING_CAPACITY: usize = 10;

type Thunk = Box<dyn FnOnce() + Send + 'static>;

struct Entry {
    run_at: Instant,
    seq: u64,
    thunk: Thunk,
}

struct State {
    entries: Vec<Entry>,
    next_seq: u64,
    /// Bumped by `wake()` so a wake landing between drain and park is not
    /// lost with the condvar notification.
    wakes: u64,
    quit: bool,
    on_wake: Option<Box<dyn FnMut() + Send>>,
    loop_thread: Option<ThreadId>,
}

struct Shared {
    state: Mutex<State>,
    ready: Condvar,
    /// Timestamp floor for immediate closures, so `run_now` work sorts
    /// ahead of any expired deadline closure.
    origin: Instant,
}

/// Single-consumer cooperative scheduler.
///
/// Clones share the same pending set; hand one to every collaborator that
/// needs to get work onto the loop thread.
#[derive(Clone)]
pub struct EventScheduler {
    shared: Arc<Shared>,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventScheduler {
    pub fn new() -> Self {
        EventScheduler {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    entries: Vec::with_capacity(PENDING_CAPACITY),
                    next_seq: 0,
                    wakes: 0,
                    quit: false,
                    on_wake: None,
                    loop_thread: None,
                }),
                ready: Condvar::new(),
                origin: Instant::now(),
            }),
        }
    }

    /// Runs `closure` on the loop thread as soon as possible, ahead of any
    /// delayed closure whose deadline has merely expired.
    pub fn run_now(&self, closure: impl FnOnce() + Send + 'static) {
        self.push(self.shared.origin, Box::new(closure));
    }

    /// Runs `closure` on or after the absolute `deadline`. A deadline in
    /// the past is legal and equivalent to [`EventScheduler::run_now`].
    pub fn run_after(&self, deadline: Instant, closure: impl FnOnce() + Send + 'static) {
        self.push(deadline, Box::new(closure));
    }

    /// Runs `closure` at least `delay` from now.
    pub fn run_delayed(&self, delay: Duration, closure: impl FnOnce() + Send + 'static) {
        self.push(Instant::now() + delay, Box::new(closure));
    }

    /// Registers a task invoked once per loop iteration regardless of the
    /// wake cause. Useful for housekeeping such as draining logs.
    pub fn set_on_wake_task(&self, task: impl FnMut() + Send + 'static) {
        self.lock().on_wake = Some(Box::new(task));
    }

    /// Makes [`EventScheduler::run`] return once the iteration in flight
    /// finishes.
    pub fn quit(&self) {
        self.lock().quit = true;
        self.shared.ready.notify_one();
    }

    /// Wakes the loop if it is parked.
    ///
    /// Callable from any thread, including contexts adjacent to low-level
    /// network-stack event delivery: it allocates nothing, performs no I/O,
    /// and only takes the scheduler's own bookkeeping lock, which is never
    /// held across closure execution or a blocking call. Called from the
    /// loop's own thread it is a deliberate no-op.
    pub fn wake(&self) {
        {
            let mut state = self.lock();
            if state.loop_thread == Some(thread::current().id()) {
                return;
            }
            state.wakes = state.wakes.wrapping_add(1);
        }
        self.shared.ready.notify_one();
    }

    /// Runs the loop until [`EventScheduler::quit`].
    ///
    /// Each iteration invokes the on-wake task, executes every closure
    /// whose deadline has passed in `(deadline, registration)` order, then
    /// parks until the earliest pending deadline or a wake.
    pub fn run(&self) {
        self.lock().loop_thread = Some(thread::current().id());

        loop {
            if self.take_quit() {
                break;
            }

            // Observed up front so a wake arriving anywhere in this
            // iteration skips the park instead of being lost.
            let observed_wakes = self.lock().wakes;

            self.run_on_wake_task();

            for entry in self.take_due() {
                (entry.thunk)();
            }

            let mut state = self.lock();
            if state.quit {
                state.quit = false;
                break;
            }
            if state.wakes != observed_wakes {
                // A wake arrived while closures ran; skip the park.
                continue;
            }
            let now = Instant::now();
            let until_next = state
                .entries
                .iter()
                .map(|entry| entry.run_at.saturating_duration_since(now))
                .min();
            match until_next {
                Some(timeout) if timeout.is_zero() => {}
                Some(timeout) => {
                    let _ = self
                        .shared
                        .ready
                        .wait_timeout(state, timeout)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => {
                    drop(
                        self.shared
                            .ready
                            .wait(state)
                            .unwrap_or_else(PoisonError::into_inner),
                    );
                }
            }
        }

        self.lock().loop_thread = None;
    }

    fn push(&self, run_at: Instant, thunk: Thunk) {
        {
            let mut state = self.lock();
            assert!(
                state.entries.len() < PENDING_CAPACITY,
                "scheduler pending-closure capacity ({PENDING_CAPACITY}) exceeded"
            );
            let seq = state.next_seq;
            state.next_seq += 1;
            state.entries.push(Entry { run_at, seq, thunk });
        }
        self.shared.ready.notify_one();
    }

    /// Removes and returns every due entry in execution order.
    fn take_due(&self) -> Vec<Entry> {
        let mut state = self.lock();
        let now = Instant::now();
        let mut due = Vec::new();
        let mut index = 0;
        while index < state.entries.len() {
            if state.entries[index].run_at <= now {
                due.push(state.entries.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|entry| (entry.run_at, entry.seq));
        due
    }

    fn run_on_wake_task(&self) {
        // The task runs outside the lock; it is reinstalled afterwards
        // unless a replacement arrived in the meantime.
        let mut task = self.lock().on_wake.take();
        if let Some(task) = task.as_mut() {
            task();
        }
        if let Some(task) = task {
            let mut state = self.lock();
            if state.on_wake.is_none() {
                state.on_wake = Some(task);
            }
        }
    }

    fn take_quit(&self) -> bool {
        let mut state = self.lock();
        if state.quit {
            state.quit = false;
            true
        } else {
            false
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
