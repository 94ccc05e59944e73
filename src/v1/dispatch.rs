/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! The main context.
//!
//! Every cache mutation, change notification and completion callback in this
//! crate runs as a job on one [`MainLoop`]. Background work posts its results
//! back through a [`MainContext`] handle. Because only the owner of the loop can
//! run jobs, and it runs them one at a time, no two completions ever interleave.

use log::trace;
use std::cell::Cell;
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    static ON_MAIN: Cell<bool> = const { Cell::new(false) };
}

/// Cloneable handle used to post jobs onto the main context
#[derive(Clone)]
pub struct MainContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl MainContext {
    /// Creates the main context handle and the loop that services it
    pub fn new() -> (MainContext, MainLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MainContext { tx }, MainLoop { rx })
    }

    /// Queues `job` to run on the main context.
    ///
    /// Jobs posted after the [`MainLoop`] has been dropped are discarded.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(job)).is_err() {
            trace!("main loop is gone, dropping job");
        }
    }

    /// True while the calling thread is executing inside the main context
    pub fn is_current() -> bool {
        ON_MAIN.with(|flag| flag.get())
    }
}

impl std::fmt::Debug for MainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContext").finish()
    }
}

/// Runs main context jobs. There is exactly one per [`MainContext`] family.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl MainLoop {
    /// Runs `f` synchronously inside the main context.
    ///
    /// Taking `&mut self` guarantees nothing else runs on the main context meanwhile.
    pub fn enter<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let _guard = MainGuard::enter();
        f()
    }

    /// Runs every job that is already queued, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            self.enter(job);
            count += 1;
        }
        count
    }

    /// Waits for the next job and runs it. Returns `false` once every
    /// [`MainContext`] handle has been dropped.
    pub async fn turn(&mut self) -> bool {
        let next = self.rx.recv().await;
        match next {
            Some(job) => {
                self.enter(job);
                true
            }
            None => false,
        }
    }

    /// Services jobs until every [`MainContext`] handle has been dropped
    pub async fn run(mut self) {
        while self.turn().await {}
    }
}

struct MainGuard {
    previous: bool,
}

impl MainGuard {
    fn enter() -> Self {
        let previous = ON_MAIN.with(|flag| flag.replace(true));
        MainGuard { previous }
    }
}

impl Drop for MainGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        ON_MAIN.with(|flag| flag.set(previous));
    }
}
