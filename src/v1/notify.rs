/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use async_stream::stream;
use futures::Stream;
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

type Listener = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

/// Named "something changed, re-read the cache" event.
///
/// Services emit on the main context after each successful cache mutation.
/// Listeners stay registered for as long as the returned [`Subscription`] lives.
#[derive(Clone)]
pub struct ChangeNotifier {
    name: &'static str,
    listeners: Arc<Mutex<Listeners>>,
}

impl ChangeNotifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `listener`; dropping the returned guard unregisters it
    #[must_use = "the listener is removed as soon as the subscription is dropped"]
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Same events as a stream. Unsubscribes when the stream is dropped.
    pub fn changes(&self) -> impl Stream<Item = ()> + Send + 'static {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move || {
            let _ = tx.send(());
        });
        stream! {
            let _subscription = subscription;
            while let Some(()) = rx.recv().await {
                yield ();
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    /// Calls every registered listener
    pub(crate) fn emit(&self) {
        // Snapshot first so listeners may subscribe or unsubscribe while running
        let snapshot: Vec<Listener> = self.listeners.lock().entries.values().cloned().collect();
        debug!("{}: notifying {} listener(s)", self.name, snapshot.len());
        for listener in snapshot {
            listener();
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Keeps a listener registered on a [`ChangeNotifier`]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().entries.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
