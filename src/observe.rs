//! Publish/subscribe state holder.
//!
//! DESIGN
//! ======
//! `StateCell` keeps the current value in a `tokio::sync::watch` channel
//! (async observers, `wait_for`) and a listener list for synchronous
//! observers that must see every transition in order.
//!
//! Each change is stamped with a sequence number and queued in an outbox
//! under the same lock that applies it, so queue order is change order.
//! Whichever caller finds the outbox idle drains it, calling listeners with
//! no lock held. Updates made meanwhile (from another thread, or from a
//! listener itself) are only queued and get delivered by that same drain,
//! after the current listener returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    /// First sequence number this listener has not already seen.
    since: u64,
    listener: Listener<T>,
}

struct Listeners<T> {
    entries: Mutex<Vec<Entry<T>>>,
    next_id: AtomicU64,
}

struct Outbox<T> {
    pending: VecDeque<(u64, T)>,
    next_seq: u64,
    draining: bool,
}

pub struct StateCell<T> {
    value: watch::Sender<T>,
    listeners: Arc<Listeners<T>>,
    outbox: Mutex<Outbox<T>>,
}

impl<T> StateCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (value, _) = watch::channel(initial);
        Self {
            value,
            listeners: Arc::new(Listeners { entries: Mutex::new(Vec::new()), next_id: AtomicU64::new(0) }),
            outbox: Mutex::new(Outbox { pending: VecDeque::new(), next_seq: 0, draining: false }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Mutate the value and notify every listener with the new snapshot.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut T),
    {
        self.update_if(|value| {
            mutate(value);
            true
        });
    }

    /// Like [`StateCell::update`], but `mutate` reports whether it changed
    /// anything. Nobody is notified when it returns `false`.
    ///
    /// Safe to call from inside a listener: the change is applied at once
    /// and delivered once the running listener returns.
    pub fn update_if<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        {
            let mut outbox = self.lock_outbox();
            if !self.value.send_if_modified(mutate) {
                return false;
            }
            let seq = outbox.next_seq;
            outbox.next_seq += 1;
            outbox.pending.push_back((seq, self.get()));
            if outbox.draining {
                return true;
            }
            outbox.draining = true;
        }
        self.drain();
        true
    }

    fn drain(&self) {
        let mut guard = DrainGuard { outbox: &self.outbox, armed: true };
        loop {
            let (seq, snapshot) = {
                let mut outbox = self.lock_outbox();
                match outbox.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        outbox.draining = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            for listener in self.listeners.due(seq) {
                listener(&snapshot);
            }
        }
    }

    /// Register `listener`, call it once with the current value, and return a
    /// guard that unregisters it on drop. May be called from inside another
    /// listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        let current = {
            let outbox = self.lock_outbox();
            self.listeners
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Entry { id, since: outbox.next_seq, listener: Arc::clone(&listener) });
            self.get()
        };
        listener(&current);

        let weak: Weak<Listeners<T>> = Arc::downgrade(&self.listeners);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.remove(id);
                }
            })),
        }
    }

    /// Async receiver that always sees the latest value.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<T> {
        self.value.subscribe()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lock_outbox(&self) -> std::sync::MutexGuard<'_, Outbox<T>> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hands the outbox back if a listener panics mid-drain, so later updates
/// still get delivered.
struct DrainGuard<'a, T> {
    outbox: &'a Mutex<Outbox<T>>,
    armed: bool,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.outbox.lock().unwrap_or_else(PoisonError::into_inner).draining = false;
        }
    }
}

impl<T> Listeners<T> {
    /// Listeners registered before change `seq` was made.
    fn due(&self, seq: u64) -> Vec<Listener<T>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.since <= seq)
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }

    fn remove(&self, id: u64) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|entry| entry.id != id);
    }
}

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the listener registered for the lifetime of the state cell.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

#[cfg(test)]
#[path = "observe_test.rs"]
mod observe_test;
