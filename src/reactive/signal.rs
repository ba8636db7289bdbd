use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};

use super::{SubscriptionId, read, write};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalState<T> {
    value: RwLock<T>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<T>)>>,
}

/// Observable cell. Clones share the same value and subscribers.
pub struct Signal<T> {
    state: Arc<SignalState<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            state: Arc::new(SignalState {
                value: RwLock::new(value),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        read(&self.state.value).clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&read(&self.state.value))
    }

    /// Replaces the value, returning `false` (and notifying nobody) when the
    /// new value equals the current one.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = write(&self.state.value);
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.notify(&value);
        true
    }

    /// Replaces the value only while it still equals `expected`, checking and
    /// writing under one lock. Returns `false` when another writer got there
    /// first.
    pub fn compare_and_set(&self, expected: &T, value: T) -> bool {
        {
            let mut current = write(&self.state.value);
            if *current != *expected {
                return false;
            }
            if *current == value {
                return true;
            }
            *current = value.clone();
        }
        self.notify(&value);
        true
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let next = {
            let mut current = write(&self.state.value);
            let mut next = current.clone();
            f(&mut next);
            if *current == next {
                return false;
            }
            *current = next.clone();
            next
        };
        self.notify(&next);
        true
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        write(&self.state.listeners).push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = write(&self.state.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, value: &T) {
        let listeners = read(&self.state.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(value);
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*read(&self.state.value))
            .field("listeners", &read(&self.state.listeners).len())
            .finish()
    }
}
