use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};

use super::{SubscriptionId, read, write};

type Listener<K> = Arc<dyn Fn(&[K]) + Send + Sync>;

struct StoreState<K, V> {
    entries: RwLock<BTreeMap<K, Arc<V>>>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<K>)>>,
}

/// Keyed structural store.
///
/// Every value lives behind its own `Arc`. Writes that leave a value equal to
/// what is already stored are dropped without notification, and
/// [`Store::reconcile`] keeps the existing `Arc` for every entry it does not
/// change, so readers holding [`Store::get_shared`] handles can compare by
/// pointer to detect untouched entries.
///
/// Subscribers receive the list of keys touched by a single write.
pub struct Store<K, V> {
    state: Arc<StoreState<K, V>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K, V> Default for Store<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl<K, V> Store<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: BTreeMap<K, V>) -> Self {
        let entries = initial
            .into_iter()
            .map(|(key, value)| (key, Arc::new(value)))
            .collect();
        Self {
            state: Arc::new(StoreState {
                entries: RwLock::new(entries),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        read(&self.state.entries)
            .get(key)
            .map(|value| V::clone(value))
    }

    pub fn get_shared(&self, key: &K) -> Option<Arc<V>> {
        read(&self.state.entries).get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        read(&self.state.entries).contains_key(key)
    }

    pub fn len(&self) -> usize {
        read(&self.state.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.state.entries).is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<K, V> {
        read(&self.state.entries)
            .iter()
            .map(|(key, value)| (key.clone(), V::clone(value)))
            .collect()
    }

    pub fn set(&self, key: K, value: V) -> bool {
        {
            let mut entries = write(&self.state.entries);
            if entries.get(&key).is_some_and(|current| **current == value) {
                return false;
            }
            entries.insert(key.clone(), Arc::new(value));
        }
        self.notify(&[key]);
        true
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = write(&self.state.entries).remove(key)?;
        self.notify(std::slice::from_ref(key));
        Some(V::clone(&removed))
    }

    /// Replaces the whole state with `next`, touching only the entries that
    /// differ. Returns the keys that were inserted, changed or removed.
    pub fn reconcile(&self, next: BTreeMap<K, V>) -> Vec<K> {
        let changed = {
            let mut entries = write(&self.state.entries);
            let mut changed = entries
                .keys()
                .filter(|key| !next.contains_key(*key))
                .cloned()
                .collect::<Vec<_>>();
            let mut rebuilt = BTreeMap::new();
            for (key, value) in next {
                match entries.remove(&key) {
                    Some(current) if *current == value => {
                        rebuilt.insert(key, current);
                    }
                    _ => {
                        changed.push(key.clone());
                        rebuilt.insert(key, Arc::new(value));
                    }
                }
            }
            *entries = rebuilt;
            changed.sort();
            changed
        };
        if !changed.is_empty() {
            self.notify(&changed);
        }
        changed
    }

    pub fn subscribe(&self, listener: impl Fn(&[K]) + Send + Sync + 'static) -> SubscriptionId {
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

    fn notify(&self, keys: &[K]) {
        let listeners = read(&self.state.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(keys);
        }
    }
}

impl<K, V> Debug for Store<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entries", &*read(&self.state.entries))
            .field("listeners", &read(&self.state.listeners).len())
            .finish()
    }
}
