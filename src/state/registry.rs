use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Concurrent id-indexed store used for connections, players and spores.
///
/// Every operation takes the same lock, so mutation and iteration exclude each other.
/// Ids handed out by [`Registry::add`] start at 1, only ever increase and are never
/// reused. [`Registry::insert`] stores an item under a caller-chosen id and moves the
/// allocator past it, so the two paths cannot hand out the same id.
pub struct Registry<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    items: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Stores `item` under the next free id and returns that id.
    pub fn add(&self, item: T) -> u64 {
        let mut g = self.inner.lock();
        let id = g.next_id;
        g.next_id += 1;
        g.items.insert(id, item);
        id
    }

    /// Stores `item` under `id`, returning whatever was there before.
    pub fn insert(&self, id: u64, item: T) -> Option<T> {
        let mut g = self.inner.lock();
        if id >= g.next_id {
            g.next_id = id + 1;
        }
        g.items.insert(id, item)
    }

    pub fn remove(&self, id: u64) -> Option<T> {
        self.inner.lock().items.remove(&id)
    }

    pub fn get(&self, id: u64) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock().items.get(&id).cloned()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.inner.lock().items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Visits every entry in id order while holding the registry lock.
    ///
    /// The visitor must not call back into this same registry (that deadlocks), and
    /// must not block: every other user of the registry waits until it returns.
    pub fn for_each(&self, mut f: impl FnMut(u64, &T)) {
        let g = self.inner.lock();
        for (id, item) in g.items.iter() {
            f(*id, item);
        }
    }

    /// Point-in-time copy of all entries, for work that has to await or take other locks.
    pub fn snapshot(&self) -> Vec<(u64, T)>
    where
        T: Clone,
    {
        self.inner
            .lock()
            .items
            .iter()
            .map(|(id, item)| (*id, item.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn add_get_remove() {
        let reg = Registry::new();
        let a = reg.add("a");
        let b = reg.add("b");
        assert_eq!((a, b), (1, 2));
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.remove(a), Some("a"));
        assert_eq!(reg.get(a), None);
        assert_eq!(reg.get(b), Some("b"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.remove(a), None);
    }

    #[test]
    fn ids_are_not_reused() {
        let reg = Registry::new();
        let a = reg.add(1);
        reg.remove(a);
        let b = reg.add(2);
        assert!(b > a);
    }

    #[test]
    fn explicit_ids_push_the_allocator() {
        let reg = Registry::new();
        assert_eq!(reg.insert(10, "ten"), None);
        assert_eq!(reg.add("next"), 11);

        // Lower explicit ids leave the allocator alone
        reg.insert(3, "three");
        assert_eq!(reg.add("after"), 12);
        assert_eq!(reg.insert(3, "again"), Some("three"));
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn len_tracks_live_entries() {
        let reg = Registry::new();
        let mut live = HashSet::new();
        for i in 0..50u32 {
            let id = reg.add(i);
            live.insert(id);
            if i % 3 == 0 {
                reg.remove(id);
                live.remove(&id);
            }
            assert_eq!(reg.len(), live.len());
        }
        for id in 1..=50 {
            assert_eq!(reg.contains(id), live.contains(&id));
        }
    }

    #[test]
    fn for_each_visits_in_id_order() {
        let reg = Registry::new();
        for name in ["x", "y", "z"] {
            reg.add(name);
        }
        let mut seen = Vec::new();
        reg.for_each(|id, name| seen.push((id, *name)));
        assert_eq!(seen, vec![(1, "x"), (2, "y"), (3, "z")]);
        assert_eq!(reg.snapshot(), seen);
    }

    #[test]
    fn concurrent_adds_get_distinct_ids() {
        let reg = Arc::new(Registry::new());
        let ids: Vec<u64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let reg = reg.clone();
                    s.spawn(move || (0..250).map(|i| reg.add(t * 1000 + i)).collect::<Vec<_>>())
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 2000);
        assert_eq!(reg.len(), 2000);
    }
}
