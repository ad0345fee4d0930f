/// Handle returned by [`Observers::subscribe`], used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// Change-notification fan-out.
///
/// Notifications carry a reference to the full current value rather than a
/// diff; observers re-read whatever they need.
///
/// Ordering contract:
/// - Observers are invoked in subscription order.
/// - Each `notify` call invokes every observer exactly once.
pub struct Observers<T> {
    next_id: u64,
    entries: Vec<(ObserverId, Callback<T>)>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&T) + Send + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(observer)));
        id
    }

    /// Returns `true` if the observer was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn notify(&mut self, value: &T) {
        for (_, observer) in &mut self.entries {
            observer(value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::Observers;

    #[test]
    fn notifies_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::<u32>::new();

        let a = Arc::clone(&seen);
        observers.subscribe(move |v| a.lock().push(("a", *v)));
        let b = Arc::clone(&seen);
        observers.subscribe(move |v| b.lock().push(("b", *v)));

        observers.notify(&7);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let mut observers = Observers::<()>::new();
        let c = Arc::clone(&count);
        let id = observers.subscribe(move |_| *c.lock() += 1);

        observers.notify(&());
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&());

        assert_eq!(*count.lock(), 1);
        assert!(observers.is_empty());
    }
}
