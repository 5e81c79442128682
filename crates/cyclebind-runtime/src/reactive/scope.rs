#![forbid(unsafe_code)]

//! Lifetime grouping for subscriptions.

use super::observable::{Observable, Subscription};
use super::stream::Stream;

/// Collects subscriptions (and arbitrary teardown closures) that belong to
/// one logical owner, such as a running cycle or a driver set.
///
/// # Invariants
///
/// 1. Held subscriptions are released in reverse registration order.
/// 2. After `clear()` or drop, no callbacks from this scope fire.
/// 3. `clear()` leaves the scope empty but reusable.
/// 4. `binding_count()` is always accurate.
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Keep `sub` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Run `teardown` when the scope is cleared or dropped.
    pub fn defer(&mut self, teardown: impl FnOnce() + 'static) {
        self.subscriptions.push(Subscription::new(teardown));
    }

    /// Subscribe to an observable within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        let sub = source.subscribe(callback);
        self.subscriptions.push(sub);
        self
    }

    /// Subscribe to a stream within this scope.
    pub fn listen<T: 'static>(
        &mut self,
        source: &Stream<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        let sub = source.subscribe(callback);
        self.subscriptions.push(sub);
        self
    }

    /// Move every subscription of `other` into this scope.
    pub fn absorb(&mut self, mut other: BindingScope) {
        self.subscriptions.append(&mut other.subscriptions);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release everything now.
    pub fn clear(&mut self) {
        while let Some(mut sub) = self.subscriptions.pop() {
            sub.unsubscribe();
        }
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Subject;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn scope_releases_on_drop() {
        let obs = Observable::new(0);
        let hits = Rc::new(Cell::new(0));
        {
            let mut scope = BindingScope::new();
            let h = Rc::clone(&hits);
            scope.subscribe(&obs, move |_| h.set(h.get() + 1));
            obs.set(1);
            assert_eq!(scope.binding_count(), 1);
        }
        obs.set(2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clear_runs_teardowns_in_reverse() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut scope = BindingScope::new();
        for i in 0..3 {
            let o = Rc::clone(&order);
            scope.defer(move || o.borrow_mut().push(i));
        }
        scope.clear();
        assert_eq!(*order.borrow(), vec![2, 1, 0]);
        assert!(scope.is_empty());
    }

    #[test]
    fn listen_and_absorb() {
        let subject: Subject<u8> = Subject::new();
        let mut inner = BindingScope::new();
        inner.listen(&subject.stream(), |_| {});
        let mut outer = BindingScope::new();
        outer.absorb(inner);
        assert_eq!(outer.binding_count(), 1);
        assert_eq!(subject.observer_count(), 1);
        outer.clear();
        assert_eq!(subject.observer_count(), 0);
    }
}
