#![forbid(unsafe_code)]

//! Version-tracked value cells and the [`Subscription`] guard shared by every
//! reactive primitive in this crate.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. A callback never runs after its [`Subscription`] was released, even when
//!    the release happens in the middle of a notification pass.
//!
//! # Failure Modes
//!
//! - Subscriber panic: propagates to the caller of `set()`. Remaining
//!   subscribers of that pass are not notified.
//! - Unsubscribing while the cell is borrowed: the listener is deactivated
//!   immediately and pruned on the next registration.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

// ---------------------------------------------------------------------------
// Subscription: RAII teardown guard
// ---------------------------------------------------------------------------

/// RAII guard for a live callback registration.
///
/// Dropping the guard unsubscribes. [`unsubscribe`](Self::unsubscribe) may be
/// called any number of times; only the first call runs the teardown.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a teardown closure.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription that is already closed. Unsubscribing it does nothing.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Combine several subscriptions into one guard. They are released in
    /// reverse order.
    pub fn join(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            let mut subscriptions = subscriptions;
            while let Some(mut sub) = subscriptions.pop() {
                sub.unsubscribe();
            }
        })
    }

    /// Run the teardown if it has not run yet.
    pub fn unsubscribe(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    /// Whether the teardown already ran (or there never was one).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.teardown.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ListenerSet: ordered callback storage
// ---------------------------------------------------------------------------

pub(crate) struct Listener<T> {
    id: u64,
    active: Cell<bool>,
    callback: Box<dyn Fn(&T)>,
}

impl<T> Listener<T> {
    pub(crate) fn call(&self, value: &T) {
        if self.active.get() {
            (self.callback)(value);
        }
    }
}

pub(crate) struct ListenerSet<T> {
    next_id: u64,
    entries: Vec<Rc<Listener<T>>>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> ListenerSet<T> {
    pub(crate) fn insert(&mut self, callback: Box<dyn Fn(&T)>) -> Rc<Listener<T>> {
        self.entries.retain(|l| l.active.get());
        let listener = Rc::new(Listener {
            id: self.next_id,
            active: Cell::new(true),
            callback,
        });
        self.next_id += 1;
        self.entries.push(Rc::clone(&listener));
        listener
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.entries.retain(|l| l.id != id);
    }

    pub(crate) fn snapshot(&self) -> Vec<Rc<Listener<T>>> {
        self.entries
            .iter()
            .filter(|l| l.active.get())
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.iter().filter(|l| l.active.get()).count()
    }
}

/// Build the guard that detaches `listener` from the set behind `owner`.
pub(crate) fn detach_guard<S: 'static, T: 'static>(
    owner: Weak<RefCell<S>>,
    listener: Rc<Listener<T>>,
    set_of: fn(&mut S) -> &mut ListenerSet<T>,
) -> Subscription {
    Subscription::new(move || {
        listener.active.set(false);
        let Some(owner) = owner.upgrade() else {
            return;
        };
        if let Ok(mut inner) = owner.try_borrow_mut() {
            set_of(&mut *inner).remove(listener.id);
        }
    })
}

// ---------------------------------------------------------------------------
// Observable<T>: version-tracked shared value
// ---------------------------------------------------------------------------

struct ObservableInner<T> {
    value: T,
    version: u64,
    listeners: ListenerSet<T>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.listeners.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable holding `value` at version 0.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                listeners: ListenerSet::default(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value and notify subscribers. Returns `false` (and does
    /// nothing) when `value` equals the current value.
    pub fn set(&self, value: T) -> bool {
        let listeners = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner.version += 1;
            inner.listeners.snapshot()
        };
        for listener in listeners {
            listener.call(&value);
        }
        true
    }

    /// Replace the value without notifying anyone. The version still moves
    /// when the value changes.
    pub fn replace_silently(&self, value: T) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.value == value {
            return false;
        }
        inner.value = value;
        inner.version += 1;
        true
    }

    /// Current version counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a change callback.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let listener = self.inner.borrow_mut().listeners.insert(Box::new(callback));
        detach_guard(Rc::downgrade(&self.inner), listener, |inner| {
            &mut inner.listeners
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Whether both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
