#![forbid(unsafe_code)]

//! Hot multicast channels.
//!
//! [`Subject<T>`] pushes every value to the subscribers registered at the time
//! of the push; late subscribers miss earlier values. [`BehaviorSubject<T>`]
//! additionally keeps the latest value and replays it to each new subscriber.
//!
//! Both are single-threaded (`Rc<RefCell<..>>`) and re-entrant: a subscriber
//! may push, subscribe or unsubscribe from inside its own callback. Values
//! pushed re-entrantly are delivered depth-first.

use std::cell::RefCell;
use std::rc::Rc;

use super::observable::{ListenerSet, Subscription, detach_guard};
use super::stream::Stream;

/// Hot multicast stream without replay.
pub struct Subject<T> {
    listeners: Rc<RefCell<ListenerSet<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(ListenerSet::default())),
        }
    }
}

impl<T> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.listeners.borrow().len())
            .finish()
    }
}

impl<T: 'static> Subject<T> {
    /// Create a subject with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `value` to every current subscriber, in registration order.
    pub fn next(&self, value: T) {
        let listeners = self.listeners.borrow().snapshot();
        for listener in listeners {
            listener.call(&value);
        }
    }

    /// Register a callback for subsequent values.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let listener = self.listeners.borrow_mut().insert(Box::new(callback));
        detach_guard(Rc::downgrade(&self.listeners), listener, |set| set)
    }

    /// View this subject as a composable [`Stream`].
    #[must_use]
    pub fn stream(&self) -> Stream<T> {
        let subject = self.clone();
        Stream::new(move |observer| subject.subscribe(move |value| observer(value)))
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether both handles point at the same channel.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }
}

/// A [`Subject`] that remembers its latest value and replays it on subscribe.
pub struct BehaviorSubject<T> {
    current: Rc<RefCell<T>>,
    subject: Subject<T>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            current: Rc::clone(&self.current),
            subject: self.subject.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for BehaviorSubject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorSubject")
            .field("current", &self.current.borrow())
            .field("observers", &self.subject.listeners.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> BehaviorSubject<T> {
    /// Create a subject seeded with `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            current: Rc::new(RefCell::new(initial)),
            subject: Subject::new(),
        }
    }

    /// The latest value.
    #[must_use]
    pub fn value(&self) -> T {
        self.current.borrow().clone()
    }

    /// Store `value` as the latest and push it to subscribers.
    pub fn next(&self, value: T) {
        *self.current.borrow_mut() = value.clone();
        self.subject.next(value);
    }

    /// Replay the latest value to `callback`, then register it.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let latest = self.value();
        callback(&latest);
        self.subject.subscribe(callback)
    }

    /// View this subject as a composable [`Stream`].
    #[must_use]
    pub fn stream(&self) -> Stream<T> {
        let subject = self.clone();
        Stream::new(move |observer| subject.subscribe(move |value| observer(value)))
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }
}
