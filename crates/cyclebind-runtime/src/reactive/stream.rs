#![forbid(unsafe_code)]

//! Cold, composable push streams.
//!
//! A [`Stream<T>`] is a recipe: nothing happens until [`Stream::subscribe`] is
//! called, and every subscription runs the producer again with its own
//! operator state. Hot sources ([`Subject`](super::Subject)) become streams via
//! `Subject::stream`, which shares the underlying channel between
//! subscriptions.
//!
//! # Invariants
//!
//! 1. Operator state (`scan` accumulators, `throttle` windows, `take` counters)
//!    is per subscription.
//! 2. Releasing the returned [`Subscription`] releases every upstream
//!    subscription the operator chain created.
//! 3. `start_with` and `of` emit synchronously, before `subscribe` returns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use super::observable::Subscription;
use crate::clock::Clock;

/// Callback receiving each value of a stream.
pub type Observer<T> = Rc<dyn Fn(&T)>;

/// A cold push stream.
pub struct Stream<T> {
    producer: Rc<dyn Fn(Observer<T>) -> Subscription>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl<T: 'static> Stream<T> {
    /// Build a stream from a producer. The producer is called once per
    /// subscription and returns the teardown for that subscription.
    pub fn new(producer: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// A stream that never emits.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// Subscribe `callback` to this stream.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        (self.producer)(Rc::new(callback))
    }

    /// Interleave the values of several streams.
    #[must_use]
    pub fn merge(streams: Vec<Stream<T>>) -> Self {
        Self::new(move |observer| {
            let subs = streams
                .iter()
                .map(|stream| {
                    let observer = Rc::clone(&observer);
                    stream.subscribe(move |value| observer(value))
                })
                .collect();
            Subscription::join(subs)
        })
    }

    /// Interleave this stream with `other`.
    #[must_use]
    pub fn merge_with(self, other: Stream<T>) -> Self {
        Self::merge(vec![self, other])
    }

    /// Transform every value.
    #[must_use]
    pub fn map<U: 'static>(self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Rc::clone(&f);
            self.subscribe(move |value| observer(&f(value)))
        })
    }

    /// Keep only values matching `predicate`.
    #[must_use]
    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        let predicate = Rc::new(predicate);
        Self::new(move |observer| {
            let predicate = Rc::clone(&predicate);
            self.subscribe(move |value| {
                if predicate(value) {
                    observer(value);
                }
            })
        })
    }

    /// Transform and filter in one step.
    #[must_use]
    pub fn filter_map<U: 'static>(self, f: impl Fn(&T) -> Option<U> + 'static) -> Stream<U> {
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Rc::clone(&f);
            self.subscribe(move |value| {
                if let Some(mapped) = f(value) {
                    observer(&mapped);
                }
            })
        })
    }

    /// Run a side effect for every value and pass it through unchanged.
    #[must_use]
    pub fn tap(self, effect: impl Fn(&T) + 'static) -> Self {
        let effect = Rc::new(effect);
        Self::new(move |observer| {
            let effect = Rc::clone(&effect);
            self.subscribe(move |value| {
                effect(value);
                observer(value);
            })
        })
    }

    /// Emit the running fold of the stream, starting from `seed`. The seed
    /// itself is not emitted.
    #[must_use]
    pub fn scan<A: Clone + 'static>(self, seed: A, f: impl Fn(&A, &T) -> A + 'static) -> Stream<A> {
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<A>| {
            let f = Rc::clone(&f);
            let state = Rc::new(RefCell::new(seed.clone()));
            self.subscribe(move |value| {
                let next = f(&*state.borrow(), value);
                *state.borrow_mut() = next.clone();
                observer(&next);
            })
        })
    }

    /// Emit at most `count` values, then ignore the rest.
    #[must_use]
    pub fn take(self, count: usize) -> Self {
        Self::new(move |observer| {
            let remaining = Rc::new(Cell::new(count));
            self.subscribe(move |value| {
                let left = remaining.get();
                if left > 0 {
                    remaining.set(left - 1);
                    observer(value);
                }
            })
        })
    }

    /// Combine each value with the latest value of `other`. Values arriving
    /// before `other` has emitted are dropped.
    #[must_use]
    pub fn with_latest_from<U, R>(
        self,
        other: Stream<U>,
        f: impl Fn(&T, &U) -> R + 'static,
    ) -> Stream<R>
    where
        U: Clone + 'static,
        R: 'static,
    {
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<R>| {
            let latest: Rc<RefCell<Option<U>>> = Rc::new(RefCell::new(None));
            let slot = Rc::clone(&latest);
            let other_sub = other.subscribe(move |value| {
                *slot.borrow_mut() = Some(value.clone());
            });
            let f = Rc::clone(&f);
            let main_sub = self.subscribe(move |value| {
                let current = latest.borrow().clone();
                if let Some(current) = current {
                    observer(&f(value, &current));
                }
            });
            Subscription::join(vec![other_sub, main_sub])
        })
    }

    /// Leading-edge throttle: emit a value, then drop everything arriving
    /// within `interval` of it according to `clock`.
    #[must_use]
    pub fn throttle(self, interval: Duration, clock: Rc<dyn Clock>) -> Self {
        Self::new(move |observer| {
            let last: Rc<Cell<Option<Instant>>> = Rc::new(Cell::new(None));
            let clock = Rc::clone(&clock);
            self.subscribe(move |value| {
                let now = clock.now();
                let open = match last.get() {
                    None => true,
                    Some(at) => now.saturating_duration_since(at) >= interval,
                };
                if open {
                    last.set(Some(now));
                    observer(value);
                }
            })
        })
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// A stream that emits `values` synchronously on subscribe.
    #[must_use]
    pub fn of(values: Vec<T>) -> Self {
        Self::new(move |observer| {
            for value in &values {
                observer(value);
            }
            Subscription::empty()
        })
    }

    /// Emit `values` first, then the values of this stream.
    #[must_use]
    pub fn start_with(self, values: Vec<T>) -> Self {
        Self::new(move |observer| {
            for value in &values {
                observer(value);
            }
            self.subscribe(move |value| observer(value))
        })
    }
}

impl<T: Clone + PartialEq + 'static> Stream<T> {
    /// Drop values equal to the previously emitted one.
    #[must_use]
    pub fn distinct_until_changed(self) -> Self {
        Self::new(move |observer| {
            let previous: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            self.subscribe(move |value| {
                let changed = previous.borrow().as_ref() != Some(value);
                if changed {
                    *previous.borrow_mut() = Some(value.clone());
                    observer(value);
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Subject;

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = stream.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    struct StepClock {
        origin: Instant,
        offset: Cell<Duration>,
    }

    impl Clock for StepClock {
        fn now(&self) -> Instant {
            self.origin + self.offset.get()
        }
    }

    #[test]
    fn scan_with_start_with_counts_clicks() {
        let clicks: Subject<()> = Subject::new();
        let count = clicks.stream().scan(0, |acc, _| acc + 1).start_with(vec![0]);
        let (seen, _sub) = collect(&count);
        clicks.next(());
        clicks.next(());
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn scan_state_is_per_subscription() {
        let src: Subject<i32> = Subject::new();
        let sums = src.stream().scan(0, |acc, v| acc + v);
        let (first, _a) = collect(&sums);
        src.next(5);
        let (second, _b) = collect(&sums);
        src.next(1);
        assert_eq!(*first.borrow(), vec![5, 6]);
        assert_eq!(*second.borrow(), vec![1]);
    }

    #[test]
    fn tap_sees_every_value_and_passes_it_on() {
        let src: Subject<i32> = Subject::new();
        let tapped = Rc::new(RefCell::new(Vec::new()));
        let t = Rc::clone(&tapped);
        let stream = src.stream().tap(move |v| t.borrow_mut().push(*v)).filter(|v| *v > 1);
        let (seen, sub) = collect(&stream);
        src.next(1);
        src.next(2);
        drop(sub);
        src.next(3);
        assert_eq!(*tapped.borrow(), vec![1, 2]);
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn map_filter_compose() {
        let src: Subject<i32> = Subject::new();
        let evens = src.stream().filter(|v| v % 2 == 0).map(|v| v * 10);
        let (seen, _sub) = collect(&evens);
        for v in 1..=4 {
            src.next(v);
        }
        assert_eq!(*seen.borrow(), vec![20, 40]);
    }

    #[test]
    fn merge_interleaves_and_unsubscribes_all() {
        let a: Subject<&'static str> = Subject::new();
        let b: Subject<&'static str> = Subject::new();
        let merged = Stream::merge(vec![a.stream(), b.stream()]);
        let (seen, sub) = collect(&merged);
        a.next("a1");
        b.next("b1");
        a.next("a2");
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "a2"]);
        drop(sub);
        assert_eq!(a.observer_count(), 0);
        assert_eq!(b.observer_count(), 0);
    }

    #[test]
    fn with_latest_from_waits_for_other() {
        let main: Subject<i32> = Subject::new();
        let other: Subject<&'static str> = Subject::new();
        let joined = main
            .stream()
            .with_latest_from(other.stream(), |n, s| format!("{s}{n}"));
        let (seen, _sub) = collect(&joined);
        main.next(1);
        other.next("x");
        main.next(2);
        other.next("y");
        main.next(3);
        assert_eq!(*seen.borrow(), vec!["x2".to_string(), "y3".to_string()]);
    }

    #[test]
    fn distinct_until_changed_drops_repeats() {
        let src: Subject<i32> = Subject::new();
        let (seen, _sub) = collect(&src.stream().distinct_until_changed());
        for v in [1, 1, 2, 2, 1] {
            src.next(v);
        }
        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn throttle_is_leading_edge() {
        let clock = Rc::new(StepClock {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        });
        let src: Subject<u32> = Subject::new();
        let throttled = src
            .stream()
            .throttle(Duration::from_millis(100), Rc::clone(&clock) as Rc<dyn Clock>);
        let (seen, _sub) = collect(&throttled);

        src.next(1);
        clock.offset.set(Duration::from_millis(50));
        src.next(2);
        clock.offset.set(Duration::from_millis(100));
        src.next(3);
        clock.offset.set(Duration::from_millis(150));
        src.next(4);
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }

    #[test]
    fn take_stops_after_count() {
        let src: Subject<i32> = Subject::new();
        let (seen, _sub) = collect(&src.stream().take(2));
        for v in 0..5 {
            src.next(v);
        }
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn of_emits_synchronously() {
        let (seen, sub) = collect(&Stream::of(vec!['a', 'b']));
        assert_eq!(*seen.borrow(), vec!['a', 'b']);
        assert!(sub.is_closed());
    }
}
