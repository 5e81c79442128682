#![forbid(unsafe_code)]

//! Reactive substrate for the cycle engine.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification. View-model properties are observables.
//! - [`Subject`] / [`BehaviorSubject`]: hot multicast channels.
//! - [`Stream`]: cold, composable push streams with the operators a
//!   transform function needs (`map`, `filter`, `scan`, `merge`,
//!   `start_with`, `with_latest_from`, `throttle`, ...).
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`BindingScope`]: groups subscriptions under one owner.
//!
//! # Architecture
//!
//! Everything here is single-threaded (`Rc<RefCell<..>>`). Listener sets are
//! snapshotted before dispatch so callbacks may subscribe, unsubscribe or
//! push re-entrantly without tripping a `RefCell` borrow.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A callback never runs after its [`Subscription`] was released.
//! 3. Streams are cold: each subscription owns its own operator state.

pub mod observable;
pub mod scope;
pub mod stream;
pub mod subject;

pub use observable::{Observable, Subscription};
pub use scope::BindingScope;
pub use stream::{Observer, Stream};
pub use subject::{BehaviorSubject, Subject};
