#![forbid(unsafe_code)]

//! Interfaces to the hosting UI framework.
//!
//! The engine never touches a view directly. Everything it needs from its
//! host goes through three seams:
//!
//! - [`ObserverLocator`] / [`PropertyObserver`]: observe and write one
//!   property of one instance (two-way driver).
//! - [`Signaler`]: ask the templating layer to re-evaluate expressions tagged
//!   with a signal name (signal driver).
//! - [`Clock`]: time source for the signal throttle.
//!
//! [`ModelObserverLocator`] is the default locator. It observes the
//! view-model's own property store and notifies synchronously.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::clock::{Clock, SystemClock};
use crate::config::CycleConfig;
use crate::model::ViewModel;
use crate::reactive::{Observable, Subscription};
use crate::value::Value;

/// Opaque handle for one observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

impl ObserverToken {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Failure reported by a host observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationError {
    message: String,
}

impl ObservationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ObservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ObservationError {}

/// Callback receiving the new value of an observed property.
pub type ObserverCallback = Rc<dyn Fn(&Value)>;

/// Host-side observation of one property.
pub trait PropertyObserver {
    fn get_value(&self) -> Value;

    fn set_value(&self, value: Value);

    /// Register `callback` for host-side changes.
    fn subscribe(&self, callback: ObserverCallback) -> Result<ObserverToken, ObservationError>;

    /// Remove a registration. Unknown or already removed tokens are ignored.
    fn unsubscribe(&self, token: ObserverToken);
}

/// Resolves a [`PropertyObserver`] for (instance, property).
pub trait ObserverLocator {
    fn get_observer(
        &self,
        model: &ViewModel,
        property: &str,
    ) -> Result<Rc<dyn PropertyObserver>, ObservationError>;
}

/// The host's declarative refresh mechanism.
pub trait Signaler {
    fn signal(&self, name: &str);
}

// ---------------------------------------------------------------------------
// ModelObserverLocator: observation over the view-model's own store
// ---------------------------------------------------------------------------

/// Default [`ObserverLocator`] backed by [`ViewModel::observe`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelObserverLocator;

impl ObserverLocator for ModelObserverLocator {
    fn get_observer(
        &self,
        model: &ViewModel,
        property: &str,
    ) -> Result<Rc<dyn PropertyObserver>, ObservationError> {
        Ok(Rc::new(ModelPropertyObserver {
            cell: model.observe(property),
            next_token: Cell::new(0),
            registrations: RefCell::new(HashMap::new()),
        }))
    }
}

struct ModelPropertyObserver {
    cell: Observable<Value>,
    next_token: Cell<u64>,
    registrations: RefCell<HashMap<ObserverToken, Subscription>>,
}

impl PropertyObserver for ModelPropertyObserver {
    fn get_value(&self) -> Value {
        self.cell.get()
    }

    fn set_value(&self, value: Value) {
        self.cell.set(value);
    }

    fn subscribe(&self, callback: ObserverCallback) -> Result<ObserverToken, ObservationError> {
        let token = ObserverToken::new(self.next_token.get());
        self.next_token.set(token.raw() + 1);
        let sub = self.cell.subscribe(move |value| callback(value));
        self.registrations.borrow_mut().insert(token, sub);
        Ok(token)
    }

    fn unsubscribe(&self, token: ObserverToken) {
        let removed = self.registrations.borrow_mut().remove(&token);
        drop(removed);
    }
}

// ---------------------------------------------------------------------------
// HostServices: what drivers may reach
// ---------------------------------------------------------------------------

/// Host integrations and configuration shared by every driver an engine
/// creates.
#[derive(Clone)]
pub struct HostServices {
    pub(crate) observer_locator: Option<Rc<dyn ObserverLocator>>,
    pub(crate) signaler: Option<Rc<dyn Signaler>>,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) config: CycleConfig,
}

impl HostServices {
    /// Services with no observer locator, no signaler and the system clock.
    #[must_use]
    pub fn bare(config: CycleConfig) -> Self {
        Self {
            observer_locator: None,
            signaler: None,
            clock: Rc::new(SystemClock),
            config,
        }
    }

    #[must_use]
    pub fn observer_locator(&self) -> Option<&Rc<dyn ObserverLocator>> {
        self.observer_locator.as_ref()
    }

    #[must_use]
    pub fn signaler(&self) -> Option<&Rc<dyn Signaler>> {
        self.signaler.as_ref()
    }

    #[must_use]
    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    #[must_use]
    pub fn config(&self) -> &CycleConfig {
        &self.config
    }
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("observer_locator", &self.observer_locator.is_some())
            .field("signaler", &self.signaler.is_some())
            .field("config", &self.config)
            .finish()
    }
}
