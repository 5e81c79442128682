#![forbid(unsafe_code)]

//! Driver creators: adapters between one component property and one stream.
//!
//! A [`DriverCreator`] turns a (instance, property) pair into a [`Driver`].
//! Creation may touch the property (initialize it, start observing it) but
//! must not read the sink yet: the sink only exists once the transformation
//! has run. The engine therefore hands each driver a proxy sink through
//! [`Driver::connect`] *before* calling the transformation, and feeds the real
//! sink into that proxy afterwards.
//!
//! # Invariants
//!
//! 1. Every mutation a driver performs is published exactly once on the
//!    component-wide change stream.
//! 2. A driver's dispose guard releases everything the driver subscribed to,
//!    whether or not `connect` ever ran. Releasing twice is a no-op.
//!
//! | Kind | Sink | Source |
//! |------|------|--------|
//! | one-way | values written to the property | empty |
//! | two-way | values written through the observer | current + host changes |
//! | action | invocations from the transformation | invocation arguments |
//! | signal | refresh requests (throttled) | empty |
//! | collection | [`CollectionCommand`]s | item and structural events |
//! | view-model | replacement nested instance | nested change events |
//! | parent | messages for the parent | messages from the parent |

pub mod action;
pub mod collection;
pub mod nested;
pub mod one_way;
pub mod parent;
pub mod signal;
pub mod two_way;

#[cfg(test)]
pub(crate) mod testing;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::change::ChangeEvent;
use crate::error::Result;
use crate::host::HostServices;
use crate::model::ViewModel;
use crate::ports::{Sink, SinkKind, Source};
use crate::reactive::{Stream, Subject, Subscription};
use crate::registry::DriverKind;
use crate::value::Value;

pub use action::{ActionDriverCreator, ActionHandle};
pub use collection::{
    CollectionCommand, CollectionDriverCreator, DoCommand, Guard, ItemAction, ItemPredicate,
    MessageCommand,
};
pub use nested::ViewModelDriverCreator;
pub use one_way::OneWayDriverCreator;
pub use parent::ParentDriverCreator;
pub use signal::SignalDriverCreator;
pub use two_way::TwoWayDriverCreator;

/// Everything a creator may use while building one driver.
pub struct DriverContext<'a> {
    pub model: &'a ViewModel,
    pub property: &'a str,
    /// The component-wide change channel.
    pub changes: &'a Subject<ChangeEvent>,
    pub services: &'a HostServices,
}

impl DriverContext<'_> {
    /// Type name of the component being mounted.
    #[must_use]
    pub fn component(&self) -> &'static str {
        self.model.type_name()
    }
}

impl fmt::Debug for DriverContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverContext")
            .field("component", &self.component())
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

/// Builds drivers for one kind of endpoint.
pub trait DriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver>;
}

type Connector = Box<dyn FnOnce(Sink) -> Source>;

/// A live adapter for one (instance, property) pair.
pub struct Driver {
    sink_kind: SinkKind,
    connect: Connector,
    dispose: Subscription,
}

impl Driver {
    /// `connect` receives the sink and returns the source; `dispose` releases
    /// everything the driver holds.
    pub fn new(
        sink_kind: SinkKind,
        connect: impl FnOnce(Sink) -> Source + 'static,
        dispose: Subscription,
    ) -> Self {
        Self {
            sink_kind,
            connect: Box::new(connect),
            dispose,
        }
    }

    /// What the driver's sink must carry.
    #[must_use]
    pub fn sink_kind(&self) -> SinkKind {
        self.sink_kind
    }

    /// Wire `sink` in and obtain the source, keeping the dispose guard.
    pub fn connect(self, sink: Sink) -> (Source, Subscription) {
        let source = (self.connect)(sink);
        (source, self.dispose)
    }

    pub(crate) fn into_parts(self) -> (SinkKind, Connector, Subscription) {
        (self.sink_kind, self.connect, self.dispose)
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("sink_kind", &self.sink_kind)
            .field("disposed", &self.dispose.is_closed())
            .finish()
    }
}

/// The built-in creator for `kind`. `Custom` kinds resolve through the
/// engine instead.
pub(crate) fn builtin(kind: DriverKind) -> Option<&'static dyn DriverCreator> {
    match kind {
        DriverKind::OneWay => Some(&OneWayDriverCreator),
        DriverKind::TwoWay => Some(&TwoWayDriverCreator),
        DriverKind::Action => Some(&ActionDriverCreator),
        DriverKind::Collection => Some(&CollectionDriverCreator),
        DriverKind::Signal => Some(&SignalDriverCreator),
        DriverKind::ViewModel => Some(&ViewModelDriverCreator),
        DriverKind::Parent => Some(&ParentDriverCreator),
        DriverKind::Custom(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Publish `event` on the component-wide change channel.
pub(crate) fn publish(changes: &Subject<ChangeEvent>, component: &'static str, event: ChangeEvent) {
    trace!(
        component,
        property = event.property.as_deref().unwrap_or("-"),
        kind = %event.kind,
        origin = ?event.origin,
        "change"
    );
    changes.next(event);
}

/// The value stream of `sink`. Command sinks yield an empty stream.
pub(crate) fn sink_values(sink: Sink, component: &'static str, property: &str) -> Stream<Value> {
    match sink {
        Sink::Values(stream) => stream,
        Sink::Commands(_) => {
            warn!(component, property, "command sink given to a value driver; ignoring");
            Stream::empty()
        }
    }
}

/// Subscriptions a driver creates during `connect`, released by its dispose
/// guard.
#[derive(Clone, Default)]
pub(crate) struct LinkSlot {
    links: Rc<RefCell<Vec<Subscription>>>,
}

impl LinkSlot {
    pub(crate) fn hold(&self, sub: Subscription) {
        self.links.borrow_mut().push(sub);
    }

    pub(crate) fn release(&self) {
        let mut links = std::mem::take(&mut *self.links.borrow_mut());
        while let Some(mut sub) = links.pop() {
            sub.unsubscribe();
        }
    }

    /// A guard that releases the slot, then runs `extra`.
    pub(crate) fn dispose_with(&self, extra: impl FnOnce() + 'static) -> Subscription {
        let slot = self.clone();
        Subscription::new(move || {
            slot.release();
            extra();
        })
    }

    pub(crate) fn dispose_guard(&self) -> Subscription {
        self.dispose_with(|| {})
    }
}
