#![forbid(unsafe_code)]

//! Imperative callables turned into push endpoints.
//!
//! The view gets an [`ActionHandle`] from [`ViewModel::action`] and calls
//! [`ActionHandle::invoke`] from its event handlers. Every live action driver
//! for that (instance, property) registers a trigger on the handle; one
//! invocation fans out to every trigger.
//!
//! # Invariants
//!
//! 1. One invocation yields exactly one `ActionInvoked` event per registered
//!    trigger, on the driver's source and on the component-wide stream.
//! 2. View-side invocations carry [`ChangeOrigin::FromView`]; invocations
//!    coming from the transformation's sink carry
//!    [`ChangeOrigin::FromViewModel`].
//! 3. Disposing a driver removes exactly its own trigger.
//!
//! [`ViewModel::action`]: crate::model::ViewModel::action

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::Result;
use crate::ports::{SinkKind, Source};
use crate::reactive::Subject;
use crate::value::Value;

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish, sink_values};

struct ActionInner {
    name: String,
    next_trigger: Cell<u64>,
    triggers: RefCell<Vec<(u64, Subject<ChangeEvent>)>>,
}

/// Capability to invoke one action of one component instance.
#[derive(Clone)]
pub struct ActionHandle {
    inner: Rc<ActionInner>,
}

impl ActionHandle {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            inner: Rc::new(ActionInner {
                name: name.to_owned(),
                next_trigger: Cell::new(0),
                triggers: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Invoke from the view with positional arguments.
    pub fn invoke<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let args = Value::list(args.into_iter().map(Into::into));
        self.fire(&args, ChangeOrigin::FromView);
    }

    /// Invoke from the view without arguments.
    pub fn trigger(&self) {
        self.fire(&Value::list([]), ChangeOrigin::FromView);
    }

    /// Number of live drivers listening to this action.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.inner.triggers.borrow().len()
    }

    pub(crate) fn fire(&self, args: &Value, origin: ChangeOrigin) {
        let triggers: Vec<Subject<ChangeEvent>> = self
            .inner
            .triggers
            .borrow()
            .iter()
            .map(|(_, t)| t.clone())
            .collect();
        if triggers.is_empty() {
            trace!(action = %self.inner.name, "action invoked with no live driver");
        }
        for trigger in triggers {
            trigger.next(ChangeEvent::new(
                Some(self.inner.name.as_str()),
                args.clone(),
                origin,
                ChangeKind::ActionInvoked,
            ));
        }
    }

    fn add_trigger(&self, trigger: Subject<ChangeEvent>) -> u64 {
        let id = self.inner.next_trigger.get();
        self.inner.next_trigger.set(id + 1);
        self.inner.triggers.borrow_mut().push((id, trigger));
        id
    }

    fn remove_trigger(&self, id: u64) {
        self.inner.triggers.borrow_mut().retain(|(t, _)| *t != id);
    }
}

impl fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandle")
            .field("name", &self.inner.name)
            .field("triggers", &self.trigger_count())
            .finish()
    }
}

/// Creator for [`DriverKind::Action`](crate::registry::DriverKind::Action).
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionDriverCreator;

impl DriverCreator for ActionDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let component = ctx.component();
        let property = ctx.property.to_owned();
        let handle = ctx.model.action(ctx.property);
        let changes = ctx.changes.clone();
        let links = LinkSlot::default();
        let held = links.clone();
        let registration: Rc<Cell<Option<u64>>> = Rc::new(Cell::new(None));
        let registered = Rc::clone(&registration);
        let owner = handle.clone();

        let connect = move |sink| {
            let trigger: Subject<ChangeEvent> = Subject::new();
            held.hold(trigger.subscribe(move |event| {
                publish(&changes, component, event.clone());
            }));
            registered.set(Some(handle.add_trigger(trigger.clone())));

            let invoker = handle.clone();
            held.hold(
                sink_values(sink, component, &property)
                    .subscribe(move |args| invoker.fire(args, ChangeOrigin::FromViewModel)),
            );
            Source::Values(trigger.stream().map(|event| event.value.clone()))
        };

        let dispose = links.dispose_with(move || {
            if let Some(id) = registration.take() {
                owner.remove_trigger(id);
            }
        });
        Ok(Driver::new(SinkKind::Values, connect, dispose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{Fixture, collect, record};
    use crate::ports::Sink;
    use crate::reactive::{Stream, Subscription};

    fn connect(fx: &Fixture) -> (Stream<Value>, Subscription, Subject<Value>) {
        let driver = ActionDriverCreator
            .make_driver(&fx.ctx("change"))
            .expect("action driver");
        let sink: Subject<Value> = Subject::new();
        let (source, dispose) = driver.connect(Sink::Values(sink.stream()));
        let Source::Values(args) = source else {
            panic!("expected a value source");
        };
        (args, dispose, sink)
    }

    #[test]
    fn view_invocation_is_from_view() {
        let fx = Fixture::new();
        let (args, _dispose, _sink) = connect(&fx);
        let seen = collect(&args);
        let events = record(&fx.changes);

        fx.model.action("change").invoke([Value::str("a"), Value::Int(2)]);

        let expected = Value::list([Value::str("a"), Value::Int(2)]);
        assert_eq!(*seen.borrow(), vec![expected.clone()]);
        assert_eq!(events.len(), 1);
        let event = &events.borrow()[0];
        assert_eq!(event.kind, ChangeKind::ActionInvoked);
        assert_eq!(event.origin, ChangeOrigin::FromView);
        assert_eq!(event.value, expected);
        assert!(event.is_for("change"));
    }

    #[test]
    fn sink_invocation_is_from_view_model() {
        let fx = Fixture::new();
        let (_args, _dispose, sink) = connect(&fx);
        let events = record(&fx.changes);

        sink.next(Value::list([Value::Int(1)]));

        assert_eq!(events.len(), 1);
        assert_eq!(events.borrow()[0].origin, ChangeOrigin::FromViewModel);
    }

    #[test]
    fn one_event_per_trigger() {
        let fx = Fixture::new();
        let (_a, _da, _sa) = connect(&fx);
        let (_b, _db, _sb) = connect(&fx);
        let events = record(&fx.changes);
        let handle = fx.model.action("change");
        assert_eq!(handle.trigger_count(), 2);

        handle.invoke([Value::Int(1), Value::Int(2)]);

        assert_eq!(events.len(), 2);
        assert!(events.borrow().iter().all(|e| e.origin == ChangeOrigin::FromView));
    }

    #[test]
    fn dispose_removes_only_own_trigger() {
        let fx = Fixture::new();
        let (_a, dispose_a, _sa) = connect(&fx);
        let (_b, _db, _sb) = connect(&fx);
        let handle = fx.model.action("change");

        drop(dispose_a);
        assert_eq!(handle.trigger_count(), 1);

        let events = record(&fx.changes);
        handle.trigger();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn invoke_without_driver_is_silent() {
        let fx = Fixture::new();
        let events = record(&fx.changes);
        fx.model.action("change").invoke([1]);
        assert_eq!(events.len(), 0);
    }
}
