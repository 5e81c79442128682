#![forbid(unsafe_code)]

//! Nested view-model forwarding.
//!
//! While connected, every event on the nested instance's change stream is
//! re-published on the parent's stream (and on this driver's source) tagged
//! with the parent's property as `parent_property`. Writing a different
//! instance (or `Null`) through the sink swaps the forwarding target.

use std::cell::RefCell;
use std::rc::Rc;

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::Result;
use crate::ports::{SinkKind, Source};
use crate::reactive::{Subject, Subscription};
use crate::value::Value;

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish, sink_values};

struct Forwarder {
    component: &'static str,
    property: String,
    local: Subject<ChangeEvent>,
    changes: Subject<ChangeEvent>,
    link: RefCell<Option<Subscription>>,
}

impl Forwarder {
    fn retarget(&self, value: &Value) {
        let next = value.as_model().map(|child| {
            let property = self.property.clone();
            let local = self.local.clone();
            let changes = self.changes.clone();
            let component = self.component;
            child.changes().subscribe(move |change| {
                let forwarded = change.clone().with_parent_property(&property);
                local.next(forwarded.clone());
                publish(&changes, component, forwarded);
            })
        });
        let previous = self.link.replace(next);
        drop(previous);
    }

    fn release(&self) {
        let previous = self.link.borrow_mut().take();
        drop(previous);
    }
}

/// Creator for [`DriverKind::ViewModel`](crate::registry::DriverKind::ViewModel).
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewModelDriverCreator;

impl DriverCreator for ViewModelDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let component = ctx.component();
        let forwarder = Rc::new(Forwarder {
            component,
            property: ctx.property.to_owned(),
            local: Subject::new(),
            changes: ctx.changes.clone(),
            link: RefCell::new(None),
        });
        let model = ctx.model.downgrade();
        let links = LinkSlot::default();
        let held = links.clone();
        let active = Rc::clone(&forwarder);

        let connect = move |sink| {
            if let Some(model) = model.upgrade() {
                active.retarget(&model.property(&active.property));
            }
            let values = sink_values(sink, component, &active.property);
            let writer = Rc::clone(&active);
            held.hold(values.subscribe(move |value| {
                let Some(model) = model.upgrade() else {
                    return;
                };
                if model.assign_property(&writer.property, value.clone()) {
                    writer.retarget(value);
                    publish(
                        &writer.changes,
                        component,
                        ChangeEvent::new(
                            Some(writer.property.as_str()),
                            value.clone(),
                            ChangeOrigin::FromViewModel,
                            ChangeKind::ValueChanged,
                        ),
                    );
                }
            }));
            Source::Changes(active.local.stream())
        };

        let dispose = links.dispose_with(move || forwarder.release());
        Ok(Driver::new(SinkKind::Values, connect, dispose))
    }
}
