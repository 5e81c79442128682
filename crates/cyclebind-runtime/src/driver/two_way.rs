#![forbid(unsafe_code)]

//! Bidirectional binding through the host's property observation.
//!
//! The source replays the observed value on subscribe and then every
//! host-side change. Host-side changes are published with origin
//! [`ChangeOrigin::Unknown`]: at this layer a view edit and a programmatic
//! write look the same. Sink values are written back only when they differ
//! from the observed value, which also terminates source → sink → source
//! loops after one round.
//!
//! # Failure Modes
//!
//! - No observer locator installed: [`CycleError::MissingObserverLocator`].
//! - The host cannot observe the property:
//!   [`CycleError::ObservationFailed`]; nothing stays subscribed.

use std::rc::Rc;

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::{CycleError, Result};
use crate::ports::{SinkKind, Source};
use crate::reactive::BehaviorSubject;
use crate::value::Value;

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish, sink_values};

/// Creator for [`DriverKind::TwoWay`](crate::registry::DriverKind::TwoWay).
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoWayDriverCreator;

impl DriverCreator for TwoWayDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let component = ctx.component();
        let property = ctx.property.to_owned();

        let locator = ctx.services.observer_locator().ok_or_else(|| {
            CycleError::MissingObserverLocator {
                component,
                property: property.clone(),
            }
        })?;
        let observation_failed = |reason: String| CycleError::ObservationFailed {
            component,
            property: property.clone(),
            reason,
        };
        let observer = locator
            .get_observer(ctx.model, ctx.property)
            .map_err(|e| observation_failed(e.to_string()))?;

        let live = BehaviorSubject::new(observer.get_value());
        let callback = {
            let live = live.clone();
            let changes = ctx.changes.clone();
            let property = property.clone();
            Rc::new(move |value: &Value| {
                live.next(value.clone());
                publish(
                    &changes,
                    component,
                    ChangeEvent::new(
                        Some(property.as_str()),
                        value.clone(),
                        ChangeOrigin::Unknown,
                        ChangeKind::ValueChanged,
                    ),
                );
            })
        };
        let token = observer
            .subscribe(callback)
            .map_err(|e| observation_failed(e.to_string()))?;

        let links = LinkSlot::default();
        let held = links.clone();
        let writer = Rc::clone(&observer);
        let connect = move |sink| {
            let values = sink_values(sink, component, &property);
            held.hold(values.subscribe(move |value| {
                if *value != writer.get_value() {
                    writer.set_value(value.clone());
                }
            }));
            Source::Values(live.stream())
        };

        let dispose = links.dispose_with(move || observer.unsubscribe(token));
        Ok(Driver::new(SinkKind::Values, connect, dispose))
    }
}
