#![forbid(unsafe_code)]

//! View-model → view only.
//!
//! Sink values are written straight into the property store, bypassing
//! property watchers, so a one-way write can never loop back into a source.

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::Result;
use crate::ports::{SinkKind, Source};
use crate::reactive::Stream;

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish, sink_values};

/// Creator for [`DriverKind::OneWay`](crate::registry::DriverKind::OneWay).
#[derive(Debug, Clone, Copy, Default)]
pub struct OneWayDriverCreator;

impl DriverCreator for OneWayDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let component = ctx.component();
        let property = ctx.property.to_owned();
        let model = ctx.model.downgrade();
        let changes = ctx.changes.clone();
        let links = LinkSlot::default();
        let held = links.clone();

        let connect = move |sink| {
            let values = sink_values(sink, component, &property);
            held.hold(values.subscribe(move |value| {
                let Some(model) = model.upgrade() else {
                    return;
                };
                if model.assign_property(&property, value.clone()) {
                    publish(
                        &changes,
                        component,
                        ChangeEvent::new(
                            Some(property.as_str()),
                            value.clone(),
                            ChangeOrigin::FromViewModel,
                            ChangeKind::ValueChanged,
                        ),
                    );
                }
            }));
            Source::Values(Stream::empty())
        };

        Ok(Driver::new(SinkKind::Values, connect, links.dispose_guard()))
    }
}
