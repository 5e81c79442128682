#![forbid(unsafe_code)]

//! Duplex message channel between a collection item and its parent.
//!
//! The source carries messages the parent collection delivers to this
//! instance (see [`MessageCommand`](super::MessageCommand)). Sink values are
//! messages for the parent: each becomes a `MessageForwarded` event on this
//! instance's change stream, which the parent's collection driver picks up.

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::Result;
use crate::ports::{SinkKind, Source};

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish, sink_values};

/// Creator for [`DriverKind::Parent`](crate::registry::DriverKind::Parent).
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentDriverCreator;

impl DriverCreator for ParentDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let component = ctx.component();
        let property = ctx.property.to_owned();
        let inbox = ctx.model.parent_inbox();
        let changes = ctx.changes.clone();
        let links = LinkSlot::default();
        let held = links.clone();

        let connect = move |sink| {
            let outgoing = sink_values(sink, component, &property);
            held.hold(outgoing.subscribe(move |message| {
                publish(
                    &changes,
                    component,
                    ChangeEvent::new(
                        Some(property.as_str()),
                        message.clone(),
                        ChangeOrigin::FromViewModel,
                        ChangeKind::MessageForwarded,
                    ),
                );
            }));
            Source::Values(inbox.stream())
        };

        Ok(Driver::new(SinkKind::Values, connect, links.dispose_guard()))
    }
}
