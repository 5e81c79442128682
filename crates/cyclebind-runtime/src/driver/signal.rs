#![forbid(unsafe_code)]

//! Throttled declarative refresh.
//!
//! Every sink value that survives a leading-edge throttle (default 100 ms,
//! see [`CycleConfig::signal_throttle`]) calls [`Signaler::signal`] with the
//! driver's signal name and publishes a `SignalFired` event carrying that
//! name.
//!
//! Signal names are `"{component}:{property}:{n}"`, where `n` counts up per
//! (component, property) pair for the life of the thread. A name is stored
//! into the property so the view can reference it; an instance that already
//! holds a name keeps it.
//!
//! [`CycleConfig::signal_throttle`]: crate::config::CycleConfig::signal_throttle
//! [`Signaler::signal`]: crate::host::Signaler::signal

use std::cell::RefCell;
use std::collections::HashMap;

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::{CycleError, Result};
use crate::ports::{SinkKind, Source};
use crate::reactive::Stream;
use crate::value::Value;

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish, sink_values};

thread_local! {
    static SIGNAL_COUNTERS: RefCell<HashMap<String, u64>> = RefCell::new(HashMap::new());
}

/// Next unique signal name for `base`.
pub(crate) fn unique_signal_name(base: &str) -> String {
    let n = SIGNAL_COUNTERS.with(|counters| {
        let mut counters = counters.borrow_mut();
        let slot = counters.entry(base.to_owned()).or_insert(0);
        let n = *slot;
        *slot += 1;
        n
    });
    format!("{base}:{n}")
}

/// Creator for [`DriverKind::Signal`](crate::registry::DriverKind::Signal).
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDriverCreator;

impl DriverCreator for SignalDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let component = ctx.component();
        let property = ctx.property.to_owned();
        let signaler = ctx
            .services
            .signaler()
            .cloned()
            .ok_or_else(|| CycleError::MissingSignaler {
                component,
                property: property.clone(),
            })?;

        let name = match ctx.model.property(ctx.property) {
            Value::Str(existing) if !existing.is_empty() => existing.to_string(),
            _ => {
                let fresh = unique_signal_name(&format!("{component}:{property}"));
                ctx.model.assign_property(ctx.property, fresh.as_str());
                fresh
            }
        };

        let interval = ctx.services.config().signal_throttle();
        let clock = ctx.services.clock();
        let changes = ctx.changes.clone();
        let links = LinkSlot::default();
        let held = links.clone();

        let connect = move |sink| {
            let requests = sink_values(sink, component, &property).throttle(interval, clock);
            held.hold(requests.subscribe(move |_| {
                signaler.signal(&name);
                publish(
                    &changes,
                    component,
                    ChangeEvent::new(
                        Some(property.as_str()),
                        Value::str(&name),
                        ChangeOrigin::FromViewModel,
                        ChangeKind::SignalFired,
                    ),
                );
            }));
            Source::Values(Stream::empty())
        };

        Ok(Driver::new(SinkKind::Values, connect, links.dispose_guard()))
    }
}
