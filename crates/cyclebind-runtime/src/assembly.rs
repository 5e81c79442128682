#![forbid(unsafe_code)]

//! Per-instance driver assembly.
//!
//! At mount time every entry of the component's [`DriverRegistry`] is turned
//! into a live driver. A driver's sink does not exist yet (the transformation
//! has not run), so each driver is connected to a *proxy*: a hot subject the
//! engine later feeds the real sink into. The sources the drivers return are
//! collected into one [`Sources`] map, and their dispose guards into one
//! [`BindingScope`].
//!
//! # Invariants
//!
//! 1. Drivers are created in registration order.
//! 2. Every created driver's dispose guard is in the teardown scope before the
//!    next driver is created, so an error part-way through releases exactly
//!    the drivers created so far.
//! 3. `changes$` and every source supplied through
//!    [`ViewModel::provide_source`] are present in the returned sources.
//!
//! # Failure Modes
//!
//! - A `Custom` kind naming an unknown creator aborts with
//!   [`CycleError::UnknownDriverCreator`].
//! - Creator errors (missing host integration, failed observation) abort
//!   unchanged.
//!
//! [`DriverRegistry`]: crate::registry::DriverRegistry

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::trace;

use crate::driver::{self, CollectionCommand, DriverContext, DriverCreator};
use crate::error::{CycleError, Result};
use crate::host::HostServices;
use crate::model::ViewModel;
use crate::ports::{CHANGES_KEY, Sink, SinkKind, Source, Sources, stream_key};
use crate::reactive::{BindingScope, Subject, Subscription};
use crate::registry::DriverKind;
use crate::value::Value;

/// Creators registered on an engine for [`DriverKind::Custom`] kinds.
pub(crate) type CreatorTable = HashMap<String, Rc<dyn DriverCreator>>;

/// Stand-in sink a driver is connected to before the transformation runs.
pub(crate) enum Proxy {
    Values(Subject<Value>),
    Commands(Subject<CollectionCommand>),
}

impl Proxy {
    fn for_kind(kind: SinkKind) -> Self {
        match kind {
            SinkKind::Values => Self::Values(Subject::new()),
            SinkKind::Commands => Self::Commands(Subject::new()),
        }
    }

    pub(crate) fn kind(&self) -> SinkKind {
        match self {
            Self::Values(_) => SinkKind::Values,
            Self::Commands(_) => SinkKind::Commands,
        }
    }

    fn sink(&self) -> Sink {
        match self {
            Self::Values(subject) => Sink::Values(subject.stream()),
            Self::Commands(subject) => Sink::Commands(subject.stream()),
        }
    }

    /// Forward everything `sink` emits into the driver. A sink of the wrong
    /// kind is handed back.
    pub(crate) fn feed(&self, sink: Sink) -> std::result::Result<Subscription, Sink> {
        match (self, sink) {
            (Self::Values(proxy), Sink::Values(stream)) => {
                let proxy = proxy.clone();
                Ok(stream.subscribe(move |value| proxy.next(value.clone())))
            }
            (Self::Commands(proxy), Sink::Commands(stream)) => {
                let proxy = proxy.clone();
                Ok(stream.subscribe(move |command| proxy.next(command.clone())))
            }
            (_, sink) => Err(sink),
        }
    }
}

/// Drivers of one mount, connected and ready for the transformation.
pub(crate) struct Assembly {
    pub(crate) sources: Sources,
    pub(crate) proxies: BTreeMap<String, Proxy>,
    pub(crate) teardown: BindingScope,
}

fn resolve<'a>(
    kind: DriverKind,
    creators: &'a CreatorTable,
    component: &'static str,
    property: &str,
) -> Result<&'a dyn DriverCreator> {
    let unknown = |creator: &str| CycleError::UnknownDriverCreator {
        component,
        property: property.to_owned(),
        creator: creator.to_owned(),
    };
    match kind {
        DriverKind::Custom(name) => creators
            .get(name)
            .map(|creator| &**creator)
            .ok_or_else(|| unknown(name)),
        builtin => driver::builtin(builtin).ok_or_else(|| unknown(builtin.label())),
    }
}

/// Create and connect every declared driver of `model`.
pub(crate) fn assemble(
    model: &ViewModel,
    services: &HostServices,
    creators: &CreatorTable,
) -> Result<Assembly> {
    let component = model.type_name();
    let changes = model.changes();
    let mut sources = Sources::new(model.downgrade(), component);
    let mut proxies = BTreeMap::new();
    let mut teardown = BindingScope::new();

    for (property, kind) in model.registry().entries() {
        let creator = resolve(kind, creators, component, property)?;
        let ctx = DriverContext {
            model,
            property,
            changes: &changes,
            services,
        };
        let (sink_kind, connect, dispose) = creator.make_driver(&ctx)?.into_parts();
        teardown.hold(dispose);

        let proxy = Proxy::for_kind(sink_kind);
        let source = connect(proxy.sink());
        let key = stream_key(property);
        trace!(component, property, kind = %kind, sink = %sink_kind, "driver connected");
        sources.insert(key.clone(), source);
        proxies.insert(key, proxy);
    }

    for (key, source) in model.provided_sources() {
        sources.insert(key, source);
    }
    sources.insert(CHANGES_KEY.to_owned(), Source::Changes(changes.stream()));

    Ok(Assembly {
        sources,
        proxies,
        teardown,
    })
}
