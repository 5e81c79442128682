#![forbid(unsafe_code)]

//! Driver creation and change propagation for stream-defined UI components.
//!
//! A component describes its behavior as a pure function from *sources*
//! (inbound streams: user actions, property changes, collection events) to
//! *sinks* (outbound streams written back into view state). This crate is the
//! adapter between that function and a host that repeatedly binds and
//! unbinds the component:
//!
//! - [`registry`]: per-type declarations of which property is which kind of
//!   endpoint.
//! - [`driver`]: one adapter per endpoint kind (one-way, two-way, action,
//!   signal, collection, nested view-model, parent channel).
//! - [`engine`]: builds the drivers at bind time, runs the transformation,
//!   wires sinks back and tears everything down at unbind.
//! - [`change`]: the [`ChangeEvent`] every mutation is reported as.
//!
//! The host is reached only through the traits in [`host`] and the two
//! hooks [`CycleEngine::before_bind`] / [`CycleEngine::before_unbind`].
//!
//! Everything is single-threaded.

mod assembly;
pub mod change;
pub mod clock;
pub mod component;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod ports;
pub mod reactive;
pub mod registry;
pub mod value;

pub use change::{ChangeEvent, ChangeKind, ChangeOrigin};
pub use clock::{Clock, SystemClock};
pub use component::Component;
pub use config::CycleConfig;
pub use driver::{
    ActionHandle, CollectionCommand, DoCommand, Driver, DriverContext, DriverCreator,
    MessageCommand,
};
pub use engine::{CycleEngine, CycleEngineBuilder, MountGuard, MountOutcome, UnmountOutcome};
pub use error::{CycleError, Result};
pub use host::{
    HostServices, ModelObserverLocator, ObservationError, ObserverCallback, ObserverLocator,
    ObserverToken, PropertyObserver, Signaler,
};
pub use model::{ModelId, ViewModel, WeakViewModel};
pub use ports::{CHANGES_KEY, Sink, SinkKind, Sinks, Source, Sources, stream_key};
pub use reactive::{BehaviorSubject, BindingScope, Observable, Stream, Subject, Subscription};
pub use registry::{DriverKind, DriverRegistry, DriverRegistryBuilder, PARENT_PROPERTY};
pub use value::{ItemList, Value};
