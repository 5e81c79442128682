#![forbid(unsafe_code)]

//! Cyclebind: bind stream-defined components to a UI host.
//!
//! A component declares which of its properties are driven how (in a
//! [`DriverRegistry`]) and supplies one pure function from [`Sources`] to
//! [`Sinks`]. A [`CycleEngine`] runs that function every time the host binds
//! an instance and tears it down when the last binding ends.
//!
//! ```
//! use std::sync::LazyLock;
//! use cyclebind::prelude::*;
//!
//! static REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
//!     DriverRegistry::builder("Greeter")
//!         .two_way("name")
//!         .one_way("greeting")
//!         .build()
//! });
//!
//! struct Greeter;
//!
//! impl Component for Greeter {
//!     fn registry(&self) -> &'static DriverRegistry {
//!         &REGISTRY
//!     }
//!
//!     fn cycle(&self, sources: &Sources) -> Sinks {
//!         let greeting = sources.values("name").map(|name| match name.as_str() {
//!             Some(name) => Value::str(format!("Hello, {name}!")),
//!             None => Value::Null,
//!         });
//!         Sinks::new().with_values("greeting", greeting)
//!     }
//! }
//!
//! let engine = CycleEngine::builder().with_model_observers().build();
//! let greeter = ViewModel::new(Greeter).with_property("name", "Ada");
//! engine.before_bind(&greeter)?;
//! assert_eq!(greeter.property("greeting"), Value::str("Hello, Ada!"));
//!
//! greeter.set_property("name", "Grace");
//! assert_eq!(greeter.property("greeting"), Value::str("Hello, Grace!"));
//! engine.before_unbind(&greeter);
//! # Ok::<(), cyclebind::CycleError>(())
//! ```

pub use cyclebind_runtime::*;

/// The names most components need.
pub mod prelude {
    pub use cyclebind_runtime::{
        ChangeEvent, ChangeKind, ChangeOrigin, CollectionCommand, Component, CycleConfig,
        CycleEngine, CycleError, DoCommand, DriverRegistry, MessageCommand, PARENT_PROPERTY,
        Sinks, Sources, Stream, Value, ViewModel,
    };
}
