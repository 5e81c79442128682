#![forbid(unsafe_code)]

//! Test host and reference fixtures for cyclebind.
//!
//! The harness plays the UI host without a UI: [`TestHost`] binds and
//! unbinds view-models, types into properties and clicks actions, while
//! [`ManualClock`] and [`RecordingSignaler`] make throttling and refresh
//! signals observable. [`EventLog`] records change streams and digests them
//! for comparisons across runs.
//!
//! The [`fixtures`] module holds the reference components (a counter and a
//! TodoMVC list) the integration tests drive, and [`strategies`] holds the
//! proptest generators for edit scripts.

pub mod clock;
pub mod fixtures;
pub mod host;
pub mod log;
pub mod strategies;

pub use clock::ManualClock;
pub use host::{FailingObserverLocator, RecordingSignaler, TestHost, items_of};
pub use log::EventLog;
