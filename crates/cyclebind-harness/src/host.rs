#![forbid(unsafe_code)]

//! An in-process stand-in for the UI host.
//!
//! [`TestHost`] owns a [`CycleEngine`] wired to a [`ManualClock`], a
//! [`RecordingSignaler`] and the view-model's own property observation, and
//! plays the host's part: binding, unbinding, typing into properties and
//! clicking actions.

use std::cell::RefCell;
use std::rc::Rc;

use cyclebind_runtime::{
    Clock, CycleConfig, CycleEngine, CycleError, DriverCreator, MountOutcome, ObservationError,
    ObserverLocator, PropertyObserver, Signaler, UnmountOutcome, Value, ViewModel,
};

use crate::clock::ManualClock;

// ---------------------------------------------------------------------------
// Host integrations
// ---------------------------------------------------------------------------

/// Records every signal name it is asked to refresh.
#[derive(Debug, Default)]
pub struct RecordingSignaler {
    names: RefCell<Vec<String>>,
}

impl RecordingSignaler {
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.names.borrow().len()
    }

    /// How many times `name` was signaled.
    #[must_use]
    pub fn count_of(&self, name: &str) -> usize {
        self.names.borrow().iter().filter(|n| *n == name).count()
    }

    pub fn clear(&self) {
        self.names.borrow_mut().clear();
    }
}

impl Signaler for RecordingSignaler {
    fn signal(&self, name: &str) {
        tracing::trace!(signal = name, "signal recorded");
        self.names.borrow_mut().push(name.to_owned());
    }
}

/// An observer locator that refuses every property.
#[derive(Debug, Clone)]
pub struct FailingObserverLocator {
    reason: String,
}

impl FailingObserverLocator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ObserverLocator for FailingObserverLocator {
    fn get_observer(
        &self,
        _model: &ViewModel,
        _property: &str,
    ) -> Result<Rc<dyn PropertyObserver>, ObservationError> {
        Err(ObservationError::new(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// TestHost
// ---------------------------------------------------------------------------

/// Engine plus host doubles, with helpers that act like a user.
pub struct TestHost {
    engine: CycleEngine,
    clock: Rc<ManualClock>,
    signals: Rc<RecordingSignaler>,
}

impl TestHost {
    /// Default configuration, lenient sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CycleConfig::default())
    }

    /// Strict sinks: unmatched or mismatched sinks fail the mount.
    #[must_use]
    pub fn strict() -> Self {
        Self::with_config(CycleConfig::default().with_strict_sinks(true))
    }

    #[must_use]
    pub fn with_config(config: CycleConfig) -> Self {
        Self::build(config, Vec::new())
    }

    /// A host whose engine also knows the given custom creators.
    #[must_use]
    pub fn with_creators(config: CycleConfig, creators: Vec<(&str, Rc<dyn DriverCreator>)>) -> Self {
        Self::build(config, creators)
    }

    fn build(config: CycleConfig, creators: Vec<(&str, Rc<dyn DriverCreator>)>) -> Self {
        let clock = Rc::new(ManualClock::new());
        let signals = Rc::new(RecordingSignaler::default());
        let mut builder = CycleEngine::builder()
            .with_model_observers()
            .signaler(Rc::clone(&signals) as Rc<dyn Signaler>)
            .clock(Rc::clone(&clock) as Rc<dyn Clock>)
            .config(config);
        for (name, creator) in creators {
            builder = builder.creator(name, creator);
        }
        Self {
            engine: builder.build(),
            clock,
            signals,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &CycleEngine {
        &self.engine
    }

    #[must_use]
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    #[must_use]
    pub fn signals(&self) -> &RecordingSignaler {
        &self.signals
    }

    /// Bind `model`.
    ///
    /// # Errors
    ///
    /// Whatever the engine reports.
    pub fn bind(&self, model: &ViewModel) -> Result<MountOutcome, CycleError> {
        self.engine.before_bind(model)
    }

    pub fn unbind(&self, model: &ViewModel) -> UnmountOutcome {
        self.engine.before_unbind(model)
    }

    /// Bind every view-model item of `model`'s collection `property`, the
    /// way a host renders each row.
    ///
    /// # Errors
    ///
    /// The first item mount that fails.
    pub fn bind_items(&self, model: &ViewModel, property: &str) -> Result<usize, CycleError> {
        let items = items_of(model, property);
        for item in &items {
            self.bind(item)?;
        }
        Ok(items.len())
    }

    /// Type into a property, the way a bound input element would.
    pub fn type_into(&self, model: &ViewModel, property: &str, text: &str) {
        model.set_property(property, text);
    }

    /// Click an action with no arguments.
    pub fn click(&self, model: &ViewModel, action: &str) {
        model.action(action).trigger();
    }

    /// Invoke an action with positional arguments.
    pub fn invoke<I>(&self, model: &ViewModel, action: &str, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        model.action(action).invoke(args);
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHost")
            .field("engine", &self.engine)
            .field("elapsed", &self.clock.elapsed())
            .field("signals", &self.signals.count())
            .finish()
    }
}

/// The view-model items of `model`'s collection `property`.
#[must_use]
pub fn items_of(model: &ViewModel, property: &str) -> Vec<ViewModel> {
    model
        .property(property)
        .as_items()
        .map(|items| items.models())
        .unwrap_or_default()
}
