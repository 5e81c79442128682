#![forbid(unsafe_code)]

//! The cycle engine: runs a component's transformation over its drivers and
//! governs the mount lifecycle.
//!
//! The host calls [`CycleEngine::before_bind`] before it shows a component and
//! [`CycleEngine::before_unbind`] before it tears one down. Nothing else is
//! required from the host.
//!
//! # Mount sequence
//!
//! 1. Assemble the drivers. Each is connected to a proxy sink and
//!    contributes one source.
//! 2. Publish `MountedEvent` on the component-wide stream.
//! 3. Call [`Component::cycle`] with the sources.
//! 4. Feed every returned sink into its driver's proxy.
//!
//! # Unmount sequence
//!
//! 1. Release every sink link (the run handle).
//! 2. Dispose every driver.
//! 3. Flush the instance's post-unbind hooks.
//! 4. Publish `UnmountedEvent`.
//!
//! # Invariants
//!
//! 1. An instance is cycled at most once at a time. Mounts are counted: the
//!    first bind starts the cycle, further binds only increment the counter,
//!    and the cycle stops when the counter returns to zero.
//! 2. After an unmount, no callback registered during that mount fires.
//! 3. A failed mount leaves the instance exactly as unmounted as before:
//!    counter restored, drivers disposed, no run handle installed.
//!
//! # Failure Modes
//!
//! - Driver creation errors and strict-mode sink errors abort the mount.
//! - A panic inside the transformation is caught and reported as
//!   [`CycleError::TransformPanicked`]; other components are unaffected.
//!   This requires the `unwind` panic strategy.
//! - Panics raised later, inside stream callbacks, are not intercepted.
//!
//! [`Component::cycle`]: crate::component::Component::cycle

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::assembly::{Assembly, CreatorTable, Proxy, assemble};
use crate::change::{ChangeEvent, ChangeKind};
use crate::clock::{Clock, SystemClock};
use crate::config::CycleConfig;
use crate::driver::{DriverCreator, publish};
use crate::error::{CycleError, Result};
use crate::host::{HostServices, ModelObserverLocator, ObserverLocator, Signaler};
use crate::model::ViewModel;
use crate::ports::Sinks;
use crate::reactive::BindingScope;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of [`CycleEngine::before_bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// The cycle is now running.
    Started,
    /// The instance was already cycled; only the counter moved.
    AlreadyMounted { mounts: u32 },
}

/// Result of [`CycleEngine::before_unbind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmountOutcome {
    /// The last mount ended and the cycle was torn down.
    Stopped,
    /// Other mounts remain; the cycle keeps running.
    StillMounted { mounts: u32 },
    /// The instance was not mounted.
    NotMounted,
}

// ---------------------------------------------------------------------------
// Running cycle
// ---------------------------------------------------------------------------

/// Everything one mount keeps alive. Stored on the instance.
pub(crate) struct RunningCycle {
    run: BindingScope,
    drivers: BindingScope,
}

impl RunningCycle {
    fn stop(&mut self) {
        self.run.clear();
        self.drivers.clear();
    }
}

impl Drop for RunningCycle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for RunningCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningCycle")
            .field("sink_links", &self.run.binding_count())
            .field("drivers", &self.drivers.binding_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Mounts and unmounts reactive components against one set of host
/// services.
pub struct CycleEngine {
    services: HostServices,
    creators: CreatorTable,
}

impl CycleEngine {
    #[must_use]
    pub fn builder() -> CycleEngineBuilder {
        CycleEngineBuilder::default()
    }

    #[must_use]
    pub fn services(&self) -> &HostServices {
        &self.services
    }

    #[must_use]
    pub fn config(&self) -> &CycleConfig {
        self.services.config()
    }

    /// Whether a creator is registered under `name`.
    #[must_use]
    pub fn has_creator(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Mount hook. Starts the cycle on the first mount.
    ///
    /// # Errors
    ///
    /// Any driver creation error, a transformation panic, or (in strict mode)
    /// an unmatched or mismatched sink. The instance stays unmounted.
    pub fn before_bind(&self, model: &ViewModel) -> Result<MountOutcome> {
        let component = model.type_name();
        let mounts = model.mount_count();
        if mounts > 0 {
            let mounts = mounts.saturating_add(1);
            model.set_mount_count(mounts);
            warn!(component, mounts, "component is already cycled; bind ignored");
            return Ok(MountOutcome::AlreadyMounted { mounts });
        }

        model.set_mount_count(1);
        match self.start(model) {
            Ok(running) => {
                debug!(component, ?running, "cycle started");
                model.install_running(running);
                Ok(MountOutcome::Started)
            }
            Err(err) => {
                model.set_mount_count(0);
                warn!(component, error = %err, "mount aborted");
                Err(err)
            }
        }
    }

    /// Unmount hook. Tears the cycle down when the last mount ends.
    pub fn before_unbind(&self, model: &ViewModel) -> UnmountOutcome {
        let component = model.type_name();
        match model.mount_count() {
            0 => {
                debug!(component, "unbind of an unmounted component ignored");
                UnmountOutcome::NotMounted
            }
            1 => {
                model.set_mount_count(0);
                self.stop(model);
                UnmountOutcome::Stopped
            }
            n => {
                let mounts = n - 1;
                model.set_mount_count(mounts);
                debug!(component, mounts, "unbind; cycle kept for remaining mounts");
                UnmountOutcome::StillMounted { mounts }
            }
        }
    }

    /// Bind `model` and return a guard that unbinds it when dropped.
    ///
    /// # Errors
    ///
    /// As [`before_bind`](Self::before_bind).
    pub fn mount<'e>(&'e self, model: &ViewModel) -> Result<MountGuard<'e>> {
        let outcome = self.before_bind(model)?;
        Ok(MountGuard {
            engine: self,
            model: model.clone(),
            outcome,
        })
    }

    fn lifecycle(&self, model: &ViewModel, kind: ChangeKind) {
        if self.services.config().emit_lifecycle_events {
            publish(&model.changes(), model.type_name(), ChangeEvent::lifecycle(kind));
        }
    }

    fn start(&self, model: &ViewModel) -> Result<RunningCycle> {
        let component = model.type_name();
        let Assembly {
            sources,
            proxies,
            teardown,
        } = assemble(model, &self.services, &self.creators)?;

        self.lifecycle(model, ChangeKind::MountedEvent);
        let outcome = catch_unwind(AssertUnwindSafe(|| model.component().cycle(&sources)))
            .map_err(|payload| CycleError::TransformPanicked {
                component,
                message: panic_message(&*payload),
            })
            .and_then(|sinks| self.wire(component, sinks, &proxies));

        match outcome {
            Ok(run) => Ok(RunningCycle {
                run,
                drivers: teardown,
            }),
            Err(err) => {
                drop(teardown);
                self.lifecycle(model, ChangeKind::UnmountedEvent);
                Err(err)
            }
        }
    }

    /// Feed each sink into its driver's proxy.
    fn wire(
        &self,
        component: &'static str,
        sinks: Sinks,
        proxies: &BTreeMap<String, Proxy>,
    ) -> Result<BindingScope> {
        let strict = self.services.config().strict_sinks;
        let mut run = BindingScope::new();
        for (key, sink) in sinks.into_entries() {
            let Some(proxy) = proxies.get(&key) else {
                if strict {
                    return Err(CycleError::UnmatchedSink { component, key });
                }
                warn!(component, key = %key, "sink has no driver; dropped");
                continue;
            };
            match proxy.feed(sink) {
                Ok(link) => run.hold(link),
                Err(rejected) => {
                    let (expected, found) = (proxy.kind(), rejected.kind());
                    if strict {
                        return Err(CycleError::SinkKindMismatch {
                            component,
                            key,
                            expected,
                            found,
                        });
                    }
                    warn!(
                        component,
                        key = %key,
                        %expected,
                        %found,
                        "sink kind does not match its driver; dropped"
                    );
                }
            }
        }
        Ok(run)
    }

    fn stop(&self, model: &ViewModel) {
        let component = model.type_name();
        let running = model.take_running();
        let had_cycle = running.is_some();
        if let Some(mut running) = running {
            running.stop();
        }
        let hooks = model.flush_post_unbind_hooks();
        self.lifecycle(model, ChangeKind::UnmountedEvent);
        debug!(component, had_cycle, hooks, "cycle stopped");
    }
}

impl fmt::Debug for CycleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut creators: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        creators.sort_unstable();
        f.debug_struct("CycleEngine")
            .field("services", &self.services)
            .field("creators", &creators)
            .finish()
    }
}

/// Keeps one mount alive; unbinds on drop.
#[must_use = "dropping the guard unbinds the component immediately"]
pub struct MountGuard<'e> {
    engine: &'e CycleEngine,
    model: ViewModel,
    outcome: MountOutcome,
}

impl MountGuard<'_> {
    #[must_use]
    pub fn outcome(&self) -> MountOutcome {
        self.outcome
    }

    #[must_use]
    pub fn model(&self) -> &ViewModel {
        &self.model
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        self.engine.before_unbind(&self.model);
    }
}

impl fmt::Debug for MountGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountGuard")
            .field("model", &self.model)
            .field("outcome", &self.outcome)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`CycleEngine`].
#[derive(Default)]
pub struct CycleEngineBuilder {
    observer_locator: Option<Rc<dyn ObserverLocator>>,
    signaler: Option<Rc<dyn Signaler>>,
    clock: Option<Rc<dyn Clock>>,
    creators: CreatorTable,
    config: CycleConfig,
}

impl CycleEngineBuilder {
    /// Host property observation, needed by two-way drivers.
    #[must_use]
    pub fn observer_locator(mut self, locator: Rc<dyn ObserverLocator>) -> Self {
        self.observer_locator = Some(locator);
        self
    }

    /// Observe properties through the view-model's own property store.
    #[must_use]
    pub fn with_model_observers(self) -> Self {
        self.observer_locator(Rc::new(ModelObserverLocator))
    }

    /// Declarative refresh, needed by signal drivers.
    #[must_use]
    pub fn signaler(mut self, signaler: Rc<dyn Signaler>) -> Self {
        self.signaler = Some(signaler);
        self
    }

    /// Time source for throttling. Defaults to [`SystemClock`].
    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Register a creator for [`DriverKind::Custom`](crate::registry::DriverKind::Custom)
    /// entries named `name`. A later registration under the same name wins.
    #[must_use]
    pub fn creator(mut self, name: &str, creator: Rc<dyn DriverCreator>) -> Self {
        if self.creators.insert(name.to_owned(), creator).is_some() {
            debug!(creator = name, "driver creator re-registered; replacing");
        }
        self
    }

    #[must_use]
    pub fn config(mut self, config: CycleConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> CycleEngine {
        CycleEngine {
            services: HostServices {
                observer_locator: self.observer_locator,
                signaler: self.signaler,
                clock: self.clock.unwrap_or_else(|| Rc::new(SystemClock)),
                config: self.config,
            },
            creators: self.creators,
        }
    }
}

impl fmt::Debug for CycleEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleEngineBuilder")
            .field("observer_locator", &self.observer_locator.is_some())
            .field("signaler", &self.signaler.is_some())
            .field("clock", &self.clock.is_some())
            .field("creators", &self.creators.len())
            .field("config", &self.config)
            .finish()
    }
}
