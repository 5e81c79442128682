#![forbid(unsafe_code)]

//! The reactive component instance.
//!
//! A [`ViewModel`] pairs a [`Component`] with everything the engine needs to
//! run it: the property store the host renders from, the component-wide
//! change stream, the inbox a parent collection messages it through, the
//! action capabilities handed to the view, and the mount bookkeeping.
//!
//! # Invariants
//!
//! 1. The component-wide change stream is created lazily and reused for the
//!    lifetime of the instance, across every mount cycle.
//! 2. `assign_property` never notifies property subscribers; `set_property`
//!    always does when the value changes.
//! 3. Post-unbind hooks run at most once each, in registration order.
//!
//! # Failure Modes
//!
//! - Dropping the last handle while mounted releases the running cycle
//!   without running post-unbind hooks or emitting an unmount event.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::change::ChangeEvent;
use crate::component::Component;
use crate::driver::action::ActionHandle;
use crate::engine::RunningCycle;
use crate::ports::{Source, stream_key};
use crate::reactive::{Observable, Stream, Subject, Subscription};
use crate::registry::DriverRegistry;
use crate::value::Value;

static MODEL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a view-model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(u64);

impl ModelId {
    fn new() -> Self {
        Self(MODEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ModelInner {
    id: ModelId,
    component: Box<dyn Component>,
    properties: RefCell<BTreeMap<String, Observable<Value>>>,
    changes: OnceCell<Subject<ChangeEvent>>,
    parent_inbox: OnceCell<Subject<Value>>,
    actions: RefCell<HashMap<String, ActionHandle>>,
    post_unbind_hooks: RefCell<Vec<Box<dyn FnOnce()>>>,
    provided: RefCell<BTreeMap<String, Source>>,
    mounts: Cell<u32>,
    running: RefCell<Option<RunningCycle>>,
}

/// Shared handle to a component instance. Clones point at the same instance.
#[derive(Clone)]
pub struct ViewModel {
    inner: Rc<ModelInner>,
}

/// Non-owning handle to a [`ViewModel`].
#[derive(Clone, Default)]
pub struct WeakViewModel {
    inner: Weak<ModelInner>,
}

impl ViewModel {
    /// Wrap `component` in a fresh, unmounted instance.
    pub fn new(component: impl Component) -> Self {
        Self {
            inner: Rc::new(ModelInner {
                id: ModelId::new(),
                component: Box::new(component),
                properties: RefCell::new(BTreeMap::new()),
                changes: OnceCell::new(),
                parent_inbox: OnceCell::new(),
                actions: RefCell::new(HashMap::new()),
                post_unbind_hooks: RefCell::new(Vec::new()),
                provided: RefCell::new(BTreeMap::new()),
                mounts: Cell::new(0),
                running: RefCell::new(None),
            }),
        }
    }

    /// Builder-style initial property value. Does not notify.
    #[must_use]
    pub fn with_property(self, name: &str, value: impl Into<Value>) -> Self {
        self.assign_property(name, value);
        self
    }

    #[must_use]
    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    /// The component's registered type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.registry().type_name()
    }

    #[must_use]
    pub fn registry(&self) -> &'static DriverRegistry {
        self.inner.component.registry()
    }

    #[must_use]
    pub fn component(&self) -> &dyn Component {
        self.inner.component.as_ref()
    }

    // -- properties ---------------------------------------------------------

    /// The observable cell backing `name`, created as `Null` if absent.
    pub fn observe(&self, name: &str) -> Observable<Value> {
        if let Some(cell) = self.inner.properties.borrow().get(name) {
            return cell.clone();
        }
        let cell = Observable::new(Value::Null);
        self.inner
            .properties
            .borrow_mut()
            .insert(name.to_owned(), cell.clone());
        cell
    }

    /// Current value of `name` (`Null` if never set).
    #[must_use]
    pub fn property(&self, name: &str) -> Value {
        self.inner
            .properties
            .borrow()
            .get(name)
            .map(Observable::get)
            .unwrap_or_default()
    }

    /// Write `name` through the observation system, notifying watchers.
    /// Returns `false` when the value was already equal.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> bool {
        self.observe(name).set(value.into())
    }

    /// Write `name` directly, bypassing watchers.
    pub fn assign_property(&self, name: &str, value: impl Into<Value>) -> bool {
        self.observe(name).replace_silently(value.into())
    }

    /// Watch `name` for notified changes.
    pub fn watch_property(&self, name: &str, callback: impl Fn(&Value) + 'static) -> Subscription {
        self.observe(name).subscribe(callback)
    }

    /// Names of every property that has been read or written.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.inner.properties.borrow().keys().cloned().collect()
    }

    // -- streams ------------------------------------------------------------

    /// The component-wide change channel.
    pub fn changes(&self) -> Subject<ChangeEvent> {
        self.inner.changes.get_or_init(Subject::new).clone()
    }

    /// The component-wide change channel as a stream.
    #[must_use]
    pub fn change_stream(&self) -> Stream<ChangeEvent> {
        self.changes().stream()
    }

    /// Whether anything ever asked for the change channel.
    #[must_use]
    pub fn has_change_stream(&self) -> bool {
        self.inner.changes.get().is_some()
    }

    /// The channel a parent collection messages this instance through.
    pub fn parent_inbox(&self) -> Subject<Value> {
        self.inner.parent_inbox.get_or_init(Subject::new).clone()
    }

    /// The action capability named `name`, created on first use.
    pub fn action(&self, name: &str) -> ActionHandle {
        self.inner
            .actions
            .borrow_mut()
            .entry(name.to_owned())
            .or_insert_with(|| ActionHandle::new(name))
            .clone()
    }

    /// Make `source` available to the transformation under `key` on every
    /// mount.
    pub fn provide_source(&self, key: &str, source: Source) {
        self.inner
            .provided
            .borrow_mut()
            .insert(stream_key(key), source);
    }

    pub(crate) fn provided_sources(&self) -> Vec<(String, Source)> {
        self.inner
            .provided
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Queue `hook` to run after the next unbind completes.
    pub fn add_post_unbind_hook(&self, hook: impl FnOnce() + 'static) {
        self.inner.post_unbind_hooks.borrow_mut().push(Box::new(hook));
    }

    /// Number of hooks waiting for the next unbind.
    #[must_use]
    pub fn pending_post_unbind_hooks(&self) -> usize {
        self.inner.post_unbind_hooks.borrow().len()
    }

    /// Run and clear every queued post-unbind hook. Hooks queued while
    /// flushing run in the same pass.
    pub fn flush_post_unbind_hooks(&self) -> usize {
        let mut ran = 0;
        loop {
            let hooks = std::mem::take(&mut *self.inner.post_unbind_hooks.borrow_mut());
            if hooks.is_empty() {
                return ran;
            }
            for hook in hooks {
                hook();
                ran += 1;
            }
        }
    }

    /// How many unmatched binds are outstanding.
    #[must_use]
    pub fn mount_count(&self) -> u32 {
        self.inner.mounts.get()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.mounts.get() > 0
    }

    /// Whether a cycle is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.borrow().is_some()
    }

    pub(crate) fn set_mount_count(&self, count: u32) {
        self.inner.mounts.set(count);
    }

    pub(crate) fn install_running(&self, running: RunningCycle) {
        *self.inner.running.borrow_mut() = Some(running);
    }

    pub(crate) fn take_running(&self) -> Option<RunningCycle> {
        self.inner.running.borrow_mut().take()
    }

    // -- identity -----------------------------------------------------------

    #[must_use]
    pub fn downgrade(&self) -> WeakViewModel {
        WeakViewModel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("type", &self.type_name())
            .field("id", &self.inner.id)
            .field("mounts", &self.inner.mounts.get())
            .finish_non_exhaustive()
    }
}

impl WeakViewModel {
    #[must_use]
    pub fn upgrade(&self) -> Option<ViewModel> {
        self.inner.upgrade().map(|inner| ViewModel { inner })
    }
}

impl fmt::Debug for WeakViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakViewModel")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
