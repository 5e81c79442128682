//! Shared scaffolding for driver unit tests.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::sync::LazyLock;
use std::time::Duration;

use web_time::Instant;

use crate::change::ChangeEvent;
use crate::clock::Clock;
use crate::component::Component;
use crate::config::CycleConfig;
use crate::host::{HostServices, ModelObserverLocator, Signaler};
use crate::model::ViewModel;
use crate::ports::{Sinks, Sources};
use crate::reactive::{Stream, Subject, Subscription};
use crate::registry::DriverRegistry;

use super::DriverContext;

static STUB: LazyLock<DriverRegistry> = LazyLock::new(|| DriverRegistry::builder("Stub").build());

pub(crate) struct Stub;

impl Component for Stub {
    fn registry(&self) -> &'static DriverRegistry {
        &STUB
    }

    fn cycle(&self, _sources: &Sources) -> Sinks {
        Sinks::new()
    }
}

pub(crate) struct StepClock {
    origin: Instant,
    offset: Cell<Duration>,
}

impl StepClock {
    pub(crate) fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for StepClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

#[derive(Default)]
pub(crate) struct SignalLog {
    pub(crate) names: RefCell<Vec<String>>,
}

impl Signaler for SignalLog {
    fn signal(&self, name: &str) {
        self.names.borrow_mut().push(name.to_owned());
    }
}

pub(crate) struct Fixture {
    pub(crate) model: ViewModel,
    pub(crate) changes: Subject<ChangeEvent>,
    pub(crate) services: HostServices,
    pub(crate) clock: Rc<StepClock>,
    pub(crate) signals: Rc<SignalLog>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::for_model(ViewModel::new(Stub))
    }

    pub(crate) fn for_model(model: ViewModel) -> Self {
        let clock = Rc::new(StepClock {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        });
        let signals = Rc::new(SignalLog::default());
        let services = HostServices {
            observer_locator: Some(Rc::new(ModelObserverLocator)),
            signaler: Some(Rc::clone(&signals) as Rc<dyn Signaler>),
            clock: Rc::clone(&clock) as Rc<dyn Clock>,
            config: CycleConfig::default(),
        };
        Self {
            changes: model.changes(),
            model,
            services,
            clock,
            signals,
        }
    }

    pub(crate) fn ctx<'a>(&'a self, property: &'a str) -> DriverContext<'a> {
        DriverContext {
            model: &self.model,
            property,
            changes: &self.changes,
            services: &self.services,
        }
    }
}

pub(crate) struct Recorded<T> {
    items: Rc<RefCell<Vec<T>>>,
    _sub: Subscription,
}

impl<T> Recorded<T> {
    pub(crate) fn borrow(&self) -> Ref<'_, Vec<T>> {
        self.items.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.borrow().len()
    }
}

pub(crate) fn collect<T: Clone + 'static>(stream: &Stream<T>) -> Recorded<T> {
    let items = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&items);
    let sub = stream.subscribe(move |v: &T| sink.borrow_mut().push(v.clone()));
    Recorded { items, _sub: sub }
}

pub(crate) fn record<T: Clone + 'static>(subject: &Subject<T>) -> Recorded<T> {
    collect(&subject.stream())
}
