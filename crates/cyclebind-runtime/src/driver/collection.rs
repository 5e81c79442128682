#![forbid(unsafe_code)]

//! The collection driver: a backing array edited by a command stream.
//!
//! The property holds an [`ItemList`]. The sink is a stream of
//! [`CollectionCommand`]s; the source is one hot stream carrying both
//! per-item change events (tagged with the item) and structural events
//! (`ItemAdded`, `ItemRemoved`, `BulkOperation`). Late subscribers do not see
//! earlier events.
//!
//! Every view-model item is *linked*: the driver subscribes to the item's
//! change stream and re-publishes each item event on its own source and, with
//! `property` set to the collection and `inner_property` set to the item's
//! property, on the component-wide stream. The driver owns those links in a
//! table keyed by item identity. Items never hold a strong reference back to
//! the driver.
//!
//! # Invariants
//!
//! 1. An item appears at most once. Adding a present item is a no-op.
//! 2. Removing an absent item is a no-op. Removal is by identity, never by
//!    index, so a batch removal cannot skip or double-remove.
//! 3. Once an item has left the array, none of its events are forwarded,
//!    even while its link is still waiting to be released.
//! 4. A removed item that is still mounted has its link released by its own
//!    post-unbind hook; an unmounted one is unlinked immediately.
//! 5. `Do` and `Message` guards (`if_all` / `if_any`) are evaluated over the
//!    whole collection, not over the selected subset.
//! 6. Dispose releases the command subscription and every outstanding link,
//!    and leaves the array untouched.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::change::{ChangeEvent, ChangeKind, ChangeOrigin};
use crate::error::Result;
use crate::model::{ModelId, ViewModel};
use crate::ports::{Sink, SinkKind, Source};
use crate::reactive::{Stream, Subject, Subscription};
use crate::value::{ItemList, Value};

use super::{Driver, DriverContext, DriverCreator, LinkSlot, publish};

/// Predicate over collection items.
pub type ItemPredicate = Rc<dyn Fn(&Value) -> bool>;

/// Side effect applied to collection items.
pub type ItemAction = Rc<dyn Fn(&Value)>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Whole-collection precondition for `Do` and `Message` commands.
#[derive(Clone, Default)]
pub struct Guard {
    /// Every item must match.
    pub all: Option<ItemPredicate>,
    /// At least one item must match.
    pub any: Option<ItemPredicate>,
}

impl Guard {
    /// Whether `items` satisfies both conditions.
    #[must_use]
    pub fn passes(&self, items: &[Value]) -> bool {
        let all = self.all.as_ref().is_none_or(|p| items.iter().all(|v| p(v)));
        let any = self.any.as_ref().is_none_or(|p| items.iter().any(|v| p(v)));
        all && any
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("all", &self.all.is_some())
            .field("any", &self.any.is_some())
            .finish()
    }
}

fn select(items: &[Value], selector: Option<&ItemPredicate>) -> Vec<Value> {
    match selector {
        Some(p) => items.iter().filter(|v| p(v)).cloned().collect(),
        None => items.to_vec(),
    }
}

/// Apply a side effect to the selected items without changing the array.
#[derive(Clone)]
pub struct DoCommand {
    action: ItemAction,
    selector: Option<ItemPredicate>,
    guard: Guard,
}

impl DoCommand {
    pub fn new(action: impl Fn(&Value) + 'static) -> Self {
        Self {
            action: Rc::new(action),
            selector: None,
            guard: Guard::default(),
        }
    }

    /// Only act on items matching `selector` (default: every item).
    #[must_use]
    pub fn matching(mut self, selector: impl Fn(&Value) -> bool + 'static) -> Self {
        self.selector = Some(Rc::new(selector));
        self
    }

    #[must_use]
    pub fn if_all(mut self, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.guard.all = Some(Rc::new(predicate));
        self
    }

    #[must_use]
    pub fn if_any(mut self, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.guard.any = Some(Rc::new(predicate));
        self
    }
}

impl fmt::Debug for DoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoCommand")
            .field("selective", &self.selector.is_some())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

/// Deliver a message to the selected items' parent inboxes.
///
/// When the guard fails, the `otherwise` branch (if any) is tried instead,
/// recursively.
#[derive(Clone)]
pub struct MessageCommand {
    message: Value,
    selector: Option<ItemPredicate>,
    guard: Guard,
    otherwise: Option<Box<MessageCommand>>,
}

impl MessageCommand {
    pub fn new(message: impl Into<Value>) -> Self {
        Self {
            message: message.into(),
            selector: None,
            guard: Guard::default(),
            otherwise: None,
        }
    }

    /// Only message items matching `selector` (default: every item).
    #[must_use]
    pub fn matching(mut self, selector: impl Fn(&Value) -> bool + 'static) -> Self {
        self.selector = Some(Rc::new(selector));
        self
    }

    #[must_use]
    pub fn if_all(mut self, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.guard.all = Some(Rc::new(predicate));
        self
    }

    #[must_use]
    pub fn if_any(mut self, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.guard.any = Some(Rc::new(predicate));
        self
    }

    /// Branch tried when this command's guard fails.
    #[must_use]
    pub fn otherwise(mut self, branch: MessageCommand) -> Self {
        self.otherwise = Some(Box::new(branch));
        self
    }

    #[must_use]
    pub fn message(&self) -> &Value {
        &self.message
    }
}

impl fmt::Debug for MessageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCommand")
            .field("message", &self.message)
            .field("selective", &self.selector.is_some())
            .field("guard", &self.guard)
            .field("otherwise", &self.otherwise)
            .finish()
    }
}

/// A structural or bulk edit of a collection.
#[derive(Clone)]
pub enum CollectionCommand {
    Add(Value),
    Remove(Value),
    RemoveWhere(ItemPredicate),
    Do(DoCommand),
    Message(MessageCommand),
}

impl CollectionCommand {
    pub fn add(item: impl Into<Value>) -> Self {
        Self::Add(item.into())
    }

    pub fn remove(item: impl Into<Value>) -> Self {
        Self::Remove(item.into())
    }

    pub fn remove_where(predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::RemoveWhere(Rc::new(predicate))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::RemoveWhere(_) => "remove_where",
            Self::Do(_) => "do",
            Self::Message(_) => "message",
        }
    }
}

impl From<DoCommand> for CollectionCommand {
    fn from(command: DoCommand) -> Self {
        Self::Do(command)
    }
}

impl From<MessageCommand> for CollectionCommand {
    fn from(command: MessageCommand) -> Self {
        Self::Message(command)
    }
}

impl fmt::Debug for CollectionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(item) => f.debug_tuple("Add").field(item).finish(),
            Self::Remove(item) => f.debug_tuple("Remove").field(item).finish(),
            Self::RemoveWhere(_) => f.write_str("RemoveWhere(..)"),
            Self::Do(cmd) => f.debug_tuple("Do").field(cmd).finish(),
            Self::Message(cmd) => f.debug_tuple("Message").field(cmd).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver state
// ---------------------------------------------------------------------------

struct ItemLink {
    generation: u64,
    _subscription: Subscription,
}

struct CollectionState {
    component: &'static str,
    property: String,
    items: ItemList,
    internal: Subject<ChangeEvent>,
    changes: Subject<ChangeEvent>,
    links: RefCell<HashMap<ModelId, ItemLink>>,
    next_generation: Cell<u64>,
}

impl CollectionState {
    fn emit(&self, internal: ChangeEvent, global: ChangeEvent) {
        self.internal.next(internal);
        publish(&self.changes, self.component, global);
    }

    fn structural(&self, kind: ChangeKind, value: Value, item: Option<Value>) {
        let mut internal = ChangeEvent::new(None, value.clone(), ChangeOrigin::FromViewModel, kind);
        let mut global =
            ChangeEvent::new(Some(self.property.as_str()), value, ChangeOrigin::FromViewModel, kind);
        if let Some(item) = item {
            internal = internal.with_item(item.clone());
            global = global.with_item(item);
        }
        self.emit(internal, global);
    }

    fn apply(self: &Rc<Self>, command: &CollectionCommand) {
        trace!(
            component = self.component,
            property = %self.property,
            command = command.label(),
            "collection command"
        );
        match command {
            CollectionCommand::Add(item) => self.add(item),
            CollectionCommand::Remove(item) => self.remove(vec![item.clone()]),
            CollectionCommand::RemoveWhere(predicate) => {
                let matching = self.items.snapshot().into_iter().filter(|v| predicate(v)).collect();
                self.remove(matching);
            }
            CollectionCommand::Do(cmd) => self.run_do(cmd),
            CollectionCommand::Message(cmd) => self.run_message(cmd),
        }
    }

    fn add(self: &Rc<Self>, item: &Value) {
        if self.items.contains(item) {
            trace!(component = self.component, property = %self.property, "duplicate add ignored");
            return;
        }
        self.items.push(item.clone());
        if let Some(model) = item.as_model() {
            self.link(model);
        }
        self.structural(ChangeKind::ItemAdded, Value::Null, Some(item.clone()));
    }

    fn remove(self: &Rc<Self>, targets: Vec<Value>) {
        let mut removed = Vec::new();
        for target in targets {
            if !self.items.remove(&target) {
                continue;
            }
            if let Some(model) = target.as_model() {
                self.detach(model);
            }
            removed.push(target);
        }
        if removed.is_empty() {
            return;
        }
        let single = (removed.len() == 1).then(|| removed[0].clone());
        self.structural(ChangeKind::ItemRemoved, Value::list(removed), single);
    }

    fn run_do(&self, cmd: &DoCommand) {
        let items = self.items.snapshot();
        if !cmd.guard.passes(&items) {
            return;
        }
        for item in select(&items, cmd.selector.as_ref()) {
            (cmd.action)(&item);
        }
    }

    fn run_message(&self, cmd: &MessageCommand) {
        let items = self.items.snapshot();
        let mut branch = Some(cmd);
        while let Some(current) = branch {
            if current.guard.passes(&items) {
                let targets = select(&items, current.selector.as_ref());
                let mut delivered = 0usize;
                for target in &targets {
                    if let Some(model) = target.as_model() {
                        model.parent_inbox().next(current.message.clone());
                        delivered += 1;
                    }
                }
                debug!(
                    component = self.component,
                    property = %self.property,
                    message = %current.message,
                    delivered,
                    "collection message delivered"
                );
                self.structural(ChangeKind::BulkOperation, Value::from(delivered), None);
                return;
            }
            branch = current.otherwise.as_deref();
        }
    }

    /// Subscribe to `model`'s change stream, replacing any older link.
    fn link(self: &Rc<Self>, model: &ViewModel) {
        let generation = self.next_generation.get();
        self.next_generation.set(generation + 1);

        let state = Rc::downgrade(self);
        let item = model.downgrade();
        let subscription = model.changes().subscribe(move |change| {
            let (Some(state), Some(item)) = (state.upgrade(), item.upgrade()) else {
                return;
            };
            let item = Value::Model(item);
            if !state.items.contains(&item) {
                return;
            }
            let internal = change.clone().with_item(item.clone());
            let mut global = ChangeEvent::new(
                Some(state.property.as_str()),
                change.value.clone(),
                change.origin,
                change.kind,
            )
            .with_item(item)
            .with_inner_property(change.property.clone());
            global.parent_property = change.parent_property.clone();
            state.emit(internal, global);
        });

        let previous = self.links.borrow_mut().insert(
            model.id(),
            ItemLink {
                generation,
                _subscription: subscription,
            },
        );
        drop(previous);
    }

    /// Release the link for a removed item, now or after its unbind.
    fn detach(self: &Rc<Self>, model: &ViewModel) {
        let Some(generation) = self.links.borrow().get(&model.id()).map(|l| l.generation) else {
            return;
        };
        if model.is_mounted() {
            let state: Weak<Self> = Rc::downgrade(self);
            let id = model.id();
            model.add_post_unbind_hook(move || {
                if let Some(state) = state.upgrade() {
                    state.unlink(id, generation);
                }
            });
        } else {
            self.unlink(model.id(), generation);
        }
    }

    fn unlink(&self, id: ModelId, generation: u64) {
        let removed = {
            let mut links = self.links.borrow_mut();
            match links.get(&id) {
                Some(link) if link.generation == generation => links.remove(&id),
                _ => None,
            }
        };
        drop(removed);
    }

    fn release_all(&self) {
        let links = std::mem::take(&mut *self.links.borrow_mut());
        drop(links);
    }

    fn link_count(&self) -> usize {
        self.links.borrow().len()
    }
}

/// Creator for [`DriverKind::Collection`](crate::registry::DriverKind::Collection).
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionDriverCreator;

impl DriverCreator for CollectionDriverCreator {
    fn make_driver(&self, ctx: &DriverContext<'_>) -> Result<Driver> {
        let items = match ctx.model.property(ctx.property) {
            Value::Items(items) => {
                let dropped = items.collapse_duplicates();
                if dropped > 0 {
                    debug!(
                        component = ctx.component(),
                        property = ctx.property,
                        dropped,
                        "duplicate items collapsed on adoption"
                    );
                }
                items
            }
            Value::List(values) => {
                let items = ItemList::from_values(values.to_vec());
                ctx.model.assign_property(ctx.property, items.clone());
                items
            }
            _ => {
                let items = ItemList::new();
                ctx.model.assign_property(ctx.property, items.clone());
                items
            }
        };

        let state = Rc::new(CollectionState {
            component: ctx.component(),
            property: ctx.property.to_owned(),
            items,
            internal: Subject::new(),
            changes: ctx.changes.clone(),
            links: RefCell::new(HashMap::new()),
            next_generation: Cell::new(0),
        });
        for model in state.items.models() {
            state.link(&model);
        }

        let links = LinkSlot::default();
        let held = links.clone();
        let active = Rc::clone(&state);
        let connect = move |sink| {
            let commands = match sink {
                Sink::Commands(stream) => stream,
                Sink::Values(_) => {
                    warn!(
                        component = active.component,
                        property = %active.property,
                        "value sink given to a collection driver; ignoring"
                    );
                    Stream::empty()
                }
            };
            let weak = Rc::downgrade(&active);
            held.hold(commands.subscribe(move |command| {
                if let Some(state) = weak.upgrade() {
                    state.apply(command);
                }
            }));
            Source::Changes(active.internal.stream())
        };

        let dispose = links.dispose_with(move || {
            debug!(
                component = state.component,
                property = %state.property,
                links = state.link_count(),
                "collection driver disposed"
            );
            state.release_all();
        });
        Ok(Driver::new(SinkKind::Commands, connect, dispose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{Fixture, Stub, collect, record};
    use proptest::prelude::*;

    fn item() -> ViewModel {
        ViewModel::new(Stub)
    }

    fn poke(model: &ViewModel, property: &str) {
        model.changes().next(ChangeEvent::new(
            Some(property),
            Value::Bool(true),
            ChangeOrigin::Unknown,
            ChangeKind::ValueChanged,
        ));
    }

    struct Harness {
        fx: Fixture,
        commands: Subject<CollectionCommand>,
        source: Stream<ChangeEvent>,
        dispose: Subscription,
    }

    fn harness(fx: Fixture) -> Harness {
        let driver = CollectionDriverCreator
            .make_driver(&fx.ctx("todos"))
            .expect("collection driver");
        assert_eq!(driver.sink_kind(), SinkKind::Commands);
        let commands: Subject<CollectionCommand> = Subject::new();
        let (source, dispose) = driver.connect(Sink::Commands(commands.stream()));
        let Source::Changes(source) = source else {
            panic!("expected a change source");
        };
        Harness {
            fx,
            commands,
            source,
            dispose,
        }
    }

    fn items_of(fx: &Fixture) -> ItemList {
        fx.model
            .property("todos")
            .as_items()
            .cloned()
            .expect("collection property holds an item list")
    }

    #[test]
    fn property_is_initialized_to_an_item_list() {
        let h = harness(Fixture::new());
        assert!(items_of(&h.fx).is_empty());
    }

    #[test]
    fn plain_list_is_converted() {
        let fx = Fixture::new();
        fx.model
            .assign_property("todos", Value::list([Value::Int(1), Value::Int(2)]));
        let h = harness(fx);
        assert_eq!(items_of(&h.fx).snapshot(), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let h = harness(Fixture::new());
        let a = item();
        let events = collect(&h.source);
        h.commands.next(CollectionCommand::add(a.clone()));
        h.commands.next(CollectionCommand::add(a.clone()));
        assert_eq!(items_of(&h.fx).len(), 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events.borrow()[0].kind, ChangeKind::ItemAdded);
        assert_eq!(events.borrow()[0].value, Value::Null);
    }

    #[test]
    fn item_changes_are_forwarded_on_both_streams() {
        let h = harness(Fixture::new());
        let a = item();
        h.commands.next(CollectionCommand::add(a.clone()));
        let local = collect(&h.source);
        let global = record(&h.fx.changes);

        poke(&a, "is_completed");

        assert_eq!(local.len(), 1);
        assert!(local.borrow()[0].is_for("is_completed"));
        assert_eq!(local.borrow()[0].item, Some(Value::Model(a.clone())));

        assert_eq!(global.len(), 1);
        let event = &global.borrow()[0];
        assert!(event.is_for("todos"));
        assert_eq!(event.inner_property.as_deref(), Some("is_completed"));
        assert_eq!(event.item, Some(Value::Model(a)));
    }

    #[test]
    fn removed_item_is_no_longer_forwarded() {
        let h = harness(Fixture::new());
        let a = item();
        let b = item();
        h.commands.next(CollectionCommand::add(a.clone()));
        h.commands.next(CollectionCommand::add(b.clone()));
        h.commands.next(CollectionCommand::remove(a.clone()));
        let local = collect(&h.source);

        poke(&a, "title");
        poke(&b, "title");

        assert_eq!(local.len(), 1);
        assert_eq!(local.borrow()[0].item, Some(Value::Model(b)));
        assert_eq!(a.changes().observer_count(), 0);
    }

    #[test]
    fn mounted_item_unlinks_after_its_unbind() {
        let h = harness(Fixture::new());
        let a = item();
        h.commands.next(CollectionCommand::add(a.clone()));
        a.set_mount_count(1);
        h.commands.next(CollectionCommand::remove(a.clone()));

        assert_eq!(a.pending_post_unbind_hooks(), 1);
        assert_eq!(a.changes().observer_count(), 1);
        let local = collect(&h.source);
        poke(&a, "title");
        assert_eq!(local.len(), 0);

        a.flush_post_unbind_hooks();
        assert_eq!(a.changes().observer_count(), 0);
    }

    #[test]
    fn stale_hook_does_not_unlink_a_re_added_item() {
        let h = harness(Fixture::new());
        let a = item();
        h.commands.next(CollectionCommand::add(a.clone()));
        a.set_mount_count(1);
        h.commands.next(CollectionCommand::remove(a.clone()));
        h.commands.next(CollectionCommand::add(a.clone()));
        a.flush_post_unbind_hooks();

        let local = collect(&h.source);
        poke(&a, "title");
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn remove_where_emits_one_batch_event() {
        let h = harness(Fixture::new());
        for n in 0..5 {
            h.commands.next(CollectionCommand::add(n));
        }
        let events = collect(&h.source);
        h.commands.next(CollectionCommand::remove_where(|v| {
            v.as_int().is_some_and(|n| n % 2 == 0)
        }));

        assert_eq!(items_of(&h.fx).snapshot(), vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(events.len(), 1);
        let event = &events.borrow()[0];
        assert_eq!(event.kind, ChangeKind::ItemRemoved);
        assert_eq!(
            event.value,
            Value::list([Value::Int(0), Value::Int(2), Value::Int(4)])
        );
        assert_eq!(event.item, None);
    }

    #[test]
    fn removing_absent_item_is_silent() {
        let h = harness(Fixture::new());
        let events = collect(&h.source);
        h.commands.next(CollectionCommand::remove(item()));
        assert_eq!(events.len(), 0);
    }

    #[test]
    fn do_respects_whole_collection_guard() {
        let h = harness(Fixture::new());
        for n in [1, 2, 3] {
            h.commands.next(CollectionCommand::add(n));
        }
        let seen = Rc::new(RefCell::new(Vec::new()));
        let events = collect(&h.source);

        let s = Rc::clone(&seen);
        h.commands.next(
            DoCommand::new(move |v| s.borrow_mut().push(v.clone()))
                .matching(|v| v.as_int() == Some(2))
                .if_any(|v| v.as_int() == Some(3))
                .into(),
        );
        let s = Rc::clone(&seen);
        h.commands.next(
            DoCommand::new(move |v| s.borrow_mut().push(v.clone()))
                .if_all(|v| v.as_int() == Some(3))
                .into(),
        );

        assert_eq!(*seen.borrow(), vec![Value::Int(2)]);
        assert_eq!(events.len(), 0);
    }

    #[test]
    fn message_takes_otherwise_branch_when_guard_fails() {
        let h = harness(Fixture::new());
        let a = item();
        let b = item();
        h.commands.next(CollectionCommand::add(a.clone()));
        h.commands.next(CollectionCommand::add(b.clone()));
        let inbox_a = record(&a.parent_inbox());
        let inbox_b = record(&b.parent_inbox());
        let events = collect(&h.source);

        h.commands.next(
            MessageCommand::new("tick")
                .if_any(|_| false)
                .otherwise(MessageCommand::new("untick"))
                .into(),
        );

        assert_eq!(*inbox_a.borrow(), vec![Value::str("untick")]);
        assert_eq!(*inbox_b.borrow(), vec![Value::str("untick")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events.borrow()[0].kind, ChangeKind::BulkOperation);
        assert_eq!(events.borrow()[0].value, Value::Int(2));
    }

    #[test]
    fn preexisting_models_are_adopted() {
        let a = item();
        let fx = Fixture::new();
        fx.model
            .assign_property("todos", ItemList::from_values(vec![Value::Model(a.clone())]));
        let h = harness(fx);
        let local = collect(&h.source);
        poke(&a, "title");
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn adopted_duplicates_collapse_to_one_linked_entry() {
        let a = item();
        let fx = Fixture::new();
        fx.model.assign_property(
            "todos",
            Value::list([Value::Model(a.clone()), Value::Model(a.clone())]),
        );
        let h = harness(fx);
        assert_eq!(items_of(&h.fx).len(), 1);
        assert_eq!(a.changes().observer_count(), 1);

        h.commands.next(CollectionCommand::remove(a.clone()));
        assert!(items_of(&h.fx).is_empty());
        assert_eq!(a.changes().observer_count(), 0);

        let list = ItemList::new();
        list.push(Value::Model(a.clone()));
        list.push(Value::Model(a.clone()));
        let fx = Fixture::new();
        fx.model.assign_property("todos", list.clone());
        let h = harness(fx);
        let local = collect(&h.source);
        assert_eq!(list.len(), 1);
        poke(&a, "title");
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn dispose_releases_links_and_keeps_items() {
        let Harness {
            fx,
            commands,
            source: _source,
            dispose,
        } = harness(Fixture::new());
        let a = item();
        commands.next(CollectionCommand::add(a.clone()));
        assert_eq!(a.changes().observer_count(), 1);

        drop(dispose);
        assert_eq!(a.changes().observer_count(), 0);
        assert_eq!(commands.observer_count(), 0);
        assert_eq!(items_of(&fx).len(), 1);
    }

    proptest! {
        #[test]
        fn replayed_edits_match_a_set_model(
            script in prop::collection::vec((any::<bool>(), 0usize..6), 0..40)
        ) {
            let h = harness(Fixture::new());
            let pool: Vec<ViewModel> = (0..6).map(|_| item()).collect();
            let mut expected: Vec<usize> = Vec::new();
            for (add, i) in script {
                if add {
                    h.commands.next(CollectionCommand::add(pool[i].clone()));
                    if !expected.contains(&i) {
                        expected.push(i);
                    }
                } else {
                    h.commands.next(CollectionCommand::remove(pool[i].clone()));
                    expected.retain(|&x| x != i);
                }
            }
            let expected: Vec<Value> =
                expected.into_iter().map(|i| Value::Model(pool[i].clone())).collect();
            prop_assert_eq!(items_of(&h.fx).snapshot(), expected);
            for (i, model) in pool.iter().enumerate() {
                let linked = items_of(&h.fx).contains(&Value::Model(model.clone()));
                prop_assert_eq!(model.changes().observer_count(), usize::from(linked), "item {}", i);
            }
        }
    }
}
