#![forbid(unsafe_code)]

//! TodoMVC as two components: the list ([`Todos`]) and its rows
//! ([`TodoItem`]).
//!
//! Rows talk to the list only through their parent channel: a row asks to be
//! destroyed by sending [`DESTROY`], and the list toggles rows by messaging
//! [`TICK`] / [`UNTICK`] into them.

use std::sync::LazyLock;

use cyclebind_runtime::{
    ChangeKind, CollectionCommand, Component, DriverRegistry, MessageCommand, PARENT_PROPERTY,
    Sinks, Sources, Stream, Value, ViewModel, WeakViewModel,
};

pub const TICK: &str = "tick";
pub const UNTICK: &str = "untick";
pub const DESTROY: &str = "destroy";

pub const FILTER_ALL: &str = "all";
pub const FILTER_ACTIVE: &str = "active";
pub const FILTER_COMPLETED: &str = "completed";

const ENTER_KEY: i64 = 13;
const ESC_KEY: i64 = 27;

fn is_completed(item: &Value) -> bool {
    item.as_model()
        .is_some_and(|model| model.property("is_completed").is_truthy())
}

fn is_incomplete(item: &Value) -> bool {
    item.as_model().is_some() && !is_completed(item)
}

// ---------------------------------------------------------------------------
// TodoItem
// ---------------------------------------------------------------------------

static ITEM_REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
    DriverRegistry::builder("TodoItem")
        .two_way("title")
        .one_way("is_completed")
        .one_way("is_editing")
        .action("start_edit")
        .action("done_edit")
        .action("key_up")
        .action("toggle")
        .action("destroy")
        .parent()
        .build()
});

/// One row. Finishing an edit with an empty title destroys the row.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoItem;

impl TodoItem {
    #[must_use]
    pub fn create(title: &str, completed: bool) -> ViewModel {
        ViewModel::new(TodoItem)
            .with_property("title", title)
            .with_property("is_completed", completed)
    }
}

impl Component for TodoItem {
    fn registry(&self) -> &'static DriverRegistry {
        &ITEM_REGISTRY
    }

    fn cycle(&self, sources: &Sources) -> Sinks {
        let model = sources.model();

        let keys = sources
            .values("key_up")
            .map(|args| args.arg(0).as_int().unwrap_or(0));
        let cancel = keys.clone().filter(|code| *code == ESC_KEY).map(|_| ());
        let done = keys
            .filter(|code| *code == ENTER_KEY)
            .map(|_| ())
            .merge_with(sources.values("done_edit").map(|_| ()));

        let is_editing = Stream::merge(vec![
            sources.values("start_edit").map(|_| Value::Bool(true)),
            done.clone().map(|_| Value::Bool(false)),
            cancel.map(|_| Value::Bool(false)),
        ])
        .start_with(vec![Value::Bool(false)])
        .distinct_until_changed();

        let from_parent = sources
            .values(PARENT_PROPERTY)
            .filter_map(|message| match message.as_str() {
                Some(TICK) => Some(Value::Bool(true)),
                Some(UNTICK) => Some(Value::Bool(false)),
                _ => None,
            });
        let toggled = sources.values("toggle").filter_map(move |_| {
            model
                .upgrade()
                .map(|m| Value::Bool(!m.property("is_completed").is_truthy()))
        });

        let emptied = done
            .with_latest_from(sources.values("title"), |_, title| title.clone())
            .filter(|title| title.as_str().is_some_and(|t| t.trim().is_empty()))
            .map(|_| ());
        let to_parent = emptied
            .merge_with(sources.values("destroy").map(|_| ()))
            .map(|_| Value::str(DESTROY));

        Sinks::new()
            .with_values("is_editing", is_editing)
            .with_values("is_completed", from_parent.merge_with(toggled))
            .with_values(PARENT_PROPERTY, to_parent)
    }
}

// ---------------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------------

static LIST_REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
    DriverRegistry::builder("Todos")
        .action("add_todo")
        .two_way("new_todo_title")
        .collection("todos")
        .action("filter")
        .one_way("current_filter")
        .one_way("remaining")
        .action("toggle_all")
        .action("clear_completed")
        .signal("refresh")
        .build()
});

/// The list: add, destroy, toggle all, clear completed, filter, count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Todos;

impl Todos {
    #[must_use]
    pub fn create() -> ViewModel {
        ViewModel::new(Todos)
    }

    /// Rows not yet completed.
    #[must_use]
    pub fn remaining(model: &ViewModel) -> usize {
        Self::rows(model)
            .into_iter()
            .filter(is_incomplete)
            .count()
    }

    /// Rows visible under the current filter.
    #[must_use]
    pub fn visible(model: &ViewModel) -> Vec<ViewModel> {
        let filter = model.property("current_filter");
        Self::rows(model)
            .into_iter()
            .filter(|row| match filter.as_str() {
                Some(FILTER_ACTIVE) => is_incomplete(row),
                Some(FILTER_COMPLETED) => is_completed(row),
                _ => true,
            })
            .filter_map(|row| row.as_model().cloned())
            .collect()
    }

    fn rows(model: &ViewModel) -> Vec<Value> {
        model
            .property("todos")
            .as_items()
            .map(|items| items.snapshot())
            .unwrap_or_default()
    }
}

fn remaining_of(model: &WeakViewModel) -> Value {
    model
        .upgrade()
        .map_or(Value::Int(0), |m| Value::from(Todos::remaining(&m)))
}

impl Component for Todos {
    fn registry(&self) -> &'static DriverRegistry {
        &LIST_REGISTRY
    }

    fn cycle(&self, sources: &Sources) -> Sinks {
        let model = sources.model();
        let rows = sources.changes_of("todos");

        let added = sources
            .values("add_todo")
            .with_latest_from(sources.values("new_todo_title"), |_, title| title.clone())
            .filter_map(|title| {
                let title = title.as_str()?.trim();
                (!title.is_empty()).then(|| CollectionCommand::add(TodoItem::create(title, false)))
            });
        let destroyed = rows.clone().filter_map(|event| {
            let asks = event.kind == ChangeKind::MessageForwarded
                && event.value.as_str() == Some(DESTROY);
            if asks {
                event.item.clone().map(CollectionCommand::Remove)
            } else {
                None
            }
        });
        let toggle_all = sources.values("toggle_all").map(|_| {
            CollectionCommand::from(
                MessageCommand::new(TICK)
                    .matching(is_incomplete)
                    .if_any(is_incomplete)
                    .otherwise(MessageCommand::new(UNTICK)),
            )
        });
        let clear_completed = sources
            .values("clear_completed")
            .map(|_| CollectionCommand::remove_where(is_completed));

        let reset_title = rows
            .clone()
            .filter(|event| event.kind == ChangeKind::ItemAdded)
            .map(|_| Value::str(""));

        let current_filter = sources
            .values("filter")
            .map(|args| args.arg(0))
            .filter(|f| matches!(f.as_str(), Some(FILTER_ALL | FILTER_ACTIVE | FILTER_COMPLETED)))
            .start_with(vec![Value::str(FILTER_ALL)])
            .distinct_until_changed();

        let remaining = rows
            .clone()
            .filter(|event| {
                matches!(event.kind, ChangeKind::ItemAdded | ChangeKind::ItemRemoved)
                    || event.is_for("is_completed")
            })
            .map(|_| ())
            .start_with(vec![()])
            .map(move |_| remaining_of(&model));

        let refresh = rows.map(|_| Value::Null);

        Sinks::new()
            .with_commands(
                "todos",
                Stream::merge(vec![added, destroyed, toggle_all, clear_completed]),
            )
            .with_values("new_todo_title", reset_title)
            .with_values("current_filter", current_filter)
            .with_values("remaining", remaining)
            .with_values("refresh", refresh)
    }
}
