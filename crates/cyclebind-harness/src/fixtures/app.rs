#![forbid(unsafe_code)]

//! A shell that nests a [`Todos`] list and summarizes it.

use std::sync::LazyLock;

use cyclebind_runtime::{Component, DriverRegistry, Sinks, Sources, Value, ViewModel};

use super::todos::Todos;

static REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
    DriverRegistry::builder("App")
        .view_model("todos")
        .one_way("summary")
        .build()
});

#[derive(Debug, Clone, Copy, Default)]
pub struct App;

impl App {
    /// An app holding a fresh list.
    #[must_use]
    pub fn create() -> ViewModel {
        ViewModel::new(App).with_property("todos", Todos::create())
    }

    /// The nested list, if one is set.
    #[must_use]
    pub fn todos(model: &ViewModel) -> Option<ViewModel> {
        model.property("todos").as_model().cloned()
    }
}

fn summary(remaining: &Value) -> Value {
    match remaining.as_int() {
        Some(1) => Value::str("1 item left"),
        Some(n) => Value::str(format!("{n} items left")),
        None => Value::Null,
    }
}

impl Component for App {
    fn registry(&self) -> &'static DriverRegistry {
        &REGISTRY
    }

    fn cycle(&self, sources: &Sources) -> Sinks {
        let summary = sources
            .changes_of("todos")
            .filter(|event| event.is_for("remaining"))
            .map(|event| summary(&event.value));
        Sinks::new().with_values("summary", summary)
    }
}
