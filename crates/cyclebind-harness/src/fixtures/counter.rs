#![forbid(unsafe_code)]

//! The counter: an action that adds its first argument to a running total.
//!
//! | Property | Kind | Role |
//! |----------|------|------|
//! | `input` | two-way | mirrors the total back into an editable field |
//! | `change` | action | `change(delta)` |
//! | `count` | one-way | the running total, starting at 0 |

use std::sync::LazyLock;

use cyclebind_runtime::{Component, DriverRegistry, Sinks, Sources, Value, ViewModel};

static REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
    DriverRegistry::builder("Counter")
        .two_way("input")
        .action("change")
        .one_way("count")
        .build()
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Counter;

impl Counter {
    /// A fresh, unmounted counter instance.
    #[must_use]
    pub fn create() -> ViewModel {
        ViewModel::new(Counter)
    }
}

impl Component for Counter {
    fn registry(&self) -> &'static DriverRegistry {
        &REGISTRY
    }

    fn cycle(&self, sources: &Sources) -> Sinks {
        let count = sources
            .values("change")
            .map(|args| args.arg(0).as_int().unwrap_or(0))
            .scan(0_i64, |total, delta| total + delta)
            .start_with(vec![0])
            .map(|total| Value::Int(*total));

        Sinks::new()
            .with_values("count", count.clone())
            .with_values("input", count)
    }
}
