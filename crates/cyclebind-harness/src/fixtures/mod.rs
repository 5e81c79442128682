//! Reference components used by the harness tests and by downstream smoke
//! tests.

mod app;
mod counter;
mod todos;

pub use app::App;
pub use counter::Counter;
pub use todos::{
    DESTROY, FILTER_ACTIVE, FILTER_ALL, FILTER_COMPLETED, TICK, TodoItem, Todos, UNTICK,
};
