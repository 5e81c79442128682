#![forbid(unsafe_code)]

//! Proptest strategies for edit scripts.
//!
//! Scripts address items by slot index into a fixed pool so a generated
//! script can be replayed against both the engine and a plain reference
//! model.

use proptest::prelude::*;

/// Slots available to [`arb_collection_edit`].
pub const POOL_SIZE: usize = 6;

/// One structural edit against a collection of pooled items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEdit {
    Add(usize),
    Remove(usize),
    /// Bind the item in this slot, if it is in the collection.
    Mount(usize),
    /// Unbind the item in this slot, if it is bound.
    Unmount(usize),
}

pub fn arb_collection_edit() -> impl Strategy<Value = CollectionEdit> {
    prop_oneof![
        3 => (0..POOL_SIZE).prop_map(CollectionEdit::Add),
        2 => (0..POOL_SIZE).prop_map(CollectionEdit::Remove),
        1 => (0..POOL_SIZE).prop_map(CollectionEdit::Mount),
        1 => (0..POOL_SIZE).prop_map(CollectionEdit::Unmount),
    ]
}

pub fn arb_collection_script(max_len: usize) -> impl Strategy<Value = Vec<CollectionEdit>> {
    prop::collection::vec(arb_collection_edit(), 0..max_len)
}

/// One user gesture in the todo list. Row indices are taken modulo the
/// current row count; gestures on an empty list do nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEdit {
    Add(String),
    /// Submit the new-todo field with only whitespace in it.
    AddBlank,
    Toggle(usize),
    Destroy(usize),
    /// Edit a row's title to empty and press enter.
    EmptyTitle(usize),
    ToggleAll,
    ClearCompleted,
}

pub fn arb_title() -> impl Strategy<Value = String> {
    "[a-z]{1,12}( [a-z]{1,8})?"
}

pub fn arb_todo_edit() -> impl Strategy<Value = TodoEdit> {
    prop_oneof![
        4 => arb_title().prop_map(TodoEdit::Add),
        1 => Just(TodoEdit::AddBlank),
        3 => any::<usize>().prop_map(TodoEdit::Toggle),
        2 => any::<usize>().prop_map(TodoEdit::Destroy),
        1 => any::<usize>().prop_map(TodoEdit::EmptyTitle),
        1 => Just(TodoEdit::ToggleAll),
        1 => Just(TodoEdit::ClearCompleted),
    ]
}

pub fn arb_todo_script(max_len: usize) -> impl Strategy<Value = Vec<TodoEdit>> {
    prop::collection::vec(arb_todo_edit(), 0..max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn collection_edits_stay_in_the_pool(edit in arb_collection_edit()) {
            let slot = match edit {
                CollectionEdit::Add(i)
                | CollectionEdit::Remove(i)
                | CollectionEdit::Mount(i)
                | CollectionEdit::Unmount(i) => i,
            };
            prop_assert!(slot < POOL_SIZE);
        }

        #[test]
        fn titles_are_never_blank(title in arb_title()) {
            prop_assert!(!title.trim().is_empty());
        }
    }
}
