#![forbid(unsafe_code)]

//! Dynamic payloads carried by properties, streams and change events.
//!
//! # Invariants
//!
//! 1. Scalars (`Bool`, `Int`, `Float`, `Str`) compare by value. `List` is an
//!    immutable payload and compares by content, so a one-way write of an
//!    equal list is not a change and adding an equal list to a collection is
//!    a duplicate.
//! 2. `Model` and `Items` compare by identity: two handles are equal only
//!    when they point at the same view-model or the same backing array.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::model::ViewModel;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<[Value]>),
    /// A nested view-model (collection item or nested component).
    Model(ViewModel),
    /// A collection backing array.
    Items(ItemList),
}

impl Value {
    /// Build a `Str` value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(s.as_ref()))
    }

    /// Build a `List` value.
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Self::List(values.into_iter().collect())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(&**s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(&**items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&ViewModel> {
        match self {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_items(&self) -> Option<&ItemList> {
        match self {
            Self::Items(items) => Some(items),
            _ => None,
        }
    }

    /// Positional argument `index` of an action payload. Non-list values are
    /// treated as a single argument.
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        match self {
            Self::List(items) => items.get(index).cloned().unwrap_or_default(),
            other if index == 0 => other.clone(),
            _ => Self::Null,
        }
    }

    /// Loose truthiness: `Null`, `false`, `0`, `0.0` and `""` are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::List(_) | Self::Model(_) | Self::Items(_) => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => a.ptr_eq(b),
            (Self::Items(a), Self::Items(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Model(model) => write!(f, "Model({}#{})", model.type_name(), model.id()),
            Self::Items(items) => write!(f, "Items(len={})", items.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(Rc::from(values))
    }
}

impl From<ViewModel> for Value {
    fn from(model: ViewModel) -> Self {
        Self::Model(model)
    }
}

impl From<ItemList> for Value {
    fn from(items: ItemList) -> Self {
        Self::Items(items)
    }
}

// ---------------------------------------------------------------------------
// ItemList: shared collection backing array
// ---------------------------------------------------------------------------

/// The ordered backing array of a collection property.
///
/// Anyone holding the list may read it; only the collection driver mutates
/// its structure.
#[derive(Clone, Default)]
pub struct ItemList {
    items: Rc<RefCell<Vec<Value>>>,
}

impl ItemList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone out the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Whether `item` is present (identity for models, value otherwise).
    #[must_use]
    pub fn contains(&self, item: &Value) -> bool {
        self.items.borrow().iter().any(|v| v == item)
    }

    /// Every contained view-model, in order.
    #[must_use]
    pub fn models(&self) -> Vec<ViewModel> {
        self.items
            .borrow()
            .iter()
            .filter_map(|v| v.as_model().cloned())
            .collect()
    }

    /// Whether both handles share one backing array.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    /// Build a list from `values`, keeping only the first of any duplicates.
    pub(crate) fn from_values(values: Vec<Value>) -> Self {
        let list = Self {
            items: Rc::new(RefCell::new(values)),
        };
        list.collapse_duplicates();
        list
    }

    /// Drop every entry equal to an earlier one. Returns how many were dropped.
    pub(crate) fn collapse_duplicates(&self) -> usize {
        let mut items = self.items.borrow_mut();
        let before = items.len();
        let mut kept: Vec<Value> = Vec::with_capacity(before);
        for value in items.drain(..) {
            if !kept.contains(&value) {
                kept.push(value);
            }
        }
        *items = kept;
        before - items.len()
    }

    pub(crate) fn push(&self, item: Value) {
        self.items.borrow_mut().push(item);
    }

    /// Remove the first entry equal to `item`. Returns whether one was found.
    pub(crate) fn remove(&self, item: &Value) -> bool {
        let mut items = self.items.borrow_mut();
        match items.iter().position(|v| v == item) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ItemList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}
