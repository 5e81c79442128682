#![forbid(unsafe_code)]

//! The change-event vocabulary shared by every driver.

use std::fmt;

use crate::value::Value;

/// Where a mutation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// User interaction through the view (an invoked action).
    FromView,
    /// A sink written by the component's transformation.
    FromViewModel,
    /// A host-side property change whose initiator cannot be told apart.
    Unknown,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ValueChanged,
    ActionInvoked,
    ItemAdded,
    ItemRemoved,
    BulkOperation,
    MountedEvent,
    UnmountedEvent,
    SignalFired,
    MessageForwarded,
}

impl ChangeKind {
    /// Stable lowercase label, used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValueChanged => "value_changed",
            Self::ActionInvoked => "action_invoked",
            Self::ItemAdded => "item_added",
            Self::ItemRemoved => "item_removed",
            Self::BulkOperation => "bulk_operation",
            Self::MountedEvent => "mounted",
            Self::UnmountedEvent => "unmounted",
            Self::SignalFired => "signal_fired",
            Self::MessageForwarded => "message_forwarded",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation anywhere in a component.
///
/// `property` is `None` for component-level events (mount, unmount).
/// Collection-forwarded events carry the originating `item` and the item's
/// own property as `inner_property`; events forwarded from a nested
/// view-model carry the parent's property as `parent_property`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub property: Option<String>,
    pub value: Value,
    pub origin: ChangeOrigin,
    pub kind: ChangeKind,
    pub item: Option<Value>,
    pub inner_property: Option<String>,
    pub parent_property: Option<String>,
}

impl ChangeEvent {
    pub fn new(
        property: Option<&str>,
        value: Value,
        origin: ChangeOrigin,
        kind: ChangeKind,
    ) -> Self {
        Self {
            property: property.map(str::to_owned),
            value,
            origin,
            kind,
            item: None,
            inner_property: None,
            parent_property: None,
        }
    }

    /// A component-level lifecycle event.
    #[must_use]
    pub fn lifecycle(kind: ChangeKind) -> Self {
        Self::new(None, Value::Null, ChangeOrigin::Unknown, kind)
    }

    #[must_use]
    pub fn with_item(mut self, item: Value) -> Self {
        self.item = Some(item);
        self
    }

    #[must_use]
    pub fn with_inner_property(mut self, inner: Option<String>) -> Self {
        self.inner_property = inner;
        self
    }

    #[must_use]
    pub fn with_parent_property(mut self, parent: &str) -> Self {
        self.parent_property = Some(parent.to_owned());
        self
    }

    /// Whether this event concerns `property`.
    #[must_use]
    pub fn is_for(&self, property: &str) -> bool {
        self.property.as_deref() == Some(property)
    }
}
