#![forbid(unsafe_code)]

//! Per-component-type driver declarations.
//!
//! A [`DriverRegistry`] maps property names to the [`DriverKind`] that
//! handles them. It is built once per component type, usually in a
//! `LazyLock` static, and shared by every instance and every mount of that
//! type:
//!
//! ```ignore
//! static REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
//!     DriverRegistry::builder("Counter")
//!         .two_way("input")
//!         .action("change")
//!         .one_way("count")
//!         .build()
//! });
//! ```
//!
//! # Invariants
//!
//! 1. Each property maps to exactly one kind. Registering a property again
//!    replaces its kind in place, keeping the original position.
//! 2. Entries are iterated in registration order, which is also the order
//!    drivers are created in at mount time.

use std::fmt;

use tracing::debug;

/// Which driver creator handles a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    OneWay,
    TwoWay,
    Action,
    Collection,
    Signal,
    /// Nested view-model.
    ViewModel,
    /// Message channel to and from the parent collection.
    Parent,
    /// A creator registered on the engine under this name.
    Custom(&'static str),
}

impl DriverKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneWay => "one_way",
            Self::TwoWay => "two_way",
            Self::Action => "action",
            Self::Collection => "collection",
            Self::Signal => "signal",
            Self::ViewModel => "view_model",
            Self::Parent => "parent",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Property name used by [`DriverRegistryBuilder::parent`].
pub const PARENT_PROPERTY: &str = "parent";

/// Immutable property → driver-kind table for one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRegistry {
    type_name: &'static str,
    entries: Vec<(String, DriverKind)>,
}

impl DriverRegistry {
    /// Start declaring the drivers of `type_name`.
    #[must_use]
    pub fn builder(type_name: &'static str) -> DriverRegistryBuilder {
        DriverRegistryBuilder {
            registry: Self {
                type_name,
                entries: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Every (property, kind) pair in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, DriverKind)> {
        self.entries.iter().map(|(p, k)| (p.as_str(), *k))
    }

    #[must_use]
    pub fn kind_of(&self, property: &str) -> Option<DriverKind> {
        self.entries
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, k)| *k)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder returned by [`DriverRegistry::builder`].
#[derive(Debug)]
pub struct DriverRegistryBuilder {
    registry: DriverRegistry,
}

impl DriverRegistryBuilder {
    /// Register `property` with `kind`, replacing any earlier registration.
    #[must_use]
    pub fn register(mut self, property: &str, kind: DriverKind) -> Self {
        let type_name = self.registry.type_name;
        match self
            .registry
            .entries
            .iter_mut()
            .find(|(p, _)| p == property)
        {
            Some(entry) => {
                debug!(
                    component = type_name,
                    property,
                    previous = %entry.1,
                    kind = %kind,
                    "driver re-registered; replacing"
                );
                entry.1 = kind;
            }
            None => self.registry.entries.push((property.to_owned(), kind)),
        }
        self
    }

    #[must_use]
    pub fn one_way(self, property: &str) -> Self {
        self.register(property, DriverKind::OneWay)
    }

    #[must_use]
    pub fn two_way(self, property: &str) -> Self {
        self.register(property, DriverKind::TwoWay)
    }

    #[must_use]
    pub fn action(self, property: &str) -> Self {
        self.register(property, DriverKind::Action)
    }

    #[must_use]
    pub fn collection(self, property: &str) -> Self {
        self.register(property, DriverKind::Collection)
    }

    #[must_use]
    pub fn signal(self, property: &str) -> Self {
        self.register(property, DriverKind::Signal)
    }

    #[must_use]
    pub fn view_model(self, property: &str) -> Self {
        self.register(property, DriverKind::ViewModel)
    }

    /// Declare that the component talks to its parent through
    /// [`PARENT_PROPERTY`].
    #[must_use]
    pub fn parent(self) -> Self {
        self.register(PARENT_PROPERTY, DriverKind::Parent)
    }

    #[must_use]
    pub fn custom(self, property: &str, creator: &'static str) -> Self {
        self.register(property, DriverKind::Custom(creator))
    }

    #[must_use]
    pub fn build(self) -> DriverRegistry {
        self.registry
    }
}
