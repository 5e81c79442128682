#![forbid(unsafe_code)]

//! The sources and sinks maps exchanged with a component's transformation.
//!
//! Keys are property names suffixed with `$` (see [`stream_key`]). Lookup
//! helpers accept either form.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::change::ChangeEvent;
use crate::driver::collection::CollectionCommand;
use crate::model::WeakViewModel;
use crate::reactive::Stream;
use crate::value::Value;

/// Key of the component-wide change stream in [`Sources`].
pub const CHANGES_KEY: &str = "changes$";

/// Stream key for `property` (`"count"` → `"count$"`). Already-suffixed names
/// are returned unchanged.
#[must_use]
pub fn stream_key(property: &str) -> String {
    if property.ends_with('$') {
        property.to_owned()
    } else {
        format!("{property}$")
    }
}

/// An inbound stream handed to the transformation.
#[derive(Clone, Debug)]
pub enum Source {
    Values(Stream<Value>),
    Changes(Stream<ChangeEvent>),
}

/// What a sink carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Values,
    Commands,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values => f.write_str("values"),
            Self::Commands => f.write_str("commands"),
        }
    }
}

/// An outbound stream returned by the transformation.
#[derive(Clone, Debug)]
pub enum Sink {
    Values(Stream<Value>),
    Commands(Stream<CollectionCommand>),
}

impl Sink {
    #[must_use]
    pub fn kind(&self) -> SinkKind {
        match self {
            Self::Values(_) => SinkKind::Values,
            Self::Commands(_) => SinkKind::Commands,
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Inbound streams for one mount of one component.
#[derive(Clone, Debug)]
pub struct Sources {
    model: WeakViewModel,
    type_name: &'static str,
    entries: BTreeMap<String, Source>,
}

impl Sources {
    pub(crate) fn new(model: WeakViewModel, type_name: &'static str) -> Self {
        Self {
            model,
            type_name,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: String, source: Source) {
        self.entries.insert(key, source);
    }

    /// The instance being cycled. Hold it weakly inside stream closures.
    #[must_use]
    pub fn model(&self) -> WeakViewModel {
        self.model.clone()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Source> {
        self.entries.get(&stream_key(key))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&stream_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The value stream under `key`. Missing or differently typed sources
    /// yield an empty stream and a warning.
    #[must_use]
    pub fn values(&self, key: &str) -> Stream<Value> {
        match self.get(key) {
            Some(Source::Values(stream)) => stream.clone(),
            other => {
                warn!(
                    component = self.type_name,
                    key,
                    found = other.is_some(),
                    "no value source under this key; using an empty stream"
                );
                Stream::empty()
            }
        }
    }

    /// The change-event stream under `key`. Missing or differently typed
    /// sources yield an empty stream and a warning.
    #[must_use]
    pub fn changes_of(&self, key: &str) -> Stream<ChangeEvent> {
        match self.get(key) {
            Some(Source::Changes(stream)) => stream.clone(),
            other => {
                warn!(
                    component = self.type_name,
                    key,
                    found = other.is_some(),
                    "no change source under this key; using an empty stream"
                );
                Stream::empty()
            }
        }
    }

    /// The component-wide change stream.
    #[must_use]
    pub fn changes(&self) -> Stream<ChangeEvent> {
        self.changes_of(CHANGES_KEY)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Outbound streams returned by a transformation.
#[derive(Clone, Debug, Default)]
pub struct Sinks {
    entries: BTreeMap<String, Sink>,
}

impl Sinks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, sink: Sink) -> Self {
        self.insert(key, sink);
        self
    }

    #[must_use]
    pub fn with_values(self, key: &str, stream: Stream<Value>) -> Self {
        self.with(key, Sink::Values(stream))
    }

    #[must_use]
    pub fn with_commands(self, key: &str, stream: Stream<CollectionCommand>) -> Self {
        self.with(key, Sink::Commands(stream))
    }

    pub fn insert(&mut self, key: &str, sink: Sink) {
        self.entries.insert(stream_key(key), sink);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, Sink> {
        self.entries
    }
}
