#![forbid(unsafe_code)]

//! Change-event recording.
//!
//! An [`EventLog`] subscribes to a change stream and keeps every event. Logs
//! render to JSON lines, and [`EventLog::digest`] hashes that rendering so two
//! runs of the same scenario can be compared with one string.
//!
//! View-models render as their type name only: instance ids come from a
//! process-wide counter and would make digests depend on test order.

use std::cell::RefCell;
use std::rc::Rc;

use cyclebind_runtime::{ChangeEvent, ChangeKind, Stream, Subscription, Value, ViewModel};
use serde_json::json;

/// Every event seen on one change stream.
pub struct EventLog {
    events: Rc<RefCell<Vec<ChangeEvent>>>,
    _subscription: Subscription,
}

impl EventLog {
    /// Record `model`'s component-wide change stream.
    #[must_use]
    pub fn attach(model: &ViewModel) -> Self {
        Self::record(&model.change_stream())
    }

    /// Record any change stream, such as a collection source.
    #[must_use]
    pub fn record(stream: &Stream<ChangeEvent>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = stream.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            events,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.events.borrow().iter().map(|e| e.kind).collect()
    }

    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind == kind).count()
    }

    /// Events whose `property` is `property`.
    #[must_use]
    pub fn for_property(&self, property: &str) -> Vec<ChangeEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.is_for(property))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// One JSON object per event, newline separated.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for event in self.events.borrow().iter() {
            out.push_str(&event_json(event).to_string());
            out.push('\n');
        }
        out
    }

    /// BLAKE3 of [`to_jsonl`](Self::to_jsonl), hex encoded.
    #[must_use]
    pub fn digest(&self) -> String {
        blake3::hash(self.to_jsonl().as_bytes()).to_hex().to_string()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("events", &self.len()).finish()
    }
}

fn event_json(event: &ChangeEvent) -> serde_json::Value {
    json!({
        "property": event.property,
        "value": value_json(&event.value),
        "origin": format!("{:?}", event.origin),
        "kind": event.kind.as_str(),
        "item": event.item.as_ref().map(value_json),
        "inner_property": event.inner_property,
        "parent_property": event.parent_property,
    })
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(n) => json!(n),
        Value::Float(x) => json!(x),
        Value::Str(s) => json!(&**s),
        Value::List(items) => items.iter().map(value_json).collect(),
        Value::Model(model) => json!({ "model": model.type_name() }),
        Value::Items(items) => json!({ "items": items.len() }),
    }
}
