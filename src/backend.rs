//! The seam between the app and the managed document database.
//!
//! Everything above this module talks to a [`DocumentStore`]. The browser
//! build uses [`crate::supabase::SupabaseClient`]; tests use
//! `MemoryStore` from the `memory` module (test builds only).

use std::fmt;

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BackendError;

/// Field set of a stored document.
pub type Fields = Map<String, Value>;

pub type SnapshotSender = UnboundedSender<Snapshot>;
pub type SnapshotStream = UnboundedReceiver<Snapshot>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Items,
    Regions,
    /// One document per user id holding the `isAdmin` flag.
    Admins,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Regions => "regions",
            Collection::Admins => "admins",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decodes the fields with the document id merged in as `id`.
    /// The document id wins over any stored `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// A full listing of one collection, delivered as a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub collection: Collection,
    pub documents: Vec<Document>,
}

/// Serializes a typed record into a document field set.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, BackendError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(BackendError::Decode(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Handle to a live query. Cancels the query when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Document storage with live snapshots.
///
/// Futures are not `Send`: the browser runs everything on one thread.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Stores `fields` under a new identifier chosen by the store.
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, BackendError>;

    /// Replaces the whole document at `id`.
    async fn set(&self, collection: Collection, id: &str, fields: Fields)
        -> Result<(), BackendError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError>;

    async fn get(&self, collection: Collection, id: &str)
        -> Result<Option<Document>, BackendError>;

    /// Pushes a [`Snapshot`] into `sink` now and whenever the collection
    /// changes, until the returned handle is dropped.
    fn subscribe(&self, collection: Collection, sink: SnapshotSender) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::types::Item;

    #[test]
    fn decode_merges_document_id() {
        let fields = to_fields(&json!({ "name": "Hammer", "region": "north", "id": "stale" }))
            .unwrap();
        let item: Item = Document::new("i1", fields).decode().unwrap();
        assert_eq!(item.id, "i1");
        assert_eq!(item.name, "Hammer");
        assert_eq!(item.region, "north");
    }

    #[test]
    fn to_fields_rejects_non_objects() {
        assert!(matches!(to_fields(&42), Err(BackendError::Decode(_))));
    }

    #[test]
    fn subscription_cancels_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let sub = Subscription::new(move || counter.set(counter.get() + 1));
        sub.unsubscribe();
        assert_eq!(calls.get(), 1);

        let counter = Rc::clone(&calls);
        drop(Subscription::new(move || counter.set(counter.get() + 1)));
        assert_eq!(calls.get(), 2);
    }
}
