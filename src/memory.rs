//! In-process [`DocumentStore`] used as the backend double in tests.
//!
//! Behaves like the hosted store from the app's point of view: identifiers
//! are assigned on `add`, every write pushes a fresh snapshot to the
//! subscribers of that collection, and subscribing delivers the current
//! listing immediately. It also records every write request, counts
//! unsubscribes and can be told to reject writes or reads.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::backend::{
    Collection, Document, DocumentStore, Fields, Snapshot, SnapshotSender, Subscription,
};
use crate::error::BackendError;

/// A write as the app requested it.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteRequest {
    Add { collection: Collection, fields: Fields },
    Set { collection: Collection, id: String, fields: Fields },
    Delete { collection: Collection, id: String },
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: BTreeMap<Collection, BTreeMap<String, Fields>>,
    watchers: Vec<Watcher>,
    next_doc: u64,
    next_watcher: u64,
    unsubscribes: BTreeMap<Collection, usize>,
    writes: Vec<WriteRequest>,
    fail_writes: Option<String>,
    fail_reads: Option<String>,
}

struct Watcher {
    id: u64,
    collection: Collection,
    sink: SnapshotSender,
}

impl Inner {
    fn snapshot(&self, collection: Collection) -> Snapshot {
        let documents = self
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Snapshot {
            collection,
            documents,
        }
    }

    fn publish(&mut self, collection: Collection) {
        let snapshot = self.snapshot(collection);
        self.watchers.retain(|watcher| {
            watcher.collection != collection
                || watcher.sink.unbounded_send(snapshot.clone()).is_ok()
        });
    }

    fn check_write(&self) -> Result<(), BackendError> {
        match &self.fail_writes {
            Some(reason) => Err(BackendError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document directly, as another client would. Subscribers are notified.
    pub fn insert(&self, collection: Collection, id: &str, fields: Fields) {
        let mut inner = self.inner.borrow_mut();
        inner
            .collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), fields);
        inner.publish(collection);
    }

    /// Removes a document directly, as another client would.
    pub fn remove(&self, collection: Collection, id: &str) {
        let mut inner = self.inner.borrow_mut();
        if let Some(docs) = inner.collections.get_mut(&collection) {
            docs.remove(id);
        }
        inner.publish(collection);
    }

    pub fn documents(&self, collection: Collection) -> Vec<Document> {
        self.inner.borrow().snapshot(collection).documents
    }

    pub fn writes(&self) -> Vec<WriteRequest> {
        self.inner.borrow().writes.clone()
    }

    pub fn fail_writes(&self, reason: &str) {
        self.inner.borrow_mut().fail_writes = Some(reason.to_string());
    }

    pub fn fail_reads(&self, reason: &str) {
        self.inner.borrow_mut().fail_reads = Some(reason.to_string());
    }

    pub fn clear_failures(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.fail_writes = None;
        inner.fail_reads = None;
    }

    pub fn unsubscribe_count(&self, collection: Collection) -> usize {
        self.inner
            .borrow()
            .unsubscribes
            .get(&collection)
            .copied()
            .unwrap_or(0)
    }

    pub fn active_subscriptions(&self, collection: Collection) -> usize {
        self.inner
            .borrow()
            .watchers
            .iter()
            .filter(|w| w.collection == collection)
            .count()
    }
}

impl DocumentStore for MemoryStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, BackendError> {
        let mut inner = self.inner.borrow_mut();
        inner.writes.push(WriteRequest::Add {
            collection,
            fields: fields.clone(),
        });
        inner.check_write()?;

        inner.next_doc += 1;
        let id = format!("doc-{}", inner.next_doc);
        inner
            .collections
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        inner.publish(collection);
        Ok(id)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.borrow_mut();
        inner.writes.push(WriteRequest::Set {
            collection,
            id: id.to_string(),
            fields: fields.clone(),
        });
        inner.check_write()?;

        inner
            .collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), fields);
        inner.publish(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.borrow_mut();
        inner.writes.push(WriteRequest::Delete {
            collection,
            id: id.to_string(),
        });
        inner.check_write()?;

        if let Some(docs) = inner.collections.get_mut(&collection) {
            docs.remove(id);
        }
        inner.publish(collection);
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, BackendError> {
        let inner = self.inner.borrow();
        if let Some(reason) = &inner.fail_reads {
            return Err(BackendError::Network(reason.clone()));
        }
        Ok(inner
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    fn subscribe(&self, collection: Collection, sink: SnapshotSender) -> Subscription {
        let watcher_id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_watcher += 1;
            let id = inner.next_watcher;
            let _ = sink.unbounded_send(inner.snapshot(collection));
            inner.watchers.push(Watcher {
                id,
                collection,
                sink,
            });
            id
        };

        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            let mut inner = inner.borrow_mut();
            inner.watchers.retain(|w| w.id != watcher_id);
            *inner.unsubscribes.entry(collection).or_default() += 1;
        })
    }
}
