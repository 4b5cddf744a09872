//! Write operations for items and regions.
//!
//! Fire and forget: every failure is logged here and swallowed. The UI
//! learns about successful writes only through the next snapshot.

use serde::Serialize;
use tracing::{debug, error};

use crate::backend::{to_fields, Collection, DocumentStore};
use crate::error::BackendError;
use crate::search::items_in_region;
use crate::types::{Item, ItemDraft, Region, RegionDraft};

/// Full-replace payload for an item. Every column is present; a missing
/// description is sent as `null` rather than left out.
#[derive(Debug, Serialize)]
struct ItemReplacement<'a> {
    name: &'a str,
    region: &'a str,
    description: Option<&'a str>,
}

impl<'a> From<&'a Item> for ItemReplacement<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            name: &item.name,
            region: &item.region,
            description: item.description.as_deref(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mutations<S> {
    store: S,
}

impl<S: DocumentStore> Mutations<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn add_item(&self, item: &ItemDraft) {
        self.create(Collection::Items, item).await;
    }

    pub async fn update_item(&self, item: &Item) {
        self.replace(Collection::Items, &item.id, &ItemReplacement::from(item))
            .await;
    }

    pub async fn delete_item(&self, id: &str) {
        self.remove(Collection::Items, id).await;
    }

    pub async fn add_region(&self, region: &RegionDraft) {
        self.create(Collection::Regions, region).await;
    }

    pub async fn update_region(&self, region: &Region) {
        self.replace(Collection::Regions, &region.id, &region.draft())
            .await;
    }

    pub async fn delete_region(&self, id: &str) {
        self.remove(Collection::Regions, id).await;
    }

    /// Clears the region reference of every item in `items` pointing at
    /// `region_id`, then deletes the region.
    pub async fn delete_region_detaching(&self, region_id: &str, items: &[Item]) {
        for item in items_in_region(items, region_id) {
            let detached = Item {
                region: String::new(),
                ..item.clone()
            };
            self.update_item(&detached).await;
        }
        self.delete_region(region_id).await;
    }

    async fn create<T: Serialize>(&self, collection: Collection, value: &T) {
        let result: Result<String, BackendError> = async {
            let fields = to_fields(value)?;
            self.store.add(collection, fields).await
        }
        .await;

        match result {
            Ok(id) => debug!(%collection, id = %id, "document added"),
            Err(e) => error!(%collection, error = %e, "error adding document"),
        }
    }

    async fn replace<T: Serialize>(&self, collection: Collection, id: &str, value: &T) {
        let result: Result<(), BackendError> = async {
            let fields = to_fields(value)?;
            self.store.set(collection, id, fields).await
        }
        .await;

        match result {
            Ok(()) => debug!(%collection, id, "document replaced"),
            Err(e) => error!(%collection, id, error = %e, "error updating document"),
        }
    }

    async fn remove(&self, collection: Collection, id: &str) {
        match self.store.delete(collection, id).await {
            Ok(()) => debug!(%collection, id, "document deleted"),
            Err(e) => error!(%collection, id, error = %e, "error deleting document"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    use crate::backend::Document;
    use crate::memory::{MemoryStore, WriteRequest};

    fn fields(value: serde_json::Value) -> crate::backend::Fields {
        to_fields(&value).unwrap()
    }

    #[test]
    fn add_item_sends_exactly_the_draft_fields() {
        let store = MemoryStore::new();
        let mutations = Mutations::new(store.clone());

        block_on(mutations.add_item(&ItemDraft::new("Hammer", "north")));

        assert_eq!(
            store.writes(),
            vec![WriteRequest::Add {
                collection: Collection::Items,
                fields: fields(json!({ "name": "Hammer", "region": "north" })),
            }]
        );
        let docs = store.documents(Collection::Items);
        assert_eq!(docs.len(), 1);
        assert!(!docs[0].id.is_empty());
    }

    #[test]
    fn update_replaces_the_whole_document() {
        let store = MemoryStore::new();
        store.insert(
            Collection::Items,
            "i1",
            fields(json!({ "name": "Hammer", "region": "north", "description": "alt", "legacy": 1 })),
        );
        let mutations = Mutations::new(store.clone());

        let item = ItemDraft::new("Hammer XL", "south").with_id("i1");
        block_on(mutations.update_item(&item));

        assert_eq!(
            store.documents(Collection::Items),
            vec![Document::new(
                "i1",
                fields(json!({ "name": "Hammer XL", "region": "south", "description": null }))
            )]
        );
    }

    #[test]
    fn update_sends_every_column_even_without_description() {
        let store = MemoryStore::new();
        let mutations = Mutations::new(store.clone());

        block_on(mutations.update_item(&ItemDraft::new("Hammer", "r1").with_id("i1")));

        let Some(WriteRequest::Set { id, fields: sent, .. }) = store.writes().pop() else {
            panic!("expected a set request");
        };
        assert_eq!(id, "i1");
        let mut columns: Vec<_> = sent.keys().cloned().collect();
        columns.sort();
        assert_eq!(columns, vec!["description", "name", "region"]);
        assert_eq!(sent["description"], serde_json::Value::Null);
    }

    #[test]
    fn updated_item_without_description_still_decodes() {
        let store = MemoryStore::new();
        let mutations = Mutations::new(store.clone());
        let item = ItemDraft::new("Hammer", "r1").with_id("i1");

        block_on(mutations.update_item(&item));

        let stored: Item = store.documents(Collection::Items)[0].decode().unwrap();
        assert_eq!(stored, item);
    }

    #[test]
    fn delete_region_removes_the_document() {
        let store = MemoryStore::new();
        store.insert(Collection::Regions, "r1", fields(json!({ "name": "Nord" })));
        store.insert(Collection::Regions, "r2", fields(json!({ "name": "Süd" })));
        let mutations = Mutations::new(store.clone());

        block_on(mutations.delete_region("r1"));

        let ids: Vec<_> = store
            .documents(Collection::Regions)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["r2".to_string()]);
    }

    #[test]
    fn failures_are_swallowed() {
        let store = MemoryStore::new();
        store.fail_writes("permission denied");
        let mutations = Mutations::new(store.clone());

        block_on(async {
            mutations.add_region(&RegionDraft::new("Nord")).await;
            mutations.update_region(&Region { id: "r1".into(), name: "Nord".into() }).await;
            mutations.delete_item("i1").await;
        });

        assert_eq!(store.writes().len(), 3);
        assert!(store.documents(Collection::Regions).is_empty());
    }

    #[test]
    fn deleting_a_region_detaches_its_items() {
        let store = MemoryStore::new();
        store.insert(Collection::Regions, "r1", fields(json!({ "name": "Nord" })));
        let items = vec![
            ItemDraft::new("Hammer", "r1").with_id("i1"),
            ItemDraft::new("Zange", "r2").with_id("i2"),
        ];
        for item in &items {
            store.insert(Collection::Items, &item.id, to_fields(&item.draft()).unwrap());
        }
        let mutations = Mutations::new(store.clone());

        block_on(mutations.delete_region_detaching("r1", &items));

        let stored: Vec<Item> = store
            .documents(Collection::Items)
            .iter()
            .map(|d| d.decode().unwrap())
            .collect();
        assert_eq!(stored[0].region, "");
        assert_eq!(stored[1].region, "r2");
        assert!(store.documents(Collection::Regions).is_empty());
    }
}
