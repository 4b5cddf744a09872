//! The two live queries that mirror `items` and `regions` while signed in.

use futures::channel::mpsc;
use tracing::debug;

use crate::backend::{Collection, DocumentStore, SnapshotStream, Subscription};

/// Owns the item and region subscriptions for one session.
///
/// Dropping it (or calling [`LiveCollections::stop`]) cancels both. Once both
/// are cancelled the stores drop their senders and the stream ends.
#[derive(Debug)]
pub struct LiveCollections {
    items: Subscription,
    regions: Subscription,
}

impl LiveCollections {
    pub fn start<S: DocumentStore>(store: &S) -> (Self, SnapshotStream) {
        let (tx, rx) = mpsc::unbounded();
        let items = store.subscribe(Collection::Items, tx.clone());
        let regions = store.subscribe(Collection::Regions, tx);
        debug!("live collections started");
        (Self { items, regions }, rx)
    }

    pub fn stop(self) {
        let Self { items, regions } = self;
        items.unsubscribe();
        regions.unsubscribe();
        debug!("live collections stopped");
    }
}
