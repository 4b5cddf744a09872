//! Identity transitions for one running app.
//!
//! [`SessionController`] owns the live collections of the signed-in user.
//! A transition cancels whatever was running, records the new user in the
//! [`AppState`] and, for a signed-in user, opens a [`SessionFeed`] that
//! carries the new session epoch. The root component drives the feed and
//! the admin lookup on the event loop; tests drive them synchronously.

use std::future::Future;

use futures::StreamExt;
use tracing::{debug, info};

use crate::auth_gate::resolve_admin;
use crate::backend::{DocumentStore, Snapshot, SnapshotStream};
use crate::live::LiveCollections;
use crate::state::AppState;
use crate::types::AuthUser;

pub struct SessionController<S> {
    store: S,
    live: Option<LiveCollections>,
}

/// Snapshots of one session, tagged with the epoch it was opened under.
#[derive(Debug)]
pub struct SessionFeed {
    epoch: u64,
    user_id: String,
    snapshots: SnapshotStream,
}

impl<S: DocumentStore + Clone + 'static> SessionController<S> {
    pub fn new(store: S) -> Self {
        Self { store, live: None }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Switches `state` to `user`. Returns the feed of the new session, or
    /// `None` after a sign-out.
    pub fn transition(&mut self, state: &mut AppState, user: Option<AuthUser>) -> Option<SessionFeed> {
        match user {
            Some(user) => Some(self.sign_in(state, user)),
            None => {
                self.sign_out(state);
                None
            }
        }
    }

    /// Cancels the previous session, if any, and opens one for `user`.
    pub fn sign_in(&mut self, state: &mut AppState, user: AuthUser) -> SessionFeed {
        self.stop();
        let epoch = state.set_user(Some(user.clone()));
        let (live, snapshots) = LiveCollections::start(&self.store);
        self.live = Some(live);
        info!(user_id = %user.id, epoch, "session started");

        SessionFeed {
            epoch,
            user_id: user.id,
            snapshots,
        }
    }

    pub fn sign_out(&mut self, state: &mut AppState) {
        self.stop();
        state.set_user(None);
        info!("session ended");
    }

    /// Cancels the live collections without touching any state.
    pub fn stop(&mut self) {
        if let Some(live) = self.live.take() {
            live.stop();
        }
    }

    /// Looks up the admin flag for the feed's user. Apply the result with
    /// [`SessionFeed::apply_admin`].
    pub fn admin_lookup(&self, feed: &SessionFeed) -> impl Future<Output = bool> + 'static {
        let store = self.store.clone();
        let user_id = feed.user_id.clone();
        async move { resolve_admin(&store, &user_id).await }
    }
}

impl SessionFeed {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Waits for the next snapshot. `None` once the session was cancelled.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.next().await
    }

    /// Applies a snapshot under this feed's epoch; stale ones are dropped.
    pub fn apply(&self, state: &mut AppState, snapshot: Snapshot) -> bool {
        state.apply_snapshot(self.epoch, snapshot)
    }

    pub fn apply_admin(&self, state: &mut AppState, is_admin: bool) -> bool {
        state.set_admin(&self.user_id, is_admin)
    }

    /// Applies every snapshot already queued. Returns how many were applied.
    pub fn drain(&mut self, state: &mut AppState) -> usize {
        let mut applied = 0;
        while let Ok(Some(snapshot)) = self.snapshots.try_next() {
            if self.apply(state, snapshot) {
                applied += 1;
            }
        }
        debug!(epoch = self.epoch, applied, "drained snapshots");
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    use crate::backend::{to_fields, Collection};
    use crate::memory::MemoryStore;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: id.into(),
            email: format!("{id}@example.org"),
        }
    }

    #[test]
    fn sign_in_mirrors_both_collections() {
        let store = MemoryStore::new();
        store.insert(Collection::Regions, "r1", to_fields(&json!({ "name": "Nord" })).unwrap());
        let mut controller = SessionController::new(store.clone());
        let mut state = AppState::default();

        let mut feed = controller.sign_in(&mut state, user("u1"));
        assert_eq!(feed.drain(&mut state), 2);

        assert!(controller.is_live());
        assert_eq!(feed.epoch(), state.epoch());
        assert_eq!(state.regions().len(), 1);
    }

    #[test]
    fn admin_result_for_a_replaced_user_is_ignored() {
        let store = MemoryStore::new();
        store.insert(Collection::Admins, "u1", to_fields(&json!({ "isAdmin": true })).unwrap());
        let mut controller = SessionController::new(store);
        let mut state = AppState::default();

        let first = controller.sign_in(&mut state, user("u1"));
        let lookup = controller.admin_lookup(&first);
        let _second = controller.sign_in(&mut state, user("u2"));

        let is_admin = block_on(lookup);
        assert!(is_admin);
        assert!(!first.apply_admin(&mut state, is_admin));
        assert!(!state.is_admin());
    }

    #[test]
    fn stop_leaves_state_alone() {
        let store = MemoryStore::new();
        let mut controller = SessionController::new(store.clone());
        let mut state = AppState::default();
        let _feed = controller.sign_in(&mut state, user("u1"));

        controller.stop();

        assert!(!controller.is_live());
        assert!(state.user().is_some());
        assert_eq!(store.active_subscriptions(Collection::Items), 0);
    }
}
