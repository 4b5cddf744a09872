//! Session scenarios over the in-memory store: sign in, mirror the live
//! collections, resolve the admin flag, write, sign out, switch user.

use std::io;
use std::sync::{Arc, Mutex};

use futures::executor::block_on;
use serde_json::json;

use inventar::backend::{to_fields, Collection};
use inventar::memory::MemoryStore;
use inventar::mutations::Mutations;
use inventar::session::{SessionController, SessionFeed};
use inventar::state::AppState;
use inventar::types::{AppView, AuthUser, ItemDraft, RegionDraft, Tab};

fn user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: format!("{id}@example.org"),
    }
}

/// Signs `uid` in the way the root component does: transition, admin
/// lookup applied through the feed, queued snapshots drained.
fn sign_in(
    controller: &mut SessionController<MemoryStore>,
    state: &mut AppState,
    uid: &str,
) -> SessionFeed {
    let mut feed = controller.sign_in(state, user(uid));
    let is_admin = block_on(controller.admin_lookup(&feed));
    feed.apply_admin(state, is_admin);
    feed.drain(state);
    feed
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(Collection::Regions, "r1", to_fields(&json!({ "name": "Nord" })).unwrap());
    store.insert(Collection::Regions, "r2", to_fields(&json!({ "name": "Süd" })).unwrap());
    store.insert(
        Collection::Items,
        "i1",
        to_fields(&json!({ "name": "Zange", "region": "r2" })).unwrap(),
    );
    store
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn admin_sees_management_tabs() {
    let store = seeded_store();
    store.insert(Collection::Admins, "u1", to_fields(&json!({ "isAdmin": true })).unwrap());
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();

    let _feed = sign_in(&mut controller, &mut state, "u1");

    assert!(state.is_admin());
    assert_eq!(state.visible_tabs(), Tab::ALL.to_vec());
    assert_eq!(state.regions().len(), 2);
    assert_eq!(state.items().len(), 1);
}

#[test]
fn user_without_admin_document_only_searches() {
    let store = seeded_store();
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();

    let _feed = sign_in(&mut controller, &mut state, "u2");

    assert!(!state.is_admin());
    assert_eq!(state.visible_tabs(), vec![Tab::Search]);

    state.select_tab(Tab::ManageRegions);
    assert_eq!(state.active_view(), AppView::Suppressed);
    assert_eq!(state.tab(), Tab::ManageRegions);
}

#[test]
fn added_item_arrives_with_its_assigned_id() {
    let store = seeded_store();
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();
    let mut feed = sign_in(&mut controller, &mut state, "u1");
    let mutations = Mutations::new(store.clone());

    block_on(mutations.add_item(&ItemDraft::new("Hammer", "r1")));
    feed.drain(&mut state);

    let hammer = state
        .items()
        .iter()
        .find(|item| item.name == "Hammer")
        .expect("hammer mirrored");
    assert_eq!(hammer.region, "r1");
    assert!(hammer.id.starts_with("doc-"));
}

#[test]
fn deleted_region_leaves_the_mirror() {
    let store = seeded_store();
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();
    let mut feed = sign_in(&mut controller, &mut state, "u1");
    let mutations = Mutations::new(store.clone());

    block_on(mutations.delete_region("r1"));
    feed.drain(&mut state);

    let ids: Vec<_> = state.regions().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r2"]);
}

#[test]
fn rejected_write_is_logged_and_state_unchanged() {
    let store = seeded_store();
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();
    let mut feed = sign_in(&mut controller, &mut state, "u1");
    let before = state.clone();
    let mutations = Mutations::new(store.clone());
    store.fail_writes("permission denied");

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .without_time()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        block_on(mutations.add_region(&RegionDraft::new("West")));
    });
    feed.drain(&mut state);

    assert_eq!(state, before);
    let logs = captured.contents();
    assert!(logs.contains("error adding document"), "logs: {logs}");
    assert!(logs.contains("permission denied"), "logs: {logs}");
}

#[test]
fn sign_out_cancels_both_subscriptions_once() {
    let store = seeded_store();
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();
    let mut feed = sign_in(&mut controller, &mut state, "u1");

    controller.sign_out(&mut state);
    assert_eq!(store.unsubscribe_count(Collection::Items), 1);
    assert_eq!(store.unsubscribe_count(Collection::Regions), 1);
    assert_eq!(store.active_subscriptions(Collection::Items), 0);
    assert!(state.items().is_empty());

    let mutations = Mutations::new(store.clone());
    block_on(mutations.add_item(&ItemDraft::new("Säge", "r1")));
    assert_eq!(feed.drain(&mut state), 0);

    assert!(state.items().is_empty());
    assert_eq!(state.active_view(), AppView::Landing);
    assert!(block_on(feed.next()).is_none());
}

#[test]
fn switching_user_cancels_the_previous_session() {
    let store = seeded_store();
    store.insert(Collection::Admins, "u1", to_fields(&json!({ "isAdmin": true })).unwrap());
    let mut controller = SessionController::new(store.clone());
    let mut state = AppState::default();

    let mut first = controller.sign_in(&mut state, user("u1"));
    let first_lookup = controller.admin_lookup(&first);
    let mut second = sign_in(&mut controller, &mut state, "u2");

    assert_eq!(store.unsubscribe_count(Collection::Items), 1);
    assert_eq!(store.unsubscribe_count(Collection::Regions), 1);
    assert_eq!(store.active_subscriptions(Collection::Items), 1);
    assert_eq!(store.active_subscriptions(Collection::Regions), 1);

    // Snapshots queued for u1 before the switch never land
    assert_eq!(first.drain(&mut state), 0);
    assert!(!first.apply_admin(&mut state, block_on(first_lookup)));
    assert!(!state.is_admin());
    assert_eq!(state.user().map(|u| u.id.as_str()), Some("u2"));

    store.insert(
        Collection::Items,
        "i2",
        to_fields(&json!({ "name": "Säge", "region": "r1" })).unwrap(),
    );
    assert_eq!(second.drain(&mut state), 1);
    assert_eq!(state.items().len(), 2);
}
