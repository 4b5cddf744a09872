//! Application state owned by the root component.
//!
//! All four pieces of UI state live here: the selected tab, the mirrored
//! `items` and `regions` arrays, and the signed-in user with its admin flag.
//! The only writers are auth transitions, admin resolutions, tab clicks and
//! snapshots drained from the live collection stream.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::backend::{Collection, Document, Snapshot};
use crate::types::{AppView, AuthUser, Item, Region, Tab};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    tab: Tab,
    items: Vec<Item>,
    regions: Vec<Region>,
    user: Option<AuthUser>,
    is_admin: bool,
    /// Bumped on every identity transition; snapshots carry the epoch
    /// their subscription was started under.
    epoch: u64,
}

impl AppState {
    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Records an identity transition and returns the new session epoch.
    ///
    /// Admin resets to false until the lookup for the new user resolves.
    /// Signing out clears both mirrors.
    pub fn set_user(&mut self, user: Option<AuthUser>) -> u64 {
        self.epoch += 1;
        self.is_admin = false;
        if user.is_none() {
            self.items.clear();
            self.regions.clear();
        }
        self.user = user;
        self.epoch
    }

    /// Applies an admin lookup result if it is for the current user.
    pub fn set_admin(&mut self, user_id: &str, is_admin: bool) -> bool {
        match &self.user {
            Some(user) if user.id == user_id => {
                self.is_admin = is_admin;
                true
            }
            _ => {
                debug!(user_id, "dropping admin flag for a stale user");
                false
            }
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// Replaces the mirror of the snapshot's collection wholesale.
    ///
    /// Returns false when the snapshot belongs to an older session or
    /// arrives while signed out.
    pub fn apply_snapshot(&mut self, epoch: u64, snapshot: Snapshot) -> bool {
        if epoch != self.epoch || self.user.is_none() {
            debug!(collection = %snapshot.collection, epoch, "dropping stale snapshot");
            return false;
        }

        match snapshot.collection {
            Collection::Items => self.items = decode_all(&snapshot.documents),
            Collection::Regions => self.regions = decode_all(&snapshot.documents),
            Collection::Admins => return false,
        }
        true
    }

    pub fn visible_tabs(&self) -> Vec<Tab> {
        Tab::ALL
            .into_iter()
            .filter(|tab| self.is_admin || !tab.requires_admin())
            .collect()
    }

    /// Render guard: admin tabs show nothing for non-admins, but the
    /// selection itself is left alone.
    pub fn active_view(&self) -> AppView {
        if self.user.is_none() {
            return AppView::Landing;
        }
        match self.tab {
            Tab::Search => AppView::Search,
            _ if !self.is_admin => AppView::Suppressed,
            Tab::ManageItems => AppView::ManageItems,
            Tab::ManageRegions => AppView::ManageRegions,
        }
    }
}

fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match doc.decode() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}
