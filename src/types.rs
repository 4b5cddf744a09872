use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Region reference as stored; not checked against the region list.
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    /// The writable fields, used as the full-replace payload on update.
    pub fn draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            region: self.region.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ItemDraft {
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ItemDraft {
    pub fn new(name: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            description: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn with_id(self, id: &str) -> Item {
        Item {
            id: id.to_string(),
            name: self.name,
            region: self.region,
            description: self.description,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Region {
    pub fn draft(&self) -> RegionDraft {
        RegionDraft {
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegionDraft {
    pub name: String,
}

impl RegionDraft {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// True when the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at.is_some_and(|at| at - now <= margin_secs)
    }
}

/// Navigation tab selected in the top bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Search,
    ManageItems,
    ManageRegions,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Search, Tab::ManageItems, Tab::ManageRegions];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Search => "Suchen",
            Tab::ManageItems => "Artikel erstellen",
            Tab::ManageRegions => "Gebiete verwalten",
        }
    }

    pub fn requires_admin(self) -> bool {
        !matches!(self, Tab::Search)
    }
}

/// What the main pane renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppView {
    Landing,
    Search,
    ManageItems,
    ManageRegions,
    /// An admin tab is selected but the user is not an admin.
    Suppressed,
}
