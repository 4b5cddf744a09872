use crate::types::AuthSession;

const AUTH_SESSION_KEY: &str = "inventar_auth_session";
const REGION_FILTER_KEY: &str = "inventar_region_filter";

pub fn get_local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn save_auth_session(session: &AuthSession) {
    if let Some(storage) = get_local_storage() {
        if let Ok(json) = serde_json::to_string(session) {
            let _ = storage.set_item(AUTH_SESSION_KEY, &json);
        }
    }
}

pub fn load_auth_session() -> Option<AuthSession> {
    let storage = get_local_storage()?;
    let json = storage.get_item(AUTH_SESSION_KEY).ok()??;
    serde_json::from_str(&json).ok()
}

pub fn clear_auth_session() {
    if let Some(storage) = get_local_storage() {
        let _ = storage.remove_item(AUTH_SESSION_KEY);
    }
}

// Last region picked in the search view, so reloads keep the filter.
pub fn load_region_filter() -> Option<String> {
    get_local_storage()
        .and_then(|s| s.get_item(REGION_FILTER_KEY).ok())
        .flatten()
        .filter(|v| !v.is_empty())
}

pub fn save_region_filter(region: Option<&str>) {
    if let Some(storage) = get_local_storage() {
        match region {
            Some(id) if !id.is_empty() => {
                let _ = storage.set_item(REGION_FILTER_KEY, id);
            }
            _ => {
                let _ = storage.remove_item(REGION_FILTER_KEY);
            }
        }
    }
}
