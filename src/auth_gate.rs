//! Admin flag resolution for a signed-in user.

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{Collection, Document, DocumentStore};

/// Field of the `admins/{user_id}` document holding the flag.
pub const ADMIN_FIELD: &str = "isAdmin";

/// True only when the document exists and its flag is JSON `true`.
pub fn is_admin_document(document: Option<&Document>) -> bool {
    document.is_some_and(|doc| doc.fields.get(ADMIN_FIELD) == Some(&Value::Bool(true)))
}

/// Looks up `admins/{user_id}`. A failed lookup counts as not admin.
pub async fn resolve_admin<S: DocumentStore>(store: &S, user_id: &str) -> bool {
    match store.get(Collection::Admins, user_id).await {
        Ok(document) => {
            let is_admin = is_admin_document(document.as_ref());
            debug!(user_id, is_admin, "resolved admin flag");
            is_admin
        }
        Err(e) => {
            warn!(user_id, error = %e, "admin lookup failed, treating user as non-admin");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    use crate::backend::to_fields;
    use crate::memory::MemoryStore;

    fn store_with_admin(uid: &str, flag: Value) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(Collection::Admins, uid, to_fields(&json!({ "isAdmin": flag })).unwrap());
        store
    }

    #[test]
    fn true_flag_grants_admin() {
        let store = store_with_admin("u1", json!(true));
        assert!(block_on(resolve_admin(&store, "u1")));
    }

    #[test]
    fn missing_document_is_not_admin() {
        let store = store_with_admin("someone-else", json!(true));
        assert!(!block_on(resolve_admin(&store, "u1")));
    }

    #[test]
    fn truthy_but_not_true_is_not_admin() {
        for flag in [json!("true"), json!(1), json!(false), Value::Null] {
            let store = store_with_admin("u1", flag.clone());
            assert!(!block_on(resolve_admin(&store, "u1")), "flag {flag} granted admin");
        }
    }

    #[test]
    fn failed_lookup_fails_closed() {
        let store = store_with_admin("u1", json!(true));
        store.fail_reads("timeout");
        assert!(!block_on(resolve_admin(&store, "u1")));
    }
}
