use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::backend::{
    Collection, Document, DocumentStore, Fields, Snapshot, SnapshotSender, Subscription,
};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::storage;
use crate::types::{AuthSession, AuthUser};

/// Refresh the access token when it expires within this window.
const REFRESH_MARGIN_SECS: i64 = 60;

// ============ AUTH ============

#[derive(Deserialize, Debug)]
struct SupabaseAuthResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: SupabaseUser,
}

#[derive(Deserialize, Debug)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct SupabaseError {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
}

impl SupabaseError {
    fn message(self, fallback: &str) -> String {
        self.error_description
            .or(self.msg)
            .or(self.error)
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn session_from_response(resp: SupabaseAuthResponse, now: i64) -> AuthSession {
    let expires_at = resp
        .expires_at
        .or_else(|| resp.expires_in.map(|secs| now + secs));
    AuthSession {
        access_token: resp.access_token,
        refresh_token: resp.refresh_token,
        expires_at,
        user: AuthUser {
            id: resp.user.id,
            email: resp.user.email.unwrap_or_default(),
        },
    }
}

/// True when `session` must be refreshed before it is sent again.
fn needs_refresh(session: &AuthSession, now: i64) -> bool {
    session.expires_within(now, REFRESH_MARGIN_SECS)
}

/// Drops everything persisted for the signed-in user.
fn forget_session() {
    storage::clear_auth_session();
    storage::save_region_filter(None);
}

fn now_secs() -> i64 {
    js_sys::Date::now() as i64 / 1000
}

// ============ DOCUMENTS ============

fn list_path(collection: Collection) -> String {
    format!("/rest/v1/{}?select=*&order=id", collection.name())
}

fn row_path(collection: Collection, id: &str) -> String {
    format!(
        "/rest/v1/{}?id=eq.{}",
        collection.name(),
        urlencoding::encode(id)
    )
}

/// Splits the `id` column off a row. Rows without a usable id are dropped.
fn row_to_document(mut row: Map<String, Value>) -> Option<Document> {
    let id = match row.remove("id")? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(Document::new(id, row))
}

struct Watcher {
    id: u64,
    collection: Collection,
    sink: SnapshotSender,
    last: Option<Vec<Document>>,
}

/// Sends `documents` to every watcher of `collection` whose last delivery
/// differs. Watchers whose receiver is gone are removed.
fn publish_to(watchers: &mut Vec<Watcher>, collection: Collection, documents: &[Document]) {
    watchers.retain_mut(|watcher| {
        if watcher.collection != collection || watcher.last.as_deref() == Some(documents) {
            return true;
        }
        let snapshot = Snapshot {
            collection,
            documents: documents.to_vec(),
        };
        if watcher.sink.unbounded_send(snapshot).is_err() {
            return false;
        }
        watcher.last = Some(documents.to_vec());
        true
    });
}

struct ClientInner {
    config: BackendConfig,
    watchers: RefCell<Vec<Watcher>>,
    next_watcher: Cell<u64>,
    on_expired: RefCell<Option<Rc<dyn Fn()>>>,
}

/// Supabase as document store and identity provider.
///
/// Live queries are polling watchers; every successful write refreshes the
/// watchers of the written collection right away.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Rc<ClientInner>,
}

impl SupabaseClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                config,
                watchers: RefCell::new(Vec::new()),
                next_watcher: Cell::new(0),
                on_expired: RefCell::new(None),
            }),
        }
    }

    /// Registers the handler run when a stored session can no longer be
    /// refreshed and has been dropped.
    pub fn on_session_expired(&self, handler: impl Fn() + 'static) {
        *self.inner.on_expired.borrow_mut() = Some(Rc::new(handler));
    }

    fn session_expired(&self) {
        let handler = self.inner.on_expired.borrow().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// The stored session, refreshed first when its token is about to lapse.
    /// A failed refresh drops the session and reports the expiry.
    async fn current_session(&self) -> Option<AuthSession> {
        let session = storage::load_auth_session()?;
        if !needs_refresh(&session, now_secs()) {
            return Some(session);
        }

        match self.refresh_session(&session).await {
            Ok(fresh) => {
                debug!(user_id = %fresh.user.id, "session refreshed");
                Some(fresh)
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed, signing out");
                forget_session();
                self.session_expired();
                None
            }
        }
    }

    fn headers(&self, session: Option<&AuthSession>) -> Result<Headers, BackendError> {
        let key = &self.inner.config.anon_key;
        let headers = Headers::new()?;
        headers.set("apikey", key)?;

        // Use user's token if logged in, otherwise anon key
        let token = session.map_or(key.as_str(), |s| s.access_token.as_str());
        headers.set("Authorization", &format!("Bearer {token}"))?;
        headers.set("Content-Type", "application/json")?;
        Ok(headers)
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
        headers: Headers,
    ) -> Result<Response, BackendError> {
        let window = web_sys::window().ok_or(BackendError::NoWindow)?;
        let opts = create_request_init(method, body, &headers);

        let url = format!("{}{}", self.inner.config.url, path);
        let request = Request::new_with_str_and_init(&url, &opts)?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;
        Ok(resp)
    }

    async fn rest(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
        prefer: Option<&str>,
    ) -> Result<Response, BackendError> {
        let session = self.current_session().await;
        let headers = self.headers(session.as_ref())?;
        if let Some(prefer) = prefer {
            headers.set("Prefer", prefer)?;
        }
        let resp = self.send(method, path, body, headers).await?;
        if !resp.ok() {
            return Err(BackendError::Http {
                status: resp.status(),
            });
        }
        Ok(resp)
    }

    async fn read_rows(resp: &Response) -> Result<Vec<Document>, BackendError> {
        let text = JsFuture::from(resp.text()?).await?;
        let text = text
            .as_string()
            .ok_or_else(|| BackendError::Decode("response body is not text".into()))?;
        let rows: Vec<Map<String, Value>> = serde_json::from_str(&text)?;
        Ok(rows.into_iter().filter_map(row_to_document).collect())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, BackendError> {
        let resp = self.rest("GET", &list_path(collection), None, None).await?;
        Self::read_rows(&resp).await
    }

    fn has_watchers(&self, collection: Collection) -> bool {
        self.inner
            .watchers
            .borrow()
            .iter()
            .any(|w| w.collection == collection)
    }

    fn is_watching(&self, id: u64) -> bool {
        self.inner.watchers.borrow().iter().any(|w| w.id == id)
    }

    fn unwatch(&self, id: u64) {
        self.inner.watchers.borrow_mut().retain(|w| w.id != id);
    }

    /// Fetches the collection and pushes it to its watchers if it changed.
    async fn refresh(&self, collection: Collection) {
        if !self.has_watchers(collection) {
            return;
        }
        match self.list(collection).await {
            Ok(documents) => {
                publish_to(&mut self.inner.watchers.borrow_mut(), collection, &documents)
            }
            Err(e) => warn!(%collection, error = %e, "snapshot fetch failed"),
        }
    }

    // ============ IDENTITY ============

    async fn auth_request(
        &self,
        path: &str,
        body: &Value,
        fallback: &str,
    ) -> Result<AuthSession, BackendError> {
        let headers = self.headers(None)?;
        let body = body.to_string();
        let resp = self.send("POST", path, Some(body.as_str()), headers).await?;

        let json = JsFuture::from(resp.json()?).await?;
        if !resp.ok() {
            let err: SupabaseError = serde_wasm_bindgen::from_value(json).unwrap_or_default();
            return Err(BackendError::Auth(err.message(fallback)));
        }

        let auth_resp: SupabaseAuthResponse = serde_wasm_bindgen::from_value(json)
            .map_err(|_| BackendError::Auth("Invalid auth response".into()))?;
        let session = session_from_response(auth_resp, now_secs());
        storage::save_auth_session(&session);
        Ok(session)
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let session = self
            .auth_request("/auth/v1/token?grant_type=password", &body, "Login failed")
            .await?;
        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Sign up with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let session = self
            .auth_request("/auth/v1/signup", &body, "Registration failed")
            .await?;
        info!(user_id = %session.user.id, "registered");
        Ok(session)
    }

    async fn refresh_session(&self, session: &AuthSession) -> Result<AuthSession, BackendError> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or_else(|| BackendError::Auth("no refresh token".into()))?;
        let body = serde_json::json!({ "refresh_token": refresh_token });
        self.auth_request(
            "/auth/v1/token?grant_type=refresh_token",
            &body,
            "Session refresh failed",
        )
        .await
    }

    /// The persisted session, refreshed if it is about to expire.
    pub async fn restore_session(&self) -> Option<AuthSession> {
        self.current_session().await
    }

    /// Ends the server session (best effort) and forgets the local one.
    pub async fn sign_out(&self) {
        if let Some(session) = storage::load_auth_session() {
            let result: Result<(), BackendError> = async {
                let headers = self.headers(Some(&session))?;
                let resp = self.send("POST", "/auth/v1/logout", None, headers).await?;
                if resp.ok() {
                    Ok(())
                } else {
                    Err(BackendError::Http {
                        status: resp.status(),
                    })
                }
            }
            .await;
            if let Err(e) = result {
                warn!(error = %e, "sign out error");
            }
        }
        forget_session();
        info!("signed out");
    }
}

fn create_request_init(method: &str, body: Option<&str>, headers: &Headers) -> RequestInit {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(b) = body {
        opts.set_body(&JsValue::from_str(b));
    }
    opts.set_headers(&JsValue::from(headers));
    opts
}

impl DocumentStore for SupabaseClient {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, BackendError> {
        let body = serde_json::to_string(&fields)?;
        let resp = self
            .rest(
                "POST",
                &format!("/rest/v1/{}", collection.name()),
                Some(body.as_str()),
                Some("return=representation"),
            )
            .await?;
        let id = Self::read_rows(&resp)
            .await?
            .into_iter()
            .next()
            .map(|doc| doc.id)
            .ok_or_else(|| BackendError::Decode("insert returned no row".into()))?;
        self.refresh(collection).await;
        Ok(id)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        mut fields: Fields,
    ) -> Result<(), BackendError> {
        // PUT on a single row needs the primary key in the body too.
        fields.insert("id".to_string(), Value::String(id.to_string()));
        let body = serde_json::to_string(&fields)?;
        self.rest("PUT", &row_path(collection, id), Some(body.as_str()), None)
            .await?;
        self.refresh(collection).await;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), BackendError> {
        self.rest("DELETE", &row_path(collection, id), None, None)
            .await?;
        self.refresh(collection).await;
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, BackendError> {
        let path = format!("{}&select=*", row_path(collection, id));
        let resp = self.rest("GET", &path, None, None).await?;
        Ok(Self::read_rows(&resp).await?.into_iter().next())
    }

    fn subscribe(&self, collection: Collection, sink: SnapshotSender) -> Subscription {
        let id = self.inner.next_watcher.get() + 1;
        self.inner.next_watcher.set(id);
        self.inner.watchers.borrow_mut().push(Watcher {
            id,
            collection,
            sink,
            last: None,
        });

        let client = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let interval = client.inner.config.poll_interval_ms;
            while client.is_watching(id) {
                client.refresh(collection).await;
                TimeoutFuture::new(interval).await;
            }
            debug!(%collection, watcher = id, "watcher stopped");
        });

        let client = self.clone();
        Subscription::new(move || client.unwatch(id))
    }
}
