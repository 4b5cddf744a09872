mod app;
pub mod auth_gate;
pub mod backend;
pub mod config;
pub mod error;
pub mod live;
pub mod logging;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod mutations;
mod pages;
pub mod search;
pub mod session;
pub mod state;
mod storage;
pub mod supabase;
pub mod types;

use wasm_bindgen::prelude::*;
use leptos::*;

use app::{App, ConfigErrorNotice};
use config::BackendConfig;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    match BackendConfig::from_build_env() {
        Ok(config) => {
            logging::init(&config.log_filter);
            tracing::info!(url = %config.url, poll_ms = config.poll_interval_ms, "starting");
            mount_to_body(move || view! { <App config=config /> });
        }
        Err(e) => {
            logging::init("info");
            tracing::error!(error = %e, "backend configuration unusable");
            let message = e.to_string();
            mount_to_body(move || view! { <ConfigErrorNotice message=message /> });
        }
    }
}
