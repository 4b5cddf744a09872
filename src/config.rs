//! Backend configuration, baked in at build time.
//!
//! # Environment Variables (read by `option_env!` when compiling)
//!
//! ## Required
//! - `INVENTAR_SUPABASE_URL` - Supabase project URL (http or https)
//! - `INVENTAR_SUPABASE_KEY` - Supabase publishable (anon) key
//!
//! ## Optional
//! - `INVENTAR_POLL_MS` - Live collection poll interval (default: 3000, min: 250)
//! - `INVENTAR_LOG` - `tracing` filter directives (default: info)

use crate::error::ConfigError;

const DEFAULT_POLL_MS: u32 = 3000;
const MIN_POLL_MS: u32 = 250;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub poll_interval_ms: u32,
    pub log_filter: String,
}

impl BackendConfig {
    /// Reads the values captured when the crate was compiled.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| {
            let value = match name {
                "INVENTAR_SUPABASE_URL" => option_env!("INVENTAR_SUPABASE_URL"),
                "INVENTAR_SUPABASE_KEY" => option_env!("INVENTAR_SUPABASE_KEY"),
                "INVENTAR_POLL_MS" => option_env!("INVENTAR_POLL_MS"),
                "INVENTAR_LOG" => option_env!("INVENTAR_LOG"),
                _ => None,
            };
            value.map(str::to_string)
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = required(&lookup, "INVENTAR_SUPABASE_URL")?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                name: "INVENTAR_SUPABASE_URL",
                value: url,
            });
        }
        let anon_key = required(&lookup, "INVENTAR_SUPABASE_KEY")?;

        let poll_interval_ms = match lookup("INVENTAR_POLL_MS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(ms) if ms >= MIN_POLL_MS => ms,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "INVENTAR_POLL_MS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_POLL_MS,
        };

        let log_filter = lookup("INVENTAR_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            poll_interval_ms,
            log_filter,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
