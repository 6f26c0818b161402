use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{LogoutPolicy, TutorSettings};
use url::Url;

pub const CONFIG_FILE: &str = "tutor.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tutor_api_url: String,
    pub auth_api_url: String,
    pub database_url: String,
    pub reveal_interval_ms: u64,
    pub logout_clears_identity: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tutor_api_url: "http://127.0.0.1:5000".into(),
            auth_api_url: "http://localhost:8080".into(),
            database_url: "sqlite://./data/tutor.db".into(),
            reveal_interval_ms: 50,
            logout_clears_identity: false,
        }
    }
}

impl Settings {
    pub fn tutor_settings(&self) -> TutorSettings {
        TutorSettings {
            reveal_interval: Duration::from_millis(self.reveal_interval_ms),
            logout_policy: if self.logout_clears_identity {
                LogoutPolicy::ResetIdentity
            } else {
                LogoutPolicy::KeepIdentity
            },
            ..TutorSettings::default()
        }
    }

    /// Both service URLs must be absolute http(s) URLs.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, raw) in [
            ("tutor api url", &self.tutor_api_url),
            ("auth api url", &self.auth_api_url),
        ] {
            let parsed = Url::parse(raw).with_context(|| format!("invalid {name} '{raw}'"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("{name} '{raw}' must use http or https");
            }
        }
        Ok(())
    }
}

pub fn load_settings() -> Settings {
    let file_cfg = fs::read_to_string(CONFIG_FILE)
        .ok()
        .and_then(|raw| toml::from_str::<HashMap<String, String>>(&raw).ok())
        .unwrap_or_default();
    resolve_settings(&file_cfg, |key| std::env::var(key).ok())
}

/// Defaults, then the config file, then the environment. For each setting the
/// `APP__` variable wins over the plain one.
fn resolve_settings(
    file_cfg: &HashMap<String, String>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(v) = file_cfg.get("tutor_api_url") {
        settings.tutor_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("auth_api_url") {
        settings.auth_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(parsed) = file_cfg
        .get("reveal_interval_ms")
        .and_then(|v| v.parse().ok())
    {
        settings.reveal_interval_ms = parsed;
    }
    if let Some(parsed) = file_cfg
        .get("logout_clears_identity")
        .and_then(|v| parse_flag(v))
    {
        settings.logout_clears_identity = parsed;
    }

    if let Some(v) = env("TUTOR_API_URL") {
        settings.tutor_api_url = v;
    }
    if let Some(v) = env("APP__TUTOR_API_URL") {
        settings.tutor_api_url = v;
    }

    if let Some(v) = env("AUTH_API_URL") {
        settings.auth_api_url = v;
    }
    if let Some(v) = env("APP__AUTH_API_URL") {
        settings.auth_api_url = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(parsed) = env("APP__REVEAL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
        settings.reveal_interval_ms = parsed;
    }
    if let Some(parsed) = env("APP__LOGOUT_CLEARS_IDENTITY").and_then(|v| parse_flag(&v)) {
        settings.logout_clears_identity = parsed;
    }

    settings
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(parent) = sqlite_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite://") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .split('?')
        .next()
        .unwrap_or_default();

    (!path.is_empty()).then(|| PathBuf::from(path))
}
