//! Application bootstrap and shared request state.
//!
//! `WebApp::init` runs once at startup: it records the startup instant,
//! loads the default avatar, builds the resource guard, and installs the Git
//! cache limits. Everything it prepares is immutable afterwards.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assets::{self, ResourceGuard};
use crate::config::Config;
use crate::error::Result;
use crate::git::SharedStore;
use crate::models::AppInfo;
use crate::session::SessionStore;

pub const HOME_PAGE: &str = "index.html";
pub const LOGIN_PAGE: &str = "login.html";

pub struct WebApp {
    startup_date: DateTime<Utc>,
    started: Instant,
    request_timeout: Duration,
    default_user_avatar: Vec<u8>,
    resource_guard: ResourceGuard,
    development: bool,
}

impl WebApp {
    pub fn init(config: &Config) -> Result<Self> {
        let startup_date = Utc::now();
        let started = Instant::now();

        let default_user_avatar = assets::load(assets::DEFAULT_AVATAR)?;

        let mut resource_guard = ResourceGuard::with_defaults();
        for pattern in &config.assets.extra_patterns {
            resource_guard.add_pattern(pattern)?;
        }

        config.git.install()?;

        if config.server.development {
            tracing::info!("Development mode: verbose request logging enabled");
        }

        Ok(Self {
            startup_date,
            started,
            request_timeout: config.server.request_timeout(),
            default_user_avatar,
            resource_guard,
            development: config.server.development,
        })
    }

    pub fn startup_date(&self) -> DateTime<Utc> {
        self.startup_date
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn home_page(&self) -> &'static str {
        HOME_PAGE
    }

    pub fn default_user_avatar(&self) -> &[u8] {
        &self.default_user_avatar
    }

    pub fn resource_guard(&self) -> &ResourceGuard {
        &self.resource_guard
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    pub fn info(&self) -> AppInfo {
        AppInfo {
            name: "gitop".to_string(),
            home_page: format!("/{}", self.home_page()),
            startup_date: self.startup_date,
            uptime_secs: self.uptime().as_secs(),
            development: self.development,
        }
    }
}

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<WebApp>,
    pub store: SharedStore,
    pub sessions: Arc<SessionStore>,
    pub allow_anonymous: bool,
}

impl AppState {
    pub fn new(config: &Config, app: WebApp, store: SharedStore) -> Self {
        Self {
            app: Arc::new(app),
            store,
            sessions: Arc::new(SessionStore::new(
                config.auth.session_timeout(),
                &config.auth.accounts,
            )),
            allow_anonymous: config.auth.allow_anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_loads_avatar_and_guard() {
        let app = WebApp::init(&Config::default()).unwrap();
        assert_eq!(&app.default_user_avatar()[..2], &[0xFF, 0xD8]);
        assert!(app.resource_guard().accept("fonts/icons.woff"));
        assert!(!app.resource_guard().accept("Cargo.toml"));
        assert_eq!(app.request_timeout(), Duration::from_secs(600));
        assert_eq!(app.home_page(), "index.html");
    }

    #[test]
    fn uptime_counts_from_startup() {
        let app = WebApp::init(&Config::default()).unwrap();
        assert!(app.startup_date() <= Utc::now());
        assert!(app.uptime() < Duration::from_secs(60));
        assert_eq!(app.info().home_page, "/index.html");
    }

    #[test]
    fn malformed_guard_pattern_fails_init() {
        let mut config = Config::default();
        config.assets.extra_patterns.push("*.woff2".to_string());
        assert!(WebApp::init(&config).is_err());
    }
}
