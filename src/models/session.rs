//! Session, login and application info DTOs.
//!
//! - `LoginRequest`: credentials posted to /login
//! - `SessionInfo`: who the current session belongs to
//! - `AppInfo`: startup date and uptime (footer display)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
    pub open_pickers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub home_page: String,
    pub startup_date: DateTime<Utc>,
    pub uptime_secs: u64,
    pub development: bool,
}
