//! Runtime configuration, read from the environment (and `.env` when present).

use crate::models::UserProfile;
use chrono::FixedOffset;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory holding the key-value payload files.
    pub data_dir: PathBuf,
    /// Offset used for day grouping and displayed timestamps (WIB by default).
    pub utc_offset: FixedOffset,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub insight_timeout: Duration,
    pub location_timeout: Duration,
    pub user: UserProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("data"),
            utc_offset: wib(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            insight_timeout: Duration::from_secs(30),
            location_timeout: Duration::from_secs(10),
            user: UserProfile::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let utc_offset = parsed_var::<i32>("APP_UTC_OFFSET_HOURS")
            .and_then(|hours| FixedOffset::east_opt(hours * 3600))
            .unwrap_or(defaults.utc_offset);

        Self {
            port: parsed_var("PORT").unwrap_or(defaults.port),
            data_dir: env::var("APP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            utc_offset,
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            insight_timeout: parsed_var("INSIGHT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.insight_timeout),
            location_timeout: parsed_var("LOCATION_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.location_timeout),
            user: UserProfile {
                id: env::var("APP_USER_ID").unwrap_or(defaults.user.id),
                name: env::var("APP_USER_NAME").unwrap_or(defaults.user.name),
                role: env::var("APP_USER_ROLE").unwrap_or(defaults.user.role),
                unit: env::var("APP_USER_UNIT").unwrap_or(defaults.user.unit),
                avatar: env::var("APP_USER_AVATAR").unwrap_or(defaults.user.avatar),
            },
        }
    }
}

fn wib() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("UTC+7 is in range")
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring invalid {name}={raw}");
            None
        }
    }
}
