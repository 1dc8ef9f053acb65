use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::layout::{FontCatalog, FontSource};
use crate::receipt::profile::{BusinessOverrides, ProfileKind};

/// Application configuration loaded from environment variables.
/// Every variable is optional; defaults reproduce the stock one-time receipt.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub profile: ProfileKind,
    /// Replaces the default regular-weight font locators when set.
    pub font_paths: Option<Vec<PathBuf>>,
    /// Replaces the default bold font locators when set.
    pub bold_font_paths: Option<Vec<PathBuf>>,
    /// Shared password for the receipt endpoints. Open access when unset.
    pub app_password: Option<String>,
    pub business: BusinessOverrides,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let profile = match non_empty("RECEIPT_PROFILE") {
            Some(raw) => raw
                .parse::<ProfileKind>()
                .map_err(|e| anyhow!(e))
                .context("RECEIPT_PROFILE must be 'one-time' or 'membership'")?,
            None => ProfileKind::OneTime,
        };

        Ok(Config {
            port: non_empty("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            profile,
            font_paths: non_empty("RECEIPT_FONT_PATHS").map(|v| split_paths(&v)),
            bold_font_paths: non_empty("RECEIPT_BOLD_FONT_PATHS").map(|v| split_paths(&v)),
            app_password: get("APP_PASSWORD").filter(|v| !v.is_empty()),
            business: BusinessOverrides {
                name: non_empty("BUSINESS_NAME"),
                phone: non_empty("BUSINESS_PHONE"),
                email: non_empty("BUSINESS_EMAIL"),
                city_state: non_empty("BUSINESS_CITY_STATE"),
            },
        })
    }

    /// The font fallback chain: DejaVu by default, each weight replaceable from config.
    pub fn font_catalog(&self) -> FontCatalog {
        let mut catalog = FontCatalog::dejavu();
        if let Some(paths) = &self.font_paths {
            catalog.regular = paths.iter().map(FontSource::path).collect();
        }
        if let Some(paths) = &self.bold_font_paths {
            catalog.bold = paths.iter().map(FontSource::path).collect();
        }
        catalog
    }
}

fn split_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}
