use std::sync::Arc;

use crate::config::Config;
use crate::layout::FontCatalog;
use crate::receipt::profile::ReceiptProfile;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Everything here is read-only after startup, so concurrent renders need no locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Active receipt profile (defaults, id prefix, manual vs preset items).
    pub profile: Arc<ReceiptProfile>,
    /// Font locators; each render resolves its own faces from this list.
    pub fonts: Arc<FontCatalog>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let profile = ReceiptProfile::for_kind(config.profile).with_overrides(&config.business);
        let fonts = config.font_catalog();
        Self {
            config,
            profile: Arc::new(profile),
            fonts: Arc::new(fonts),
        }
    }
}
