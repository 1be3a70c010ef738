use std::sync::Arc;

use staybook_core::Marketplace;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<Marketplace>,
    /// Bearer token for admin endpoints. Admin endpoints are closed when unset.
    pub admin_token: Option<Arc<str>>,
    /// Expected `X-Webhook-Secret` of payment webhooks.
    pub webhook_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        market: Arc<Marketplace>,
        admin_token: Option<String>,
        webhook_secret: Option<String>,
    ) -> Self {
        AppState {
            market,
            admin_token: admin_token.filter(|t| !t.is_empty()).map(Arc::from),
            webhook_secret: webhook_secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }
}
