use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;

use crate::config::CONFIG;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("aesthetic_explorer/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(
            CONFIG.gemini_request_timeout_seconds.saturating_add(30),
        ))
        .build()
        .expect("Failed to build HTTP client")
});

/// Shared client; batch requests reuse its connection pool.
pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
