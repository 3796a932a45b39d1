use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

// Shared client for the remote tier; per-request timeouts come from the server config
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build configured HTTP client, using defaults: {}", e);
            Client::new()
        })
});

/// Read an error body for logging without failing on it
pub async fn error_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
