use std::time::Duration;

use reqwest::{header, Client};

pub static VERSION: &str = env!("CARGO_PKG_VERSION");

/// Headers identifying this client on every outgoing request
pub fn default_headers() -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        "X-Client-Name",
        header::HeaderValue::from_static("soroban-pxpump"),
    );
    headers.insert("X-Client-Version", header::HeaderValue::from_static(VERSION));
    headers
}

pub fn create_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .default_headers(default_headers())
        .timeout(timeout)
        .build()
}
