//! HTTP hook contract.
//!
//! The interpreter never talks to a network itself; `curl` calls the
//! embedder-provided client and treats the exchange as atomic.

use async_trait::async_trait;
use std::collections::HashMap;

/// Request record handed to the HTTP client hook.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Response record returned by the hook.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Status line text for -i / -w style output.
    pub fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "",
        }
    }
}

/// The embedder-provided HTTP client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Network settings on the sandbox.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let response = HttpResponse { status: 404, headers: HashMap::new(), body: String::new() };
        assert_eq!(response.status_text(), "Not Found");
        let response = HttpResponse { status: 299, headers: HashMap::new(), body: String::new() };
        assert_eq!(response.status_text(), "");
    }
}
