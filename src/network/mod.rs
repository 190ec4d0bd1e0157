//! Network hook types for the curl command.

pub mod types;

pub use types::{HttpClient, HttpRequest, HttpResponse, NetworkConfig};
