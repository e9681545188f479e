// proxy module - allowlisted forwarding service

pub mod allowlist;
pub mod config;
pub mod error;
pub mod headers;
pub mod server;
pub mod target;

pub mod handlers; // Route handlers
pub mod middleware; // Axum middleware
pub mod upstream; // Outbound client

pub use allowlist::Allowlist;
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use server::{AppState, AxumServer};
