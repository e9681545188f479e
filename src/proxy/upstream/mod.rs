// Upstream module - outbound side of the proxy

pub mod client;

pub use client::{OutboundOutcome, OutboundRequest, Transport, UpstreamClient};
