use serde::{Deserialize, Serialize};

/// Forwarding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to listen on every interface
    /// - true: 0.0.0.0 (default, clients reach the proxy from the browser host)
    /// - false: 127.0.0.1 only
    #[serde(default = "default_allow_lan_access")]
    pub allow_lan_access: bool,

    /// Origin permitted by the CORS layer
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Outbound client timeout (seconds). Unset waits on the target as long as
    /// it takes; when set, expiry surfaces as a transport failure
    #[serde(default)]
    pub request_timeout: Option<u64>,

    /// Maximum inbound body size (bytes)
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,

    /// Upstream proxy configuration
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Upstream proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allow_lan_access: default_allow_lan_access(),
            allowed_origin: default_allowed_origin(),
            request_timeout: None,
            body_limit: default_body_limit(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_allow_lan_access() -> bool {
    true
}

fn default_allowed_origin() -> String {
    "https://pro.easyeda.com".to_string()
}

fn default_body_limit() -> usize {
    100 * 1024 * 1024
}

impl ProxyConfig {
    /// Get actual listening address
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}
