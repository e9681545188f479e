// Host allowlist

use crate::proxy::error::ProxyError;
use crate::proxy::target::{DecodedTarget, TargetUrl};

/// Hostnames a request may be forwarded to.
///
/// Built once at startup and shared read-only between requests. Matching is an
/// exact string comparison against the host as written in the target: no
/// wildcards, no subdomains, no case folding, no default-port elision.
/// An empty allowlist denies everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    hosts: Vec<String>,
}

impl Allowlist {
    /// Build from individual hostnames, keeping first-seen order and dropping duplicates.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for host in hosts {
            let host = host.into();
            if !unique.contains(&host) {
                unique.push(host);
            }
        }
        Self { hosts: unique }
    }

    /// Parse the `ALLOWED_DOMAINS` form: comma separated, surrounding
    /// whitespace trimmed, empty entries ignored.
    pub fn parse(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty()),
        )
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        self.hosts.iter().any(|allowed| allowed == host)
    }

    /// Gate a decoded target.
    ///
    /// A target without an extractable host fails with its decode error. When a
    /// host is present it is authorized first, so an unknown host is reported as
    /// such even if the URL itself is also unusable.
    pub fn authorize(&self, target: DecodedTarget) -> Result<TargetUrl, ProxyError> {
        let Some(host) = target.host else {
            return Err(match target.url {
                Err(e) => e,
                Ok(_) => ProxyError::InvalidUrl,
            });
        };

        if !self.is_allowed(&host) {
            tracing::warn!("Rejected target host not in allowlist: {}", host);
            return Err(ProxyError::UnauthorizedHost);
        }

        target.url
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
