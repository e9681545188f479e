// Target decoding: base64 path segment -> absolute URL

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use url::Url;

use crate::proxy::error::ProxyError;

/// Schemes the outbound client can actually speak.
const FORWARDABLE_SCHEMES: &[&str] = &["http", "https"];

/// A validated target.
///
/// The decoded text is what gets forwarded; the parsed form is only used for
/// validation and inspection, since parsing normalizes case, ports and escapes.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetUrl {
    raw: String,
    parsed: Url,
}

impl TargetUrl {
    /// The decoded target exactly as the client encoded it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> &Url {
        &self.parsed
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Result of decoding the `:targeturl` path segment.
///
/// `host` and `url` are independent: a URL can yield a host and still be
/// unusable (e.g. `ftp://api.example.com/`). The host, when present, is what
/// the allowlist is checked against, and that check runs before `url`'s error
/// is surfaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTarget {
    pub host: Option<String>,
    pub url: Result<TargetUrl, ProxyError>,
}

impl DecodedTarget {
    fn rejected(err: ProxyError) -> Self {
        Self {
            host: None,
            url: Err(err),
        }
    }
}

/// Decode a standard (padded) base64 segment into a target.
pub fn decode_target(segment: &str) -> DecodedTarget {
    let bytes = match general_purpose::STANDARD.decode(segment) {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Target segment is not valid base64: {}", e);
            return DecodedTarget::rejected(ProxyError::Decode);
        }
    };

    let Ok(raw) = String::from_utf8(bytes) else {
        return DecodedTarget::rejected(ProxyError::InvalidUrl);
    };

    let parsed = match Url::parse(&raw) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!("Decoded target is not an absolute URL: {}", e);
            return DecodedTarget::rejected(ProxyError::InvalidUrl);
        }
    };

    if parsed.host_str().map_or(true, str::is_empty) {
        return DecodedTarget::rejected(ProxyError::InvalidUrl);
    }
    let Some(host) = literal_authority(&raw) else {
        return DecodedTarget::rejected(ProxyError::InvalidUrl);
    };

    if !FORWARDABLE_SCHEMES.contains(&parsed.scheme()) {
        return DecodedTarget {
            host: Some(host),
            url: Err(ProxyError::InvalidUrl),
        };
    }

    DecodedTarget {
        host: Some(host),
        url: Ok(TargetUrl { raw, parsed }),
    }
}

/// `host[:port]` exactly as written between `scheme://` and the path, without
/// userinfo. Case and explicit default ports are kept.
fn literal_authority(raw: &str) -> Option<String> {
    let (_, rest) = raw.trim().split_once("://")?;
    let end = rest
        .find(|c| matches!(c, '/' | '?' | '#' | '\\'))
        .unwrap_or(rest.len());
    let authority = &rest[..end];
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    (!host.is_empty()).then(|| host.to_string())
}
