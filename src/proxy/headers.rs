// Outbound header filtering

use axum::http::{header, HeaderMap, HeaderName};

/// Headers never relayed to the target.
///
/// They identify the calling browser or the proxy's own hostname, and `Host`
/// would collide with the target's virtual-host routing.
pub const STRIPPED_HEADERS: [HeaderName; 4] = [
    header::ORIGIN,
    header::HOST,
    header::REFERER,
    header::USER_AGENT,
];

/// Copy of `inbound` without [`STRIPPED_HEADERS`]. Every other header,
/// repeated values included, is kept as is and nothing is added.
pub fn sanitize_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = inbound.clone();
    for name in &STRIPPED_HEADERS {
        outbound.remove(name);
    }
    outbound
}
