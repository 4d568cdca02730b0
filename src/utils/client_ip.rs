//! Client identity extraction for rate limiting.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Identity used when no address information is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolves the network identity of the client behind a request.
///
/// When `behind_proxy` is set, proxy headers take precedence:
/// 1. First entry of `X-Forwarded-For`
/// 2. `X-Real-IP`
/// 3. Socket peer address
///
/// Otherwise only the socket peer address is used, since the headers are
/// client-controlled. Falls back to [`UNKNOWN_CLIENT`].
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(client_identity(&headers, None, true), "203.0.113.7");
/// ```
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_str(headers, X_FORWARDED_FOR)
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        if let Some(ip) = header_str(headers, X_REAL_IP).map(str::trim)
            && !ip.is_empty()
        {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
