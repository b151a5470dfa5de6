//! Client identification utilities
//!
//! Pulls client identity out of HTTP headers: the originating IP (for rate
//! limiting and session metadata), the user agent, and the bearer token.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Maximum stored user agent length
const USER_AGENT_MAX_LENGTH: usize = 512;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Client metadata captured when a session is created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Socket peer, or the forwarded client behind a trusted proxy
    pub ip: Option<IpAddr>,
    /// User-Agent header, truncated
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }

    /// Rate-limit identity. Clients without a known address share one bucket.
    pub fn rate_limit_id(&self) -> String {
        self.ip_string().unwrap_or_else(|| "unknown".to_string())
    }
}

/// Build [`ClientInfo`] from request headers and the socket peer.
pub fn extract_client_info(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> ClientInfo {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(USER_AGENT_MAX_LENGTH).collect());

    ClientInfo::new(extract_client_ip(headers, peer, trusted_proxies), user_agent)
}

/// Client IP address for a request received from `peer`.
///
/// `X-Forwarded-For` is only read while the hop that appended to it is a
/// trusted proxy. Entries are walked right to left starting at the socket
/// peer; the first untrusted address is the client. Without trusted
/// proxies this is always the socket peer.
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<IpAddr> {
    let mut client = peer?;
    if !trusted_proxies.contains(&client) {
        return Some(client);
    }

    let Some(xff) = headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) else {
        return Some(client);
    };
    for hop in xff.rsplit(',') {
        if !trusted_proxies.contains(&client) {
            break;
        }
        match hop.trim().parse::<IpAddr>() {
            Ok(ip) => client = ip,
            Err(_) => break,
        }
    }
    Some(client)
}

/// Token from an `Authorization: Bearer <token>` header.
///
/// `None` when the header is absent, not valid UTF-8, uses another scheme, or
/// carries an empty token. The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarded_for() {
        let headers = forwarded("10.0.0.1");
        let peer = ip("198.51.100.9");

        assert_eq!(extract_client_ip(&headers, Some(peer), &[]), Some(peer));
        assert_eq!(
            extract_client_ip(&headers, Some(peer), &[ip("203.0.113.1")]),
            Some(peer)
        );
    }

    #[test]
    fn test_trusted_proxy_forwards_client() {
        let headers = forwarded("192.168.1.1, 10.0.0.1");
        let proxy = ip("127.0.0.1");

        // Rightmost entry was appended by the proxy itself
        assert_eq!(
            extract_client_ip(&headers, Some(proxy), &[proxy]),
            Some(ip("10.0.0.1"))
        );
    }

    #[test]
    fn test_trusted_chain_stops_at_first_untrusted_hop() {
        let headers = forwarded("6.6.6.6, 192.168.1.1, 10.0.0.2");
        let proxy = ip("127.0.0.1");
        let trusted = [proxy, ip("10.0.0.2")];

        // A spoofed leftmost entry is never reached
        assert_eq!(
            extract_client_ip(&headers, Some(proxy), &trusted),
            Some(ip("192.168.1.1"))
        );
    }

    #[test]
    fn test_trusted_proxy_with_garbage_forwarded_for() {
        let headers = forwarded("not-an-ip");
        let proxy = ip("127.0.0.1");

        assert_eq!(extract_client_ip(&headers, Some(proxy), &[proxy]), Some(proxy));
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), Some(proxy), &[proxy]),
            Some(proxy)
        );
    }

    #[test]
    fn test_no_peer_means_no_ip() {
        assert_eq!(extract_client_ip(&forwarded("10.0.0.1"), None, &[]), None);
    }

    #[test]
    fn test_extract_client_info() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );

        let info = extract_client_info(&headers, Some(ip("10.1.2.3")), &[]);
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(info.ip_string().as_deref(), Some("10.1.2.3"));
        assert_eq!(info.rate_limit_id(), "10.1.2.3");
    }

    #[test]
    fn test_rate_limit_id_without_ip() {
        assert_eq!(ClientInfo::default().rate_limit_id(), "unknown");
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(extract_bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer    "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
