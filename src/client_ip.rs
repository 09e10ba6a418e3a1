use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Rate-limit key for the caller.
///
/// Behind a reverse proxy the socket peer is the proxy itself, so with
/// `trust_proxy` the left-most `X-Forwarded-For` entry (or `X-Real-IP`) is
/// used instead. Unparseable header values fall back to the peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(parse_ip);
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_ip);
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.ip().to_string()
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
