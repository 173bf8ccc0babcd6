//! Client address resolution.
//!
//! The first `X-Forwarded-For` entry wins when it parses, otherwise the
//! transport peer address. With a non-empty `trusted_proxies` list the
//! forwarded chain is only honoured when the peer is one of them.

use crate::domain::SecurityConfig;
use axum::{extract::ConnectInfo, http::HeaderMap, http::Request};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::{debug, warn};

/// Used when neither a forwarded header nor a peer address is available.
pub const UNKNOWN_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Resolve the address a request is attributed to.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    config: &SecurityConfig,
) -> IpAddr {
    if config.trust_forwarded_for && peer_may_forward(peer, config) {
        if let Some(ip) = first_forwarded(headers) {
            debug!(extracted_ip = %ip, peer = ?peer, "Using X-Forwarded-For address");
            return ip;
        }
    } else if headers.contains_key("x-forwarded-for") {
        warn!(peer = ?peer, "Ignoring X-Forwarded-For from untrusted source");
    }

    peer.unwrap_or(UNKNOWN_ADDRESS)
}

/// Resolve from a full request, reading the peer from `ConnectInfo`.
pub fn client_ip_of<B>(req: &Request<B>, config: &SecurityConfig) -> IpAddr {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    resolve_client_ip(req.headers(), peer, config)
}

fn peer_may_forward(peer: Option<IpAddr>, config: &SecurityConfig) -> bool {
    if config.trusted_proxies.is_empty() {
        return true;
    }
    peer.is_some_and(|ip| config.trusted_proxies.contains(&ip))
}

fn first_forwarded(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}
