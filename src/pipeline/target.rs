use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use url::{Host, Url};

use crate::error::{ScrapeError, ScrapeResult};

static SCHEME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme regex is valid")
});

/// Parse `raw` as a target URL, defaulting the scheme to `http` and
/// rejecting hosts that name or resolve to this machine. Runs before any
/// request is sent to the target.
pub async fn validate_target(raw: &str) -> ScrapeResult<Url> {
    let url = normalize(raw)?;
    ensure_public(&url).await?;
    Ok(url)
}

/// Parse `raw` as an http(s) URL with a host, prefixing `http://` when no
/// scheme is given.
pub fn normalize(raw: &str) -> ScrapeResult<Url> {
    let raw = raw.trim();
    let candidate = if SCHEME_RE.is_match(raw) {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&candidate).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScrapeError::InvalidUrl(format!(
                "unsupported scheme '{other}'"
            )))
        }
    }

    if url.host().is_none() {
        return Err(ScrapeError::InvalidUrl("URL has no host".into()));
    }

    Ok(url)
}

/// Lexical check first, then a DNS lookup of the host. Any loopback
/// address among the results rejects the URL.
pub async fn ensure_public(url: &Url) -> ScrapeResult<()> {
    ensure_not_loopback(url)?;
    ensure_resolves_public(url).await
}

pub fn ensure_not_loopback(url: &Url) -> ScrapeResult<()> {
    if is_loopback(url) {
        return Err(forbidden(url));
    }
    Ok(())
}

/// Resolve the host and reject it if any address is loopback. IP literals
/// are checked without a lookup.
pub async fn ensure_resolves_public(url: &Url) -> ScrapeResult<()> {
    let addrs = match url.host() {
        Some(Host::Domain(domain)) => {
            let port = url.port_or_known_default().unwrap_or(80);
            tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| {
                    tracing::warn!(error = ?e, host = domain, "Could not resolve host");
                    ScrapeError::Resolve {
                        host: domain.to_string(),
                        source: e,
                    }
                })?
                .map(|addr| addr.ip())
                .collect::<Vec<_>>()
        }
        Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
        Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
        None => return Err(ScrapeError::InvalidUrl("URL has no host".into())),
    };

    if addrs.iter().copied().any(is_loopback_ip) {
        tracing::warn!(url = %url, "Host resolves to a loopback address");
        return Err(forbidden(url));
    }
    Ok(())
}

/// Returns `true` if the URL's host names this machine.
pub fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_loopback_v4(ip),
        Some(Host::Ipv6(ip)) => is_loopback_v6(ip),
        None => false,
    }
}

pub fn is_loopback_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_loopback_v4(v4),
        IpAddr::V6(v6) => is_loopback_v6(v6),
    }
}

fn is_loopback_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_unspecified()
}

fn is_loopback_v6(ip: Ipv6Addr) -> bool {
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.to_ipv4_mapped().map(is_loopback_v4).unwrap_or(false)
}

fn forbidden(url: &Url) -> ScrapeError {
    ScrapeError::ForbiddenTarget(url.host_str().unwrap_or_default().to_string())
}
