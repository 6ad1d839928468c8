//! Host header → subdomain label.
//!
//! # Responsibilities
//! - Normalize the Host header (port, case, trailing dot)
//! - Strip the base domain on a label boundary
//! - Apply the leading-`www` policy
//!
//! # Design Decisions
//! - A host outside the base domain is a deployment problem, not a client
//!   error: it is logged and the request is served as the bare domain

use thiserror::Error;

use crate::observability::metrics;

const WWW_PREFIX: &str = "www.";
const WWW_LABEL: &str = "www";

/// Errors raised while parsing a host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host `{host}` is not within base domain `{domain}`")]
    MisconfiguredHost { host: String, domain: String },
}

/// Normalize a Host header value: drop the port, lower-case, drop a
/// trailing root dot.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = if host.starts_with('[') {
        // IPv6 literal, e.g. [::1]:8080
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        host.split(':').next().unwrap_or(host)
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Extract the subdomain label of `host` relative to `domain`.
///
/// Returns `Ok(None)` for the bare domain (and for `www` when `strip_www`
/// is set) and [`HostError::MisconfiguredHost`] when `host` is not within
/// `domain`.
pub fn try_parse_subdomain(
    host: &str,
    domain: &str,
    strip_www: bool,
) -> Result<Option<String>, HostError> {
    let host = normalize_host(host);
    let domain = normalize_host(domain);

    if host == domain {
        return Ok(None);
    }

    let label = host
        .strip_suffix(domain.as_str())
        .and_then(|prefix| prefix.strip_suffix('.'))
        .filter(|label| !label.is_empty() && !domain.is_empty())
        .ok_or_else(|| HostError::MisconfiguredHost {
            host: host.clone(),
            domain: domain.clone(),
        })?;

    Ok(apply_www_policy(label, strip_www))
}

/// Like [`try_parse_subdomain`], but a misconfigured host degrades to
/// "no subdomain" after logging a warning.
pub fn parse_subdomain(host: &str, domain: &str, strip_www: bool) -> Option<String> {
    match try_parse_subdomain(host, domain, strip_www) {
        Ok(label) => label,
        Err(err) => {
            tracing::warn!(
                error = %err,
                "Unable to determine subdomain; serving request as the bare domain"
            );
            metrics::record_misconfigured_host();
            None
        }
    }
}

fn apply_www_policy(label: &str, strip_www: bool) -> Option<String> {
    if !strip_www {
        return Some(label.to_string());
    }
    if label == WWW_LABEL {
        return None;
    }
    // Only the first `www.` goes.
    Some(label.strip_prefix(WWW_PREFIX).unwrap_or(label).to_string())
}
