//! Per-request table selection.
//!
//! # Responsibilities
//! - Combine host parsing and registry lookup for one request
//! - Produce the typed [`SubdomainContext`] carried by the request
//!
//! # Design Decisions
//! - The context is computed once per request and stored in the request's
//!   extensions; nothing is shared between requests
//! - `table: None` means "dispatch to the root table", never an error

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::config::SiteSettings;
use crate::routing::host::{normalize_host, parse_subdomain};
use crate::routing::registry::SubdomainRegistry;
use crate::routing::table::TableId;

/// Subdomain and table selected for the request being handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdomainContext {
    /// Parsed subdomain label; `None` for the bare domain.
    pub subdomain: Option<String>,
    /// Registered table; `None` defers to the root table.
    pub table: Option<TableId>,
}

/// Resolves request hosts to a [`SubdomainContext`].
#[derive(Debug, Clone)]
pub struct RoutingResolver {
    domain: String,
    strip_www: bool,
    registry: Arc<SubdomainRegistry>,
}

impl RoutingResolver {
    pub fn new(settings: &SiteSettings, registry: Arc<SubdomainRegistry>) -> Self {
        Self {
            domain: normalize_host(&settings.domain),
            strip_www: settings.remove_www_from_domain,
            registry,
        }
    }

    /// Context for a request carrying `host`.
    pub fn resolve(&self, host: &str) -> SubdomainContext {
        let subdomain = parse_subdomain(host, &self.domain, self.strip_www);
        self.context_for(subdomain)
    }

    /// Context for an already parsed subdomain label.
    pub fn context_for(&self, subdomain: Option<String>) -> SubdomainContext {
        let table = self.registry.resolve(subdomain.as_deref()).cloned();
        tracing::trace!(
            subdomain = subdomain.as_deref().unwrap_or(""),
            table = table.as_ref().map(TableId::as_str).unwrap_or("(root)"),
            "Resolved subdomain"
        );
        SubdomainContext { subdomain, table }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn registry(&self) -> &SubdomainRegistry {
        &self.registry
    }
}

impl<S> FromRequestParts<S> for SubdomainContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SubdomainContext>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Subdomain routing middleware is not installed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::registry::SubdomainKey;

    fn resolver(strip_www: bool) -> RoutingResolver {
        let mut registry = SubdomainRegistry::new();
        registry.insert(SubdomainKey::Default, "marketing".into()).unwrap();
        registry.insert(SubdomainKey::Label("api".into()), "api".into()).unwrap();
        registry.insert(SubdomainKey::Label("www".into()), "marketing".into()).unwrap();

        let settings = SiteSettings {
            domain: "Example.com".into(),
            remove_www_from_domain: strip_www,
            ..Default::default()
        };
        RoutingResolver::new(&settings, Arc::new(registry))
    }

    #[test]
    fn test_url_routing() {
        let resolver = resolver(false);

        let ctx = resolver.resolve("example.com");
        assert_eq!(ctx.subdomain, None);
        assert_eq!(ctx.table, Some(TableId::from("marketing")));

        let ctx = resolver.resolve("www.example.com");
        assert_eq!(ctx.subdomain.as_deref(), Some("www"));
        assert_eq!(ctx.table, Some(TableId::from("marketing")));

        let ctx = resolver.resolve("api.example.com:8080");
        assert_eq!(ctx.subdomain.as_deref(), Some("api"));
        assert_eq!(ctx.table, Some(TableId::from("api")));

        // Falls through to the root table.
        let ctx = resolver.resolve("subdomain.example.com");
        assert_eq!(ctx.subdomain.as_deref(), Some("subdomain"));
        assert_eq!(ctx.table, None);
    }

    #[test]
    fn test_stripped_www_uses_default_entry() {
        let ctx = resolver(true).resolve("WWW.example.com");
        assert_eq!(ctx, SubdomainContext {
            subdomain: None,
            table: Some(TableId::from("marketing")),
        });
    }

    #[test]
    fn test_misconfigured_host_is_bare_domain() {
        let ctx = resolver(true).resolve("example.org");
        assert_eq!(ctx.subdomain, None);
        assert_eq!(ctx.table, Some(TableId::from("marketing")));
    }
}
