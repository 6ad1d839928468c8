//! Reverse URL resolution.
//!
//! # Responsibilities
//! - Pick the URL table for a named route (explicit table, explicit
//!   subdomain, request context, or the bare-domain entry)
//! - Pick the subdomain the URL is built for
//! - Resolve the route's path and join scheme + host + path
//!
//! # Design Decisions
//! - An explicit subdomain always overrides the request context
//! - Explicit subdomain and explicit table together are rejected, never
//!   resolved by precedence
//! - Every failure is returned to the caller; there is no fallback URL

use std::sync::Arc;

use thiserror::Error;

use crate::config::SiteSettings;
use crate::observability::metrics;
use crate::routing::host::normalize_host;
use crate::routing::registry::SubdomainRegistry;
use crate::routing::resolver::SubdomainContext;
use crate::routing::table::{RouteArgs, TableId, UrlTables};
use crate::urls::join::url_join;

/// Errors surfaced by [`UrlReverser::reverse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReverseError {
    /// The request is malformed or combines arguments that cannot be used together.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No table could be chosen, or the route doesn't resolve in it.
    #[error("no URL for route `{route}`: {reason}")]
    NoMatchingRoute { route: String, reason: String },
}

impl ReverseError {
    /// Short, stable name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NoMatchingRoute { .. } => "no_matching_route",
        }
    }

    fn no_match(route: &str, reason: impl Into<String>) -> Self {
        Self::NoMatchingRoute {
            route: route.to_string(),
            reason: reason.into(),
        }
    }
}

/// A named route to turn into an absolute URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseRequest {
    route: String,
    args: RouteArgs,
    /// `Some(None)` asks explicitly for the bare domain.
    subdomain: Option<Option<String>>,
    table: Option<TableId>,
    scheme: Option<String>,
}

impl ReverseRequest {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            ..Default::default()
        }
    }

    /// Build the URL for `label`. An empty label means the bare domain.
    pub fn subdomain(mut self, label: impl Into<String>) -> Self {
        let label = label.into().trim().to_ascii_lowercase();
        self.subdomain = Some(if label.is_empty() { None } else { Some(label) });
        self
    }

    /// Build the URL for the bare domain, ignoring the request context.
    pub fn bare_domain(mut self) -> Self {
        self.subdomain = Some(None);
        self
    }

    /// Resolve the route in `table` instead of the subdomain's table.
    pub fn table(mut self, table: impl Into<TableId>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.keyword.insert(name.into(), value.into());
        self
    }

    pub fn route(&self) -> &str {
        &self.route
    }
}

/// Builds absolute URLs for named routes.
#[derive(Debug, Clone)]
pub struct UrlReverser {
    domain: String,
    default_scheme: String,
    registry: Arc<SubdomainRegistry>,
    tables: Arc<UrlTables>,
}

impl UrlReverser {
    pub fn new(
        settings: &SiteSettings,
        registry: Arc<SubdomainRegistry>,
        tables: Arc<UrlTables>,
    ) -> Self {
        Self {
            domain: normalize_host(&settings.domain),
            default_scheme: settings.default_url_scheme.clone(),
            registry,
            tables,
        }
    }

    /// Absolute URL for `request`.
    ///
    /// `context` is the subdomain context of the request being handled, if
    /// any; it supplies the subdomain when the request names neither a
    /// subdomain nor a table.
    pub fn reverse(
        &self,
        request: &ReverseRequest,
        context: Option<&SubdomainContext>,
    ) -> Result<String, ReverseError> {
        let result = self.try_reverse(request, context);
        if let Err(err) = &result {
            tracing::debug!(route = %request.route, error = %err, "Reverse URL lookup failed");
            metrics::record_reverse_failure(err.kind());
        }
        result
    }

    /// [`reverse`](Self::reverse) on behalf of the request owning `context`.
    pub fn reverse_for(
        &self,
        request: &ReverseRequest,
        context: &SubdomainContext,
    ) -> Result<String, ReverseError> {
        self.reverse(request, Some(context))
    }

    fn try_reverse(
        &self,
        request: &ReverseRequest,
        context: Option<&SubdomainContext>,
    ) -> Result<String, ReverseError> {
        if request.subdomain.is_some() && request.table.is_some() {
            return Err(ReverseError::InvalidArgument(
                "`subdomain` and `table` are mutually exclusive".to_string(),
            ));
        }
        if request.args.is_mixed() {
            return Err(ReverseError::InvalidArgument(
                "positional and keyword arguments cannot be mixed".to_string(),
            ));
        }
        if let Some(Some(label)) = &request.subdomain {
            if !is_subdomain_label(label) {
                return Err(ReverseError::InvalidArgument(format!(
                    "`{}` is not a valid subdomain",
                    label
                )));
            }
        }
        if let Some(scheme) = &request.scheme {
            if !matches!(scheme.as_str(), "http" | "https") {
                return Err(ReverseError::InvalidArgument(format!(
                    "scheme `{}` is not supported",
                    scheme
                )));
            }
        }

        let table_id = self.effective_table(request, context)?;
        let subdomain = match (&request.subdomain, context) {
            (Some(explicit), _) => explicit.as_deref(),
            (None, Some(context)) => context.subdomain.as_deref(),
            (None, None) => None,
        };

        let table = self.tables.get(table_id).ok_or_else(|| {
            ReverseError::no_match(&request.route, format!("URL table `{}` is not defined", table_id))
        })?;
        let path = table.resolve_path(&request.route, &request.args).ok_or_else(|| {
            ReverseError::no_match(
                &request.route,
                format!("no route with these arguments in URL table `{}`", table_id),
            )
        })?;

        let scheme = request.scheme.as_deref().unwrap_or(&self.default_scheme);
        Ok(url_join(&self.host_for(subdomain), scheme, Some(&path)))
    }

    fn effective_table<'a>(
        &'a self,
        request: &'a ReverseRequest,
        context: Option<&SubdomainContext>,
    ) -> Result<&'a TableId, ReverseError> {
        if let Some(table) = &request.table {
            return Ok(table);
        }

        let label = match (&request.subdomain, context) {
            (Some(explicit), _) => explicit.as_deref(),
            (None, Some(context)) => context.subdomain.as_deref(),
            (None, None) => {
                return self.registry.default_table().ok_or_else(|| {
                    ReverseError::no_match(&request.route, "no bare-domain URL table is registered")
                });
            }
        };

        self.registry.resolve(label).ok_or_else(|| {
            ReverseError::no_match(
                &request.route,
                format!("subdomain `{}` has no URL table", label.unwrap_or("")),
            )
        })
    }

    /// Host for `subdomain` under the base domain.
    pub fn host_for(&self, subdomain: Option<&str>) -> String {
        match subdomain {
            Some(label) => format!("{}.{}", label, self.domain),
            None => self.domain.clone(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn default_scheme(&self) -> &str {
        &self.default_scheme
    }
}

/// Dot-separated DNS labels of letters, digits and hyphens.
fn is_subdomain_label(label: &str) -> bool {
    label.split('.').all(|part| {
        !part.is_empty()
            && !part.starts_with('-')
            && !part.ends_with('-')
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::registry::SubdomainKey;
    use crate::routing::table::RouteTable;

    fn reverser(wildcard: bool) -> UrlReverser {
        let marketing = RouteTable::new()
            .route("home", "/")
            .and_then(|t| t.route("example", "/example/"))
            .unwrap();
        let api = RouteTable::new()
            .route("home", "/")
            .and_then(|t| t.route("view", "/view/"))
            .and_then(|t| t.route("item", "/items/{id}/"))
            .unwrap();

        let mut tables = UrlTables::new();
        tables.insert("marketing", Arc::new(marketing));
        tables.insert("api", Arc::new(api));

        let mut registry = SubdomainRegistry::new();
        registry.insert(SubdomainKey::Default, "marketing".into()).unwrap();
        registry.insert(SubdomainKey::Label("api".into()), "api".into()).unwrap();
        registry.insert(SubdomainKey::Label("www".into()), "marketing".into()).unwrap();
        registry.insert(SubdomainKey::Label("ghost".into()), "missing".into()).unwrap();
        if wildcard {
            registry.insert(SubdomainKey::Wildcard, "marketing".into()).unwrap();
        }

        let settings = SiteSettings {
            domain: "example.com".into(),
            ..Default::default()
        };
        UrlReverser::new(&settings, Arc::new(registry), Arc::new(tables))
    }

    fn context(subdomain: Option<&str>) -> SubdomainContext {
        SubdomainContext {
            subdomain: subdomain.map(String::from),
            table: None,
        }
    }

    #[test]
    fn test_implicit_reverse() {
        let url = reverser(false).reverse(&ReverseRequest::new("home"), None);
        assert_eq!(url.as_deref(), Ok("http://example.com/"));
    }

    #[test]
    fn test_explicit_reverse() {
        let reverser = reverser(false);
        let home = ReverseRequest::new("home").subdomain("api");
        assert_eq!(reverser.reverse(&home, None).as_deref(), Ok("http://api.example.com/"));

        let view = ReverseRequest::new("view").subdomain("api");
        assert_eq!(
            reverser.reverse(&view, None).as_deref(),
            Ok("http://api.example.com/view/")
        );
    }

    #[test]
    fn test_wildcard_reverse() {
        let reverser = reverser(true);
        let request = ReverseRequest::new("home").subdomain("wildcard");
        assert_eq!(
            reverser.reverse(&request, None).as_deref(),
            Ok("http://wildcard.example.com/")
        );

        let request = ReverseRequest::new("example").subdomain("wildcard");
        assert_eq!(
            reverser.reverse(&request, None).as_deref(),
            Ok("http://wildcard.example.com/example/")
        );
    }

    #[test]
    fn test_unregistered_subdomain_without_wildcard() {
        let request = ReverseRequest::new("home").subdomain("wildcard");
        assert!(matches!(
            reverser(false).reverse(&request, None),
            Err(ReverseError::NoMatchingRoute { .. })
        ));
    }

    #[test]
    fn test_reverse_subdomain_mismatch() {
        assert!(matches!(
            reverser(false).reverse(&ReverseRequest::new("view"), None),
            Err(ReverseError::NoMatchingRoute { .. })
        ));
    }

    #[test]
    fn test_subdomain_and_table_are_exclusive() {
        let request = ReverseRequest::new("x").subdomain("a").table("api");
        assert_eq!(
            reverser(false).reverse(&request, None).unwrap_err().kind(),
            "invalid_argument"
        );

        let request = ReverseRequest::new("home").bare_domain().table("does-not-exist");
        assert!(matches!(
            reverser(false).reverse(&request, None),
            Err(ReverseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_context_supplies_subdomain() {
        let reverser = reverser(false);
        let ctx = context(Some("api"));
        assert_eq!(
            reverser.reverse(&ReverseRequest::new("view"), Some(&ctx)).as_deref(),
            Ok("http://api.example.com/view/")
        );

        let ctx = context(Some("www"));
        assert_eq!(
            reverser.reverse(&ReverseRequest::new("home"), Some(&ctx)).as_deref(),
            Ok("http://www.example.com/")
        );

        let ctx = context(None);
        assert_eq!(
            reverser.reverse(&ReverseRequest::new("home"), Some(&ctx)).as_deref(),
            Ok("http://example.com/")
        );
    }

    #[test]
    fn test_unregistered_context_fails() {
        let ctx = context(Some("unknown"));
        assert!(matches!(
            reverser(false).reverse(&ReverseRequest::new("home"), Some(&ctx)),
            Err(ReverseError::NoMatchingRoute { .. })
        ));
    }

    #[test]
    fn test_explicit_subdomain_overrides_context() {
        let reverser = reverser(false);
        let ctx = context(Some("www"));

        let request = ReverseRequest::new("view").subdomain("api");
        assert_eq!(
            reverser.reverse(&request, Some(&ctx)).as_deref(),
            Ok("http://api.example.com/view/")
        );

        let request = ReverseRequest::new("home").bare_domain();
        assert_eq!(
            reverser.reverse(&request, Some(&ctx)).as_deref(),
            Ok("http://example.com/")
        );
    }

    #[test]
    fn test_explicit_table_keeps_context_subdomain() {
        let ctx = context(Some("tenant"));
        let request = ReverseRequest::new("view").table("api");
        assert_eq!(
            reverser(false).reverse(&request, Some(&ctx)).as_deref(),
            Ok("http://tenant.example.com/view/")
        );

        let request = ReverseRequest::new("view").table("api");
        assert_eq!(
            reverser(false).reverse(&request, None).as_deref(),
            Ok("http://example.com/view/")
        );
    }

    #[test]
    fn test_arguments_and_scheme() {
        let reverser = reverser(false);
        let request = ReverseRequest::new("item").subdomain("api").arg("7").scheme("https");
        assert_eq!(
            reverser.reverse(&request, None).as_deref(),
            Ok("https://api.example.com/items/7/")
        );

        let request = ReverseRequest::new("item").subdomain("api").kwarg("id", "7");
        assert_eq!(
            reverser.reverse(&request, None).as_deref(),
            Ok("http://api.example.com/items/7/")
        );

        let request = ReverseRequest::new("item").subdomain("api").arg("7").kwarg("id", "7");
        assert!(matches!(
            reverser.reverse(&request, None),
            Err(ReverseError::InvalidArgument(_))
        ));

        let request = ReverseRequest::new("item").subdomain("api");
        assert!(matches!(
            reverser.reverse(&request, None),
            Err(ReverseError::NoMatchingRoute { .. })
        ));
    }

    #[test]
    fn test_arguments_are_encoded() {
        let request = ReverseRequest::new("item").subdomain("api").arg("a b%");
        assert_eq!(
            reverser(false).reverse(&request, None).as_deref(),
            Ok("http://api.example.com/items/a%20b%25/")
        );
    }

    #[test]
    fn test_rejects_malformed_subdomain_and_scheme() {
        let reverser = reverser(true);
        for label in ["evil.com/", "a b", "-api", "api..x", "user@host"] {
            let request = ReverseRequest::new("home").subdomain(label);
            assert!(
                matches!(reverser.reverse(&request, None), Err(ReverseError::InvalidArgument(_))),
                "{}",
                label
            );
        }

        let request = ReverseRequest::new("home").subdomain("api").scheme("javascript");
        assert!(matches!(
            reverser.reverse(&request, None),
            Err(ReverseError::InvalidArgument(_))
        ));

        // Multi-label subdomains are still accepted.
        let request = ReverseRequest::new("home").subdomain("sub.www");
        assert_eq!(
            reverser.reverse(&request, None).as_deref(),
            Ok("http://sub.www.example.com/")
        );
    }

    #[test]
    fn test_registered_table_missing_from_tables() {
        let request = ReverseRequest::new("home").subdomain("ghost");
        let err = reverser(false).reverse(&request, None).unwrap_err();
        assert_eq!(
            err,
            ReverseError::NoMatchingRoute {
                route: "home".into(),
                reason: "URL table `missing` is not defined".into(),
            }
        );
    }
}
