//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for a compiled site
//! - Wire up middleware (request ID, tracing, timeout, subdomain context)
//! - Bind server to listener and stop on shutdown

use std::collections::HashMap;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SiteConfig;
use crate::http::dispatch::{dispatch, table_router, DispatchState};
use crate::http::middleware::subdomain_middleware;
use crate::http::request::{make_request_span, X_REQUEST_ID};
use crate::lifecycle::{Site, StartupError};

/// HTTP server for a subdomain-routed site.
pub struct HttpServer {
    router: Router,
    site: Site,
}

impl HttpServer {
    /// Compile the site and build its router.
    pub fn new(config: &SiteConfig) -> Result<Self, StartupError> {
        let site = Site::from_config(config)?;
        let router = Self::build_router(config, &site);
        Ok(Self { router, site })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SiteConfig, site: &Site) -> Router {
        let routers: HashMap<_, _> = site
            .tables
            .iter()
            .map(|(id, table)| {
                let router = table_router(id.clone(), table.clone(), site.reverser.clone());
                (id.clone(), router)
            })
            .collect();
        let state = DispatchState::new(routers, site.root_table.clone());

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(middleware::from_fn_with_state(
                site.resolver.clone(),
                subdomain_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| make_request_span(req)))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            domain = self.site.resolver.domain(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn site(&self) -> &Site {
        &self.site
    }
}
