//! Subdomain routing middleware.
//! Attaches the request's [`SubdomainContext`] before dispatch.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::request_host;
use crate::routing::{RoutingResolver, SubdomainContext, TableId};

pub async fn subdomain_middleware(
    State(resolver): State<Arc<RoutingResolver>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let context: SubdomainContext = match request_host(&req) {
        Some(host) => resolver.resolve(host),
        None => {
            tracing::warn!("Request carries no host; serving it as the bare domain");
            resolver.context_for(None)
        }
    };

    tracing::debug!(
        subdomain = context.subdomain.as_deref().unwrap_or(""),
        table = context.table.as_ref().map(TableId::as_str).unwrap_or("(root)"),
        "Subdomain resolved"
    );

    req.extensions_mut().insert(context);
    next.run(req).await
}
