//! Per-table dispatch.
//!
//! # Responsibilities
//! - Build one axum router per URL table
//! - Hand each request to the router of its selected table
//! - Redirect `/path` to `/path/` when only the latter exists
//! - Serve the reverse-URL endpoint of every table
//!
//! # Design Decisions
//! - Route templates are axum paths; axum does the path matching
//! - Requests whose subdomain has no table go to the root table
//! - Redirect locations are relative, so the client keeps the host it used

use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower::ServiceExt;

use crate::http::response::{ReverseResponse, RouteResponse};
use crate::observability::metrics;
use crate::routing::{RouteTable, SubdomainContext, TableId};
use crate::urls::{ReverseError, ReverseRequest, UrlReverser};

/// Paths under this prefix belong to the router itself.
pub const RESERVED_PREFIX: &str = "/_reverse/";

#[derive(Clone)]
struct TableState {
    table: TableId,
    /// Routes actually registered with the router.
    routes: Arc<RouteTable>,
    reverser: Arc<UrlReverser>,
}

/// Build the router serving one URL table.
pub fn table_router(table: TableId, routes: Arc<RouteTable>, reverser: Arc<UrlReverser>) -> Router {
    let mut router = Router::new();
    let mut shapes = HashSet::new();
    let mut registered = RouteTable::new();

    for (name, template) in routes.routes() {
        if template.as_str().starts_with(RESERVED_PREFIX) || !shapes.insert(template.shape()) {
            tracing::warn!(
                table = %table,
                route = name,
                template = %template,
                "Skipping route that cannot be dispatched"
            );
            continue;
        }

        registered.insert(name, template.clone());
        let route = name.to_string();
        router = if template.has_params() {
            router.route(
                template.as_str(),
                get(
                    move |State(state): State<TableState>,
                          context: SubdomainContext,
                          Path(params): Path<BTreeMap<String, String>>| {
                        describe_route(state, route.clone(), context, params)
                    },
                ),
            )
        } else {
            router.route(
                template.as_str(),
                get(move |State(state): State<TableState>, context: SubdomainContext| {
                    describe_route(state, route.clone(), context, BTreeMap::new())
                }),
            )
        };
    }

    router
        .route(&format!("{}{{route}}", RESERVED_PREFIX), get(reverse_handler))
        .fallback(append_slash)
        .with_state(TableState {
            table,
            routes: Arc::new(registered),
            reverser,
        })
}

/// Routers of all tables plus the table serving unregistered subdomains.
#[derive(Clone)]
pub struct DispatchState {
    routers: Arc<HashMap<TableId, Router>>,
    root_table: TableId,
}

impl DispatchState {
    pub fn new(routers: HashMap<TableId, Router>, root_table: TableId) -> Self {
        Self {
            routers: Arc::new(routers),
            root_table,
        }
    }
}

/// Run the request through the router of its table.
pub async fn dispatch(State(state): State<DispatchState>, req: Request<Body>) -> Response {
    let table = req
        .extensions()
        .get::<SubdomainContext>()
        .and_then(|context| context.table.clone())
        .unwrap_or_else(|| state.root_table.clone());

    let Some(router) = state.routers.get(&table) else {
        tracing::error!(table = %table, "No router for URL table");
        return (StatusCode::NOT_FOUND, "No URL table serves this host").into_response();
    };

    metrics::record_dispatch(table.as_str());
    router
        .clone()
        .oneshot(req)
        .await
        .unwrap_or_else(|never: Infallible| match never {})
}

async fn describe_route(
    state: TableState,
    route: String,
    context: SubdomainContext,
    params: BTreeMap<String, String>,
) -> Response {
    let request = params.iter().fold(
        ReverseRequest::new(route.as_str()).table(state.table.clone()),
        |request, (name, value)| request.kwarg(name.as_str(), value.as_str()),
    );

    match state.reverser.reverse_for(&request, &context) {
        Ok(url) => Json(RouteResponse {
            table: state.table,
            route,
            subdomain: context.subdomain,
            url,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// `GET /_reverse/{route}?subdomain=&table=&scheme=&args=a,b&name=value`
///
/// Reverses `route` with the request's context as the default subdomain.
/// An empty `subdomain` asks for the bare domain; query parameters other
/// than the four above become keyword arguments.
async fn reverse_handler(
    State(state): State<TableState>,
    context: SubdomainContext,
    Path(route): Path<String>,
    Query(mut query): Query<BTreeMap<String, String>>,
) -> Result<Json<ReverseResponse>, ReverseError> {
    let mut request = ReverseRequest::new(route);
    if let Some(subdomain) = query.remove("subdomain") {
        request = request.subdomain(subdomain);
    }
    if let Some(table) = query.remove("table") {
        request = request.table(table);
    }
    if let Some(scheme) = query.remove("scheme") {
        request = request.scheme(scheme);
    }
    if let Some(args) = query.remove("args") {
        for arg in args.split(',').filter(|arg| !arg.is_empty()) {
            request = request.arg(arg);
        }
    }
    for (name, value) in query {
        request = request.kwarg(name, value);
    }

    let url = state.reverser.reverse_for(&request, &context)?;
    Ok(Json(ReverseResponse { url }))
}

async fn append_slash(State(state): State<TableState>, req: Request<Body>) -> Response {
    let uri = req.uri();
    let path = uri.path();
    let method = req.method();

    if (*method == Method::GET || *method == Method::HEAD) && !path.ends_with('/') {
        let slashed = format!("{}/", path);
        if state.routes.has_path(&slashed) {
            let location = match uri.query() {
                Some(query) => format!("{}?{}", slashed, query),
                None => slashed,
            };
            tracing::debug!(table = %state.table, location = %location, "Appending slash");
            metrics::record_append_slash_redirect(state.table.as_str());
            return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response();
        }
    }

    (StatusCode::NOT_FOUND, "No route matches this path").into_response()
}
