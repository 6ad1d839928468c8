//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use subdomain_router::config::{SiteConfig, SubdomainConfig, TableConfig};
use subdomain_router::lifecycle::Shutdown;
use subdomain_router::HttpServer;

fn table(routes: &[(&str, &str)]) -> TableConfig {
    TableConfig {
        routes: routes
            .iter()
            .map(|(name, template)| (name.to_string(), template.to_string()))
            .collect(),
    }
}

fn entry(subdomain: Option<&str>, table: &str) -> SubdomainConfig {
    SubdomainConfig {
        subdomain: subdomain.map(str::to_string),
        table: table.to_string(),
    }
}

/// `example.com` with a marketing site on the bare domain and `www`, an API
/// on `api`, and the application as root table.
pub fn site_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.site.domain = "example.com".into();
    config.site.root_table = "application".into();
    config.subdomains = vec![
        entry(None, "marketing"),
        entry(Some("api"), "api"),
        entry(Some("www"), "marketing"),
    ];
    config.tables.insert(
        "marketing".into(),
        table(&[("home", "/"), ("example", "/example/")]),
    );
    config.tables.insert(
        "api".into(),
        table(&[
            ("home", "/"),
            ("example", "/example/"),
            ("view", "/view/"),
            ("item", "/items/{id}/"),
        ]),
    );
    config.tables.insert(
        "application".into(),
        table(&[
            ("example", "/example/"),
            ("view", "/view/"),
            ("application", "/application/"),
        ]),
    );
    config
}

/// [`site_config`] where every other subdomain is served by the application.
pub fn wildcard_site_config() -> SiteConfig {
    let mut config = site_config();
    config.subdomains.push(entry(Some("*"), "application"));
    config
}

pub fn router(config: &SiteConfig) -> Router {
    HttpServer::new(config).unwrap().router()
}

/// Send a GET for `path` to `host` through `router`.
pub async fn get(router: &Router, host: &str, path: &str) -> Response {
    let req = Request::builder()
        .uri(path)
        .header("Host", host)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap()
}

/// Serve `config` on an ephemeral local port.
pub async fn start_server(config: SiteConfig) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config).unwrap();

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, stopped).await.unwrap();
    });
    (addr, shutdown, handle)
}
