//! Subdomain routing for HTTP sites.
//!
//! Selects a URL table per request from the subdomain of its host, and
//! builds absolute URLs for named routes on any subdomain.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod urls;

pub use config::schema::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, Site};
pub use routing::{RoutingResolver, SubdomainContext};
pub use urls::{url_join, ReverseError, ReverseRequest, UrlReverser};
