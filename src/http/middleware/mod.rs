//! HTTP middleware.

pub mod subdomain;

pub use subdomain::subdomain_middleware;
