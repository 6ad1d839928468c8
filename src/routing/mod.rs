//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → host.rs (subdomain label, www policy)
//!     → registry.rs (label → table id, wildcard fallback)
//!     → resolver.rs (SubdomainContext attached to the request)
//!     → dispatcher runs the selected table (root table when unregistered)
//!
//! Table Compilation (at startup):
//!     TableConfig{}
//!     → matcher.rs (parse path templates)
//!     → table.rs (RouteTable, UrlTables)
//!     → Freeze behind Arc
//! ```
//!
//! # Design Decisions
//! - Registry and tables compiled at startup, immutable at runtime
//! - Host matching is case-insensitive, path matching is case-sensitive
//! - Deterministic: same host always selects the same table

pub mod host;
pub mod matcher;
pub mod registry;
pub mod resolver;
pub mod table;

pub use host::{normalize_host, parse_subdomain, try_parse_subdomain, HostError};
pub use matcher::{PathTemplate, TemplateError};
pub use registry::{RegistryError, SubdomainKey, SubdomainRegistry, WILDCARD};
pub use resolver::{RoutingResolver, SubdomainContext};
pub use table::{RouteArgs, RouteTable, TableId, UrlTable, UrlTables};
