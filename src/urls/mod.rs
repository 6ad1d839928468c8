//! URL construction.
//!
//! # Data Flow
//! ```text
//! ReverseRequest (+ SubdomainContext of the current request, if any)
//!     → reverse.rs (pick table and subdomain, resolve route path)
//!     → join.rs (scheme://host/path)
//!     → absolute URL
//! ```

pub mod join;
pub mod reverse;

pub use join::url_join;
pub use reverse::{ReverseError, ReverseRequest, UrlReverser};
