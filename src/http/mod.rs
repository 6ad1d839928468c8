//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, host, tracing span)
//!     → middleware/subdomain.rs (attach SubdomainContext)
//!     → dispatch.rs (run the selected table's router, append slash)
//!     → response.rs (JSON bodies, error mapping)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::RESERVED_PREFIX;
pub use request::X_REQUEST_ID;
pub use response::{ReverseResponse, RouteResponse};
pub use server::HttpServer;
