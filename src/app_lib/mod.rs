//! Shared client plumbing: the HTTP gateway, configuration and errors.
//!
//! ## Trust boundaries
//!
//! 1. **User client:** carries the bearer credential issued by `/auth/login` and
//!    is the only client whose 401 responses tear the session down.
//! 2. **Admin client:** carries a fixed, statically configured credential pair
//!    (HTTP Basic) for metrics and model management endpoints.
//!
//! Keeping both behind one gateway keeps timeouts and error mapping uniform.
//! Callers must still avoid logging credential material.

pub mod api;
pub mod config;
pub mod errors;

pub use api::{HttpGateway, RawResponse, UnauthorizedEvent, UnauthorizedListener};
pub use config::ClientConfig;
pub use errors::{AppError, ErrorKind};
