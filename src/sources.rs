//! Acquisition paths for registry data

pub mod program;
pub mod server;

use crate::error::Error;
use crate::response::Response;

/// A way of obtaining registry data for a resource.
///
/// Implementations are stateless per query; a caller chains several of them
/// and keeps the first valid [`Response`]. The `Display` form is the name
/// used when reporting on the source.
pub trait Source: std::fmt::Display {
    fn query(&self, resource: &str) -> Result<Response, Error>;
}
