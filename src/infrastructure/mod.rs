//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the record source boundary and wires up services.

pub mod di;
pub mod traits;

pub use di::ServiceContainer;
