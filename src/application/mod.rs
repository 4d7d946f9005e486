//! Application layer: use cases orchestrating domain services and ports.

mod lookup_service;

pub use lookup_service::LookupService;
