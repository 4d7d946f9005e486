//! check-tools Library
//!
//! Website status, domain-to-geolocation and caller-IP lookups behind a
//! small JSON HTTP API. The modules are exposed for integration tests
//! and for embedding the router in another server.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;

// Re-export commonly used types
pub use adapters::inbound::{router, ApiState, HttpServer};
pub use application::LookupService;
pub use config::{load_config, Config};
pub use domain::entities::{GeoLookup, GeoRecord};
pub use domain::errors::{LookupError, UpstreamError};
pub use domain::ports::{DnsResolver, GeoProvider, ReachabilityProbe};
pub use domain::services::GeoFallbackResolver;
