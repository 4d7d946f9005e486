//! Adapters: inbound (HTTP API) and outbound (DoH, GeoIP APIs, probe).

pub mod inbound;
pub mod outbound;
