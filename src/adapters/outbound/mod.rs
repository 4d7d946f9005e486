mod doh_resolver;
mod http_geo_provider;
mod http_probe;

pub use doh_resolver::{DohResolver, DEFAULT_DNS_TIMEOUT, DEFAULT_DOH_URL};
pub use http_geo_provider::{
    find_spec, HttpGeoProvider, ProviderSpec, BUILTIN_PROVIDERS, DEFAULT_GEO_USER_AGENT,
};
pub use http_probe::{HttpReachabilityProbe, DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_USER_AGENT};
