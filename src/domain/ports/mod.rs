mod dns_resolver;
mod geo_provider;
mod reachability_probe;

pub use dns_resolver::DnsResolver;
pub use geo_provider::GeoProvider;
pub use reachability_probe::ReachabilityProbe;
