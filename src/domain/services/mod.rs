mod address_selector;
mod geo_fallback;

pub use address_selector::AddressSelector;
pub use geo_fallback::GeoFallbackResolver;
