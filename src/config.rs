use crate::adapters::outbound::{
    find_spec, BUILTIN_PROVIDERS, DEFAULT_DNS_TIMEOUT, DEFAULT_DOH_URL, DEFAULT_GEO_USER_AGENT,
    DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_USER_AGENT,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Server settings
    pub listen_addr: String,
    pub debug: bool,

    // DNS-over-HTTPS settings
    pub doh_url: String,
    pub dns_timeout_ms: u64,
    pub dual_stack: bool,

    // Reachability probe settings
    pub check_timeout_secs: u64,
    pub user_agent: String,

    // Geolocation settings
    pub geo_user_agent: String,
    pub geo_providers: Vec<String>,
    pub geo_timeout_ms: Option<u64>,
    pub ipapi_url: String,
    pub ipwho_url: String,
    pub ipapi_com_url: String,
    pub ip_enrich: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            debug: false,
            doh_url: DEFAULT_DOH_URL.to_string(),
            dns_timeout_ms: DEFAULT_DNS_TIMEOUT.as_millis() as u64,
            dual_stack: true,
            check_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            user_agent: DEFAULT_PROBE_USER_AGENT.to_string(),
            geo_user_agent: DEFAULT_GEO_USER_AGENT.to_string(),
            geo_providers: BUILTIN_PROVIDERS
                .iter()
                .map(|spec| spec.name.to_string())
                .collect(),
            geo_timeout_ms: None,
            ipapi_url: builtin_base_url("ipapi.co"),
            ipwho_url: builtin_base_url("ipwho.is"),
            ipapi_com_url: builtin_base_url("ip-api.com"),
            ip_enrich: true,
        }
    }
}

fn builtin_base_url(name: &str) -> String {
    find_spec(name)
        .map(|spec| spec.default_base_url.to_string())
        .unwrap_or_default()
}

impl Config {
    /// Base URL configured for a built-in geo provider.
    pub fn provider_base_url(&self, name: &str) -> Option<&str> {
        match name {
            "ipapi.co" => Some(&self.ipapi_url),
            "ipwho.is" => Some(&self.ipwho_url),
            "ip-api.com" => Some(&self.ipapi_com_url),
            _ => None,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    config_from(|key| std::env::var(key).ok())
}

fn flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(default)
}

fn number(value: Option<String>, default: u64) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Build a Config from any key lookup (the process environment in production).
pub fn config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let listen_addr = var("CHECKTOOLS_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let debug = var("DEBUG").is_some();

    // DNS-over-HTTPS settings
    let doh_url = var("CHECKTOOLS_DOH_URL").unwrap_or(defaults.doh_url);
    let dns_timeout_ms = number(var("CHECKTOOLS_DNS_TIMEOUT_MS"), defaults.dns_timeout_ms);
    let dual_stack = flag(var("CHECKTOOLS_DUAL_STACK"), defaults.dual_stack);

    // Reachability probe settings
    let check_timeout_secs = number(
        var("CHECKTOOLS_CHECK_TIMEOUT_SECS"),
        defaults.check_timeout_secs,
    );
    let user_agent = var("CHECKTOOLS_USER_AGENT").unwrap_or(defaults.user_agent);

    // Geolocation settings
    let geo_user_agent = var("CHECKTOOLS_GEO_USER_AGENT").unwrap_or(defaults.geo_user_agent);

    let geo_providers = var("CHECKTOOLS_GEO_PROVIDERS")
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(defaults.geo_providers);

    let geo_timeout_ms = var("CHECKTOOLS_GEO_TIMEOUT_MS").and_then(|v| v.trim().parse().ok());

    let ipapi_url = var("CHECKTOOLS_IPAPI_URL").unwrap_or(defaults.ipapi_url);
    let ipwho_url = var("CHECKTOOLS_IPWHO_URL").unwrap_or(defaults.ipwho_url);
    let ipapi_com_url = var("CHECKTOOLS_IPAPI_COM_URL").unwrap_or(defaults.ipapi_com_url);

    let ip_enrich = flag(var("CHECKTOOLS_IP_ENRICH"), defaults.ip_enrich);

    Ok(Config {
        listen_addr,
        debug,
        doh_url,
        dns_timeout_ms,
        dual_stack,
        check_timeout_secs,
        user_agent,
        geo_user_agent,
        geo_providers,
        geo_timeout_ms,
        ipapi_url,
        ipwho_url,
        ipapi_com_url,
        ip_enrich,
    })
}
