//! HTTP GeoIP Providers
//!
//! Implements GeoProvider over public JSON geolocation APIs. Each API is
//! described by a `ProviderSpec` row: where to send the request, how long
//! to wait, how to tell success from an in-band failure, and how to map
//! its fields onto `GeoRecord`.

use crate::domain::entities::GeoRecord;
use crate::domain::errors::UpstreamError;
use crate::domain::ports::GeoProvider;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;

/// Default client identifier sent to geolocation APIs.
pub const DEFAULT_GEO_USER_AGENT: &str = "CheckTools/1.0";

/// Declarative description of one geolocation API.
pub struct ProviderSpec {
    pub name: &'static str,
    pub default_base_url: &'static str,
    /// Path appended to the base URL; `{ip}` is substituted
    pub path_template: &'static str,
    pub timeout: Duration,
    /// In-band success flag check, run after a 2xx response
    pub accepts: fn(&Value) -> bool,
    pub normalize: fn(Value) -> Result<GeoRecord, serde_json::Error>,
}

/// Built-in providers in default priority order.
pub static BUILTIN_PROVIDERS: [ProviderSpec; 3] = [
    ProviderSpec {
        name: "ipapi.co",
        default_base_url: "https://ipapi.co",
        path_template: "/{ip}/json/",
        timeout: Duration::from_secs(5),
        accepts: ipapi_co_accepts,
        normalize: ipapi_co_normalize,
    },
    ProviderSpec {
        name: "ipwho.is",
        default_base_url: "https://ipwho.is",
        path_template: "/{ip}",
        timeout: Duration::from_secs(5),
        accepts: ipwho_is_accepts,
        normalize: ipwho_is_normalize,
    },
    ProviderSpec {
        name: "ip-api.com",
        default_base_url: "http://ip-api.com",
        path_template: "/json/{ip}",
        timeout: Duration::from_secs(5),
        accepts: ip_api_com_accepts,
        normalize: ip_api_com_normalize,
    },
];

/// Look up a built-in provider by name (case-insensitive).
pub fn find_spec(name: &str) -> Option<&'static ProviderSpec> {
    BUILTIN_PROVIDERS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name.trim()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Best-effort human reason from a rejected body.
fn rejection_reason(body: &Value) -> String {
    ["reason", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .unwrap_or("no reason given")
        .to_string()
}

// ─── ipapi.co ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct IpApiCoBody {
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    postal: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    asn: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

fn ipapi_co_accepts(body: &Value) -> bool {
    body.is_object() && !body.get("error").and_then(Value::as_bool).unwrap_or(false)
}

fn ipapi_co_normalize(body: Value) -> Result<GeoRecord, serde_json::Error> {
    let b: IpApiCoBody = serde_json::from_value(body)?;
    let org = non_empty(b.org);
    Ok(GeoRecord {
        country: non_empty(b.country_name),
        country_code: non_empty(b.country_code),
        region: non_empty(b.region),
        city: non_empty(b.city),
        postal: non_empty(b.postal),
        timezone: non_empty(b.timezone),
        // ipapi.co has no separate ISP field
        isp: org.clone(),
        org,
        asn: non_empty(b.asn),
        latitude: b.latitude,
        longitude: b.longitude,
    })
}

// ─── ipwho.is ───────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct IpWhoConnection {
    #[serde(default)]
    asn: Option<u64>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    isp: Option<String>,
}

#[derive(Deserialize, Default)]
struct IpWhoTimezone {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct IpWhoIsBody {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    postal: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    connection: Option<IpWhoConnection>,
    #[serde(default)]
    timezone: Option<IpWhoTimezone>,
}

fn ipwho_is_accepts(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

fn ipwho_is_normalize(body: Value) -> Result<GeoRecord, serde_json::Error> {
    let b: IpWhoIsBody = serde_json::from_value(body)?;
    let connection = b.connection.unwrap_or_default();
    Ok(GeoRecord {
        country: non_empty(b.country),
        country_code: non_empty(b.country_code),
        region: non_empty(b.region),
        city: non_empty(b.city),
        postal: non_empty(b.postal),
        timezone: non_empty(b.timezone.unwrap_or_default().id),
        isp: non_empty(connection.isp),
        org: non_empty(connection.org),
        asn: connection.asn.map(|n| format!("AS{}", n)),
        latitude: b.latitude,
        longitude: b.longitude,
    })
}

// ─── ip-api.com ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiComBody {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    zip: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    org: Option<String>,
    /// e.g. "AS15169 Google LLC"
    #[serde(default, rename = "as")]
    as_name: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

fn ip_api_com_accepts(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("success")
}

fn ip_api_com_normalize(body: Value) -> Result<GeoRecord, serde_json::Error> {
    let b: IpApiComBody = serde_json::from_value(body)?;
    let asn = non_empty(b.as_name)
        .and_then(|s| s.split_whitespace().next().map(str::to_string));
    Ok(GeoRecord {
        country: non_empty(b.country),
        country_code: non_empty(b.country_code),
        region: non_empty(b.region_name),
        city: non_empty(b.city),
        postal: non_empty(b.zip),
        timezone: non_empty(b.timezone),
        isp: non_empty(b.isp),
        org: non_empty(b.org),
        asn,
        latitude: b.lat,
        longitude: b.lon,
    })
}

// ─── Provider adapter ───────────────────────────────────────────

/// reqwest-backed provider driven by a `ProviderSpec`.
pub struct HttpGeoProvider {
    spec: &'static ProviderSpec,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    client: reqwest::Client,
}

impl HttpGeoProvider {
    /// Provider with its built-in base URL and timeout.
    pub fn new(spec: &'static ProviderSpec, client: reqwest::Client) -> Self {
        Self {
            spec,
            base_url: spec.default_base_url.to_string(),
            timeout: spec.timeout,
            user_agent: DEFAULT_GEO_USER_AGENT.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn lookup_url(&self, ip: IpAddr) -> String {
        format!(
            "{}{}",
            self.base_url,
            self.spec.path_template.replace("{ip}", &ip.to_string())
        )
    }
}

#[async_trait]
impl GeoProvider for HttpGeoProvider {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoRecord, UpstreamError> {
        let url = self.lookup_url(ip);
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        if !(self.spec.accepts)(&body) {
            return Err(UpstreamError::Rejected(rejection_reason(&body)));
        }

        (self.spec.normalize)(body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}
