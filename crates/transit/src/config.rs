//! Backend endpoint configuration. Values can be overridden through
//! environment variables so the app can point at a staging backend or a
//! self-hosted geocoder without a rebuild.

use bevy::prelude::*;

/// Nominatim public instance used for address search.
const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Reachability backend ("raio" service) that computes the isochrones.
const DEFAULT_ISOCHRONE_URL: &str = "http://191.9.114.117:18001/transporte/api/raio/";

/// Identifies the app to the geocoder, which requires a product User-Agent.
const DEFAULT_USER_AGENT: &str = "AteOndePossoIr/1.0";

/// Seconds allowed for the optional startup locate fix before giving up.
const DEFAULT_LOCATE_TIMEOUT_SECS: u64 = 5;

#[derive(Resource, Clone)]
pub struct BackendConfig {
    pub nominatim_url: String,
    pub isochrone_url: String,
    pub user_agent: String,
    /// Optional endpoint returning `{"lat": f64, "lon": f64}` for a one-shot
    /// position fix at startup. Unset means the fallback position is kept.
    pub locate_url: Option<String>,
    pub locate_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let nominatim_url = std::env::var("ALCANCE_NOMINATIM_URL")
            .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.into());
        let isochrone_url = std::env::var("ALCANCE_ISOCHRONE_URL")
            .unwrap_or_else(|_| DEFAULT_ISOCHRONE_URL.into());
        let user_agent =
            std::env::var("ALCANCE_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.into());
        let locate_url = std::env::var("ALCANCE_LOCATE_URL").ok();
        let locate_timeout_secs = std::env::var("ALCANCE_LOCATE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOCATE_TIMEOUT_SECS);

        Self {
            nominatim_url,
            isochrone_url,
            user_agent,
            locate_url,
            locate_timeout_secs,
        }
    }
}
