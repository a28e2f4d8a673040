use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

use crate::sdk::config::AmapConfig;

/// (longitude, latitude)
pub type Coord = (f64, f64);

/// Metrics for one fetched route. Distance is stored in kilometers — the
/// vendor reports meters and the conversion happens once, at the provider
/// boundary. Duration stays in seconds, toll in yuan when the response
/// carries it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_secs: f64,
    pub toll_yuan: Option<f64>,
}

/// The two versioned driving-direction endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DrivingApi {
    V3,
    V5,
}

impl DrivingApi {
    pub fn url(self, config: &AmapConfig) -> &str {
        match self {
            DrivingApi::V3 => &config.direction_v3_url,
            DrivingApi::V5 => &config.direction_v5_url,
        }
    }
}

impl fmt::Display for DrivingApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DrivingApi::V3 => "v3",
            DrivingApi::V5 => "v5",
        })
    }
}

// --- Response envelopes for the driving API ---

#[derive(Debug, Deserialize)]
pub struct DirectionResponse {
    pub status: String,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub route: Option<RoutePlan>,
}

#[derive(Debug, Deserialize)]
pub struct RoutePlan {
    #[serde(default)]
    pub paths: Vec<PathSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PathSummary {
    #[serde(deserialize_with = "lenient_f64")]
    pub distance: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub toll: Option<f64>,
}

/// v3 quotes its numbers (`"distance": "1018"`), v5 sends them bare.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Like `lenient_f64`, but `null` and `""` mean absent.
fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed
                    .parse()
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}
