use reqwest::blocking::Client;

use super::service::RouteProvider;
use super::types::{Coord, DirectionResponse, DrivingApi, RouteSummary};
use crate::sdk::config::AmapConfig;
use crate::sdk::error::GaodeError;
use crate::sdk::util::rate_limit::Pacer;

/// Blocking client for the Amap driving-direction endpoints.
pub struct RemoteAmapProvider {
    client: Client,
    config: AmapConfig,
    api: DrivingApi,
    pacer: Pacer,
}

impl RemoteAmapProvider {
    pub fn new(config: AmapConfig, api: DrivingApi, pacer: Pacer) -> Result<Self, GaodeError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            api,
            pacer,
        })
    }
}

impl RouteProvider for RemoteAmapProvider {
    fn fetch_route(&self, origin: Coord, destination: Coord) -> Result<RouteSummary, GaodeError> {
        self.pacer.wait();

        let origin_param = format!("{},{}", origin.0, origin.1);
        let destination_param = format!("{},{}", destination.0, destination.1);
        let url = self.api.url(&self.config);
        log::debug!("fetching route {} -> {}", origin_param, destination_param);

        let response = self
            .client
            .get(url)
            .query(&[
                ("origin", origin_param.as_str()),
                ("destination", destination_param.as_str()),
                ("key", self.config.api_key.as_str()),
                ("extensions", "all"),
            ])
            .send()?;
        let text = response.text()?;

        let envelope: DirectionResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "unparseable direction response. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            GaodeError::from(e)
        })?;

        summarize(envelope, || {
            format!(
                "origin={} destination={}",
                origin_param, destination_param
            )
        })
    }
}

fn summarize(
    envelope: DirectionResponse,
    params: impl Fn() -> String,
) -> Result<RouteSummary, GaodeError> {
    if envelope.status != "1" {
        return Err(GaodeError::Api {
            info: envelope.info.unwrap_or_else(|| "no info".to_string()),
            params: params(),
        });
    }

    let path = envelope
        .route
        .and_then(|r| r.paths.into_iter().next())
        .ok_or_else(|| GaodeError::Api {
            info: "success envelope with no paths".to_string(),
            params: params(),
        })?;

    // Meters on the wire, kilometers in the table.
    Ok(RouteSummary {
        distance_km: path.distance / 1000.0,
        duration_secs: path.duration,
        toll_yuan: path.toll,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> DirectionResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn first_path_wins_and_distance_becomes_kilometers() {
        let envelope = parse(
            r#"{"status": "1", "route": {"paths": [
                {"distance": "1018000", "duration": "36000", "toll": "230"},
                {"distance": "2000000", "duration": "72000"}
            ]}}"#,
        );
        let summary = summarize(envelope, || String::new()).unwrap();
        assert_eq!(summary.distance_km, 1018.0);
        assert_eq!(summary.duration_secs, 36000.0);
        assert_eq!(summary.toll_yuan, Some(230.0));
    }

    #[test]
    fn non_success_status_carries_the_request_params() {
        let envelope = parse(r#"{"status": "0", "info": "INVALID_USER_KEY"}"#);
        let err = summarize(envelope, || "origin=1,2 destination=3,4".to_string()).unwrap_err();
        match err {
            GaodeError::Api { info, params } => {
                assert_eq!(info, "INVALID_USER_KEY");
                assert!(params.contains("origin=1,2"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn success_without_paths_is_an_api_error() {
        let envelope = parse(r#"{"status": "1", "route": {"paths": []}}"#);
        assert!(matches!(
            summarize(envelope, String::new),
            Err(GaodeError::Api { .. })
        ));
    }
}
