use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::sdk::config::AmapConfig;
use crate::sdk::error::GaodeError;
use crate::sdk::routing::types::Coord;
use crate::sdk::util::rate_limit::Pacer;

/// One row of the coordinate lookup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityCoordinate {
    pub city: String,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(default)]
    info: Option<String>,
    #[serde(default)]
    geocodes: Vec<GeocodeEntry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    location: String,
}

#[derive(Debug, Deserialize)]
struct CityRow {
    city: String,
}

/// City name → (longitude, latitude), loaded once at startup. Coordinates are
/// rounded to 5 decimal places, about a metre of precision, which is all the
/// routing endpoint needs.
#[derive(Debug, Clone)]
pub struct GeocodeResolver {
    coords: HashMap<String, Coord>,
}

impl GeocodeResolver {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GaodeError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut rdr = ReaderBuilder::new().delimiter(b',').from_reader(file);

        let mut entries = Vec::new();
        for result in rdr.deserialize::<CityCoordinate>() {
            let entry = result.map_err(|e| GaodeError::MalformedTable {
                path: PathBuf::from(path),
                detail: e.to_string(),
            })?;
            entries.push(entry);
        }
        log::debug!("loaded {} city coordinates from {}", entries.len(), path.display());
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CityCoordinate>) -> Self {
        let coords = entries
            .into_iter()
            .map(|e| (e.city, (round5(e.longitude), round5(e.latitude))))
            .collect();
        Self { coords }
    }

    /// A miss is fatal for the row being processed; there is no fallback.
    pub fn resolve(&self, city: &str) -> Result<Coord, GaodeError> {
        self.coords
            .get(city)
            .copied()
            .ok_or_else(|| GaodeError::UnknownCity(city.to_string()))
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Reads the one-column (`city`) input list.
pub fn read_city_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, GaodeError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new().delimiter(b',').from_reader(file);

    let mut cities = Vec::new();
    for result in rdr.deserialize::<CityRow>() {
        let row = result.map_err(|e| GaodeError::MalformedTable {
            path: PathBuf::from(path),
            detail: e.to_string(),
        })?;
        cities.push(row.city.trim().to_string());
    }
    Ok(cities)
}

/// Bulk geocoding pass: one request per city against the geocoding endpoint.
/// Any non-success envelope aborts the whole pass — a silently skipped city
/// would surface later as an unresolvable row in the batch run.
pub fn geocode_all(
    cities: &[String],
    config: &AmapConfig,
    pacer: &Pacer,
) -> Result<Vec<CityCoordinate>, GaodeError> {
    let client = Client::builder().timeout(config.timeout).build()?;

    let mut entries = Vec::with_capacity(cities.len());
    for city in cities {
        pacer.wait();
        let response = client
            .get(&config.geocode_url)
            .query(&[("key", config.api_key.as_str()), ("address", city.as_str())])
            .send()?;
        let text = response.text()?;

        let envelope: GeoResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!("unparseable geocode response for {:?}: {}. Body: {}", city, e, text);
            GaodeError::from(e)
        })?;

        if envelope.status != "1" {
            return Err(GaodeError::Api {
                info: envelope.info.unwrap_or_else(|| "no info".to_string()),
                params: format!("address={}", city),
            });
        }

        let first = envelope.geocodes.first().ok_or_else(|| GaodeError::Api {
            info: "success envelope with no geocodes".to_string(),
            params: format!("address={}", city),
        })?;
        let (longitude, latitude) = parse_location(&first.location)?;

        log::info!("geocoded {} -> ({}, {})", city, longitude, latitude);
        entries.push(CityCoordinate {
            city: city.clone(),
            longitude: round5(longitude),
            latitude: round5(latitude),
        });
    }
    Ok(entries)
}

/// Writes a fresh lookup table (`city,longitude,latitude`).
pub fn write_lookup<P: AsRef<Path>>(
    entries: &[CityCoordinate],
    path: P,
) -> Result<(), GaodeError> {
    let mut wtr = Writer::from_path(path.as_ref())?;
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

fn parse_location(raw: &str) -> Result<Coord, GaodeError> {
    let malformed = || GaodeError::MalformedLocation(raw.to_string());
    let (lon, lat) = raw.split_once(',').ok_or_else(malformed)?;
    let lon = lon.trim().parse::<f64>().map_err(|_| malformed())?;
    let lat = lat.trim().parse::<f64>().map_err(|_| malformed())?;
    Ok((lon, lat))
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolver_rounds_to_five_decimals() {
        let resolver = GeocodeResolver::from_entries(vec![CityCoordinate {
            city: "北京".to_string(),
            longitude: 116.407394999,
            latitude: 39.904211001,
        }]);
        assert_eq!(resolver.resolve("北京").unwrap(), (116.40739, 39.90421));
    }

    #[test]
    fn unknown_city_is_an_error() {
        let resolver = GeocodeResolver::from_entries(vec![]);
        assert!(matches!(
            resolver.resolve("乌有之乡"),
            Err(GaodeError::UnknownCity(_))
        ));
    }

    #[test]
    fn lookup_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cities_lng_lat_gaode.csv");
        let entries = vec![
            CityCoordinate {
                city: "上海".to_string(),
                longitude: 121.47370,
                latitude: 31.23037,
            },
            CityCoordinate {
                city: "广州".to_string(),
                longitude: 113.26453,
                latitude: 23.12908,
            },
        ];
        write_lookup(&entries, &path).unwrap();

        let resolver = GeocodeResolver::load(&path).unwrap();
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.resolve("上海").unwrap(), (121.47370, 31.23037));
    }

    #[test]
    fn malformed_lookup_file_fails_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "city,longitude,latitude\n上海,not-a-number,31.2\n").unwrap();
        assert!(matches!(
            GeocodeResolver::load(&path),
            Err(GaodeError::MalformedTable { .. })
        ));
    }

    #[test]
    fn city_list_reads_single_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cities.csv");
        fs::write(&path, "city\n上海\n北京\n").unwrap();
        assert_eq!(read_city_list(&path).unwrap(), vec!["上海", "北京"]);
    }

    #[test]
    fn location_strings_must_be_lon_comma_lat() {
        assert_eq!(parse_location("116.40,39.90").unwrap(), (116.40, 39.90));
        assert!(parse_location("116.40").is_err());
        assert!(parse_location("abc,39.90").is_err());
    }
}
