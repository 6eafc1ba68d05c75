use crate::{encoder, Error, IntoMetaValue, Meta, Station};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::TryFrom;
use std::fmt;
use std::slice;
use tracing::debug;

/// A named network of stations operated by one provider.
///
/// Station ids come from the upstream feed, so no uniqueness check is done
/// here; keeping them unique is the provider's job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RawSystem")]
pub struct System {
    tag: String,

    pub meta: Meta,

    stations: Vec<Station>,
}

impl System {
    pub fn new<S, I, K, V>(tag: S, overrides: I) -> Result<System, Error>
    where
        S: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoMetaValue,
    {
        System::with_defaults(tag, &Meta::default(), overrides)
    }

    /// Builds a system from shared company defaults plus per-city overrides.
    /// The defaults are copied, never referenced. Non-finite float overrides
    /// are a validation error.
    pub fn with_defaults<S, I, K, V>(tag: S, defaults: &Meta, overrides: I) -> Result<System, Error>
    where
        S: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoMetaValue,
    {
        let tag = tag.into();
        validate_tag(&tag)?;

        let meta = defaults.clone().with_overrides(overrides)?;
        debug!(tag = %tag, name = ?meta.name(), "system created");

        Ok(System {
            tag,
            meta,
            stations: Vec::new(),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn stations_mut(&mut self) -> slice::IterMut<'_, Station> {
        self.stations.iter_mut()
    }

    pub fn iter(&self) -> slice::Iter<'_, Station> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn push_station(&mut self, station: Station) {
        self.stations.push(station);
    }

    /// Publishes a fully populated collection in one step and hands back the
    /// previous one.
    pub fn replace_stations(&mut self, stations: Vec<Station>) -> Vec<Station> {
        debug!(
            tag = %self.tag,
            previous = self.stations.len(),
            current = stations.len(),
            "stations replaced"
        );
        std::mem::replace(&mut self.stations, stations)
    }

    pub fn find_station(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|station| station.id() == id)
    }

    /// Closest station with known coordinates and its distance in meters.
    pub fn closest_station(&self, latitude: f64, longitude: f64) -> Option<(&Station, f64)> {
        let mut closest: Option<(&Station, f64)> = None;
        for station in &self.stations {
            let distance = match station.distance_to(latitude, longitude) {
                Some(distance) => distance,
                None => continue,
            };
            let is_closer = match &closest {
                Some((_, closest_distance)) => distance < *closest_distance,
                None => true,
            };
            if is_closer {
                closest = Some((station, distance));
            }
        }
        closest
    }

    pub fn describe(&self) -> String {
        format!(
            "--- {name} ---\nUname: {tag}\nCity: {city}\nCountry: {country}\nLatLng: {latitude} / {longitude}\nCompany: {company}\n",
            name = self.meta.display("name"),
            tag = self.tag,
            city = self.meta.display("city"),
            country = self.meta.display("country"),
            latitude = self.meta.display("latitude"),
            longitude = self.meta.display("longitude"),
            company = self.meta.display("company"),
        )
    }

    pub fn to_value(&self) -> Result<Value, Error> {
        encoder::to_value(self)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        encoder::to_json(self)
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<'a> IntoIterator for &'a System {
    type Item = &'a Station;
    type IntoIter = slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

fn validate_tag(tag: &str) -> Result<(), Error> {
    if tag.trim().is_empty() {
        return Err(Error::ValidationError(String::from(
            "System tag must not be empty.",
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawSystem {
    tag: String,
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    stations: Vec<Station>,
}

impl TryFrom<RawSystem> for System {
    type Error = Error;

    fn try_from(raw: RawSystem) -> Result<Self, Self::Error> {
        validate_tag(&raw.tag)?;
        Ok(System {
            tag: raw.tag,
            meta: raw.meta,
            stations: raw.stations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_overrides() -> Vec<(String, Value)> {
        Vec::new()
    }

    fn station(id: &str, latitude: f64, longitude: f64) -> Station {
        let mut station = Station::new(id).unwrap();
        station.latitude = Some(latitude);
        station.longitude = Some(longitude);
        station
    }

    #[test]
    fn rejects_empty_tag() {
        assert!(matches!(
            System::new("", no_overrides()),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn overrides_apply_over_defaults() {
        let system = System::new("acme", vec![("city", "Metropolis")]).unwrap();
        assert_eq!(system.tag(), "acme");
        assert_eq!(system.meta["city"], "Metropolis");
        for key in ["name", "country", "latitude", "longitude", "company"].iter() {
            assert_eq!(system.meta[*key], Value::Null);
        }
    }

    #[test]
    fn company_defaults_are_copied() {
        let jcdecaux = Meta::default()
            .with_overrides(vec![("company", "JCDecaux")])
            .unwrap();
        let mut velib =
            System::with_defaults("velib", &jcdecaux, vec![("city", "Paris")]).unwrap();
        let bicikelj =
            System::with_defaults("bicikelj", &jcdecaux, vec![("city", "Ljubljana")]).unwrap();

        velib.meta.set("company", "Someone else").unwrap();

        assert_eq!(jcdecaux.company(), Some("JCDecaux"));
        assert_eq!(bicikelj.meta.company(), Some("JCDecaux"));
        assert_eq!(velib.meta.company(), Some("Someone else"));
    }

    #[test]
    fn describe_renders_absent_fields() {
        let system = System::new("acme", no_overrides()).unwrap();
        assert_eq!(
            system.describe(),
            "--- - ---\nUname: acme\nCity: -\nCountry: -\nLatLng: - / -\nCompany: -\n"
        );
    }

    #[test]
    fn describe_renders_values() {
        let system = System::new(
            "bicing",
            vec![
                ("name", json!("Bicing")),
                ("city", json!("Barcelona")),
                ("country", json!("ES")),
                ("latitude", json!(41.3850639)),
                ("longitude", json!(2.1734035)),
                ("company", json!("ClearChannel")),
            ],
        )
        .unwrap();
        assert_eq!(
            system.to_string(),
            "--- Bicing ---\nUname: bicing\nCity: Barcelona\nCountry: ES\nLatLng: 41.3850639 / 2.1734035\nCompany: ClearChannel\n"
        );
    }

    #[test]
    fn replace_returns_previous_collection() {
        let mut system = System::new("acme", no_overrides()).unwrap();
        system.push_station(Station::new("a").unwrap());

        let previous = system.replace_stations(vec![
            Station::new("b").unwrap(),
            Station::new("c").unwrap(),
        ]);

        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].id(), "a");
        let ids: Vec<&str> = system.iter().map(Station::id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn duplicates_are_not_filtered() {
        let mut system = System::new("acme", no_overrides()).unwrap();
        system.push_station(Station::new("a").unwrap());
        system.push_station(Station::new("a").unwrap());
        assert_eq!(system.len(), 2);
    }

    #[test]
    fn closest_station_skips_unknown_locations() {
        let mut system = System::new("acme", no_overrides()).unwrap();
        assert!(system.closest_station(41.38, 2.17).is_none());

        system.push_station(Station::new("nowhere").unwrap());
        system.push_station(station("far", 41.50, 2.17));
        system.push_station(station("near", 41.39, 2.17));

        let (closest, distance) = system.closest_station(41.38, 2.17).unwrap();
        assert_eq!(closest.id(), "near");
        assert!(distance < 1200.0);
    }
}
