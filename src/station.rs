use crate::{encoder, timestamp, Error, StationUpdate};
use chrono::{DateTime, Utc};
use serde::{ser, Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::convert::TryFrom;
use std::fmt;
use tracing::trace;

/// A single docking point of a bike-share system.
///
/// The id is fixed at construction and the timestamp only moves forward
/// through [`Station::touch`]; everything else is filled in by whichever
/// provider refreshes the station.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RawStation")]
pub struct Station {
    id: String,

    pub name: Option<String>,

    #[serde(serialize_with = "finite")]
    pub latitude: Option<f64>,

    #[serde(serialize_with = "finite")]
    pub longitude: Option<f64>,

    pub bikes: Option<i64>,

    pub slots: Option<i64>,

    #[serde(with = "crate::timestamp")]
    timestamp: DateTime<Utc>,
}

impl Station {
    pub fn new<S: Into<String>>(id: S) -> Result<Station, Error> {
        let id = id.into();
        validate_id(&id)?;

        Ok(Station {
            id,
            name: None,
            latitude: None,
            longitude: None,
            bikes: None,
            slots: None,
            timestamp: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Marks the station as refreshed now. Every refresh implementation
    /// must end up here, either directly or through [`Station::apply`].
    pub fn touch(&mut self) {
        self.timestamp = timestamp::now_after(&self.timestamp);
        trace!(id = %self.id, timestamp = %self.timestamp, "station touched");
    }

    /// Overwrites the fields carried by `update` and touches the station.
    pub fn apply(&mut self, update: StationUpdate) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(latitude) = update.latitude {
            self.latitude = Some(latitude);
        }
        if let Some(longitude) = update.longitude {
            self.longitude = Some(longitude);
        }
        if let Some(bikes) = update.bikes {
            self.bikes = Some(bikes);
        }
        if let Some(slots) = update.slots {
            self.slots = Some(slots);
        }
        self.touch();
    }

    /// Flat earth approximation, good enough within a single city.
    pub fn distance_to(&self, latitude: f64, longitude: f64) -> Option<f64> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(distance_meters(latitude, longitude, lat, lon)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Result<Value, Error> {
        encoder::to_value(self)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        encoder::to_json(self)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} bikes / {} slots)",
            self.id,
            self.name.as_deref().unwrap_or("-"),
            or_dash(self.bikes),
            or_dash(self.slots)
        )
    }
}

fn or_dash(count: Option<i64>) -> String {
    match count {
        Some(count) => count.to_string(),
        None => String::from("-"),
    }
}

pub(crate) fn validate_id(id: &str) -> Result<(), Error> {
    if id.trim().is_empty() {
        return Err(Error::ValidationError(String::from(
            "Station id must not be empty.",
        )));
    }
    Ok(())
}

// JSON has no representation for NaN or infinity.
fn finite<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if !v.is_finite() => Err(ser::Error::custom(format!(
            "Coordinate {} is not a finite number.",
            v
        ))),
        _ => value.serialize(serializer),
    }
}

fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let x = (lon1 - lon2).to_radians() * f64::cos(((lat1 + lat2) / 2.0).to_radians());
    let y = (lat1 - lat2).to_radians();
    6371000.0 * f64::sqrt(x * x + y * y)
}

#[derive(Deserialize)]
struct RawStation {
    id: String,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    bikes: Option<i64>,
    slots: Option<i64>,
    #[serde(with = "crate::timestamp")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawStation> for Station {
    type Error = Error;

    fn try_from(raw: RawStation) -> Result<Self, Self::Error> {
        validate_id(&raw.id)?;
        Ok(Station {
            id: raw.id,
            name: raw.name,
            latitude: raw.latitude,
            longitude: raw.longitude,
            bikes: raw.bikes,
            slots: raw.slots,
            timestamp: raw.timestamp,
        })
    }
}
