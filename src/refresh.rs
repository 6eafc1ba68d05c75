//! The refresh capability shared by stations, systems and provider variants.
//!
//! A provider wraps a [`Station`](crate::Station) or [`System`](crate::System)
//! and implements [`Refresh`] with its own fetch logic. Whatever it fetches,
//! it must finish by calling `Station::touch` (or `Station::apply`, which
//! touches) on every station it updated so timestamps behave the same for
//! every provider.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;

pub trait Refresh {
    type Error;

    fn refresh(&mut self) -> Result<(), Self::Error>;
}

/// Live values fetched for one station. Absent fields leave the station's
/// current value alone.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StationUpdate {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub bikes: Option<i64>,

    #[serde(default)]
    pub slots: Option<i64>,
}

impl Refresh for crate::Station {
    type Error = Infallible;

    fn refresh(&mut self) -> Result<(), Self::Error> {
        self.touch();
        Ok(())
    }
}

impl Refresh for crate::System {
    type Error = Infallible;

    fn refresh(&mut self) -> Result<(), Self::Error> {
        for station in self.stations_mut() {
            station.refresh()?;
        }
        Ok(())
    }
}
