//! Shared data model for bike-share systems.
//!
//! A [`System`] owns a collection of [`Station`]s plus descriptive [`Meta`].
//! Provider specific scrapers live elsewhere; they build a system, refresh
//! its stations through the [`Refresh`] capability and hand the canonical
//! JSON produced by the [`encoder`] to whoever consumes it.

pub mod encoder;
pub use encoder::Style;
mod error;
pub use error::Error;
mod meta;
pub use meta::{IntoMetaValue, Meta};
mod refresh;
pub use refresh::{Refresh, StationUpdate};
mod station;
pub use station::Station;
mod system;
pub use system::System;
pub mod timestamp;

/// Keys every [`Meta`] carries, null unless a system sets them.
pub const META_KEYS: [&str; 6] = ["name", "city", "country", "latitude", "longitude", "company"];

/// ISO-8601 in UTC with microseconds and no offset suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
