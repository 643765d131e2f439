use std::fmt;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

static CADASTRAL_NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{6}:[0-9]{2}$")
        .expect("cadastral number pattern is a valid regex")
});

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Parcel identifier in the `NN:NN:NNNNNN:NN` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct CadastralNumber(String);

impl CadastralNumber {
    pub fn parse(raw: &str) -> Result<Self> {
        Self::try_from(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CadastralNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CadastralNumber {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        if CADASTRAL_NUMBER_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidCadastralNumber(value))
        }
    }
}

impl From<CadastralNumber> for String {
    fn from(value: CadastralNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for CadastralNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A latitude/longitude pair checked against the WGS84 ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// NaN fails both range checks, so non-finite input is rejected too.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !LATITUDE_RANGE.contains(&latitude) {
            return Err(ModelError::LatitudeOutOfRange(latitude));
        }
        if !LONGITUDE_RANGE.contains(&longitude) {
            return Err(ModelError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A validated land parcel, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Parcel {
    pub cadastral_number: CadastralNumber,
    pub coordinates: Coordinates,
}

impl Parcel {
    pub fn new(
        cadastral_number: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        Ok(Self {
            cadastral_number: CadastralNumber::parse(cadastral_number)?,
            coordinates: Coordinates::new(latitude, longitude)?,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude()
    }
}

/// Body of `POST /calc/`.
///
/// Older clients send the misspelled `longtitude` key; both spellings are
/// accepted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalcRequest {
    pub cadastral_number: String,
    pub latitude: f64,
    #[cfg_attr(feature = "serde", serde(alias = "longtitude"))]
    pub longitude: f64,
}

impl CalcRequest {
    pub fn validate(&self) -> Result<Parcel> {
        Parcel::try_from(self.clone())
    }
}

impl TryFrom<CalcRequest> for Parcel {
    type Error = ModelError;

    fn try_from(request: CalcRequest) -> Result<Self> {
        Ok(Self {
            cadastral_number: CadastralNumber::try_from(
                request.cadastral_number,
            )?,
            coordinates: Coordinates::new(request.latitude, request.longitude)?,
        })
    }
}
