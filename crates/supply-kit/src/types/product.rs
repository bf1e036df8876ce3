//! Supply-chain domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use stellar_xdr::curr::ScVal;

use crate::error::{Error, ParseStatusError};

use super::value::to_native;

/// Product identifier the contract returns for an unknown product.
pub const NOT_FOUND_ID: u64 = 0;

/// Where a product is in its lifecycle.
///
/// The contract stores the status as free text. Text outside the three
/// lifecycle stages is kept as [`Other`](Self::Other) when read back, while
/// [`FromStr`] accepts only the known stages.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductStatus {
    /// Registered at the factory.
    #[default]
    Manufactured,
    /// Moving between locations.
    InTransit,
    /// Arrived at its destination.
    Delivered,
    /// Status text written by another client.
    Other(String),
}

impl ProductStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ProductStatus; 3] = [
        ProductStatus::Manufactured,
        ProductStatus::InTransit,
        ProductStatus::Delivered,
    ];

    /// The string stored by the contract.
    pub fn as_str(&self) -> &str {
        match self {
            ProductStatus::Manufactured => "manufactured",
            ProductStatus::InTransit => "in_transit",
            ProductStatus::Delivered => "delivered",
            ProductStatus::Other(text) => text,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ProductStatus::Other(_))
    }
}

impl From<String> for ProductStatus {
    fn from(text: String) -> Self {
        text.parse().unwrap_or(ProductStatus::Other(text))
    }
}

impl From<ProductStatus> for String {
    fn from(status: ProductStatus) -> Self {
        match status {
            ProductStatus::Other(text) => text,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "manufactured" => Ok(ProductStatus::Manufactured),
            "in_transit" => Ok(ProductStatus::InTransit),
            "delivered" => Ok(ProductStatus::Delivered),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A product as stored by the contract.
///
/// Numeric fields arrive as decimal text from the decoder and are parsed back
/// into integers here.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde_as(as = "DisplayFromStr")]
    pub product_id: u64,
    pub name: String,
    pub manufacturer: String,
    pub current_location: String,
    pub status: ProductStatus,
    /// Seconds since the Unix epoch of the last registration or update.
    #[serde_as(as = "DisplayFromStr")]
    pub timestamp: u64,
}

impl ProductRecord {
    /// Decode the value returned by `get_product`.
    ///
    /// Returns `Ok(None)` when the contract answered with its not-found record.
    /// The identifier is checked before any other field is read.
    pub fn from_sc_val(value: &ScVal) -> Result<Option<Self>, Error> {
        let native = to_native(value);

        let id = native
            .get("product_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::decode("product", "missing product_id"))?;
        let id: u64 = id
            .parse()
            .map_err(|e| Error::decode("product", format!("product_id '{id}': {e}")))?;
        if id == NOT_FOUND_ID {
            return Ok(None);
        }

        serde_json::from_value(native)
            .map(Some)
            .map_err(|e| Error::decode("product", e))
    }

    /// The last update time.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// The last update time formatted for display.
    pub fn readable_timestamp(&self) -> String {
        match self.updated_at() {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => self.timestamp.to_string(),
        }
    }
}

/// Input for registering a product.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub manufacturer: String,
    pub location: String,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
            location: location.into(),
        }
    }
}
