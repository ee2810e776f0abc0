use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Lifecycle status of a listing. The only transition in this design is
/// `Available -> Sold`, triggered by a shortlist or an explicit owner update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ListingStatus::Available),
            "sold" => Ok(ListingStatus::Sold),
            other => Err(StoreError::InvalidInput(format!(
                "unknown listing status '{}'",
                other
            ))),
        }
    }
}

/// Validated details of a property listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDetails {
    pub location: String,
    pub price: f64,
    pub property_type: String,
    pub description: Option<String>,
    pub amenities: Option<BTreeSet<String>>,
}

/// A property listing. `id`, `owner` and `created_at` are immutable after
/// creation; only `status` mutates over the listing's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub owner: String,
    #[serde(flatten)]
    pub details: ListingDetails,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

/// Wire shape for creating a listing. Fields the store requires are kept
/// optional here so that missing values surface as `InvalidInput` rather
/// than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingRequest {
    pub location: Option<String>,
    pub price: Option<f64>,
    pub property_type: Option<String>,
    pub description: Option<String>,
    pub amenities: Option<BTreeSet<String>>,
}

impl CreateListingRequest {
    /// Validates the request into `ListingDetails`.
    pub fn into_details(self) -> Result<ListingDetails, StoreError> {
        let price = self
            .price
            .ok_or_else(|| StoreError::InvalidInput("listing details must include 'price'".into()))?;
        if !price.is_finite() || price < 0.0 {
            return Err(StoreError::InvalidInput(
                "'price' must be a non-negative finite number".into(),
            ));
        }
        let location = self
            .location
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| {
                StoreError::InvalidInput("listing details must include 'location'".into())
            })?;
        let property_type = self
            .property_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                StoreError::InvalidInput("listing details must include 'property_type'".into())
            })?;
        Ok(ListingDetails {
            location,
            price,
            property_type,
            description: self.description,
            amenities: self.amenities,
        })
    }
}

/// Search filters, applied as a conjunction; absent filters are no-ops.
/// `page` and `limit` are sliced at the handler boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCriteria {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

impl Default for SearchCriteria {
    fn default() -> Self {
        SearchCriteria {
            min_price: None,
            max_price: None,
            location: None,
            property_type: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}
