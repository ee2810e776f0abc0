use std::sync::Arc;

use chrono::Utc;
use log::debug;

use crate::error::StoreError;
use crate::models::{Listing, ListingStatus, SearchCriteria};
use crate::store::{self, PropertyManager};

/// Stateless query layer over [`PropertyManager`]: criteria search over
/// available listings plus the shortlist workflow.
pub struct PropertySearch {
    manager: Arc<PropertyManager>,
}

impl PropertySearch {
    pub fn new(manager: Arc<PropertyManager>) -> Self {
        PropertySearch { manager }
    }

    /// Scans the listing table, keeps only available listings, and applies
    /// every provided filter as a conjunction. Absent filters are no-ops.
    /// Pagination is left to the caller.
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<Listing> {
        let results = self.manager.filter_listings(|listing| {
            if listing.status != ListingStatus::Available {
                return false;
            }
            if let Some(min_price) = criteria.min_price {
                if listing.details.price < min_price {
                    return false;
                }
            }
            if let Some(max_price) = criteria.max_price {
                if listing.details.price > max_price {
                    return false;
                }
            }
            if let Some(location) = &criteria.location {
                if &listing.details.location != location {
                    return false;
                }
            }
            if let Some(property_type) = &criteria.property_type {
                if &listing.details.property_type != property_type {
                    return false;
                }
            }
            true
        });
        debug!("search matched {} listings", results.len());
        results
    }

    /// Adds the listing to `user`'s shortlist and marks it sold. One-way per
    /// listing: a second shortlist of the same id fails with `AlreadySold`.
    pub fn shortlist(&self, user: &str, listing_id: &str) -> Result<(), StoreError> {
        self.manager.shortlist(user, listing_id, Utc::now())
    }

    /// The user's shortlisted listings, sold ones included, ordered by the
    /// listing's creation time, most recent first.
    pub fn get_shortlisted(&self, user: &str) -> Result<Vec<Listing>, StoreError> {
        let mut listings = self.manager.shortlisted_listings(user)?;
        store::sort_newest_first(&mut listings);
        Ok(listings)
    }
}
