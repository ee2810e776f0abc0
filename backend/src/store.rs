use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, error};

use crate::error::StoreError;
use crate::id;
use crate::models::{CreateListingRequest, Listing, ListingStatus};

/// Key for the sorted price index. For non-negative finite floats the
/// IEEE-754 bit pattern orders identically to the numeric value, and
/// create-time validation guarantees prices are exactly that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PriceKey(u64);

impl PriceKey {
    fn new(price: f64) -> Self {
        // -0.0 passes validation but carries the sign bit; fold it into +0.0
        // so the bit pattern keeps ordering by value.
        PriceKey((price + 0.0).to_bits())
    }
}

#[derive(Debug, Clone)]
struct ShortlistEntry {
    listing_id: String,
    shortlisted_at: DateTime<Utc>,
}

/// Listing table plus every derived structure. All fields mutate together
/// under the write guard, so readers never observe a half-applied update.
#[derive(Default)]
struct StoreState {
    listings: HashMap<String, Listing>,
    portfolios: HashMap<String, HashSet<String>>,
    shortlists: HashMap<String, Vec<ShortlistEntry>>,
    price_index: BTreeMap<PriceKey, Vec<String>>,
    location_index: HashMap<String, Vec<String>>,
    status_index: HashMap<ListingStatus, Vec<String>>,
}

impl StoreState {
    /// Populates the price, location and status indices for a freshly
    /// inserted listing. A failure here means the table and indices would
    /// diverge, so the caller must roll the insert back.
    fn index_new_listing(&mut self, listing_id: &str) -> Result<(), String> {
        let (price, location, status) = match self.listings.get(listing_id) {
            Some(listing) => (
                listing.details.price,
                listing.details.location.clone(),
                listing.status,
            ),
            None => return Err(format!("listing '{}' missing from table", listing_id)),
        };
        let bucket = self.status_index.entry(status).or_default();
        if bucket.iter().any(|id| id == listing_id) {
            return Err(format!("listing '{}' is already indexed", listing_id));
        }
        bucket.push(listing_id.to_string());
        self.price_index
            .entry(PriceKey::new(price))
            .or_default()
            .push(listing_id.to_string());
        self.location_index
            .entry(location)
            .or_default()
            .push(listing_id.to_string());
        Ok(())
    }

    /// Moves `listing_id` from its current status bucket to the bucket for
    /// `new_status` and updates the status field. The id missing from the
    /// source bucket means the index already diverged from the table.
    fn transition_status(
        &mut self,
        listing_id: &str,
        new_status: ListingStatus,
        requester: &str,
    ) -> Result<(), StoreError> {
        let old_status = {
            let listing = self.listings.get(listing_id).ok_or_else(|| {
                StoreError::NotFound(format!("listing with id '{}' does not exist", listing_id))
            })?;
            if listing.owner != requester {
                return Err(StoreError::Forbidden);
            }
            listing.status
        };

        let bucket = self.status_index.get_mut(&old_status).ok_or_else(|| {
            StoreError::IndexUpdateFailure(format!(
                "no status bucket for '{}' while moving listing '{}'",
                old_status, listing_id
            ))
        })?;
        let pos = bucket.iter().position(|id| id == listing_id).ok_or_else(|| {
            StoreError::IndexUpdateFailure(format!(
                "listing '{}' not found in status bucket '{}'",
                listing_id, old_status
            ))
        })?;
        bucket.remove(pos);
        self.status_index
            .entry(new_status)
            .or_default()
            .push(listing_id.to_string());
        if let Some(listing) = self.listings.get_mut(listing_id) {
            listing.status = new_status;
        }
        Ok(())
    }
}

/// In-memory indexed store of property listings. One reader-writer lock
/// guards the table and every index: reads run concurrently, mutations and
/// multi-step read sequences are exclusive.
pub struct PropertyManager {
    inner: RwLock<StoreState>,
}

impl Default for PropertyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyManager {
    pub fn new() -> Self {
        PropertyManager {
            inner: RwLock::new(StoreState::default()),
        }
    }

    // State mutations never panic mid-update, so a guard recovered from a
    // poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a listing owned by `owner` and returns its id. All-or-nothing:
    /// if indexing fails after the primary insert, the listing is removed
    /// from the table and the owner's portfolio before the error is returned.
    pub fn create(&self, owner: &str, request: CreateListingRequest) -> Result<String, StoreError> {
        let details = request.into_details()?;
        let mut state = self.write();

        let listing_id = id::generate_listing_id();
        if state.listings.contains_key(&listing_id) {
            return Err(StoreError::IndexUpdateFailure(format!(
                "generated id '{}' collides with an existing listing",
                listing_id
            )));
        }

        let listing = Listing {
            id: listing_id.clone(),
            owner: owner.to_string(),
            details,
            status: ListingStatus::Available,
            created_at: Utc::now(),
        };
        state.listings.insert(listing_id.clone(), listing);
        state
            .portfolios
            .entry(owner.to_string())
            .or_default()
            .insert(listing_id.clone());

        if let Err(reason) = state.index_new_listing(&listing_id) {
            state.listings.remove(&listing_id);
            if let Some(portfolio) = state.portfolios.get_mut(owner) {
                portfolio.remove(&listing_id);
            }
            error!("rolled back listing '{}': {}", listing_id, reason);
            return Err(StoreError::IndexUpdateFailure(reason));
        }

        debug!("user '{}' created listing '{}'", owner, listing_id);
        Ok(listing_id)
    }

    /// Transitions a listing to `new_status` on behalf of `requester`, who
    /// must be the owner. An `IndexUpdateFailure` here has no compensation:
    /// it is logged and surfaced as a fatal inconsistency.
    pub fn update_status(
        &self,
        listing_id: &str,
        new_status: ListingStatus,
        requester: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.write();
        state
            .transition_status(listing_id, new_status, requester)
            .inspect_err(|err| {
                if matches!(err, StoreError::IndexUpdateFailure(_)) {
                    error!("status index corrupted for listing '{}': {}", listing_id, err);
                }
            })
    }

    /// All listings owned by `owner`, optionally filtered by status, newest
    /// first. An owner with no portfolio entry at all is `NotFound`; an owner
    /// whose listings simply don't match the filter gets an empty vec.
    pub fn get_user_listings(
        &self,
        owner: &str,
        status: Option<ListingStatus>,
    ) -> Result<Vec<Listing>, StoreError> {
        let state = self.read();
        let portfolio = state.portfolios.get(owner).ok_or_else(|| {
            StoreError::NotFound(format!("no listings found for user '{}'", owner))
        })?;
        let mut listings: Vec<Listing> = portfolio
            .iter()
            .filter_map(|id| state.listings.get(id))
            .filter(|listing| status.map_or(true, |s| listing.status == s))
            .cloned()
            .collect();
        sort_newest_first(&mut listings);
        Ok(listings)
    }

    /// Records `(listing_id, at)` in `user`'s shortlist and marks the listing
    /// sold, as one critical section. The status transition runs in the
    /// owner's permission context: any user's shortlist sells the listing on
    /// the owner's behalf.
    pub fn shortlist(
        &self,
        user: &str,
        listing_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.write();
        let (status, owner) = {
            let listing = state.listings.get(listing_id).ok_or_else(|| {
                StoreError::NotFound(format!("listing with id '{}' does not exist", listing_id))
            })?;
            (listing.status, listing.owner.clone())
        };
        if status == ListingStatus::Sold {
            return Err(StoreError::AlreadySold(listing_id.to_string()));
        }

        let entry = ShortlistEntry {
            listing_id: listing_id.to_string(),
            shortlisted_at: at,
        };
        debug!(
            "user '{}' shortlisted listing '{}' at {}",
            user, entry.listing_id, entry.shortlisted_at
        );
        state.shortlists.entry(user.to_string()).or_default().push(entry);

        state
            .transition_status(listing_id, ListingStatus::Sold, &owner)
            .inspect_err(|err| {
                error!("shortlist of listing '{}' left indices inconsistent: {}", listing_id, err)
            })
    }

    /// Every listing the user has ever shortlisted, regardless of its current
    /// status. A user who has never shortlisted anything is `NotFound`.
    pub fn shortlisted_listings(&self, user: &str) -> Result<Vec<Listing>, StoreError> {
        let state = self.read();
        let entries = state.shortlists.get(user).ok_or_else(|| {
            StoreError::NotFound(format!("no shortlisted listings found for user '{}'", user))
        })?;
        Ok(entries
            .iter()
            .filter_map(|entry| state.listings.get(&entry.listing_id))
            .cloned()
            .collect())
    }

    /// Snapshot of a single listing.
    pub fn get(&self, listing_id: &str) -> Option<Listing> {
        self.read().listings.get(listing_id).cloned()
    }

    /// Linear scan of the listing table under one read guard, keeping the
    /// listings the predicate accepts.
    pub fn filter_listings<F>(&self, mut keep: F) -> Vec<Listing>
    where
        F: FnMut(&Listing) -> bool,
    {
        self.read()
            .listings
            .values()
            .filter(|listing| keep(listing))
            .cloned()
            .collect()
    }
}

/// Orders by creation time, most recent first; ids break exact-timestamp
/// ties deterministically.
pub(crate) fn sort_newest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
