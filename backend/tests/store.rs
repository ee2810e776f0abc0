use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use property_listing_backend::error::StoreError;
use property_listing_backend::models::{CreateListingRequest, ListingStatus};
use property_listing_backend::store::PropertyManager;

fn request(price: f64, location: &str) -> CreateListingRequest {
    CreateListingRequest {
        location: Some(location.to_string()),
        price: Some(price),
        property_type: Some("apartment".to_string()),
        description: Some("two rooms, south facing".to_string()),
        amenities: None,
    }
}

#[test]
fn created_listing_round_trips_through_owner_listings() {
    let manager = PropertyManager::new();
    let id = manager.create("alice", request(250_000.0, "stockholm")).unwrap();

    let listings = manager.get_user_listings("alice", None).unwrap();
    let listing = listings.iter().find(|l| l.id == id).expect("listing present");
    assert_eq!(listing.owner, "alice");
    assert_eq!(listing.status, ListingStatus::Available);
    assert_eq!(listing.details.location, "stockholm");
    assert_eq!(listing.details.price, 250_000.0);
}

#[test]
fn create_rejects_missing_price() {
    let manager = PropertyManager::new();
    let mut req = request(100.0, "berlin");
    req.price = None;
    let err = manager.create("alice", req).unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn create_rejects_missing_location() {
    let manager = PropertyManager::new();
    let mut req = request(100.0, "berlin");
    req.location = None;
    let err = manager.create("alice", req).unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn create_rejects_negative_and_non_finite_prices() {
    let manager = PropertyManager::new();
    for bad_price in [-1.0, f64::NAN, f64::INFINITY] {
        let mut req = request(100.0, "berlin");
        req.price = Some(bad_price);
        let err = manager.create("alice", req).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)), "price {}", bad_price);
    }
}

#[test]
fn concurrent_creates_yield_distinct_ids() {
    let manager = Arc::new(PropertyManager::new());
    let mut handles = Vec::new();
    for worker in 0..8 {
        let manager = manager.clone();
        handles.push(thread::spawn(move || {
            let owner = format!("user-{}", worker);
            (0..25)
                .map(|i| manager.create(&owner, request(1000.0 + i as f64, "oslo")).unwrap())
                .collect::<Vec<String>>()
        }));
    }

    let mut ids = HashSet::new();
    let mut total = 0;
    for handle in handles {
        for id in handle.join().unwrap() {
            ids.insert(id);
            total += 1;
        }
    }
    assert_eq!(ids.len(), total);
}

#[test]
fn update_status_enforces_ownership() {
    let manager = PropertyManager::new();
    let id = manager.create("alice", request(100.0, "a")).unwrap();

    let err = manager.update_status(&id, ListingStatus::Sold, "mallory").unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));
    // Unaffected by the rejected attempt.
    assert_eq!(manager.get(&id).unwrap().status, ListingStatus::Available);
}

#[test]
fn update_status_of_unknown_listing_is_not_found() {
    let manager = PropertyManager::new();
    let err = manager
        .update_status("no-such-id", ListingStatus::Sold, "alice")
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn owner_with_no_matches_gets_empty_not_an_error() {
    let manager = PropertyManager::new();
    manager.create("alice", request(100.0, "a")).unwrap();

    let sold = manager
        .get_user_listings("alice", Some(ListingStatus::Sold))
        .unwrap();
    assert!(sold.is_empty());
}

#[test]
fn unknown_owner_is_not_found() {
    let manager = PropertyManager::new();
    let err = manager.get_user_listings("nobody", None).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn owner_listings_come_newest_first() {
    let manager = PropertyManager::new();
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(manager.create("alice", request(100.0 * (i + 1) as f64, "a")).unwrap());
        thread::sleep(Duration::from_millis(3));
    }

    let listings = manager.get_user_listings("alice", None).unwrap();
    let ordered: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(ordered, expected);
    assert!(listings.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[test]
fn status_filter_tracks_transitions() {
    let manager = PropertyManager::new();
    let id = manager.create("alice", request(100.0, "a")).unwrap();
    manager.update_status(&id, ListingStatus::Sold, "alice").unwrap();

    let sold = manager
        .get_user_listings("alice", Some(ListingStatus::Sold))
        .unwrap();
    assert_eq!(sold.len(), 1);
    assert_eq!(sold[0].id, id);
    let available = manager
        .get_user_listings("alice", Some(ListingStatus::Available))
        .unwrap();
    assert!(available.is_empty());
}
