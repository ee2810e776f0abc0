use uuid::Uuid;

/// Allocates a listing id. Random UUIDs keep ids unique without depending on
/// clock resolution; a residual collision is caught by the store's indexing
/// step and rolled back.
pub fn generate_listing_id() -> String {
    Uuid::new_v4().to_string()
}
