use std::str::FromStr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{self, CurrentUser};
use crate::error::StoreError;
use crate::models::{CreateListingRequest, Listing, ListingStatus, SearchCriteria};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
}

/// Stand-in for the external identity provider: exchanges a user id for a
/// bearer token. An empty id signals absence and maps to 401.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if request.user_id.trim().is_empty() {
        return Err((StatusCode::UNAUTHORIZED, "Unknown user".to_string()));
    }
    let token = auth::create_token(&request.user_id, &state.config.jwt_secret)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({ "token": token })))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<CreateListingRequest>,
) -> Result<Json<Value>, StoreError> {
    let listing_id = state.manager.create(&user_id, request)?;
    log::info!("user '{}' listed property '{}'", user_id, listing_id);
    Ok(Json(json!({
        "message": "Property created successfully",
        "property_id": listing_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListOwnedParams {
    pub status: Option<String>,
}

pub async fn list_owned(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(params): Query<ListOwnedParams>,
) -> Result<Json<Value>, StoreError> {
    let status = params
        .status
        .as_deref()
        .map(ListingStatus::from_str)
        .transpose()?;
    let listings = state.manager.get_user_listings(&user_id, status)?;
    Ok(Json(json!({ "properties": listings })))
}

pub async fn search_listings(
    State(state): State<AppState>,
    Query(criteria): Query<SearchCriteria>,
) -> Json<Value> {
    let page = criteria.page.max(1);
    // Page and limit come straight off the query string; saturate instead of
    // overflowing on absurd values (a saturated offset just yields an empty page).
    let offset = (page - 1).saturating_mul(criteria.limit);
    let results: Vec<Listing> = state
        .search
        .search(&criteria)
        .into_iter()
        .skip(offset)
        .take(criteria.limit)
        .collect();
    Json(json!({
        "results": results,
        "page": page,
        "limit": criteria.limit,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ShortlistParams {
    pub property_id: String,
}

pub async fn shortlist_listing(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(params): Query<ShortlistParams>,
) -> Result<Json<Value>, StoreError> {
    state.search.shortlist(&user_id, &params.property_id)?;
    log::info!(
        "user '{}' shortlisted property '{}'",
        user_id,
        params.property_id
    );
    Ok(Json(json!({
        "message": "Property shortlisted successfully",
        "property_id": params.property_id,
    })))
}

pub async fn list_shortlisted(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<Listing>>, StoreError> {
    let listings = state.search.get_shortlisted(&user_id)?;
    Ok(Json(listings))
}
