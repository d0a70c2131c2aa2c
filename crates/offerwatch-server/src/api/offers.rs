use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use offerwatch_core::Variant;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct OffersQuery {
    pub variant: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    id: i64,
    source: String,
    variant: String,
    title: String,
    text: String,
    link: String,
    category: Option<String>,
    hash: String,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    last_changed: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct OfferVersionItem {
    source: String,
    variant: String,
    hash: String,
    captured_at: DateTime<Utc>,
    title: String,
    text: String,
    link: String,
    category: Option<String>,
}

pub(super) async fn list_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OffersQuery>,
) -> Result<Json<ApiResponse<Vec<OfferItem>>>, ApiError> {
    let variant = match query.variant.as_deref() {
        None => None,
        Some(raw) => Some(Variant::from_str(raw).map_err(|_| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown variant '{raw}'"),
            )
        })?),
    };

    let rows = offerwatch_db::list_offers(
        &state.pool,
        variant.map(Variant::as_str),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| OfferItem {
            id: row.id,
            source: row.source,
            variant: row.variant,
            title: row.title,
            text: row.text,
            link: row.link,
            category: row.category,
            hash: row.hash,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            last_changed: row.last_changed,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_offer_versions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(offer_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<OfferVersionItem>>>, ApiError> {
    let offer = offerwatch_db::get_offer(&state.pool, offer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if offer.is_none() {
        return Err(ApiError::new(req_id.0, "not_found", "offer not found"));
    }

    let rows = offerwatch_db::list_offer_versions(&state.pool, offer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|version| OfferVersionItem {
            source: version.source,
            variant: version.variant,
            hash: version.hash,
            captured_at: version.captured_at,
            title: version.title,
            text: version.text,
            link: version.link,
            category: version.category,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
