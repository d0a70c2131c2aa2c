use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeLogQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeLogItem {
    run_time: DateTime<Utc>,
    variant: String,
    offers_found: i32,
    offers_new: i32,
    offers_changed: i32,
    offers_unchanged: i32,
    error_message: Option<String>,
}

pub(super) async fn list_scrape_log(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeLogQuery>,
) -> Result<Json<ApiResponse<Vec<ScrapeLogItem>>>, ApiError> {
    let rows = offerwatch_db::list_scrape_log(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ScrapeLogItem {
            run_time: row.run_time,
            variant: row.variant,
            offers_found: row.offers_found,
            offers_new: row.offers_new,
            offers_changed: row.offers_changed,
            offers_unchanged: row.offers_unchanged,
            error_message: row.error_message,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
