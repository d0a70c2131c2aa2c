use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use offerwatch_db::PgOfferStore;
use offerwatch_pipeline::{run_scrape, PipelineError, ScrapeRequest};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeQuery {
    pub source: Option<String>,
    pub dry_run: Option<String>,
}

/// Body returned when a run cannot start or cannot complete.
#[derive(Debug, Serialize)]
pub(super) struct ScrapeFailure {
    ok: bool,
    error: String,
}

impl ScrapeFailure {
    fn response(status: StatusCode, error: impl Into<String>) -> Response {
        (
            status,
            Json(Self {
                ok: false,
                error: error.into(),
            }),
        )
            .into_response()
    }
}

/// Accepts `1`/`true`/`yes` and `0`/`false`/`no`; anything else is `None`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Runs a scrape synchronously and returns its report.
///
/// The body is the run report itself rather than the usual `data`/`meta`
/// envelope, so that callers get the same shape from every trigger.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> Response {
    let dry_run = match query.dry_run.as_deref() {
        None => state.scrape.dry_run,
        Some(raw) => match parse_flag(raw) {
            Some(flag) => flag,
            None => {
                return ScrapeFailure::response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid dry_run value '{raw}'"),
                );
            }
        },
    };

    let request = ScrapeRequest {
        selector: query.source,
        dry_run,
        base_urls: state.scrape.base_urls.clone(),
    };
    let store = PgOfferStore::new(state.pool.clone());

    tracing::info!(
        request_id = %req_id.0,
        source = ?request.selector,
        dry_run,
        "scrape triggered over HTTP"
    );

    match run_scrape(&store, state.source.as_ref(), &request).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(PipelineError::Config(e)) => {
            ScrapeFailure::response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "scrape run failed");
            ScrapeFailure::response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn scrape_failure_serializes_ok_false() {
        let body = ScrapeFailure {
            ok: false,
            error: "unsupported source selector 'mx'".to_string(),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "unsupported source selector 'mx'");
    }
}
